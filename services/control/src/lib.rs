//! # Isodac Control Task
//!
//! Device-level side effects of stream events. The playback engine only
//! raises [`AudioEvents`]; this task waits on them and drives the hardware
//! that sits outside the USB path.
//!
//! ```text
//!   AudioStream::events() ──wait──▶ ControlTask::dispatch
//!                                     ├── USB_STATE ─▶ "USB active" indicator
//!                                     ├── PLAYBACK  ─▶ bus, DMA exchange, SOF capture, DAC
//!                                     ├── MUTE      ─▶ mute indicators, DAC mute
//!                                     └── VOLUME    ─▶ DAC volume
//! ```
//!
//! Playback start brings the chain up from the clock outwards and stop takes
//! it down in reverse:
//!
//! ```text
//!   start: indicator on → bus → exchange → capture → DAC
//!   stop:  DAC → capture → exchange → bus → indicator off
//! ```
//!
//! A failing collaborator does not abort the sequence. Every step is
//! attempted, failures are logged, and the first one is returned.

#![no_std]

use isodac_stream::{AudioError, AudioEvents, AudioStream, CaptureTimer, ChannelControls};

// =============================================================================
// Collaborators
// =============================================================================

/// Serial audio bus (I2S) feeding the DAC
pub trait AudioBus {
    /// Enables the bus clock
    fn start(&mut self) -> Result<(), AudioError>;
    /// Disables the bus clock
    fn stop(&mut self) -> Result<(), AudioError>;
    /// Starts continuous circular DMA over the double buffer
    fn start_exchange(&mut self) -> Result<(), AudioError>;
    fn stop_exchange(&mut self) -> Result<(), AudioError>;
}

/// External DAC, programmed over its register interface
pub trait Dac {
    /// Powers up and unmutes the output stage
    fn start(&mut self) -> Result<(), AudioError>;
    fn stop(&mut self) -> Result<(), AudioError>;
    fn set_mute(&mut self, mute: [bool; 2]) -> Result<(), AudioError>;
    /// Per-channel volume in 8.8 dB
    fn set_volume(&mut self, volume: [i16; 2]) -> Result<(), AudioError>;
}

/// Status indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Device configured by the host
    UsbActive,
    Playback,
    MuteLeft,
    MuteRight,
}

/// Board LEDs or equivalent
pub trait StatusIndicator {
    fn set(&mut self, indicator: Indicator, on: bool);
}

/// USB device state as reported by the bus driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbState {
    Detached,
    Default,
    Addressed,
    /// Configured
    Active,
    Suspended,
}

/// Query for the bus driver's current device state
pub trait UsbStatus {
    fn state(&self) -> UsbState;
}

// =============================================================================
// Control task
// =============================================================================

/// Hardware the control task drives
pub struct Board<B, D, I, T, U> {
    pub bus: B,
    pub dac: D,
    pub indicators: I,
    /// Start-of-frame capture timer for the clock monitor
    pub timer: T,
    pub usb: U,
}

/// Control/notification task
pub struct ControlTask<'a, B, D, I, T, U> {
    stream: &'a AudioStream,
    board: Board<B, D, I, T, U>,
    /// Playback chain currently brought up
    running: bool,
}

impl<'a, B, D, I, T, U> ControlTask<'a, B, D, I, T, U>
where
    B: AudioBus,
    D: Dac,
    I: StatusIndicator,
    T: CaptureTimer,
    U: UsbStatus,
{
    pub fn new(stream: &'a AudioStream, board: Board<B, D, I, T, U>) -> Self {
        Self {
            stream,
            board,
            running: false,
        }
    }

    pub fn board(&self) -> &Board<B, D, I, T, U> {
        &self.board
    }

    /// Playback chain is up
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Applies one batch of event flags
    pub fn dispatch(&mut self, events: AudioEvents) -> Result<(), AudioError> {
        let mut first = None;

        if events.contains(AudioEvents::USB_STATE) {
            let active = self.board.usb.state() == UsbState::Active;
            self.board.indicators.set(Indicator::UsbActive, active);
            log::debug!("usb state {:?}", self.board.usb.state());
        }

        if events.contains(AudioEvents::PLAYBACK) {
            let playing = self.stream.is_playing();
            if playing && !self.running {
                self.start_chain(&mut first);
            } else if !playing && self.running {
                self.stop_chain(&mut first);
            }
        }

        if events.intersects(AudioEvents::MUTE | AudioEvents::VOLUME) {
            // One snapshot so both channels come from the same write
            let controls = self.stream.controls();
            if events.contains(AudioEvents::MUTE) {
                self.apply_mute(&controls, &mut first);
            }
            if events.contains(AudioEvents::VOLUME) {
                note(&mut first, "dac volume", self.board.dac.set_volume(controls.volume));
            }
        }

        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn start_chain(&mut self, first: &mut Option<AudioError>) {
        log::debug!("bringing up playback chain");
        self.board.indicators.set(Indicator::Playback, true);
        note(first, "bus start", self.board.bus.start());
        note(first, "exchange start", self.board.bus.start_exchange());
        self.stream.start_capture(&mut self.board.timer);
        note(first, "dac start", self.board.dac.start());
        self.running = true;
    }

    fn stop_chain(&mut self, first: &mut Option<AudioError>) {
        log::debug!("taking down playback chain");
        note(first, "dac stop", self.board.dac.stop());
        self.stream.stop_capture(&mut self.board.timer);
        note(first, "exchange stop", self.board.bus.stop_exchange());
        note(first, "bus stop", self.board.bus.stop());
        self.board.indicators.set(Indicator::Playback, false);
        self.running = false;
    }

    fn apply_mute(&mut self, controls: &ChannelControls, first: &mut Option<AudioError>) {
        self.board.indicators.set(Indicator::MuteLeft, controls.mute[0]);
        self.board.indicators.set(Indicator::MuteRight, controls.mute[1]);
        note(first, "dac mute", self.board.dac.set_mute(controls.mute));
    }

    /// Task body: waits for events forever
    pub async fn run(&mut self) -> ! {
        log::debug!("control task running");
        loop {
            let events = self.stream.events().wait().await;
            // Failures are logged per step; keep serving events
            let _ = self.dispatch(events);
        }
    }
}

/// Logs a failed step and keeps the first failure
fn note(first: &mut Option<AudioError>, step: &str, result: Result<(), AudioError>) {
    if let Err(err) = result {
        log::warn!("{} failed: {}", step, err);
        first.get_or_insert(err);
    }
}

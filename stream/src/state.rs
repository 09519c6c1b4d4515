//! # Stream State
//!
//! The single state value shared by every interrupt handler and task. It is
//! constructed once by the firmware and handed out by reference; there is no
//! implicit global.
//!
//! All mutable fields live behind one [`IrqMutex`]. A handler that reads
//! `playback` and then acts on the endpoints does so inside one lock scope, so
//! a stream transition can never land in the middle of a frame slot.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use isodac_uac::FeedbackSample;

use crate::bridge::StagedWrite;
use crate::buffer::{Half, HalfTransfer};
use crate::config::{AudioConfig, CHANNELS, QUEUE_SIZE};
use crate::error::AudioError;
use crate::event::EventSource;
use crate::lock::IrqMutex;
use crate::monitor::FrameClockCapture;
use crate::queue::IngressQueue;
use crate::stats::StreamStats;

/// Rendezvous between the half-transfer interrupt and the buffer pump
pub type PumpSignal = Signal<CriticalSectionRawMutex, HalfTransfer>;

/// Per-channel mute and volume, read and written as one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelControls {
    /// Channel mute states (0 = left, 1 = right)
    pub mute: [bool; CHANNELS],
    /// Channel volumes in 8.8 dB
    pub volume: [i16; CHANNELS],
}

/// Lock-protected part of the stream state
pub(crate) struct Shared {
    /// Streaming alternate setting active
    pub(crate) playback: bool,
    /// At least one full measurement window since capture started
    pub(crate) feedback_valid: bool,
    /// Last completed feedback measurement
    pub(crate) feedback: FeedbackSample,
    /// Frame clock capture accumulator
    pub(crate) capture: FrameClockCapture,
    /// Frame-boundary capture is armed
    pub(crate) capture_armed: bool,
    pub(crate) controls: ChannelControls,
    pub(crate) queue: IngressQueue<QUEUE_SIZE>,
    /// Control write waiting for its data stage
    pub(crate) staged: Option<StagedWrite>,
}

impl Shared {
    const fn new() -> Self {
        Self {
            playback: false,
            feedback_valid: false,
            feedback: FeedbackSample::ZERO,
            capture: FrameClockCapture::new(),
            capture_armed: false,
            controls: ChannelControls {
                mute: [false; CHANNELS],
                volume: [0; CHANNELS],
            },
            queue: IngressQueue::new(),
            staged: None,
        }
    }
}

/// Playback engine state
pub struct AudioStream {
    config: AudioConfig,
    pub(crate) shared: IrqMutex<Shared>,
    events: EventSource,
    pump: PumpSignal,
    stats: StreamStats,
}

impl AudioStream {
    /// Creates a stopped stream with muting off and volume at 0 dB
    pub fn new(config: AudioConfig) -> Result<Self, AudioError> {
        config.validate()?;

        Ok(Self {
            config,
            shared: IrqMutex::new(Shared::new()),
            events: EventSource::new(),
            pump: Signal::new(),
            stats: StreamStats::new(),
        })
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Event flags consumed by the control task
    pub fn events(&self) -> &EventSource {
        &self.events
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub(crate) fn pump_signal(&self) -> &PumpSignal {
        &self.pump
    }

    /// Streaming alternate setting active
    pub fn is_playing(&self) -> bool {
        self.shared.lock(|s| s.playback)
    }

    pub fn feedback_valid(&self) -> bool {
        self.shared.lock(|s| s.feedback_valid)
    }

    /// Last feedback measurement, if one is valid
    pub fn feedback(&self) -> Option<FeedbackSample> {
        self.shared
            .lock(|s| if s.feedback_valid { Some(s.feedback) } else { None })
    }

    /// Consistent snapshot of both channels' mute and volume
    pub fn controls(&self) -> ChannelControls {
        self.shared.lock(|s| s.controls)
    }

    /// Bytes waiting in the ingress queue
    pub fn queued_bytes(&self) -> usize {
        self.shared.lock(|s| s.queue.len())
    }

    /// DMA half-transfer-complete interrupt
    ///
    /// `half` is the half the DMA has just finished transmitting. Resumes the
    /// pump; a wake posted before the pump parks is kept, and a newer wake
    /// replaces an unconsumed older one.
    pub fn on_half_transfer(&self, half: Half) {
        self.pump.signal(HalfTransfer {
            half,
            len: self.config.half_buffer_bytes(),
        });
    }

    /// Moves exactly `out.len()` queued bytes into `out`, or nothing
    pub(crate) fn take_samples(&self, out: &mut [u8]) -> bool {
        self.shared.lock(|s| s.queue.read_exact(out))
    }
}

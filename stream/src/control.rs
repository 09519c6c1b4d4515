//! # Stream Control
//!
//! Two states, driven by the host:
//!
//! ```text
//!              SET_INTERFACE(streaming, alt 1)
//!   Stopped  ---------------------------------->  Streaming
//!            <----------------------------------
//!              SET_INTERFACE(streaming, alt 0) or bus reset
//! ```
//!
//! Transitions happen under the stream lock, so the per-frame endpoint
//! handlers always see one `playback` value for their whole slot. Every real
//! transition raises [`AudioEvents::PLAYBACK`]; repeated requests for the
//! current state do nothing.

use crate::endpoint::{EndpointConfig, EndpointDriver};
use crate::error::AudioError;
use crate::event::AudioEvents;
use crate::state::AudioStream;

/// Alternate setting of the streaming interface that carries audio
pub const STREAMING_ALT_ACTIVE: u8 = 1;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Streaming,
}

/// USB driver global events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbEvent {
    /// Bus reset
    Reset,
    /// Address assigned
    Address,
    /// Configuration selected
    Configured,
    Suspend,
    Wakeup,
    /// Endpoint stalled
    Stalled,
}

impl AudioStream {
    pub fn state(&self) -> PlaybackState {
        if self.is_playing() {
            PlaybackState::Streaming
        } else {
            PlaybackState::Stopped
        }
    }

    /// Enters `Streaming`
    ///
    /// Discards stale queued bytes, primes the data endpoint to receive and
    /// the feedback endpoint with a zero-length packet. Returns `false` when
    /// already streaming.
    pub fn start_playback<D: EndpointDriver>(&self, usb: &mut D) -> Result<bool, AudioError> {
        let ep_out = self.config().playback_endpoint;
        let ep_in = self.config().feedback_endpoint;
        let max_packet = self.config().max_packet_size();

        let started = self.shared.lock(|s| -> Result<bool, AudioError> {
            if s.playback {
                return Ok(false);
            }
            s.queue.clear();
            usb.start_receive(ep_out, max_packet)?;
            usb.start_transmit(ep_in, &[])?;
            s.playback = true;
            Ok(true)
        })?;

        if started {
            self.events().broadcast(AudioEvents::PLAYBACK);
            log::debug!("playback started");
        }
        Ok(started)
    }

    /// Enters `Stopped`. Returns `false` when already stopped.
    ///
    /// Feedback measured during the session is invalidated here, so a restart
    /// sends zero-length feedback until a fresh window completes even if the
    /// control task never sees the stop.
    pub fn stop_playback(&self) -> bool {
        let stopped = self.shared.lock(|s| {
            if !s.playback {
                return false;
            }
            s.playback = false;
            s.capture.reset();
            s.feedback_valid = false;
            true
        });

        if stopped {
            self.events().broadcast(AudioEvents::PLAYBACK);
            log::debug!("playback stopped");
        }
        stopped
    }

    /// SET_INTERFACE from the host
    ///
    /// Takes the full wIndex and wValue. Only the streaming interface is
    /// handled; alternate setting 1 starts playback and any other stops it.
    pub fn set_interface<D: EndpointDriver>(
        &self,
        usb: &mut D,
        interface: u16,
        alternate: u16,
    ) -> Result<(), AudioError> {
        if interface != self.config().streaming_interface as u16 {
            return Err(AudioError::Unsupported);
        }

        if alternate == STREAMING_ALT_ACTIVE as u16 {
            self.start_playback(usb)?;
        } else {
            self.stop_playback();
        }
        Ok(())
    }

    /// USB driver global event
    pub fn on_usb_event<D: EndpointDriver>(&self, usb: &mut D, event: UsbEvent) -> Result<(), AudioError> {
        self.events().broadcast(AudioEvents::USB_STATE);
        log::debug!("usb event {:?}", event);

        match event {
            UsbEvent::Reset => {
                self.stop_playback();
            }
            UsbEvent::Configured => {
                let config = EndpointConfig::streaming(self.config());
                let ep = self.config().playback_endpoint;
                self.shared.lock(|_| usb.init_endpoint(ep, &config))?;
                log::debug!("streaming endpoints enabled on ep{}", ep);
            }
            UsbEvent::Address | UsbEvent::Suspend | UsbEvent::Wakeup | UsbEvent::Stalled => {}
        }
        Ok(())
    }
}

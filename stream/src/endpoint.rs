//! # Isochronous Endpoint Handlers
//!
//! Per-frame callbacks for the streaming endpoint pair:
//!
//! - OUT (playback): received samples go into the ingress queue and the
//!   endpoint is re-armed for the next frame. Draining is the pump's job.
//! - IN (feedback): transmits the last feedback value, or a zero-length
//!   packet while no measurement window has completed yet.
//!
//! Both handlers run in interrupt context and never block.

use crate::config::{AudioConfig, FEEDBACK_MAX_PACKET};
use crate::error::AudioError;
use crate::state::AudioStream;

/// USB transfer types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TransferType {
    Control = 0,
    Isochronous = 1,
    Bulk = 2,
    Interrupt = 3,
}

/// Configuration applied to an endpoint pair when the device is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Transfer type of both directions
    pub transfer_type: TransferType,
    /// Maximum IN packet size
    pub in_max_packet: u16,
    /// Maximum OUT packet size
    pub out_max_packet: u16,
    /// Hardware double buffering
    pub double_buffered: bool,
}

impl EndpointConfig {
    /// Streaming OUT plus feedback IN, isochronous and double-buffered
    pub fn streaming(config: &AudioConfig) -> Self {
        Self {
            transfer_type: TransferType::Isochronous,
            in_max_packet: FEEDBACK_MAX_PACKET,
            out_max_packet: config.max_packet_size() as u16,
            double_buffered: true,
        }
    }
}

/// Device-side USB endpoint operations
///
/// Every method is called from interrupt context with the stream lock held
/// and must return without waiting for the bus.
pub trait EndpointDriver {
    /// Enables an endpoint number with the given configuration
    fn init_endpoint(&mut self, ep: u8, config: &EndpointConfig) -> Result<(), AudioError>;

    /// Arms the OUT side of `ep` to receive one packet of up to `max_len` bytes
    fn start_receive(&mut self, ep: u8, max_len: usize) -> Result<(), AudioError>;

    /// Arms the IN side of `ep` with `data`; an empty slice sends a zero-length packet
    fn start_transmit(&mut self, ep: u8, data: &[u8]) -> Result<(), AudioError>;
}

impl AudioStream {
    /// Feedback IN slot, once per frame
    pub fn on_feedback_slot<D: EndpointDriver>(&self, usb: &mut D) -> Result<(), AudioError> {
        let ep = self.config().feedback_endpoint;
        self.shared.lock(|s| {
            if !s.playback {
                return Ok(());
            }
            if s.feedback_valid {
                usb.start_transmit(ep, s.feedback.as_bytes())
            } else {
                usb.start_transmit(ep, &[])
            }
        })
    }

    /// Playback OUT slot, once per frame
    ///
    /// `received` is what the hardware delivered in this frame, possibly
    /// nothing. Bytes beyond one maximum packet, or beyond the queue's free
    /// space, are dropped and counted.
    pub fn on_data_slot<D: EndpointDriver>(
        &self,
        usb: &mut D,
        received: &[u8],
    ) -> Result<(), AudioError> {
        let ep = self.config().playback_endpoint;
        let max_packet = self.config().max_packet_size();
        let packet = &received[..received.len().min(max_packet)];

        let result = self.shared.lock(|s| -> Result<Option<usize>, AudioError> {
            if !s.playback {
                return Ok(None);
            }
            let accepted = s.queue.write(packet);
            usb.start_receive(ep, max_packet)?;
            Ok(Some(received.len() - accepted))
        });

        if let Some(dropped) = result? {
            if dropped > 0 {
                self.stats().record_dropped(dropped);
                log::trace!("ingress overflow, dropped {} bytes", dropped);
            }
            #[cfg(feature = "trace-frames")]
            log::trace!("ingress packet {} bytes", received.len());
        }
        Ok(())
    }
}

//! # Audio Parameters
//!
//! Stream format, USB topology numbers and the buffer sizes derived from
//! them. Storage is sized at compile time for the default profile; a runtime
//! [`AudioConfig`] may describe a smaller stream but never a larger one.

use isodac_uac::feedback::FEEDBACK_SIZE;

use crate::error::AudioError;

/// Default sample rate in Hz
pub const SAMPLE_RATE: u32 = 48_000;

/// Default sample resolution in bits
pub const RESOLUTION_BITS: u32 = 16;

/// Channel count; mute and volume state is kept per channel
pub const CHANNELS: usize = 2;

/// USB frames per second on a full-speed bus
pub const FRAMES_PER_SECOND: u32 = 1000;

/// Extra bytes per packet the host may send while following feedback
pub const PACKET_SLACK: usize = 4;

/// Samples per channel per USB frame
pub const SAMPLES_PER_FRAME: usize = (SAMPLE_RATE / FRAMES_PER_SECOND) as usize;

/// Nominal isochronous OUT packet
pub const PACKET_SIZE: usize = SAMPLES_PER_FRAME * CHANNELS * (RESOLUTION_BITS as usize / 8);

/// Largest isochronous OUT packet
pub const MAX_PACKET_SIZE: usize = PACKET_SIZE + PACKET_SLACK;

/// DMA buffer length in 16-bit words (two halves of one frame each)
pub const BUFFER_SAMPLES: usize = SAMPLES_PER_FRAME * CHANNELS * 2;

/// DMA buffer length in bytes
pub const BUFFER_BYTES: usize = BUFFER_SAMPLES * (RESOLUTION_BITS as usize / 8);

/// Ingress queue capacity
pub const QUEUE_SIZE: usize = MAX_PACKET_SIZE * 4;

/// Feedback endpoint max packet (3 bytes used)
pub const FEEDBACK_MAX_PACKET: u16 = 4;

/// Control data stage staging buffer
pub const CONTROL_BUFFER_SIZE: usize = 8;

/// Stream and topology configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bits per sample
    pub resolution_bits: u32,
    /// Number of channels
    pub channels: usize,
    /// Isochronous OUT endpoint number
    pub playback_endpoint: u8,
    /// Isochronous IN (feedback) endpoint number
    pub feedback_endpoint: u8,
    /// Audio control interface number
    pub control_interface: u8,
    /// Audio streaming interface number
    pub streaming_interface: u8,
    /// Feature unit ID (mute and volume)
    pub feature_unit_id: u8,
}

impl AudioConfig {
    /// 48 kHz, 16-bit stereo on endpoint 1
    pub const fn new() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            resolution_bits: RESOLUTION_BITS,
            channels: CHANNELS,
            playback_endpoint: 0x01,
            feedback_endpoint: 0x01,
            control_interface: 0,
            streaming_interface: 1,
            feature_unit_id: 2,
        }
    }

    pub const fn bytes_per_sample(&self) -> usize {
        (self.resolution_bits / 8) as usize
    }

    pub const fn samples_per_frame(&self) -> usize {
        (self.sample_rate / FRAMES_PER_SECOND) as usize
    }

    /// Nominal packet: `(rate / 1000) x channels x (bits / 8)`
    pub const fn packet_size(&self) -> usize {
        self.samples_per_frame() * self.channels * self.bytes_per_sample()
    }

    /// Nominal packet plus rate-adaptation slack
    pub const fn max_packet_size(&self) -> usize {
        self.packet_size() + PACKET_SLACK
    }

    /// Whole DMA buffer in bytes
    pub const fn buffer_bytes(&self) -> usize {
        self.half_buffer_bytes() * 2
    }

    /// Bytes the pump must supply per half-transfer
    pub const fn half_buffer_bytes(&self) -> usize {
        self.packet_size()
    }

    pub const fn queue_size(&self) -> usize {
        self.max_packet_size() * 4
    }

    /// Address of the feedback endpoint (direction bit set)
    pub const fn feedback_endpoint_address(&self) -> u8 {
        0x80 | self.feedback_endpoint
    }

    /// Checks the configuration against the compiled-in storage
    pub fn validate(&self) -> Result<(), AudioError> {
        if self.channels != CHANNELS {
            return Err(AudioError::InvalidConfig);
        }
        if self.sample_rate == 0 || self.sample_rate % FRAMES_PER_SECOND != 0 {
            return Err(AudioError::InvalidConfig);
        }
        if self.resolution_bits == 0 || self.resolution_bits % 8 != 0 {
            return Err(AudioError::InvalidConfig);
        }
        if self.queue_size() > QUEUE_SIZE || self.buffer_bytes() > BUFFER_BYTES {
            return Err(AudioError::InvalidConfig);
        }
        // Endpoint 0 is the control pipe
        if self.playback_endpoint == 0 || self.playback_endpoint > 15 {
            return Err(AudioError::InvalidConfig);
        }
        if self.feedback_endpoint == 0 || self.feedback_endpoint > 15 {
            return Err(AudioError::InvalidConfig);
        }
        Ok(())
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self::new()
    }
}

const _: () = assert!(FEEDBACK_SIZE as u16 <= FEEDBACK_MAX_PACKET);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sizes() {
        let config = AudioConfig::default();
        assert_eq!(config.packet_size(), 192);
        assert_eq!(config.max_packet_size(), 196);
        assert_eq!(config.queue_size(), 784);
        assert_eq!(config.buffer_bytes(), BUFFER_BYTES);
        assert_eq!(BUFFER_SAMPLES, 192);
        assert_eq!(config.half_buffer_bytes(), 192);
        assert_eq!(config.feedback_endpoint_address(), 0x81);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_smaller_stream_fits() {
        let config = AudioConfig {
            sample_rate: 32_000,
            ..AudioConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.packet_size(), 128);
    }

    #[test]
    fn test_rejects_oversized_or_odd() {
        let too_fast = AudioConfig {
            sample_rate: 96_000,
            ..AudioConfig::default()
        };
        assert_eq!(too_fast.validate(), Err(AudioError::InvalidConfig));

        let fractional = AudioConfig {
            sample_rate: 44_100,
            ..AudioConfig::default()
        };
        assert_eq!(fractional.validate(), Err(AudioError::InvalidConfig));

        let mono = AudioConfig {
            channels: 1,
            ..AudioConfig::default()
        };
        assert_eq!(mono.validate(), Err(AudioError::InvalidConfig));

        let control_pipe = AudioConfig {
            playback_endpoint: 0,
            ..AudioConfig::default()
        };
        assert_eq!(control_pipe.validate(), Err(AudioError::InvalidConfig));
    }
}

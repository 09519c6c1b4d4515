//! Rate Feedback Value
//!
//! The feedback endpoint reports the device's sample rate in samples per
//! USB frame as a 24-bit 10.14 fixed-point value, little-endian.
//!
//! The measuring timer is clocked by the audio master clock (256 x Fs) and
//! accumulates ticks over 32 frames. `256 * 32 = 2^13`, so the accumulated
//! count is already the rate in 19.13 format; one left shift yields 10.14.

/// Bytes on the wire
pub const FEEDBACK_SIZE: usize = 3;

/// Frames accumulated per feedback measurement
pub const FEEDBACK_WINDOW_FRAMES: u32 = 32;

/// Fractional bits of the encoded value
pub const FEEDBACK_FRACTION_BITS: u32 = 14;

const FEEDBACK_MASK: u32 = 0x00FF_FFFF;

/// Encoded 10.14 feedback value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedbackSample {
    bytes: [u8; FEEDBACK_SIZE],
}

impl FeedbackSample {
    pub const ZERO: Self = Self { bytes: [0; FEEDBACK_SIZE] };

    /// Encodes the master-clock ticks counted over one measurement window
    pub const fn from_ticks(accumulated: u32) -> Self {
        let value = (accumulated << 1) & FEEDBACK_MASK;
        Self {
            bytes: [
                (value & 0xFF) as u8,
                ((value >> 8) & 0xFF) as u8,
                ((value >> 16) & 0xFF) as u8,
            ],
        }
    }

    pub const fn from_bytes(bytes: [u8; FEEDBACK_SIZE]) -> Self {
        Self { bytes }
    }

    /// Wire representation
    pub const fn as_bytes(&self) -> &[u8; FEEDBACK_SIZE] {
        &self.bytes
    }

    /// Decoded 24-bit value
    pub const fn value(&self) -> u32 {
        (self.bytes[0] as u32) | ((self.bytes[1] as u32) << 8) | ((self.bytes[2] as u32) << 16)
    }

    /// Whole samples per frame
    pub const fn whole(&self) -> u32 {
        self.value() >> FEEDBACK_FRACTION_BITS
    }

    /// Fractional samples per frame, in 1/16384 units
    pub const fn fraction(&self) -> u32 {
        self.value() & ((1 << FEEDBACK_FRACTION_BITS) - 1)
    }
}

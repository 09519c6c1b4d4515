//! DMA double buffer
//!
//! The serial audio bus drains one half while the pump refills the other.
//! The DMA engine only reports completion of the half it has just left, so
//! the pump and the DMA never touch the same half at the same time.

use crate::config::BUFFER_BYTES;

/// One half of the double buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    First,
    Second,
}

impl Half {
    /// The half the DMA moves to next
    pub fn other(self) -> Self {
        match self {
            Half::First => Half::Second,
            Half::Second => Half::First,
        }
    }

    /// Byte offset of this half in a buffer of `total` bytes
    pub fn offset(self, total: usize) -> usize {
        match self {
            Half::First => 0,
            Half::Second => total / 2,
        }
    }
}

/// Wake-up payload posted by the half-transfer interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfTransfer {
    /// Half just vacated by the DMA
    pub half: Half,
    /// Bytes the pump must supply
    pub len: usize,
}

/// Sample buffer transmitted continuously by the DMA
///
/// Holds 16-bit little-endian samples as raw bytes, starting silent.
pub struct DoubleBuffer<const B: usize = BUFFER_BYTES> {
    data: [u8; B],
}

impl<const B: usize> DoubleBuffer<B> {
    pub const fn new() -> Self {
        assert!(B % 2 == 0, "double buffer must split into two equal halves");
        Self { data: [0; B] }
    }

    /// Bytes per half
    pub const fn half_len(&self) -> usize {
        B / 2
    }

    pub fn half(&self, half: Half) -> &[u8] {
        let offset = half.offset(B);
        &self.data[offset..offset + B / 2]
    }

    pub fn half_mut(&mut self, half: Half) -> &mut [u8] {
        let offset = half.offset(B);
        &mut self.data[offset..offset + B / 2]
    }

    /// Whole buffer, in DMA order
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Start address handed to the DMA engine
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }
}

impl<const B: usize> Default for DoubleBuffer<B> {
    fn default() -> Self {
        Self::new()
    }
}

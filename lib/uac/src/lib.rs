//! # Isodac USB Audio Class Primitives
//!
//! This crate provides the protocol-level building blocks shared by the
//! playback engine and the control service. Nothing here touches hardware.
//!
//! ## Contents
//!
//! - **SETUP packets**: decoding of the 8-byte control SETUP stage
//! - **Feature unit**: UAC 1.0 class requests, control selectors and channel
//!   selectors for mute and volume
//! - **Feedback**: the 10.14 fixed-point rate value sent on the isochronous
//!   feedback endpoint
//!
//! ## Design
//!
//! - `no_std`, no allocation
//! - Explicit byte-level encode/decode over fixed-width integers

#![no_std]

pub mod feature;
pub mod feedback;
pub mod setup;

pub use feature::{ChannelSelector, ClassRequest, FeatureControl};
pub use feedback::FeedbackSample;
pub use setup::{Direction, Recipient, RequestKind, SetupPacket};

/// Standard descriptor types the device answers GET_DESCRIPTOR for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DescriptorType {
    Device = 1,
    Configuration = 2,
    String = 3,
}

impl DescriptorType {
    /// Decodes the descriptor type byte of a GET_DESCRIPTOR request
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(DescriptorType::Device),
            2 => Some(DescriptorType::Configuration),
            3 => Some(DescriptorType::String),
            _ => None,
        }
    }
}

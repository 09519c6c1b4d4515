//! # Isodac Playback Engine
//!
//! The core of a USB Audio Class 1.0 asynchronous speaker: audio arrives on an
//! isochronous OUT endpoint, is queued, and is pumped into a DMA double buffer
//! feeding the audio bus. The device's own clock is measured against the USB
//! frame clock and reported back on an isochronous feedback endpoint so the
//! host can match its rate.
//!
//! ## Data flow
//!
//! ```text
//!  host ──ISO OUT──▶ on_data_slot ──▶ IngressQueue ──▶ BufferPump ──▶ DoubleBuffer ──▶ DMA ──▶ DAC
//!                                                          ▲                            │
//!                                                          └──── on_half_transfer ◀─────┘
//!  host ◀──ISO IN─── on_feedback_slot ◀── FrameClockCapture ◀── on_frame_boundary (SOF latch)
//!  host ◀─control──▶ requests_hook ──▶ bridge / stream control ──▶ AudioEvents ──▶ control task
//! ```
//!
//! ## Contexts
//!
//! - **Interrupts**: `on_frame_boundary`, `on_half_transfer`, `on_data_slot`,
//!   `on_feedback_slot`, `on_usb_event`, `requests_hook`. Never block; touch
//!   shared state only inside [`IrqMutex`] scopes.
//! - **Pump task**: [`BufferPump::run`]. The only place that parks, and never
//!   with the lock held.
//! - **Control task**: waits on [`EventSource`] and drives the DAC, audio bus
//!   and indicators. Lives outside this crate.
//!
//! The firmware builds one [`AudioStream`] and hands out `&AudioStream` to every
//! context. There are no globals in this crate.

#![no_std]

pub mod bridge;
pub mod buffer;
pub mod config;
pub mod control;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod lock;
pub mod monitor;
pub mod pump;
pub mod queue;
pub mod requests;
pub mod state;
pub mod stats;

pub use bridge::{ControlData, ControlTransfer, FeatureRequest};
pub use buffer::{DoubleBuffer, Half, HalfTransfer};
pub use config::AudioConfig;
pub use control::{PlaybackState, UsbEvent};
pub use endpoint::{EndpointConfig, EndpointDriver, TransferType};
pub use error::AudioError;
pub use event::{AudioEvents, EventSource};
pub use lock::IrqMutex;
pub use monitor::{CaptureTimer, FrameClockCapture};
pub use pump::{BufferPump, PumpOutcome};
pub use queue::IngressQueue;
pub use requests::DescriptorSet;
pub use state::{AudioStream, ChannelControls};
pub use stats::{StatsSnapshot, StreamStats};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

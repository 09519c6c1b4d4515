//! Audio error types

use core::fmt;

/// Playback engine errors
///
/// None of these are fatal. Protocol errors are reported to the bus layer,
/// which stalls the control pipe; driver errors are surfaced to the caller of
/// the handler that armed the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioError {
    /// Request not handled by this function
    Unsupported,
    /// Channel number outside the feature unit
    InvalidChannel,
    /// Data stage too long for the staging buffer or too short for the control
    InvalidLength,
    /// Data stage completed with nothing staged
    NoPendingTransfer,
    /// Configuration does not fit the compiled-in storage
    InvalidConfig,
    /// Endpoint still owns a previous transfer
    EndpointBusy,
    /// Endpoint not initialized
    EndpointNotConfigured,
    /// Collaborator (driver, DAC, bus) failure
    Driver,
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            AudioError::Unsupported => "request not supported",
            AudioError::InvalidChannel => "invalid channel",
            AudioError::InvalidLength => "invalid data stage length",
            AudioError::NoPendingTransfer => "no pending control transfer",
            AudioError::InvalidConfig => "invalid audio configuration",
            AudioError::EndpointBusy => "endpoint busy",
            AudioError::EndpointNotConfigured => "endpoint not configured",
            AudioError::Driver => "driver error",
        };
        f.write_str(msg)
    }
}

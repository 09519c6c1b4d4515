//! # Control-Transfer Bridge
//!
//! Feature unit requests (mute and volume) arriving on the control pipe.
//!
//! A GET request is answered immediately from the current controls. A SET
//! request only stages its data stage: the bus layer receives the payload and
//! hands it back through [`AudioStream::complete_control_write`], which is the
//! only place the controls are mutated.
//!
//! Payload layouts (little endian):
//!
//! ```text
//!   mute,   channel n : [m]
//!   mute,   master    : [reserved, m1, m2]
//!   volume, channel n : [v lo, v hi]
//!   volume, master    : [reserved lo, reserved hi, v1 lo, v1 hi, v2 lo, v2 hi]
//! ```

use isodac_uac::feature::{VOLUME_MAX, VOLUME_MIN, VOLUME_RES};
use isodac_uac::{ChannelSelector, ClassRequest, FeatureControl};

use crate::config::{CHANNELS, CONTROL_BUFFER_SIZE};
use crate::error::AudioError;
use crate::event::AudioEvents;
use crate::state::{AudioStream, ChannelControls};

/// SET request waiting for its data stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StagedWrite {
    Mute(ChannelSelector),
    Volume(ChannelSelector),
    /// Accepted and thrown away on completion
    Discard,
}

/// Decoded feature unit request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureRequest {
    pub request: ClassRequest,
    pub control: FeatureControl,
    pub channel: ChannelSelector,
    /// Data stage length requested by the host
    pub length: u16,
}

impl FeatureRequest {
    /// Decodes the raw request fields
    ///
    /// `control` is the high byte of wValue and `channel` the low byte.
    pub fn decode(
        request: u8,
        control: u8,
        channel: u8,
        length: u16,
        channels: usize,
    ) -> Result<Self, AudioError> {
        let request = ClassRequest::from_u8(request).ok_or(AudioError::Unsupported)?;
        let control = FeatureControl::from_u8(control).ok_or(AudioError::Unsupported)?;
        let channel = ChannelSelector::decode(channel, channels).ok_or(AudioError::InvalidChannel)?;

        if length as usize > CONTROL_BUFFER_SIZE {
            return Err(AudioError::InvalidLength);
        }

        Ok(Self {
            request,
            control,
            channel,
            length,
        })
    }
}

/// Bytes returned in an IN data stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlData {
    bytes: [u8; CONTROL_BUFFER_SIZE],
    len: usize,
}

impl ControlData {
    /// Copies `data`, cut to `limit` bytes and to the staging buffer
    fn truncated(data: &[u8], limit: usize) -> Self {
        let len = data.len().min(limit).min(CONTROL_BUFFER_SIZE);
        let mut bytes = [0u8; CONTROL_BUFFER_SIZE];
        bytes[..len].copy_from_slice(&data[..len]);
        Self { bytes, len }
    }

    /// `value` repeated once per 16-bit word of a `len`-byte response
    fn words(value: i16, len: usize) -> Self {
        let mut bytes = [0u8; CONTROL_BUFFER_SIZE];
        for word in bytes.chunks_exact_mut(2) {
            word.copy_from_slice(&value.to_le_bytes());
        }
        Self {
            bytes,
            len: len.min(CONTROL_BUFFER_SIZE),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// What the bus layer does next with a handled control request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlTransfer {
    /// No data stage; acknowledge with a zero-length status stage
    Status,
    /// Send these bytes to the host
    Send(ControlData),
    /// Receive `len` bytes, then call [`AudioStream::complete_control_write`]
    Receive { len: usize },
}

/// Payload bytes a SET_CUR needs for `control` on `channel`
fn payload_len(control: FeatureControl, channel: ChannelSelector) -> usize {
    match (control, channel) {
        (FeatureControl::Mute, ChannelSelector::Master) => 1 + CHANNELS,
        (FeatureControl::Mute, ChannelSelector::Channel(_)) => 1,
        (FeatureControl::Volume, ChannelSelector::Master) => 2 * (1 + CHANNELS),
        (FeatureControl::Volume, ChannelSelector::Channel(_)) => 2,
    }
}

fn current_value(controls: &ChannelControls, req: &FeatureRequest) -> Result<ControlData, AudioError> {
    let limit = req.length as usize;
    let data = match (req.control, req.channel) {
        (FeatureControl::Mute, ChannelSelector::Master) => ControlData::truncated(
            &[0, controls.mute[0] as u8, controls.mute[1] as u8],
            limit,
        ),
        (FeatureControl::Mute, channel) => {
            let idx = channel.index().ok_or(AudioError::InvalidChannel)?;
            let mute = controls.mute.get(idx).ok_or(AudioError::InvalidChannel)?;
            ControlData::truncated(&[*mute as u8], limit)
        }
        (FeatureControl::Volume, ChannelSelector::Master) => {
            let v1 = controls.volume[0].to_le_bytes();
            let v2 = controls.volume[1].to_le_bytes();
            ControlData::truncated(&[0, 0, v1[0], v1[1], v2[0], v2[1]], limit)
        }
        (FeatureControl::Volume, channel) => {
            let idx = channel.index().ok_or(AudioError::InvalidChannel)?;
            let volume = controls.volume.get(idx).ok_or(AudioError::InvalidChannel)?;
            ControlData::truncated(&volume.to_le_bytes(), limit)
        }
    };
    Ok(data)
}

/// Applies a completed SET_CUR payload, returning the event to raise
fn apply_write(
    controls: &mut ChannelControls,
    staged: StagedWrite,
    data: &[u8],
) -> Result<Option<AudioEvents>, AudioError> {
    let (control, channel) = match staged {
        StagedWrite::Discard => return Ok(None),
        StagedWrite::Mute(channel) => (FeatureControl::Mute, channel),
        StagedWrite::Volume(channel) => (FeatureControl::Volume, channel),
    };

    if data.len() < payload_len(control, channel) {
        return Err(AudioError::InvalidLength);
    }

    match (control, channel) {
        (FeatureControl::Mute, ChannelSelector::Master) => {
            controls.mute[0] = data[1] != 0;
            controls.mute[1] = data[2] != 0;
        }
        (FeatureControl::Mute, channel) => {
            let idx = channel.index().ok_or(AudioError::InvalidChannel)?;
            let mute = controls.mute.get_mut(idx).ok_or(AudioError::InvalidChannel)?;
            *mute = data[0] != 0;
        }
        (FeatureControl::Volume, ChannelSelector::Master) => {
            controls.volume[0] = i16::from_le_bytes([data[2], data[3]]);
            controls.volume[1] = i16::from_le_bytes([data[4], data[5]]);
        }
        (FeatureControl::Volume, channel) => {
            let idx = channel.index().ok_or(AudioError::InvalidChannel)?;
            let volume = controls.volume.get_mut(idx).ok_or(AudioError::InvalidChannel)?;
            *volume = i16::from_le_bytes([data[0], data[1]]);
        }
    }

    Ok(Some(match control {
        FeatureControl::Mute => AudioEvents::MUTE,
        FeatureControl::Volume => AudioEvents::VOLUME,
    }))
}

impl AudioStream {
    /// Handles the SETUP stage of a feature unit request
    ///
    /// A new request always replaces whatever was staged before.
    pub fn feature_request(&self, req: &FeatureRequest) -> Result<ControlTransfer, AudioError> {
        use ClassRequest::*;
        use FeatureControl::*;

        let len = req.length as usize;

        let result = self.shared.lock(|s| {
            s.staged = None;
            match (req.request, req.control) {
                (SetMin | SetMax | SetRes, Volume) => {
                    s.staged = Some(StagedWrite::Discard);
                    Ok(ControlTransfer::Receive { len })
                }
                (GetMax, Volume) => Ok(ControlTransfer::Send(ControlData::words(VOLUME_MAX, len))),
                (GetMin, Volume) => Ok(ControlTransfer::Send(ControlData::words(VOLUME_MIN, len))),
                (GetRes, Volume) => Ok(ControlTransfer::Send(ControlData::words(VOLUME_RES, len))),
                (GetCur, _) => current_value(&s.controls, req).map(ControlTransfer::Send),
                (SetCur, control) => {
                    if len < payload_len(control, req.channel) {
                        return Err(AudioError::InvalidLength);
                    }
                    s.staged = Some(match control {
                        Mute => StagedWrite::Mute(req.channel),
                        Volume => StagedWrite::Volume(req.channel),
                    });
                    Ok(ControlTransfer::Receive { len })
                }
                _ => Err(AudioError::Unsupported),
            }
        });

        if let Err(err) = result {
            log::warn!("feature request {:?} rejected: {}", req, err);
        }
        result
    }

    /// Data stage of a staged SET request completed with `data`
    ///
    /// Consumes the staged write even when the payload is rejected.
    pub fn complete_control_write(&self, data: &[u8]) -> Result<(), AudioError> {
        let raised = self.shared.lock(|s| -> Result<Option<AudioEvents>, AudioError> {
            let staged = s.staged.take().ok_or(AudioError::NoPendingTransfer)?;
            apply_write(&mut s.controls, staged, data)
        })?;

        if let Some(flags) = raised {
            self.events().broadcast(flags);
        }
        Ok(())
    }
}

//! Feature Unit Controls
//!
//! UAC 1.0 class-specific requests for the feature unit (mute and volume).
//! Volumes are signed 8.8 fixed point in dB.

/// Audio class-specific request codes
pub mod request {
    /// Set Current
    pub const SET_CUR: u8 = 0x01;
    /// Set Minimum
    pub const SET_MIN: u8 = 0x02;
    /// Set Maximum
    pub const SET_MAX: u8 = 0x03;
    /// Set Resolution
    pub const SET_RES: u8 = 0x04;
    /// Get Current
    pub const GET_CUR: u8 = 0x81;
    /// Get Minimum
    pub const GET_MIN: u8 = 0x82;
    /// Get Maximum
    pub const GET_MAX: u8 = 0x83;
    /// Get Resolution
    pub const GET_RES: u8 = 0x84;
}

/// Channel number addressing every channel at once
pub const MASTER_CHANNEL: u8 = 0xFF;

/// One dB in 8.8 fixed point
pub const VOLUME_STEPS_PER_DB: i16 = 256;

/// Lowest volume the feature unit reports: -96 dB
pub const VOLUME_MIN: i16 = -96 * VOLUME_STEPS_PER_DB;

/// Highest volume the feature unit reports: 0 dB
pub const VOLUME_MAX: i16 = 0;

/// Volume step the feature unit reports: 0.5 dB
pub const VOLUME_RES: i16 = 128;

/// Class request, decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClassRequest {
    SetCur = request::SET_CUR,
    SetMin = request::SET_MIN,
    SetMax = request::SET_MAX,
    SetRes = request::SET_RES,
    GetCur = request::GET_CUR,
    GetMin = request::GET_MIN,
    GetMax = request::GET_MAX,
    GetRes = request::GET_RES,
}

impl ClassRequest {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            request::SET_CUR => Some(ClassRequest::SetCur),
            request::SET_MIN => Some(ClassRequest::SetMin),
            request::SET_MAX => Some(ClassRequest::SetMax),
            request::SET_RES => Some(ClassRequest::SetRes),
            request::GET_CUR => Some(ClassRequest::GetCur),
            request::GET_MIN => Some(ClassRequest::GetMin),
            request::GET_MAX => Some(ClassRequest::GetMax),
            request::GET_RES => Some(ClassRequest::GetRes),
            _ => None,
        }
    }

    /// Device-to-host request
    pub fn is_get(&self) -> bool {
        (*self as u8) & 0x80 != 0
    }
}

/// Feature unit control selector (high byte of wValue)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FeatureControl {
    Mute = 0x01,
    Volume = 0x02,
}

impl FeatureControl {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(FeatureControl::Mute),
            0x02 => Some(FeatureControl::Volume),
            _ => None,
        }
    }
}

/// Channel addressed by a feature unit request (low byte of wValue)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSelector {
    /// All channels (`0xFF`)
    Master,
    /// A single logical channel, numbered from 1
    Channel(u8),
}

impl ChannelSelector {
    /// Decodes a channel number, rejecting channels the unit does not have
    ///
    /// Channel 0 (the master control slot of the descriptor) is not
    /// addressable; channels `1..=channels` are.
    pub fn decode(raw: u8, channels: usize) -> Option<Self> {
        match raw {
            MASTER_CHANNEL => Some(ChannelSelector::Master),
            n if n >= 1 && (n as usize) <= channels => Some(ChannelSelector::Channel(n)),
            _ => None,
        }
    }

    /// Zero-based state index for a single channel
    pub fn index(&self) -> Option<usize> {
        match self {
            ChannelSelector::Master => None,
            ChannelSelector::Channel(n) => Some(*n as usize - 1),
        }
    }
}

/// Converts whole decibels to 8.8 fixed point
pub const fn db_to_8q8(db: i16) -> i16 {
    db * VOLUME_STEPS_PER_DB
}

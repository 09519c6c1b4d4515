//! SETUP request routing and descriptor lookup
//!
//! The bus layer handles the standard device requests itself and offers
//! everything else to [`AudioStream::requests_hook`]. An `Unsupported` error
//! means "not ours": the bus layer stalls the control pipe.

use isodac_uac::setup::standard_request;
use isodac_uac::{DescriptorType, Recipient, RequestKind, SetupPacket};

use crate::bridge::{ControlTransfer, FeatureRequest};
use crate::error::AudioError;
use crate::endpoint::EndpointDriver;
use crate::state::AudioStream;

/// Number of string descriptors, language table included
pub const STRING_COUNT: usize = 4;

/// Descriptor bytes supplied by the board
#[derive(Debug, Clone, Copy)]
pub struct DescriptorSet<'a> {
    pub device: &'a [u8],
    pub configuration: &'a [u8],
    /// Language IDs, manufacturer, product, serial number
    pub strings: [&'a [u8]; STRING_COUNT],
}

impl<'a> DescriptorSet<'a> {
    /// GET_DESCRIPTOR lookup; `None` stalls the request
    pub fn get(&self, dtype: u8, index: u8) -> Option<&'a [u8]> {
        match DescriptorType::from_u8(dtype)? {
            DescriptorType::Device => Some(self.device),
            DescriptorType::Configuration => Some(self.configuration),
            DescriptorType::String => self.strings.get(index as usize).copied(),
        }
    }
}

impl AudioStream {
    /// Handles a SETUP packet the bus layer did not handle itself
    pub fn requests_hook<D: EndpointDriver>(
        &self,
        usb: &mut D,
        setup: &SetupPacket,
    ) -> Result<ControlTransfer, AudioError> {
        match (setup.kind(), setup.recipient()) {
            (RequestKind::Standard, Recipient::Interface) => {
                if setup.request != standard_request::SET_INTERFACE {
                    return Err(AudioError::Unsupported);
                }
                self.set_interface(usb, setup.index, setup.value)?;
                Ok(ControlTransfer::Status)
            }
            (RequestKind::Class, Recipient::Interface) => {
                let config = self.config();
                if setup.index_low() != config.control_interface
                    || setup.index_high() != config.feature_unit_id
                {
                    return Err(AudioError::Unsupported);
                }
                let request = FeatureRequest::decode(
                    setup.request,
                    (setup.value >> 8) as u8,
                    (setup.value & 0xFF) as u8,
                    setup.length,
                    config.channels,
                )?;
                self.feature_request(&request)
            }
            _ => Err(AudioError::Unsupported),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AudioConfig;
    use crate::endpoint::EndpointConfig;
    use crate::state::ChannelControls;
    use isodac_uac::feature::request;

    #[derive(Default)]
    struct CountingUsb {
        armed: usize,
    }

    impl EndpointDriver for CountingUsb {
        fn init_endpoint(&mut self, _ep: u8, _config: &EndpointConfig) -> Result<(), AudioError> {
            Ok(())
        }

        fn start_receive(&mut self, _ep: u8, _max_len: usize) -> Result<(), AudioError> {
            self.armed += 1;
            Ok(())
        }

        fn start_transmit(&mut self, _ep: u8, _data: &[u8]) -> Result<(), AudioError> {
            self.armed += 1;
            Ok(())
        }
    }

    const DEVICE: [u8; 2] = [18, 1];
    const CONFIG: [u8; 2] = [9, 2];
    const LANG: [u8; 4] = [4, 3, 0x09, 0x04];

    fn descriptors() -> DescriptorSet<'static> {
        DescriptorSet {
            device: &DEVICE,
            configuration: &CONFIG,
            strings: [&LANG, b"\x04\x03M\x00", b"\x04\x03P\x00", b"\x04\x03S\x00"],
        }
    }

    #[test]
    fn test_descriptor_lookup() {
        let set = descriptors();
        assert_eq!(set.get(1, 0), Some(&DEVICE[..]));
        assert_eq!(set.get(2, 0), Some(&CONFIG[..]));
        assert_eq!(set.get(3, 0), Some(&LANG[..]));
        assert_eq!(set.get(3, 3), Some(&b"\x04\x03S\x00"[..]));
        assert_eq!(set.get(3, 4), None);
        assert_eq!(set.get(6, 0), None);
    }

    #[test]
    fn test_set_interface_routed() {
        let stream = AudioStream::new(AudioConfig::default()).expect("default config");
        let mut usb = CountingUsb::default();

        let start = SetupPacket::set_interface(1, 1);
        assert_eq!(stream.requests_hook(&mut usb, &start), Ok(ControlTransfer::Status));
        assert!(stream.is_playing());
        assert_eq!(usb.armed, 2);

        let stop = SetupPacket::set_interface(1, 0);
        assert_eq!(stream.requests_hook(&mut usb, &stop), Ok(ControlTransfer::Status));
        assert!(!stream.is_playing());

        let other = SetupPacket::set_interface(0, 1);
        assert_eq!(stream.requests_hook(&mut usb, &other), Err(AudioError::Unsupported));
    }

    #[test]
    fn test_set_interface_compares_full_fields() {
        let stream = AudioStream::new(AudioConfig::default()).expect("default config");
        let mut usb = CountingUsb::default();

        // wIndex 0x0101 is not interface 1
        let high_index = SetupPacket::new(0x01, standard_request::SET_INTERFACE, 1, 0x0101, 0);
        assert_eq!(stream.requests_hook(&mut usb, &high_index), Err(AudioError::Unsupported));
        assert!(!stream.is_playing());

        stream
            .requests_hook(&mut usb, &SetupPacket::set_interface(1, 1))
            .expect("started");

        // wValue 0x0101 is not alternate setting 1
        let high_value = SetupPacket::new(0x01, standard_request::SET_INTERFACE, 0x0101, 1, 0);
        assert_eq!(stream.requests_hook(&mut usb, &high_value), Ok(ControlTransfer::Status));
        assert!(!stream.is_playing());
    }

    #[test]
    fn test_feature_unit_routed() {
        let stream = AudioStream::new(AudioConfig::default()).expect("default config");
        let mut usb = CountingUsb::default();

        let set_mute = SetupPacket::class_interface(request::SET_CUR, 0x01, 1, 0, 2, 1);
        assert_eq!(
            stream.requests_hook(&mut usb, &set_mute),
            Ok(ControlTransfer::Receive { len: 1 })
        );
        stream.complete_control_write(&[1]).expect("applied");
        assert_eq!(
            stream.controls(),
            ChannelControls {
                mute: [true, false],
                volume: [0, 0],
            }
        );
    }

    #[test]
    fn test_foreign_requests_unsupported() {
        let stream = AudioStream::new(AudioConfig::default()).expect("default config");
        let mut usb = CountingUsb::default();

        // Wrong entity, wrong interface
        for setup in [
            SetupPacket::class_interface(request::GET_CUR, 0x01, 1, 0, 3, 1),
            SetupPacket::class_interface(request::GET_CUR, 0x01, 1, 1, 2, 1),
        ] {
            assert_eq!(stream.requests_hook(&mut usb, &setup), Err(AudioError::Unsupported));
        }

        // Class request to an endpoint, vendor request, GET_INTERFACE
        for setup in [
            SetupPacket::new(0x22, request::SET_CUR, 0x0100, 0x0001, 3),
            SetupPacket::new(0x41, 0x01, 0, 0, 0),
            SetupPacket::new(0x81, standard_request::GET_INTERFACE, 0, 1, 1),
        ] {
            assert_eq!(stream.requests_hook(&mut usb, &setup), Err(AudioError::Unsupported));
        }
        assert_eq!(usb.armed, 0);
    }
}

//! SETUP Packet Decoding
//!
//! The 8-byte SETUP stage of a control transfer, as defined in chapter 9 of
//! the USB 2.0 specification.

/// Standard request codes
pub mod standard_request {
    /// GET_INTERFACE
    pub const GET_INTERFACE: u8 = 0x0A;
    /// SET_INTERFACE
    pub const SET_INTERFACE: u8 = 0x0B;
}

/// Data stage direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Host to device
    Out,
    /// Device to host
    In,
}

/// Request type field (bmRequestType bits 6..5)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Standard,
    Class,
    Vendor,
    Reserved,
}

/// Request recipient (bmRequestType bits 4..0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Device,
    Interface,
    Endpoint,
    Other,
    Reserved(u8),
}

/// USB SETUP packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupPacket {
    /// Request type (direction, type, recipient)
    pub request_type: u8,
    /// Request code
    pub request: u8,
    /// Value
    pub value: u16,
    /// Index
    pub index: u16,
    /// Length of data stage
    pub length: u16,
}

impl SetupPacket {
    /// Size of a SETUP packet on the wire
    pub const SIZE: usize = 8;

    /// Create a new setup packet
    pub const fn new(request_type: u8, request: u8, value: u16, index: u16, length: u16) -> Self {
        Self {
            request_type,
            request,
            value,
            index,
            length,
        }
    }

    /// Parse from raw bytes
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }

        Some(Self {
            request_type: data[0],
            request: data[1],
            value: u16::from_le_bytes([data[2], data[3]]),
            index: u16::from_le_bytes([data[4], data[5]]),
            length: u16::from_le_bytes([data[6], data[7]]),
        })
    }

    /// Serialize to the wire layout
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let value = self.value.to_le_bytes();
        let index = self.index.to_le_bytes();
        let length = self.length.to_le_bytes();
        [
            self.request_type,
            self.request,
            value[0],
            value[1],
            index[0],
            index[1],
            length[0],
            length[1],
        ]
    }

    /// Data stage direction
    pub fn direction(&self) -> Direction {
        if self.request_type & 0x80 != 0 {
            Direction::In
        } else {
            Direction::Out
        }
    }

    /// Standard, class or vendor request
    pub fn kind(&self) -> RequestKind {
        match (self.request_type >> 5) & 0x03 {
            0 => RequestKind::Standard,
            1 => RequestKind::Class,
            2 => RequestKind::Vendor,
            _ => RequestKind::Reserved,
        }
    }

    /// Addressed recipient
    pub fn recipient(&self) -> Recipient {
        match self.request_type & 0x1F {
            0 => Recipient::Device,
            1 => Recipient::Interface,
            2 => Recipient::Endpoint,
            3 => Recipient::Other,
            other => Recipient::Reserved(other),
        }
    }

    /// Low byte of wIndex: interface (or endpoint) number
    pub fn index_low(&self) -> u8 {
        (self.index & 0xFF) as u8
    }

    /// High byte of wIndex: entity ID for class requests
    pub fn index_high(&self) -> u8 {
        (self.index >> 8) as u8
    }

    /// SET_INTERFACE request
    pub fn set_interface(interface: u8, alternate: u8) -> Self {
        Self::new(
            0x01, // Host to device, standard, interface
            standard_request::SET_INTERFACE,
            alternate as u16,
            interface as u16,
            0,
        )
    }

    /// Audio class request addressed to an entity of an interface
    ///
    /// `wValue` carries the control selector in its high byte and the channel
    /// number in its low byte; `wIndex` carries the entity ID in its high byte
    /// and the interface in its low byte.
    pub fn class_interface(
        request: u8,
        control: u8,
        channel: u8,
        interface: u8,
        entity: u8,
        length: u16,
    ) -> Self {
        let request_type = if request & 0x80 != 0 {
            0xA1 // Device-to-host, class, interface
        } else {
            0x21 // Host-to-device, class, interface
        };

        Self::new(
            request_type,
            request,
            ((control as u16) << 8) | (channel as u16),
            ((entity as u16) << 8) | (interface as u16),
            length,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_interface() {
        let raw = [0x01, 0x0B, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00];
        let setup = SetupPacket::from_bytes(&raw).expect("8 bytes");

        assert_eq!(setup, SetupPacket::set_interface(1, 1));
        assert_eq!(setup.kind(), RequestKind::Standard);
        assert_eq!(setup.recipient(), Recipient::Interface);
        assert_eq!(setup.direction(), Direction::Out);
    }

    #[test]
    fn test_class_request_fields() {
        // GET_CUR volume, master channel, interface 0, feature unit 2
        let setup = SetupPacket::class_interface(0x81, 0x02, 0xFF, 0, 2, 6);
        let raw = setup.to_bytes();

        assert_eq!(raw, [0xA1, 0x81, 0xFF, 0x02, 0x00, 0x02, 0x06, 0x00]);
        assert_eq!(setup.kind(), RequestKind::Class);
        assert_eq!(setup.direction(), Direction::In);
        assert_eq!(setup.index_low(), 0);
        assert_eq!(setup.index_high(), 2);
    }

    #[test]
    fn test_short_packet_rejected() {
        assert!(SetupPacket::from_bytes(&[0x01, 0x0B, 0x01]).is_none());
    }

    #[test]
    fn test_reserved_recipient() {
        let setup = SetupPacket::new(0x3F, 0, 0, 0, 0);
        assert_eq!(setup.kind(), RequestKind::Class);
        assert_eq!(setup.recipient(), Recipient::Reserved(0x1F));
    }
}

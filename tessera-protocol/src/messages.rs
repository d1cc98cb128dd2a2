//! Message types carried in UART frames
//!
//! The frame layer only validates framing; what a `msg_type` means is
//! decided here. Types the peer does not know are still valid frames.

use crate::frame::{Frame, FrameError, FrameHeader};

// Message type IDs
pub const MSG_HEARTBEAT: u8 = 0x01;
pub const MSG_DATA: u8 = 0x02;
pub const MSG_ACK: u8 = 0x03;
pub const MSG_STATUS: u8 = 0x04;

/// Device status codes carried by [`Message::Status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusCode {
    /// Device is running normally
    Ok,
    /// Device is busy
    Busy,
    /// Device reports a fault
    Fault,
}

const STATUS_OK: u8 = 0x00;
const STATUS_BUSY: u8 = 0x01;
const STATUS_FAULT: u8 = 0x02;

impl StatusCode {
    /// Parse a status from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            STATUS_OK => Some(StatusCode::Ok),
            STATUS_BUSY => Some(StatusCode::Busy),
            STATUS_FAULT => Some(StatusCode::Fault),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            StatusCode::Ok => STATUS_OK,
            StatusCode::Busy => STATUS_BUSY,
            StatusCode::Fault => STATUS_FAULT,
        }
    }
}

/// Messages understood by Tessera endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message<'a> {
    /// Keep-alive, no payload
    Heartbeat,
    /// Opaque application data
    Data(&'a [u8]),
    /// Acknowledges the frame with the given `msg_id`
    Ack { msg_id: u8 },
    /// Device status report
    Status(StatusCode),
    /// Valid frame with a type this side does not handle
    Unknown { msg_type: u8, payload: &'a [u8] },
}

impl<'a> Message<'a> {
    /// Interpret a frame
    ///
    /// Only a known type with a malformed payload is an error; unknown
    /// types come back as [`Message::Unknown`].
    pub fn from_frame(frame: &'a Frame) -> Result<Self, FrameError> {
        let payload = &frame.payload[..];
        match frame.msg_type {
            MSG_HEARTBEAT => Ok(Message::Heartbeat),
            MSG_DATA => Ok(Message::Data(payload)),
            MSG_ACK => match payload {
                [msg_id] => Ok(Message::Ack { msg_id: *msg_id }),
                _ => Err(FrameError::InvalidPayload),
            },
            MSG_STATUS => payload
                .first()
                .and_then(|b| StatusCode::from_byte(*b))
                .map(Message::Status)
                .ok_or(FrameError::InvalidPayload),
            msg_type => Ok(Message::Unknown { msg_type, payload }),
        }
    }

    /// Message type byte for this message
    pub fn msg_type(&self) -> u8 {
        match self {
            Message::Heartbeat => MSG_HEARTBEAT,
            Message::Data(_) => MSG_DATA,
            Message::Ack { .. } => MSG_ACK,
            Message::Status(_) => MSG_STATUS,
            Message::Unknown { msg_type, .. } => *msg_type,
        }
    }

    /// Encode this message into a frame with the given header
    pub fn to_frame(&self, header: FrameHeader) -> Result<Frame, FrameError> {
        match self {
            Message::Heartbeat => Ok(Frame::empty(header, MSG_HEARTBEAT)),
            Message::Data(data) => Frame::new(header, MSG_DATA, data),
            Message::Ack { msg_id } => Frame::new(header, MSG_ACK, &[*msg_id]),
            Message::Status(code) => Frame::new(header, MSG_STATUS, &[code.to_byte()]),
            Message::Unknown { msg_type, payload } => Frame::new(header, *msg_type, payload),
        }
    }
}

/// Builds outgoing frames with a fixed device identity
///
/// Every frame gets the next `msg_id`, wrapping at 255.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    template: FrameHeader,
    next_id: u8,
}

impl FrameBuilder {
    /// Create a builder stamping the given device type and versions
    pub fn new(device_type: u8, frame_ver: u8, device_ver: u8) -> Self {
        Self {
            template: FrameHeader {
                device_type,
                frame_ver,
                device_ver,
                ..FrameHeader::default()
            },
            next_id: 0,
        }
    }

    /// Start numbering at `msg_id` instead of zero
    pub fn starting_at(mut self, msg_id: u8) -> Self {
        self.next_id = msg_id;
        self
    }

    /// `msg_id` the next frame will carry
    pub fn next_id(&self) -> u8 {
        self.next_id
    }

    fn next_header(&mut self) -> FrameHeader {
        let header = FrameHeader {
            msg_id: self.next_id,
            ..self.template
        };
        self.next_id = self.next_id.wrapping_add(1);
        header
    }

    /// Build a frame for `message`
    pub fn build(&mut self, message: &Message<'_>) -> Result<Frame, FrameError> {
        let header = self.next_header();
        message.to_frame(header)
    }

    /// Build a frame with an arbitrary message type
    pub fn build_raw(&mut self, msg_type: u8, payload: &[u8]) -> Result<Frame, FrameError> {
        let header = self.next_header();
        Frame::new(header, msg_type, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_frame() {
        let frame = Message::Heartbeat.to_frame(FrameHeader::default()).unwrap();
        assert_eq!(frame.msg_type, MSG_HEARTBEAT);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_data_roundtrip() {
        let frame = Message::Data(b"hello")
            .to_frame(FrameHeader::default())
            .unwrap();
        assert_eq!(Message::from_frame(&frame), Ok(Message::Data(b"hello")));
    }

    #[test]
    fn test_ack_requires_one_byte() {
        let frame = Frame::new(FrameHeader::default(), MSG_ACK, &[7, 8]).unwrap();
        assert_eq!(Message::from_frame(&frame), Err(FrameError::InvalidPayload));

        let frame = Frame::new(FrameHeader::default(), MSG_ACK, &[7]).unwrap();
        assert_eq!(Message::from_frame(&frame), Ok(Message::Ack { msg_id: 7 }));
    }

    #[test]
    fn test_status_parse() {
        let frame = Frame::new(FrameHeader::default(), MSG_STATUS, &[STATUS_BUSY]).unwrap();
        assert_eq!(
            Message::from_frame(&frame),
            Ok(Message::Status(StatusCode::Busy))
        );

        let bad = Frame::new(FrameHeader::default(), MSG_STATUS, &[0x7F]).unwrap();
        assert!(Message::from_frame(&bad).is_err());
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        let frame = Frame::new(FrameHeader::default(), 0x42, &[1, 2]).unwrap();
        let msg = Message::from_frame(&frame).unwrap();
        assert_eq!(msg.msg_type(), 0x42);
        assert!(matches!(msg, Message::Unknown { payload: [1, 2], .. }));
    }

    #[test]
    fn test_builder_increments_msg_id() {
        let mut builder = FrameBuilder::new(0x01, 0x02, 0x03);
        let first = builder.build(&Message::Heartbeat).unwrap();
        let second = builder.build_raw(MSG_DATA, b"x").unwrap();

        assert_eq!(first.header.msg_id, 0);
        assert_eq!(second.header.msg_id, 1);
        assert_eq!(second.header.device_type, 0x01);
        assert_eq!(second.header.frame_ver, 0x02);
        assert_eq!(second.header.device_ver, 0x03);
        assert_eq!(builder.next_id(), 2);
    }

    #[test]
    fn test_builder_starting_at() {
        let mut builder = FrameBuilder::new(0, 0, 0).starting_at(0xFF);
        assert_eq!(builder.build(&Message::Heartbeat).unwrap().header.msg_id, 0xFF);
        assert_eq!(builder.next_id(), 0);
    }

    #[test]
    fn test_builder_msg_id_wraps() {
        let mut builder = FrameBuilder::new(0, 0, 0);
        for _ in 0..256 {
            builder.build(&Message::Heartbeat).unwrap();
        }
        assert_eq!(builder.next_id(), 0);
    }
}

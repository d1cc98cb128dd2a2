//! Frame encoding and decoding for the Tessera UART protocol.
//!
//! Frame format:
//! - HEAD (1 byte): 0xAA synchronization byte
//! - LEN (1 byte): bytes from HEAD through the last payload byte, at least 10
//! - DEVICE_TYPE (1 byte): machine/device type code
//! - FRAME_CRC (1 byte): carried through untouched, never validated
//! - RESERVE (2 bytes)
//! - MSG_ID (1 byte), FRAME_VER (1 byte), DEVICE_VER (1 byte)
//! - MSG_TYPE (1 byte): dispatch selector
//! - PAYLOAD (LEN - 10 bytes)
//! - CRC (1 byte): two's-complement negation of the byte sum of LEN..=PAYLOAD

use heapless::Vec;

/// Frame synchronization byte
pub const FRAME_HEAD: u8 = 0xAA;

/// Bytes from HEAD through MSG_TYPE
pub const HEADER_LEN: usize = 10;

/// Smallest LEN value a decoder accepts (a frame with no payload)
pub const MIN_FRAME_LEN: u8 = HEADER_LEN as u8;

/// Maximum payload size in bytes (LEN is a single byte)
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize - HEADER_LEN;

/// Maximum complete frame size (header + payload + CRC)
pub const MAX_FRAME_SIZE: usize = HEADER_LEN + MAX_PAYLOAD_SIZE + 1;

/// Errors that can occur during frame decoding or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// LEN byte below the 10-byte header
    LengthTooShort,
    /// Trailing CRC does not match the computed checksum
    InvalidChecksum,
    /// Buffer too small for encoding
    BufferTooSmall,
    /// Payload does not fit the message type
    InvalidPayload,
}

/// Compute the frame checksum over `bytes`
///
/// Sums every byte (wrapping), then negates: `!sum + 1`.
pub fn checksum(bytes: &[u8]) -> u8 {
    negate(bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)))
}

fn negate(sum: u8) -> u8 {
    (!sum).wrapping_add(1)
}

/// Fixed header fields between LEN and MSG_TYPE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameHeader {
    /// Machine/device type code
    pub device_type: u8,
    /// Per-frame CRC field; kept as received, not checked
    pub frame_crc: u8,
    /// Reserved bytes
    pub reserve: [u8; 2],
    /// Message identifier
    pub msg_id: u8,
    /// Protocol version
    pub frame_ver: u8,
    /// Device version
    pub device_ver: u8,
}

/// A decoded or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Header fields
    pub header: FrameHeader,
    /// Message type identifier
    pub msg_type: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given header, message type and payload
    pub fn new(header: FrameHeader, msg_type: u8, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }

        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            header,
            msg_type,
            payload: payload_vec,
        })
    }

    /// Create a frame with no payload
    pub fn empty(header: FrameHeader, msg_type: u8) -> Self {
        Self {
            header,
            msg_type,
            payload: Vec::new(),
        }
    }

    /// Value of the LEN byte for this frame
    pub fn len_field(&self) -> u8 {
        (HEADER_LEN + self.payload.len()) as u8
    }

    /// Number of bytes this frame occupies on the wire
    pub fn wire_len(&self) -> usize {
        HEADER_LEN + self.payload.len() + 1
    }

    fn header_bytes(&self) -> [u8; HEADER_LEN] {
        let h = &self.header;
        [
            FRAME_HEAD,
            self.len_field(),
            h.device_type,
            h.frame_crc,
            h.reserve[0],
            h.reserve[1],
            h.msg_id,
            h.frame_ver,
            h.device_ver,
            self.msg_type,
        ]
    }

    /// Checksum this frame carries in its trailing CRC byte
    pub fn checksum(&self) -> u8 {
        let header = self.header_bytes();
        let sum = header[1..]
            .iter()
            .chain(self.payload.iter())
            .fold(0u8, |acc, &b| acc.wrapping_add(b));
        negate(sum)
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.wire_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let end = HEADER_LEN + self.payload.len();
        buffer[..HEADER_LEN].copy_from_slice(&self.header_bytes());
        buffer[HEADER_LEN..end].copy_from_slice(&self.payload);
        buffer[end] = checksum(&buffer[1..end]);

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }
}

/// Receives every frame that passes validation
pub trait FrameHandler {
    /// Handle one validated frame
    fn handle(&mut self, frame: &Frame);
}

impl<F: FnMut(&Frame)> FrameHandler for F {
    fn handle(&mut self, frame: &Frame) {
        self(frame)
    }
}

/// Decoder position within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeState {
    /// Scanning for the HEAD byte
    Header,
    /// Got HEAD, waiting for LEN
    Len,
    /// Waiting for DEVICE_TYPE
    DeviceType,
    /// Waiting for FRAME_CRC
    FrameCrc,
    /// Waiting for first reserved byte
    Reserve1,
    /// Waiting for second reserved byte
    Reserve2,
    /// Waiting for MSG_ID
    MsgId,
    /// Waiting for FRAME_VER
    FrameVersion,
    /// Waiting for DEVICE_VER
    DeviceVersion,
    /// Waiting for MSG_TYPE
    MsgType,
    /// Reading payload bytes
    Text,
    /// Waiting for trailing CRC
    MsgCrc,
}

/// Outcome counters for one [`FrameDecoder::decode`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodeReport {
    /// Frames validated and handed to the handler
    pub frames: usize,
    /// Frames dropped because LEN was below the header size
    pub short_length: usize,
    /// Frames dropped on checksum mismatch
    pub bad_checksum: usize,
}

impl DecodeReport {
    /// Total frames dropped
    pub fn errors(&self) -> usize {
        self.short_length + self.bad_checksum
    }

    /// Add another report's counters into this one
    pub fn merge(&mut self, other: DecodeReport) {
        self.frames += other.frames;
        self.short_length += other.short_length;
        self.bad_checksum += other.bad_checksum;
    }
}

/// Incremental frame decoder
///
/// Each decoder owns its assembly state, so one decoder per byte stream
/// lets any number of streams be decoded side by side. Partial frames
/// carry over between calls.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: DecodeState,
    header: FrameHeader,
    msg_type: u8,
    payload_len: usize,
    payload: Vec<u8, MAX_PAYLOAD_SIZE>,
    sum: u8,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a new frame decoder
    pub fn new() -> Self {
        Self {
            state: DecodeState::Header,
            header: FrameHeader::default(),
            msg_type: 0,
            payload_len: 0,
            payload: Vec::new(),
            sum: 0,
        }
    }

    /// Current decoder state
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Drop any partial frame and go back to scanning for HEAD
    pub fn reset(&mut self) {
        self.state = DecodeState::Header;
        self.header = FrameHeader::default();
        self.msg_type = 0;
        self.payload_len = 0;
        self.payload.clear();
        self.sum = 0;
    }

    fn advance(&mut self, byte: u8, next: DecodeState) {
        self.sum = self.sum.wrapping_add(byte);
        self.state = next;
    }

    /// Feed a single byte to the decoder
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is decoded,
    /// `Ok(None)` when more bytes are needed, or `Err` when the frame in
    /// progress was dropped. The decoder is ready for the next frame
    /// after an error.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        use DecodeState::*;

        match self.state {
            Header => {
                // Anything but HEAD is line noise
                if byte == FRAME_HEAD {
                    self.reset();
                    self.state = Len;
                }
            }
            Len => {
                if byte < MIN_FRAME_LEN {
                    self.reset();
                    return Err(FrameError::LengthTooShort);
                }
                self.payload_len = usize::from(byte) - HEADER_LEN;
                self.advance(byte, DeviceType);
            }
            DeviceType => {
                self.header.device_type = byte;
                self.advance(byte, FrameCrc);
            }
            FrameCrc => {
                self.header.frame_crc = byte;
                self.advance(byte, Reserve1);
            }
            Reserve1 => {
                self.header.reserve[0] = byte;
                self.advance(byte, Reserve2);
            }
            Reserve2 => {
                self.header.reserve[1] = byte;
                self.advance(byte, MsgId);
            }
            MsgId => {
                self.header.msg_id = byte;
                self.advance(byte, FrameVersion);
            }
            FrameVersion => {
                self.header.frame_ver = byte;
                self.advance(byte, DeviceVersion);
            }
            DeviceVersion => {
                self.header.device_ver = byte;
                self.advance(byte, MsgType);
            }
            MsgType => {
                self.msg_type = byte;
                let next = if self.payload_len == 0 { MsgCrc } else { Text };
                self.advance(byte, next);
            }
            Text => {
                // Capacity covers every payload length LEN can express
                let _ = self.payload.push(byte);
                let next = if self.payload.len() == self.payload_len {
                    MsgCrc
                } else {
                    Text
                };
                self.advance(byte, next);
            }
            MsgCrc => return self.complete(byte),
        }

        Ok(None)
    }

    fn complete(&mut self, crc: u8) -> Result<Option<Frame>, FrameError> {
        if crc != negate(self.sum) {
            self.reset();
            return Err(FrameError::InvalidChecksum);
        }

        let frame = Frame {
            header: self.header,
            msg_type: self.msg_type,
            payload: core::mem::take(&mut self.payload),
        };

        self.reset();
        Ok(Some(frame))
    }

    /// Decode a chunk of bytes, handing every valid frame to `handler`
    ///
    /// The whole chunk is consumed. Dropped frames are only counted.
    pub fn decode<H: FrameHandler + ?Sized>(
        &mut self,
        bytes: &[u8],
        handler: &mut H,
    ) -> DecodeReport {
        let mut report = DecodeReport::default();

        for &byte in bytes {
            match self.feed(byte) {
                Ok(Some(frame)) => {
                    report.frames += 1;
                    handler.handle(&frame);
                }
                Ok(None) => {}
                Err(FrameError::LengthTooShort) => report.short_length += 1,
                Err(_) => report.bad_checksum += 1,
            }
        }

        report
    }
}

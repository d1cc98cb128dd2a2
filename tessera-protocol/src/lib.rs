//! Tessera wire formats
//!
//! This crate holds the byte-level codecs shared by the Tessera tools:
//! the UART frame format spoken by serial peripherals, the ICMP echo
//! packets used by `ping`, and a base64 codec. Everything works on
//! caller-provided buffers so the same code can run on a microcontroller
//! peer.
//!
//! # UART Frame Overview
//!
//! ```text
//! ┌──────┬─────┬─────────┬─────────┬─────────┬────────┬───────────┬────────────┬──────────┬─────────┬─────┐
//! │ HEAD │ LEN │ DEV TYP │ FRM CRC │ RESERVE │ MSG ID │ FRAME VER │ DEVICE VER │ MSG TYPE │ PAYLOAD │ CRC │
//! │ 1B   │ 1B  │ 1B      │ 1B      │ 2B      │ 1B     │ 1B        │ 1B         │ 1B       │ LEN-10  │ 1B  │
//! └──────┴─────┴─────────┴─────────┴─────────┴────────┴───────────┴────────────┴──────────┴─────────┴─────┘
//! ```
//!
//! Frames are assembled incrementally by a [`FrameDecoder`]; each byte
//! stream gets its own decoder.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod base64;
pub mod frame;
pub mod icmp;
pub mod messages;

pub use base64::Base64Error;
pub use frame::{
    checksum, DecodeReport, DecodeState, Frame, FrameDecoder, FrameError, FrameHandler,
    FrameHeader, FRAME_HEAD, HEADER_LEN, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE, MIN_FRAME_LEN,
};
pub use icmp::{EchoReply, EchoRequest, IcmpError};
pub use messages::{FrameBuilder, Message, StatusCode};

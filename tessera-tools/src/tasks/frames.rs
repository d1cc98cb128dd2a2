//! Offline frame decoding and encoding
//!
//! `tessera decode` and `tessera encode` work on hex text so frames can
//! be inspected without a serial port.

use anyhow::{Context, Result};
use tessera_core::config::FrameSettings;
use tessera_core::Logger;
use tessera_protocol::{DecodeReport, Frame, FrameBuilder, FrameDecoder, Message};

use crate::hexstr;

/// One-line summary of a frame
pub fn describe(frame: &Frame) -> String {
    let h = &frame.header;
    let body = match Message::from_frame(frame) {
        Ok(Message::Heartbeat) => "heartbeat".to_string(),
        Ok(Message::Data(data)) => format!("data [{}]", hexstr::format(data)),
        Ok(Message::Ack { msg_id }) => format!("ack of {}", msg_id),
        Ok(Message::Status(code)) => format!("status {:?}", code),
        Ok(Message::Unknown { msg_type, payload }) => {
            format!("type {:#04x} [{}]", msg_type, hexstr::format(payload))
        }
        Err(e) => format!("type {:#04x} malformed ({:?})", frame.msg_type, e),
    };
    format!(
        "id={} dev={} ver={}/{} {}",
        h.msg_id, h.device_type, h.frame_ver, h.device_ver, body
    )
}

/// Decode every frame in `bytes`
pub fn decode_bytes(bytes: &[u8]) -> (Vec<Frame>, DecodeReport) {
    let mut frames = Vec::new();
    let report = FrameDecoder::new().decode(bytes, &mut |frame: &Frame| frames.push(frame.clone()));
    (frames, report)
}

/// `tessera decode <hex>`
pub fn decode(text: &str, logger: &Logger) -> Result<DecodeReport> {
    let bytes = hexstr::parse(text).context("parsing hex input")?;
    logger.debug(format_args!("decoding {} bytes", bytes.len()));

    let (frames, report) = decode_bytes(&bytes);
    for frame in &frames {
        println!("{}", describe(frame));
    }

    logger.info(format_args!(
        "{} frame(s), {} short length, {} bad checksum",
        report.frames, report.short_length, report.bad_checksum
    ));
    Ok(report)
}

/// Build a frame stamped with the configured identity
pub fn build(settings: &FrameSettings, msg_id: u8, msg_type: u8, payload: &[u8]) -> Result<Frame> {
    FrameBuilder::new(settings.device_type, settings.frame_ver, settings.device_ver)
        .starting_at(msg_id)
        .build_raw(msg_type, payload)
        .map_err(|e| anyhow::anyhow!("cannot build frame: {:?}", e))
}

/// `tessera encode`
pub fn encode(settings: &FrameSettings, msg_id: u8, msg_type: u8, payload: &[u8]) -> Result<()> {
    let frame = build(settings, msg_id, msg_type, payload)?;
    let bytes = frame
        .encode_to_vec()
        .map_err(|e| anyhow::anyhow!("cannot encode frame: {:?}", e))?;
    println!("{}", hexstr::format(&bytes));
    Ok(())
}

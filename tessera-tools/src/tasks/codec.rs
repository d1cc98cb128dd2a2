//! Base64 encode/decode of command-line text

use anyhow::{anyhow, Result};
use tessera_protocol::base64;

/// Encode `input` as base64 text
pub fn encode(input: &[u8]) -> Result<String> {
    let mut out = vec![0u8; base64::encoded_len(input.len())];
    let n = base64::encode(input, &mut out)
        .map_err(|e| anyhow!("base64 encode failed: {:?}", e))?;
    out.truncate(n);
    Ok(String::from_utf8(out)?)
}

/// Decode base64 text; surrounding whitespace is ignored
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let mut out = vec![0u8; base64::decoded_len_max(text.len())];
    let n = base64::decode(text.as_bytes(), &mut out)
        .map_err(|e| anyhow!("invalid base64: {:?}", e))?;
    out.truncate(n);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_text() {
        assert_eq!(encode(b"tessera").unwrap(), "dGVzc2VyYQ==");
        assert_eq!(decode(" dGVzc2VyYQ==\n").unwrap(), b"tessera");
    }

    #[test]
    fn test_decode_reports_position() {
        let err = decode("dGV*").unwrap_err();
        assert!(err.to_string().contains("InvalidByte(3)"));
    }
}

//! Hex text helpers for frame input and output

use anyhow::{Context, Result};

/// Parse hex bytes, ignoring whitespace, `:` and `,` separators
///
/// Accepts `"AA 0B 01"`, `"aa0b01"` and `"0xAA,0x0B"`. Each token is
/// decoded on its own, so every token needs an even number of digits.
pub fn parse(text: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for token in text
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .filter(|token| !token.is_empty())
    {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        let decoded = hex::decode(digits).with_context(|| format!("bad hex token {:?}", token))?;
        bytes.extend_from_slice(&decoded);
    }
    Ok(bytes)
}

/// Format bytes as space-separated uppercase hex
pub fn format(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode_upper([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_separators() {
        assert_eq!(parse("AA 0B 01").unwrap(), [0xAA, 0x0B, 0x01]);
        assert_eq!(parse("aa0b01").unwrap(), [0xAA, 0x0B, 0x01]);
        assert_eq!(parse("0xAA,0x0b").unwrap(), [0xAA, 0x0B]);
        assert_eq!(parse("AA:0B, 01\n").unwrap(), [0xAA, 0x0B, 0x01]);
        assert_eq!(parse("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("ABC").is_err());
        assert!(parse("ZZ").is_err());
    }

    #[test]
    fn test_single_digit_tokens_rejected() {
        // Nibbles from separate tokens never pair up into one byte
        assert!(parse("0x1, 0x2").is_err());
        assert!(parse("1 2 3 4").is_err());
        assert_eq!(parse("0x01, 0x02").unwrap(), [0x01, 0x02]);
    }

    #[test]
    fn test_prefix_stripped_once() {
        assert!(parse("0x0xAA").is_err());
        assert!(parse("0X0XAA").is_err());
        assert_eq!(parse("0XAA").unwrap(), [0xAA]);
    }

    #[test]
    fn test_format() {
        assert_eq!(format(&[0xAA, 0x0B, 0x41]), "AA 0B 41");
        assert_eq!(format(&[]), "");
    }
}

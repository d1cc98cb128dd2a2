//! Base64 (RFC 4648, standard alphabet, `=` padding)
//!
//! Slice-in, slice-out so it works without an allocator.

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const PAD: u8 = b'=';

/// Errors from base64 encoding or decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Base64Error {
    /// Output buffer cannot hold the result
    BufferTooSmall,
    /// Byte at this position is not in the alphabet
    InvalidByte(usize),
    /// Input length is not a multiple of four
    InvalidLength,
    /// Padding in the wrong place
    InvalidPadding,
}

/// Length of the encoded form of `input_len` bytes
pub const fn encoded_len(input_len: usize) -> usize {
    input_len.div_ceil(3) * 4
}

/// Upper bound on the decoded length of `input_len` encoded bytes
pub const fn decoded_len_max(input_len: usize) -> usize {
    input_len / 4 * 3
}

/// Encode `input` into `out`
///
/// Returns the number of bytes written
pub fn encode(input: &[u8], out: &mut [u8]) -> Result<usize, Base64Error> {
    let needed = encoded_len(input.len());
    if out.len() < needed {
        return Err(Base64Error::BufferTooSmall);
    }

    for (chunk, dst) in input.chunks(3).zip(out.chunks_mut(4)) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);
        let n = (u32::from(b0) << 16) | (u32::from(b1) << 8) | u32::from(b2);

        dst[0] = ALPHABET[(n >> 18) as usize & 0x3F];
        dst[1] = ALPHABET[(n >> 12) as usize & 0x3F];
        dst[2] = if chunk.len() > 1 {
            ALPHABET[(n >> 6) as usize & 0x3F]
        } else {
            PAD
        };
        dst[3] = if chunk.len() > 2 {
            ALPHABET[n as usize & 0x3F]
        } else {
            PAD
        };
    }

    Ok(needed)
}

fn sextet(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Decode `input` into `out`
///
/// Returns the number of bytes written
pub fn decode(input: &[u8], out: &mut [u8]) -> Result<usize, Base64Error> {
    if input.len() % 4 != 0 {
        return Err(Base64Error::InvalidLength);
    }
    if input.is_empty() {
        return Ok(0);
    }

    let pad = input.iter().rev().take_while(|&&b| b == PAD).count();
    if pad > 2 {
        return Err(Base64Error::InvalidPadding);
    }

    let decoded_len = decoded_len_max(input.len()) - pad;
    if out.len() < decoded_len {
        return Err(Base64Error::BufferTooSmall);
    }

    let data_end = input.len() - pad;
    let mut written = 0;

    for (index, quad) in input.chunks(4).enumerate() {
        let base = index * 4;
        let mut n: u32 = 0;

        for (offset, &byte) in quad.iter().enumerate() {
            let pos = base + offset;
            let value = if pos >= data_end {
                0
            } else {
                match sextet(byte) {
                    Some(v) => v,
                    None if byte == PAD => return Err(Base64Error::InvalidPadding),
                    None => return Err(Base64Error::InvalidByte(pos)),
                }
            };
            n = (n << 6) | u32::from(value);
        }

        let bytes = [(n >> 16) as u8, (n >> 8) as u8, n as u8];
        let take = (decoded_len - written).min(3);
        out[written..written + take].copy_from_slice(&bytes[..take]);
        written += take;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_str(input: &[u8]) -> std::string::String {
        let mut out = [0u8; 128];
        let len = encode(input, &mut out).unwrap();
        std::string::String::from_utf8(out[..len].to_vec()).unwrap()
    }

    fn decode_str(input: &str) -> Result<std::vec::Vec<u8>, Base64Error> {
        let mut out = [0u8; 128];
        let len = decode(input.as_bytes(), &mut out)?;
        Ok(out[..len].to_vec())
    }

    #[test]
    fn test_rfc4648_vectors() {
        let vectors: [(&[u8], &str); 7] = [
            (b"", ""),
            (b"f", "Zg=="),
            (b"fo", "Zm8="),
            (b"foo", "Zm9v"),
            (b"foob", "Zm9vYg=="),
            (b"fooba", "Zm9vYmE="),
            (b"foobar", "Zm9vYmFy"),
        ];

        for (plain, encoded) in vectors {
            assert_eq!(encode_str(plain), encoded);
            assert_eq!(decode_str(encoded).unwrap(), plain);
        }
    }

    #[test]
    fn test_binary_bytes() {
        assert_eq!(encode_str(&[0xFF, 0xFE, 0x00]), "//4A");
        assert_eq!(decode_str("//4A").unwrap(), [0xFF, 0xFE, 0x00]);
    }

    #[test]
    fn test_lengths() {
        assert_eq!(encoded_len(0), 0);
        assert_eq!(encoded_len(1), 4);
        assert_eq!(encoded_len(3), 4);
        assert_eq!(encoded_len(4), 8);
        assert_eq!(decoded_len_max(8), 6);
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert_eq!(decode_str("Zm9"), Err(Base64Error::InvalidLength));
        assert_eq!(decode_str("Zm9*"), Err(Base64Error::InvalidByte(3)));
        assert_eq!(decode_str("Z==="), Err(Base64Error::InvalidPadding));
        assert_eq!(decode_str("Z=9v"), Err(Base64Error::InvalidPadding));
    }

    #[test]
    fn test_buffer_too_small() {
        let mut out = [0u8; 3];
        assert_eq!(encode(b"foo", &mut out), Err(Base64Error::BufferTooSmall));
        assert_eq!(decode(b"Zm9vYg==", &mut out), Err(Base64Error::BufferTooSmall));
    }
}

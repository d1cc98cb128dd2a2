//! ICMP echo request/reply codec (RFC 792)
//!
//! ```text
//! ┌──────┬──────┬──────────┬────────────┬──────────┬─────────┐
//! │ TYPE │ CODE │ CHECKSUM │ IDENTIFIER │ SEQUENCE │ PAYLOAD │
//! │ 1B   │ 1B   │ 2B       │ 2B         │ 2B       │ ...     │
//! └──────┴──────┴──────────┴────────────┴──────────┴─────────┘
//! ```

/// Echo reply type
pub const ICMP_ECHO_REPLY: u8 = 0;

/// Echo request type
pub const ICMP_ECHO_REQUEST: u8 = 8;

/// Fixed ICMP echo header size
pub const ICMP_HEADER_LEN: usize = 8;

/// ICMP codec errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IcmpError {
    /// Packet shorter than the echo header
    Truncated,
    /// Not an echo reply (carries the received type)
    UnexpectedType(u8),
    /// Internet checksum does not verify
    InvalidChecksum,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// RFC 1071 internet checksum
pub fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = words.remainder() {
        sum += u32::from(*last) << 8;
    }
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

/// An outgoing echo request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoRequest<'a> {
    /// Identifier (the kernel rewrites this on datagram ICMP sockets)
    pub ident: u16,
    /// Sequence number
    pub seq: u16,
    /// Echo data
    pub payload: &'a [u8],
}

impl EchoRequest<'_> {
    /// Encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        ICMP_HEADER_LEN + self.payload.len()
    }

    /// Encode into `buffer`, returning the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, IcmpError> {
        let len = self.encoded_len();
        if buffer.len() < len {
            return Err(IcmpError::BufferTooSmall);
        }

        buffer[0] = ICMP_ECHO_REQUEST;
        buffer[1] = 0;
        buffer[2..4].copy_from_slice(&[0, 0]);
        buffer[4..6].copy_from_slice(&self.ident.to_be_bytes());
        buffer[6..8].copy_from_slice(&self.seq.to_be_bytes());
        buffer[ICMP_HEADER_LEN..len].copy_from_slice(self.payload);

        let csum = internet_checksum(&buffer[..len]);
        buffer[2..4].copy_from_slice(&csum.to_be_bytes());
        Ok(len)
    }
}

/// A parsed echo reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoReply<'a> {
    /// Identifier
    pub ident: u16,
    /// Sequence number
    pub seq: u16,
    /// Time-to-live, when the packet arrived with its IPv4 header
    pub ttl: Option<u8>,
    /// Echo data
    pub payload: &'a [u8],
}

impl<'a> EchoReply<'a> {
    /// Parse a reply
    ///
    /// Raw sockets deliver the IPv4 header in front of the ICMP message;
    /// datagram ICMP sockets do not. A leading byte with version 4 is
    /// taken as an IPv4 header and skipped.
    pub fn parse(packet: &'a [u8]) -> Result<Self, IcmpError> {
        let (icmp, ttl) = match packet.first() {
            Some(&b) if b >> 4 == 4 => {
                let ihl = usize::from(b & 0x0F) * 4;
                if ihl < 20 || packet.len() < ihl {
                    return Err(IcmpError::Truncated);
                }
                (&packet[ihl..], Some(packet[8]))
            }
            _ => (packet, None),
        };

        if icmp.len() < ICMP_HEADER_LEN {
            return Err(IcmpError::Truncated);
        }
        if icmp[0] != ICMP_ECHO_REPLY {
            return Err(IcmpError::UnexpectedType(icmp[0]));
        }
        if internet_checksum(icmp) != 0 {
            return Err(IcmpError::InvalidChecksum);
        }

        Ok(Self {
            ident: u16::from_be_bytes([icmp[4], icmp[5]]),
            seq: u16::from_be_bytes([icmp[6], icmp[7]]),
            ttl,
            payload: &icmp[ICMP_HEADER_LEN..],
        })
    }
}

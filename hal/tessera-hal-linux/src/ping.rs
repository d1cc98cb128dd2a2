//! ICMP echo ("ping") over IPv4
//!
//! Prefers an unprivileged ICMP datagram socket (allowed when the
//! caller's group is inside `net.ipv4.ping_group_range`) and falls back
//! to a raw socket, which needs `CAP_NET_RAW`.

use std::io::{self, Read};
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tessera_protocol::icmp::{EchoReply, EchoRequest, IcmpError};
use thiserror::Error;

const PAYLOAD: &[u8] = b"tessera-ping-0123456789abcdefghijklmnopqrstuvwxyz";

const RECV_BUF: usize = 1500;

/// Ping errors
#[derive(Debug, Error)]
pub enum PingError {
    #[error("cannot open ICMP socket (datagram: {datagram}, raw: {raw})")]
    Socket { datagram: io::Error, raw: io::Error },

    #[error("only IPv4 targets are supported")]
    Ipv6Unsupported,

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("malformed ICMP packet: {0:?}")]
    Packet(IcmpError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A received echo reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingReply {
    /// Sequence number echoed back
    pub seq: u16,
    /// ICMP bytes received (header plus data)
    pub bytes: usize,
    /// Round-trip time
    pub rtt: Duration,
    /// Responding host
    pub from: IpAddr,
    /// IPv4 TTL, only known on raw sockets
    pub ttl: Option<u8>,
}

/// Sends echo requests and waits for the matching replies
pub struct Pinger {
    socket: Socket,
    raw: bool,
    ident: u16,
    seq: u16,
    timeout: Duration,
}

impl Pinger {
    /// Open an ICMP socket with the given per-ping timeout
    pub fn new(timeout: Duration) -> Result<Self, PingError> {
        let (socket, raw) =
            match Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::ICMPV4)) {
                Ok(socket) => (socket, false),
                Err(datagram) => {
                    log::debug!("datagram ICMP socket unavailable: {}", datagram);
                    match Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4)) {
                        Ok(socket) => (socket, true),
                        Err(raw) => return Err(PingError::Socket { datagram, raw }),
                    }
                }
            };

        Ok(Self {
            socket,
            raw,
            ident: std::process::id() as u16,
            seq: 0,
            timeout,
        })
    }

    /// Whether the fallback raw socket is in use
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// Send one echo request to `addr` and wait for its reply
    pub fn ping(&mut self, addr: IpAddr) -> Result<PingReply, PingError> {
        if addr.is_ipv6() {
            return Err(PingError::Ipv6Unsupported);
        }

        self.seq = self.seq.wrapping_add(1);
        let seq = self.seq;

        let request = EchoRequest {
            ident: self.ident,
            seq,
            payload: PAYLOAD,
        };
        let mut out = [0u8; 64];
        let len = request.encode(&mut out).map_err(PingError::Packet)?;

        self.socket.connect(&SockAddr::from(SocketAddr::new(addr, 0)))?;
        let sent_at = Instant::now();
        self.socket.send(&out[..len])?;
        log::trace!("icmp_seq={} sent {} bytes to {}", seq, len, addr);

        let deadline = sent_at + self.timeout;
        let mut buf = [0u8; RECV_BUF];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(PingError::Timeout(self.timeout));
            }
            self.socket.set_read_timeout(Some(remaining))?;

            let n = match (&self.socket).read(&mut buf) {
                Ok(n) => n,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Err(PingError::Timeout(self.timeout));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            let reply = match EchoReply::parse(&buf[..n]) {
                Ok(reply) => reply,
                Err(e) => {
                    log::trace!("ignoring ICMP packet: {:?}", e);
                    continue;
                }
            };

            if !self.matches(&reply, seq) {
                log::trace!("ignoring reply ident={} seq={}", reply.ident, reply.seq);
                continue;
            }

            return Ok(PingReply {
                seq,
                bytes: reply.payload.len() + tessera_protocol::icmp::ICMP_HEADER_LEN,
                rtt: sent_at.elapsed(),
                from: addr,
                ttl: reply.ttl,
            });
        }
    }

    // The kernel owns the identifier on datagram sockets
    fn matches(&self, reply: &EchoReply<'_>, seq: u16) -> bool {
        reply.seq == seq && (!self.raw || reply.ident == self.ident)
    }
}

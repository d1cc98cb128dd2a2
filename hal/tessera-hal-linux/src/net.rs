//! TCP/UDP socket helpers
//!
//! Thin wrappers over `std::net` that add host resolution, connect
//! timeouts and logging.

use std::io;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use thiserror::Error;

/// Socket errors
#[derive(Debug, Error)]
pub enum NetError {
    #[error("cannot resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("no address found for {0}")]
    NoAddress(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Resolve a hostname (or literal address) to its IP addresses
///
/// Duplicates are removed; order follows the resolver.
pub fn resolve(host: &str) -> Result<Vec<IpAddr>, NetError> {
    let addrs = (host, 0).to_socket_addrs().map_err(|source| NetError::Resolve {
        host: host.to_string(),
        source,
    })?;

    let mut ips: Vec<IpAddr> = Vec::new();
    for addr in addrs {
        if !ips.contains(&addr.ip()) {
            ips.push(addr.ip());
        }
    }

    if ips.is_empty() {
        return Err(NetError::NoAddress(host.to_string()));
    }
    log::debug!("resolved {} to {:?}", host, ips);
    Ok(ips)
}

/// First address for `host`, preferring IPv4
pub fn resolve_one(host: &str) -> Result<IpAddr, NetError> {
    let ips = resolve(host)?;
    ips.iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| ips.first())
        .copied()
        .ok_or_else(|| NetError::NoAddress(host.to_string()))
}

/// Connect to `host:port`, trying each resolved address in turn
pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, NetError> {
    let mut last_err = None;

    for ip in resolve(host)? {
        let addr = SocketAddr::new(ip, port);
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                log::info!("connected to {}", addr);
                return Ok(stream);
            }
            Err(e) => {
                log::debug!("connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    Err(match last_err {
        Some(e) => NetError::Io(e),
        None => NetError::NoAddress(host.to_string()),
    })
}

/// Bind a listening TCP socket
pub fn listen(addr: &str) -> Result<TcpListener, NetError> {
    let listener = TcpListener::bind(addr)?;
    log::info!("listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accept one connection
pub fn accept(listener: &TcpListener) -> Result<(TcpStream, SocketAddr), NetError> {
    let (stream, peer) = listener.accept()?;
    log::info!("accepted connection from {}", peer);
    Ok((stream, peer))
}

/// Switch a stream between blocking and non-blocking mode
pub fn set_blocking(stream: &TcpStream, blocking: bool) -> Result<(), NetError> {
    stream.set_nonblocking(!blocking)?;
    Ok(())
}

/// Bind a UDP socket
pub fn udp_bind(addr: &str) -> Result<UdpSocket, NetError> {
    let socket = UdpSocket::bind(addr)?;
    log::info!("udp bound to {}", socket.local_addr()?);
    Ok(socket)
}

/// Send one datagram to `host:port`
///
/// Returns the number of bytes sent.
pub fn udp_send_to(
    socket: &UdpSocket,
    host: &str,
    port: u16,
    data: &[u8],
) -> Result<usize, NetError> {
    let addr = SocketAddr::new(resolve_one(host)?, port);
    let sent = socket.send_to(data, addr)?;
    log::debug!("sent {} bytes to {}", sent, addr);
    Ok(sent)
}

//! UDP datagram echo

use std::io::ErrorKind;
use std::net::UdpSocket;
use std::time::Duration;

use anyhow::{Context, Result};
use tessera_core::Logger;
use tessera_hal_linux::net;

use crate::channels::StopFlag;

/// Largest datagram handled
const DATAGRAM_SIZE: usize = 65_507;

/// Send every datagram back to its sender
///
/// Returns after `max_datagrams` when given, or when `stop` is raised.
/// A read timeout on the socket lets the loop notice `stop`.
pub fn echo(
    socket: &UdpSocket,
    max_datagrams: Option<usize>,
    stop: &StopFlag,
    logger: &Logger,
) -> Result<usize> {
    let mut buf = vec![0u8; DATAGRAM_SIZE];
    let mut echoed = 0;

    while !stop.is_stopped() && max_datagrams.map_or(true, |max| echoed < max) {
        let (n, from) = match socket.recv_from(&mut buf) {
            Ok(got) => got,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        logger.debug(format_args!("{} bytes from {}", n, from));
        socket.send_to(&buf[..n], from)?;
        echoed += 1;
    }

    Ok(echoed)
}

/// `tessera udp-echo`
pub fn echo_server(bind: &str, max_datagrams: Option<usize>, logger: &Logger) -> Result<()> {
    let logger = logger.child("udp");
    let socket = net::udp_bind(bind).with_context(|| format!("binding {}", bind))?;
    let echoed = echo(&socket, max_datagrams, &StopFlag::new(), &logger)?;
    logger.info(format_args!("echoed {} datagram(s)", echoed));
    Ok(())
}

/// `tessera udp-send`
///
/// Sends `message` and waits for one reply.
pub fn send(
    host: &str,
    port: u16,
    message: &str,
    timeout: Duration,
    logger: &Logger,
) -> Result<Option<Vec<u8>>> {
    let logger = logger.child("udp");
    let socket = net::udp_bind("0.0.0.0:0")?;
    socket.set_read_timeout(Some(timeout))?;

    net::udp_send_to(&socket, host, port, message.as_bytes())?;

    let mut buf = vec![0u8; DATAGRAM_SIZE];
    match socket.recv_from(&mut buf) {
        Ok((n, from)) => {
            println!("{}: {}", from, String::from_utf8_lossy(&buf[..n]));
            Ok(Some(buf[..n].to_vec()))
        }
        Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
            logger.warn(format_args!("no reply within {:?}", timeout));
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::logger::LevelFilter;

    fn quiet() -> Logger {
        Logger::new("test.udp", LevelFilter::Off)
    }

    #[test]
    fn test_send_gets_echo() {
        let socket = net::udp_bind("127.0.0.1:0").unwrap();
        let port = socket.local_addr().unwrap().port();
        let server = std::thread::spawn(move || echo(&socket, Some(1), &StopFlag::new(), &quiet()));

        let reply = send("127.0.0.1", port, "marco", Duration::from_secs(2), &quiet()).unwrap();
        assert_eq!(reply.as_deref(), Some(&b"marco"[..]));
        assert_eq!(server.join().unwrap().unwrap(), 1);
    }

    #[test]
    fn test_send_times_out_without_server() {
        // Bound but never read, so nothing comes back
        let silent = net::udp_bind("127.0.0.1:0").unwrap();
        let port = silent.local_addr().unwrap().port();

        let timeout = Duration::from_millis(100);
        let reply = send("127.0.0.1", port, "anyone?", timeout, &quiet()).unwrap();
        assert!(reply.is_none());
    }

    #[test]
    fn test_echo_honours_stop() {
        let socket = net::udp_bind("127.0.0.1:0").unwrap();
        socket.set_read_timeout(Some(Duration::from_millis(20))).unwrap();
        let stop = StopFlag::new();
        stop.stop();
        assert_eq!(echo(&socket, None, &stop, &quiet()).unwrap(), 0);
    }
}

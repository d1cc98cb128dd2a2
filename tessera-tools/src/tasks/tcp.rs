//! TCP echo server and client

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use tessera_core::Logger;
use tessera_hal_linux::{net, spawn_with_retry, RetryPolicy};

use crate::channels::StopFlag;

const BUF_SIZE: usize = 1024;

/// Echo everything received on `stream` until the peer closes it
///
/// Returns the number of bytes echoed.
pub fn echo_connection(mut stream: TcpStream, stop: &StopFlag, logger: &Logger) -> Result<usize> {
    let peer = stream.peer_addr()?;
    let mut buf = [0u8; BUF_SIZE];
    let mut total = 0;

    while !stop.is_stopped() {
        let n = match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        logger.debug(format_args!(
            "{}: {} bytes: {}",
            peer,
            n,
            String::from_utf8_lossy(&buf[..n]).trim_end()
        ));
        stream.write_all(&buf[..n])?;
        total += n;
    }

    logger.info(format_args!("{} closed after {} bytes", peer, total));
    Ok(total)
}

/// Accept connections, one echo thread each
///
/// Stops after `max_connections` when given, otherwise runs until the
/// listener fails or `stop` is raised.
pub fn serve(
    listener: TcpListener,
    max_connections: Option<usize>,
    stop: &StopFlag,
    logger: &Logger,
) -> Result<()> {
    let policy = RetryPolicy::default();
    let mut workers: Vec<JoinHandle<()>> = Vec::new();
    let mut accepted = 0;

    while !stop.is_stopped() && max_connections.map_or(true, |max| accepted < max) {
        let (stream, peer) = net::accept(&listener)?;
        accepted += 1;

        let conn_stop = stop.clone();
        let conn_logger = logger.child("conn");
        let handle = spawn_with_retry(&format!("tcp-{}", peer), &policy, move || {
            if let Err(e) = echo_connection(stream, &conn_stop, &conn_logger) {
                conn_logger.warn(format_args!("{}: {:#}", peer, e));
            }
        })
        .context("spawning connection worker")?;
        workers.push(handle);

        workers.retain(|w| !w.is_finished());
    }

    for worker in workers {
        let _ = worker.join();
    }
    Ok(())
}

/// `tessera tcp-server`
pub fn server(bind: &str, max_connections: Option<usize>, logger: &Logger) -> Result<()> {
    let logger = logger.child("tcp");
    let listener = net::listen(bind).with_context(|| format!("binding {}", bind))?;
    serve(listener, max_connections, &StopFlag::new(), &logger)
}

/// `tessera tcp-client`
///
/// Sends `message`, half-closes, and prints replies from a reader thread
/// until the server closes the connection. Returns what was received.
pub fn client(
    host: &str,
    port: u16,
    message: &str,
    timeout: Duration,
    logger: &Logger,
) -> Result<Vec<u8>> {
    let logger = logger.child("tcp");
    let mut stream = net::connect(host, port, timeout)?;
    stream.set_read_timeout(Some(timeout))?;

    let mut reader = stream.try_clone()?;
    let rx_logger = logger.clone();
    let (done_tx, done_rx) = mpsc::channel();
    let handle = spawn_with_retry("tcp-rx", &RetryPolicy::default(), move || {
        let mut received = Vec::new();
        let mut buf = [0u8; BUF_SIZE];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    println!("{}", String::from_utf8_lossy(&buf[..n]));
                    received.extend_from_slice(&buf[..n]);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    rx_logger.warn(format_args!("read failed: {}", e));
                    break;
                }
            }
        }
        let _ = done_tx.send(received);
    })
    .context("spawning reader")?;

    stream.write_all(message.as_bytes())?;
    stream.shutdown(Shutdown::Write)?;
    logger.info(format_args!("sent {} bytes", message.len()));

    handle
        .join()
        .map_err(|_| anyhow::anyhow!("reader panicked"))?;
    let received = done_rx.recv().unwrap_or_default();
    logger.info(format_args!("received {} bytes", received.len()));
    Ok(received)
}

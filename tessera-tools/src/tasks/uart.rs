//! UART receive and transmit workers
//!
//! The reader thread owns the stream's `FrameDecoder` and hands frames
//! to a `Dispatcher`. Data frames are acknowledged by a writer thread
//! fed over a channel, so the reader never blocks on a write.

use std::fmt::Debug;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use anyhow::{Context, Result};
use tessera_core::config::AppConfig;
use tessera_core::{Dispatcher, Logger};
use tessera_hal::{UartRx, UartTx};
use tessera_hal_linux::{spawn_with_retry, RetryPolicy, SerialPort};
use tessera_protocol::messages::{MSG_ACK, MSG_DATA, MSG_HEARTBEAT, MSG_STATUS};
use tessera_protocol::{DecodeReport, Frame, FrameBuilder, FrameDecoder, Message};

use crate::channels::{StopFlag, TxRequest};
use crate::config::uart_config;
use crate::tasks::frames::describe;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 256;

/// Dispatcher printing every frame and queueing acks for data frames
pub fn frame_dispatcher(logger: &Logger, tx: Sender<TxRequest>) -> Dispatcher {
    let mut dispatcher = Dispatcher::new(logger.child("dispatch"));

    dispatcher.on(MSG_DATA, move |frame: &Frame| {
        println!("{}", describe(frame));
        // Writer gone means we are shutting down
        let _ = tx.send(TxRequest::Ack(frame.header.msg_id));
    });
    for msg_type in [MSG_HEARTBEAT, MSG_ACK, MSG_STATUS] {
        dispatcher.on(msg_type, |frame: &Frame| println!("{}", describe(frame)));
    }
    dispatcher.on_unrecognized(|frame: &Frame| println!("{}", describe(frame)));

    dispatcher
}

/// Read and decode until `stop` is raised or the port fails
pub fn rx_loop<R>(
    rx: &mut R,
    dispatcher: &mut Dispatcher,
    stop: &StopFlag,
    logger: &Logger,
) -> DecodeReport
where
    R: UartRx,
    R::Error: Debug,
{
    logger.info(format_args!("RX worker started"));

    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; RX_BUF_SIZE];
    let mut total = DecodeReport::default();

    while !stop.is_stopped() {
        match rx.read_blocking(&mut buf) {
            Ok(0) => {}
            Ok(n) => {
                logger.trace(format_args!("RX: {} bytes", n));
                let report = decoder.decode(&buf[..n], dispatcher);
                if report.errors() > 0 {
                    logger.warn(format_args!(
                        "dropped {} frame(s) ({} short length, {} bad checksum)",
                        report.errors(),
                        report.short_length,
                        report.bad_checksum
                    ));
                }
                total.merge(report);
            }
            Err(e) => {
                logger.error(format_args!("UART read error: {:?}", e));
                stop.stop();
            }
        }
    }

    logger.info(format_args!("RX worker stopped after {} frame(s)", total.frames));
    total
}

/// Encode and send one frame
pub fn send_frame<T>(tx: &mut T, frame: &Frame) -> Result<()>
where
    T: UartTx,
    T::Error: Debug,
{
    let bytes = frame
        .encode_to_vec()
        .map_err(|e| anyhow::anyhow!("cannot encode frame: {:?}", e))?;
    tx.write_blocking(&bytes)
        .map_err(|e| anyhow::anyhow!("UART write failed: {:?}", e))?;
    tx.flush()
        .map_err(|e| anyhow::anyhow!("UART flush failed: {:?}", e))
}

/// Serve writer requests until every sender is gone
pub fn tx_loop<T>(
    tx: &mut T,
    requests: Receiver<TxRequest>,
    mut builder: FrameBuilder,
    logger: &Logger,
) where
    T: UartTx,
    T::Error: Debug,
{
    logger.info(format_args!("TX worker started"));

    for request in requests {
        let TxRequest::Ack(msg_id) = request;
        let frame = match builder.build(&Message::Ack { msg_id }) {
            Ok(frame) => frame,
            Err(e) => {
                logger.warn(format_args!("cannot build ack: {:?}", e));
                continue;
            }
        };
        match send_frame(tx, &frame) {
            Ok(()) => logger.trace(format_args!("ACK {} sent", msg_id)),
            Err(e) => logger.warn(format_args!("failed to send ACK {}: {:#}", msg_id, e)),
        }
    }

    logger.info(format_args!("TX worker stopped"));
}

fn builder(config: &AppConfig) -> FrameBuilder {
    let f = &config.frame;
    FrameBuilder::new(f.device_type, f.frame_ver, f.device_ver)
}

/// `tessera uart-listen`
pub fn listen(config: &AppConfig, port: &str, seconds: Option<u64>, logger: &Logger) -> Result<()> {
    let logger = logger.child("uart");
    let line = uart_config(&config.uart)?;
    let mut reader = SerialPort::open(port, &line).with_context(|| format!("opening {}", port))?;
    let mut writer = reader.try_clone().context("cloning serial handle")?;

    let stop = StopFlag::new();
    let (tx, rx) = mpsc::channel();
    let policy = RetryPolicy::default();

    let tx_logger = logger.child("tx");
    let tx_builder = builder(config);
    let tx_handle = spawn_with_retry("uart-tx", &policy, move || {
        tx_loop(&mut writer, rx, tx_builder, &tx_logger);
    })
    .context("spawning UART writer")?;

    let rx_logger = logger.child("rx");
    let rx_stop = stop.clone();
    let rx_handle = spawn_with_retry("uart-rx", &policy, move || {
        let mut dispatcher = frame_dispatcher(&rx_logger, tx);
        let report = rx_loop(&mut reader, &mut dispatcher, &rx_stop, &rx_logger);
        let stats = dispatcher.stats();
        rx_logger.info(format_args!(
            "{} frame(s) decoded, {} dropped, {} unrecognized",
            report.frames,
            report.errors(),
            stats.unrecognized
        ));
    })
    .context("spawning UART reader")?;

    if let Some(seconds) = seconds {
        std::thread::sleep(Duration::from_secs(seconds));
        stop.stop();
    }

    // Reader drops the ack sender on exit, which ends the writer
    rx_handle
        .join()
        .map_err(|_| anyhow::anyhow!("UART reader panicked"))?;
    tx_handle
        .join()
        .map_err(|_| anyhow::anyhow!("UART writer panicked"))?;
    Ok(())
}

/// `tessera uart-send`
pub fn send(
    config: &AppConfig,
    port: &str,
    msg_type: u8,
    payload: &[u8],
    logger: &Logger,
) -> Result<()> {
    let logger = logger.child("uart");
    let line = uart_config(&config.uart)?;
    let mut serial = SerialPort::open(port, &line).with_context(|| format!("opening {}", port))?;

    let frame = builder(config)
        .build_raw(msg_type, payload)
        .map_err(|e| anyhow::anyhow!("cannot build frame: {:?}", e))?;
    send_frame(&mut serial, &frame)?;

    logger.info(format_args!(
        "sent {} bytes to {}: {}",
        frame.wire_len(),
        serial.path(),
        describe(&frame)
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tessera_core::logger::LevelFilter;
    use tessera_protocol::FrameHeader;

    /// Scripted port: hands out chunks, then raises `stop`
    struct MockPort {
        chunks: VecDeque<Vec<u8>>,
        written: Vec<u8>,
        stop: StopFlag,
    }

    impl UartRx for MockPort {
        type Error = ();

        fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
            match self.chunks.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => {
                    self.stop.stop();
                    Ok(0)
                }
            }
        }
    }

    impl UartTx for MockPort {
        type Error = ();

        fn write_blocking(&mut self, data: &[u8]) -> Result<(), ()> {
            self.written.extend_from_slice(data);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    fn quiet() -> Logger {
        Logger::new("test.uart", LevelFilter::Off)
    }

    fn data_frame(msg_id: u8, payload: &[u8]) -> Vec<u8> {
        let header = FrameHeader {
            msg_id,
            ..FrameHeader::default()
        };
        Frame::new(header, MSG_DATA, payload)
            .unwrap()
            .encode_to_vec()
            .unwrap()
            .to_vec()
    }

    #[test]
    fn test_rx_loop_acks_data_split_across_reads() {
        let mut stream = data_frame(7, b"hello");
        stream.extend(data_frame(8, b"x"));
        let (a, b) = stream.split_at(9);

        let stop = StopFlag::new();
        let mut port = MockPort {
            chunks: VecDeque::from([a.to_vec(), b.to_vec()]),
            written: Vec::new(),
            stop: stop.clone(),
        };

        let (tx, rx) = mpsc::channel();
        let mut dispatcher = frame_dispatcher(&quiet(), tx);
        let report = rx_loop(&mut port, &mut dispatcher, &stop, &quiet());
        drop(dispatcher);

        assert_eq!(report.frames, 2);
        assert_eq!(rx.iter().collect::<Vec<_>>(), [TxRequest::Ack(7), TxRequest::Ack(8)]);
    }

    #[test]
    fn test_rx_loop_stops_on_read_error() {
        struct Broken;
        impl UartRx for Broken {
            type Error = &'static str;
            fn read_blocking(&mut self, _: &mut [u8]) -> Result<usize, Self::Error> {
                Err("unplugged")
            }
        }

        let stop = StopFlag::new();
        let (tx, _rx) = mpsc::channel();
        let mut dispatcher = frame_dispatcher(&quiet(), tx);
        let report = rx_loop(&mut Broken, &mut dispatcher, &stop, &quiet());
        assert_eq!(report.frames, 0);
        assert!(stop.is_stopped());
    }

    #[test]
    fn test_tx_loop_writes_ack_frames() {
        let mut port = MockPort {
            chunks: VecDeque::new(),
            written: Vec::new(),
            stop: StopFlag::new(),
        };
        let (tx, rx) = mpsc::channel();
        tx.send(TxRequest::Ack(5)).unwrap();
        drop(tx);

        tx_loop(&mut port, rx, FrameBuilder::new(1, 1, 1), &quiet());

        let mut frames = Vec::new();
        FrameDecoder::new().decode(&port.written, &mut |f: &Frame| frames.push(f.clone()));
        assert_eq!(frames.len(), 1);
        assert_eq!(
            Message::from_frame(&frames[0]),
            Ok(Message::Ack { msg_id: 5 })
        );
    }
}

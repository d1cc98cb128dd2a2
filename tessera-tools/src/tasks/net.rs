//! Name resolution, ping and HTTP fetch

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tessera_core::Logger;
use tessera_hal_linux::http;
use tessera_hal_linux::{net, PingError, Pinger};

/// `tessera resolve`
pub fn resolve(host: &str) -> Result<()> {
    for ip in net::resolve(host)? {
        println!("{}", ip);
    }
    Ok(())
}

/// Round-trip summary for a ping run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PingSummary {
    pub sent: u32,
    pub received: u32,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
}

impl PingSummary {
    fn record(&mut self, rtt: Duration) {
        let ms = rtt.as_secs_f64() * 1000.0;
        if self.received == 0 || ms < self.min_ms {
            self.min_ms = ms;
        }
        if ms > self.max_ms {
            self.max_ms = ms;
        }
        self.avg_ms = (self.avg_ms * f64::from(self.received) + ms) / f64::from(self.received + 1);
        self.received += 1;
    }

    pub fn loss_percent(&self) -> f64 {
        if self.sent == 0 {
            return 0.0;
        }
        f64::from(self.sent - self.received) * 100.0 / f64::from(self.sent)
    }
}

/// `tessera ping`
pub fn ping(
    host: &str,
    count: u32,
    interval: Duration,
    timeout: Duration,
    logger: &Logger,
) -> Result<PingSummary> {
    let logger = logger.child("ping");
    let addr = net::resolve_one(host)?;
    let mut pinger = Pinger::new(timeout).context("opening ICMP socket")?;
    if pinger.is_raw() {
        logger.debug(format_args!("using raw ICMP socket"));
    }

    println!("PING {} ({})", host, addr);
    let mut summary = PingSummary::default();

    for i in 0..count {
        summary.sent += 1;
        match pinger.ping(addr) {
            Ok(reply) => {
                summary.record(reply.rtt);
                let ttl = reply.ttl.map(|t| format!(" ttl={}", t)).unwrap_or_default();
                println!(
                    "{} bytes from {}: icmp_seq={}{} time={:.3} ms",
                    reply.bytes,
                    reply.from,
                    reply.seq,
                    ttl,
                    reply.rtt.as_secs_f64() * 1000.0
                );
            }
            Err(PingError::Timeout(_)) => println!("request timeout for icmp_seq={}", i + 1),
            Err(e) => return Err(e.into()),
        }
        if i + 1 < count {
            thread::sleep(interval);
        }
    }

    println!(
        "{} packets transmitted, {} received, {:.1}% packet loss",
        summary.sent,
        summary.received,
        summary.loss_percent()
    );
    if summary.received > 0 {
        println!(
            "rtt min/avg/max = {:.3}/{:.3}/{:.3} ms",
            summary.min_ms, summary.avg_ms, summary.max_ms
        );
    }
    logger.info(format_args!("{} of {} replies", summary.received, summary.sent));
    Ok(summary)
}

/// `tessera http-get`
pub fn http_get(url: &str, show_body: bool, timeout: Duration, logger: &Logger) -> Result<()> {
    let logger = logger.child("http");
    let response = http::get(url, timeout).with_context(|| format!("fetching {}", url))?;

    println!("{} {} {}", response.version, response.status, response.reason);
    for (name, value) in &response.headers {
        println!("{}: {}", name, value);
    }
    println!();
    if show_body {
        println!("{}", String::from_utf8_lossy(&response.body));
    } else {
        println!("({} byte body)", response.body.len());
    }

    logger.info(format_args!("{} -> {}", url, response.status));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_summary() {
        let mut summary = PingSummary {
            sent: 4,
            ..PingSummary::default()
        };
        summary.record(Duration::from_millis(10));
        summary.record(Duration::from_millis(30));

        assert_eq!(summary.received, 2);
        assert!((summary.min_ms - 10.0).abs() < 1e-9);
        assert!((summary.max_ms - 30.0).abs() < 1e-9);
        assert!((summary.avg_ms - 20.0).abs() < 1e-9);
        assert!((summary.loss_percent() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_summary_has_no_loss() {
        assert_eq!(PingSummary::default().loss_percent(), 0.0);
    }
}

//! Tessera - Linux userspace facility toolkit
//!
//! One binary, one subcommand per facility: UART framing, TCP/UDP
//! sockets, ICMP ping, HTTP, base64 and the driver model. Each
//! subcommand runs on its own; nothing is shared between them.
//!
//! Named after the small tiles of a mosaic.

mod channels;
mod config;
mod hexstr;
mod tasks;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tessera_core::config::AppConfig;
use tessera_core::Logger;

#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(version)]
#[command(about = "Exercise serial framing, sockets, ping, HTTP, base64 and the driver model")]
struct Cli {
    /// Configuration file (defaults to the built-in tessera.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode frames from hex bytes
    Decode {
        /// Hex stream, e.g. "AA 0B 01 00 00 00 01 01 01 02 41 AE"
        hex: String,
    },

    /// Build a frame and print it as hex
    Encode {
        /// Message type (decimal or 0x-prefixed hex)
        #[arg(long, value_parser = parse_u8)]
        msg_type: u8,

        /// Message id
        #[arg(long, default_value = "0", value_parser = parse_u8)]
        msg_id: u8,

        #[command(flatten)]
        payload: PayloadArgs,
    },

    /// Decode frames arriving on a serial port, acknowledging data frames
    UartListen {
        /// Serial device (defaults to [uart] port)
        #[arg(long)]
        port: Option<String>,

        /// Stop after this many seconds (runs until the port fails otherwise)
        #[arg(long)]
        seconds: Option<u64>,
    },

    /// Send one frame on a serial port
    UartSend {
        /// Serial device (defaults to [uart] port)
        #[arg(long)]
        port: Option<String>,

        /// Message type (decimal or 0x-prefixed hex)
        #[arg(long, value_parser = parse_u8)]
        msg_type: u8,

        #[command(flatten)]
        payload: PayloadArgs,
    },

    /// TCP echo server, one thread per connection
    TcpServer {
        #[arg(long, default_value = "0.0.0.0:7878")]
        bind: String,

        /// Exit after serving this many connections
        #[arg(long)]
        max_connections: Option<usize>,
    },

    /// Send a message over TCP and print the replies
    TcpClient {
        #[arg(long)]
        host: String,

        #[arg(long)]
        port: u16,

        #[arg(long)]
        message: String,
    },

    /// UDP echo server
    UdpEcho {
        #[arg(long, default_value = "0.0.0.0:7879")]
        bind: String,

        /// Exit after echoing this many datagrams
        #[arg(long)]
        count: Option<usize>,
    },

    /// Send one datagram and wait for a reply
    UdpSend {
        #[arg(long)]
        host: String,

        #[arg(long)]
        port: u16,

        #[arg(long)]
        message: String,
    },

    /// Resolve a hostname to its addresses
    Resolve { host: String },

    /// ICMP echo
    Ping {
        host: String,

        #[arg(short, long, default_value = "4")]
        count: u32,

        /// Seconds between requests
        #[arg(short, long, default_value = "1")]
        interval: u64,
    },

    /// Fetch an http:// URL
    HttpGet {
        url: String,

        /// Print the body instead of its length
        #[arg(long)]
        body: bool,
    },

    /// Base64 encode or decode text
    Base64 {
        #[command(subcommand)]
        op: Base64Op,
    },

    /// Register the built-in drivers and exercise read/write/ioctl
    Drivers,
}

#[derive(Subcommand, Debug)]
enum Base64Op {
    Encode { text: String },
    Decode { text: String },
}

#[derive(clap::Args, Debug)]
struct PayloadArgs {
    /// Payload as text
    #[arg(long, conflicts_with = "hex")]
    payload: Option<String>,

    /// Payload as hex bytes
    #[arg(long)]
    hex: Option<String>,
}

impl PayloadArgs {
    fn bytes(&self) -> Result<Vec<u8>> {
        match (&self.payload, &self.hex) {
            (Some(text), _) => Ok(text.as_bytes().to_vec()),
            (None, Some(digits)) => hexstr::parse(digits),
            (None, None) => Ok(Vec::new()),
        }
    }
}

fn parse_u8(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("{:?} is not a byte value: {}", s, e))
}

/// Install the process log backend with timestamps
fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level.as_str().to_lowercase()),
    )
    .format(|buf, record| {
        writeln!(
            buf,
            "{} {:<5} {}: {}",
            buf.timestamp_millis(),
            record.level(),
            record.target(),
            record.args()
        )
    })
    .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut app: AppConfig = config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(level) = cli.log_level {
        if tessera_core::logger::parse_level(&level).is_none() {
            bail!("unknown log level {:?}", level);
        }
        app.log.level = level;
    }

    let level = config::log_level(&app);
    init_logging(level);
    let logger = Logger::new("tessera", level);

    let net_timeout = Duration::from_millis(app.net.timeout_ms);

    match cli.command {
        Commands::Decode { hex } => {
            let report = tasks::frames::decode(&hex, &logger)?;
            if report.frames == 0 && report.errors() > 0 {
                bail!("no valid frames ({} dropped)", report.errors());
            }
        }

        Commands::Encode {
            msg_type,
            msg_id,
            payload,
        } => {
            tasks::frames::encode(&app.frame, msg_id, msg_type, &payload.bytes()?)?;
        }

        Commands::UartListen { port, seconds } => {
            let port = port.unwrap_or_else(|| app.uart.port.clone());
            tasks::uart::listen(&app, &port, seconds, &logger)?;
        }

        Commands::UartSend {
            port,
            msg_type,
            payload,
        } => {
            let port = port.unwrap_or_else(|| app.uart.port.clone());
            tasks::uart::send(&app, &port, msg_type, &payload.bytes()?, &logger)?;
        }

        Commands::TcpServer {
            bind,
            max_connections,
        } => {
            tasks::tcp::server(&bind, max_connections, &logger)?;
        }

        Commands::TcpClient {
            host,
            port,
            message,
        } => {
            tasks::tcp::client(&host, port, &message, net_timeout, &logger)?;
        }

        Commands::UdpEcho { bind, count } => {
            tasks::udp::echo_server(&bind, count, &logger)?;
        }

        Commands::UdpSend {
            host,
            port,
            message,
        } => {
            tasks::udp::send(&host, port, &message, net_timeout, &logger)?;
        }

        Commands::Resolve { host } => {
            tasks::net::resolve(&host)?;
        }

        Commands::Ping {
            host,
            count,
            interval,
        } => {
            tasks::net::ping(
                &host,
                count,
                Duration::from_secs(interval),
                net_timeout,
                &logger,
            )?;
        }

        Commands::HttpGet { url, body } => {
            tasks::net::http_get(&url, body, net_timeout, &logger)?;
        }

        Commands::Base64 { op } => match op {
            Base64Op::Encode { text } => println!("{}", tasks::codec::encode(text.as_bytes())?),
            Base64Op::Decode { text } => {
                let bytes = tasks::codec::decode(&text)?;
                match String::from_utf8(bytes) {
                    Ok(text) => println!("{}", text),
                    Err(e) => println!("{}", hexstr::format(e.as_bytes())),
                }
            }
        },

        Commands::Drivers => {
            tasks::drivers::run(&app.drivers, &logger)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_u8() {
        assert_eq!(parse_u8("0x02"), Ok(2));
        assert_eq!(parse_u8("255"), Ok(255));
        assert!(parse_u8("256").is_err());
        assert!(parse_u8("0xZZ").is_err());
    }

    #[test]
    fn test_encode_args() {
        let cli = Cli::try_parse_from([
            "tessera", "encode", "--msg-type", "0x02", "--msg-id", "1", "--payload", "A",
        ])
        .unwrap();
        match cli.command {
            Commands::Encode {
                msg_type,
                msg_id,
                payload,
            } => {
                assert_eq!((msg_type, msg_id), (2, 1));
                assert_eq!(payload.bytes().unwrap(), b"A");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_payload_sources_conflict() {
        assert!(Cli::try_parse_from([
            "tessera", "encode", "--msg-type", "1", "--payload", "A", "--hex", "41",
        ])
        .is_err());
    }
}

//! Minimal HTTP/1.0 GET client
//!
//! Plain `http://` only. The request asks the server to close the
//! connection, so the response body is whatever arrives before EOF.

use std::fmt;
use std::io::{self, Read, Write};
use std::time::Duration;

use thiserror::Error;

use crate::net::{self, NetError};

const USER_AGENT: &str = concat!("tessera/", env!("CARGO_PKG_VERSION"));

/// HTTP client errors
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("unsupported URL scheme in {0} (only http:// is supported)")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("malformed response: {0}")]
    MalformedResponse(&'static str),

    #[error(transparent)]
    Net(#[from] NetError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A parsed `http://host[:port][/path]` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Url {
    /// Parse an `http://` URL; port defaults to 80 and path to `/`
    pub fn parse(url: &str) -> Result<Self, HttpError> {
        let rest = url
            .strip_prefix("http://")
            .ok_or_else(|| HttpError::UnsupportedScheme(url.to_string()))?;

        let (authority, path) = match rest.find(|c: char| c == '/' || c == '?') {
            Some(i) if rest[i..].starts_with('?') => (&rest[..i], format!("/{}", &rest[i..])),
            Some(i) => (&rest[..i], rest[i..].to_string()),
            None => (rest, "/".to_string()),
        };

        let invalid = || HttpError::InvalidUrl(url.to_string());
        let parse_port = |port: &str| port.parse::<u16>().map_err(|_| invalid());

        // IPv6 literals are bracketed so their colons are not taken as the port
        let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
            let (host, after) = bracketed.split_once(']').ok_or_else(invalid)?;
            let port = match after {
                "" => 80,
                _ => parse_port(after.strip_prefix(':').ok_or_else(invalid)?)?,
            };
            (host, port)
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, parse_port(port)?),
                None => (authority, 80),
            }
        };

        if host.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            host: host.to_string(),
            port,
            path,
        })
    }

    /// Value for the `Host` header
    fn host_header(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if self.port == 80 {
            host
        } else {
            format!("{}:{}", host, self.port)
        }
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}{}", self.host_header(), self.path)
    }
}

/// An outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: &'static str,
    pub url: Url,
}

impl Request {
    /// GET request for `url`
    pub fn get(url: Url) -> Self {
        Self { method: "GET", url }
    }

    /// Request text as sent on the wire
    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "{} {} HTTP/1.0\r\nHost: {}\r\nUser-Agent: {}\r\nAccept: */*\r\nConnection: close\r\n\r\n",
            self.method,
            self.url.path,
            self.url.host_header(),
            USER_AGENT
        )
        .into_bytes()
    }
}

/// A parsed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub version: String,
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Parse a complete response (status line, headers, body)
    pub fn parse(raw: &[u8]) -> Result<Self, HttpError> {
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .ok_or(HttpError::MalformedResponse("missing end of headers"))?;

        let head = std::str::from_utf8(&raw[..split])
            .map_err(|_| HttpError::MalformedResponse("headers are not UTF-8"))?;
        let body = raw[split + 4..].to_vec();

        let mut lines = head.split("\r\n");
        let status_line = lines
            .next()
            .ok_or(HttpError::MalformedResponse("missing status line"))?;

        let mut parts = status_line.splitn(3, ' ');
        let version = parts
            .next()
            .filter(|v| v.starts_with("HTTP/"))
            .ok_or(HttpError::MalformedResponse("bad protocol version"))?;
        let status = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or(HttpError::MalformedResponse("bad status code"))?;
        let reason = parts.next().unwrap_or("");

        let mut headers = Vec::new();
        for line in lines {
            let (name, value) = line
                .split_once(':')
                .ok_or(HttpError::MalformedResponse("bad header line"))?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        Ok(Self {
            version: version.to_string(),
            status,
            reason: reason.to_string(),
            headers,
            body,
        })
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Fetch `url` with a GET request
pub fn get(url: &str, timeout: Duration) -> Result<Response, HttpError> {
    let url = Url::parse(url)?;
    let request = Request::get(url.clone());

    let mut stream = net::connect(&url.host, url.port, timeout)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    stream.write_all(&request.to_bytes())?;
    log::debug!("GET {}", url);

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw)?;
    log::debug!("received {} bytes from {}", raw.len(), url.host);

    Response::parse(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_url_parse() {
        let url = Url::parse("http://example.com:8080/a/b?c=d").unwrap();
        assert_eq!(url.host, "example.com");
        assert_eq!(url.port, 8080);
        assert_eq!(url.path, "/a/b?c=d");

        let url = Url::parse("http://example.com").unwrap();
        assert_eq!(url.port, 80);
        assert_eq!(url.path, "/");
        assert_eq!(url.to_string(), "http://example.com/");
    }

    #[test]
    fn test_url_query_without_path() {
        let url = Url::parse("http://host?x=1").unwrap();
        assert_eq!(url.host, "host");
        assert_eq!(url.port, 80);
        assert_eq!(url.path, "/?x=1");

        let url = Url::parse("http://host:81?x=1").unwrap();
        assert_eq!((url.host.as_str(), url.port), ("host", 81));
    }

    #[test]
    fn test_url_ipv6_literal() {
        let url = Url::parse("http://[::1]:8080/").unwrap();
        assert_eq!(url.host, "::1");
        assert_eq!(url.port, 8080);
        assert_eq!(url.path, "/");
        assert_eq!(url.to_string(), "http://[::1]:8080/");

        let url = Url::parse("http://[fe80::1]/x").unwrap();
        assert_eq!((url.host.as_str(), url.port), ("fe80::1", 80));

        assert!(matches!(Url::parse("http://[::1/"), Err(HttpError::InvalidUrl(_))));
        assert!(matches!(Url::parse("http://[::1]x/"), Err(HttpError::InvalidUrl(_))));
        assert!(matches!(Url::parse("http://[]:80/"), Err(HttpError::InvalidUrl(_))));
    }

    #[test]
    fn test_url_rejects_other_schemes() {
        assert!(matches!(
            Url::parse("https://example.com/"),
            Err(HttpError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            Url::parse("http://host:notaport/"),
            Err(HttpError::InvalidUrl(_))
        ));
        assert!(matches!(Url::parse("http:///x"), Err(HttpError::InvalidUrl(_))));
    }

    #[test]
    fn test_request_text() {
        let req = Request::get(Url::parse("http://localhost:8000/index.html").unwrap());
        let text = String::from_utf8(req.to_bytes()).unwrap();
        assert!(text.starts_with("GET /index.html HTTP/1.0\r\n"));
        assert!(text.contains("Host: localhost:8000\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_response_parse() {
        let raw = b"HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: 4\r\n\r\nnope";
        let resp = Response::parse(raw).unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.reason, "Not Found");
        assert_eq!(resp.header("content-type"), Some("text/plain"));
        assert_eq!(resp.body, b"nope");
    }

    #[test]
    fn test_response_parse_rejects_garbage() {
        assert!(Response::parse(b"hello").is_err());
        assert!(Response::parse(b"SSH-2.0 x\r\n\r\n").is_err());
        assert!(Response::parse(b"HTTP/1.0 abc OK\r\n\r\n").is_err());
    }

    #[test]
    fn test_get_against_local_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut buf = [0u8; 512];
            let n = conn.read(&mut buf).unwrap();
            assert!(buf[..n].starts_with(b"GET /hello HTTP/1.0\r\n"));
            conn.write_all(b"HTTP/1.0 200 OK\r\nServer: test\r\n\r\nhi")
                .unwrap();
        });

        let url = format!("http://127.0.0.1:{}/hello", port);
        let resp = get(&url, Duration::from_secs(2)).unwrap();
        server.join().unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.header("Server"), Some("test"));
        assert_eq!(resp.body, b"hi");
    }
}

//! HTTP/1.1 Framing
//!
//! Request serialization and response parsing for HTTP/1.1. Only identity
//! encoded, `Content-Length` delimited bodies are understood.

use std::io::{Read, Write};

use crate::tcp::BufferedConnection;
use crate::NetError;

/// HTTP/1.1 request
#[derive(Debug, Clone)]
pub struct Http1Request {
    /// HTTP method
    pub method: String,
    /// Request path (e.g., "/index.html")
    pub path: String,
    /// HTTP version
    pub version: HttpVersion,
    /// Request headers, in send order
    pub headers: Vec<(String, String)>,
}

/// HTTP version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpVersion {
    Http10,
    #[default]
    Http11,
}

impl HttpVersion {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "HTTP/1.0" => Some(HttpVersion::Http10),
            "HTTP/1.1" => Some(HttpVersion::Http11),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpVersion::Http10 => write!(f, "HTTP/1.0"),
            HttpVersion::Http11 => write!(f, "HTTP/1.1"),
        }
    }
}

impl Http1Request {
    /// Create a GET request
    pub fn get(path: &str) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.to_string(),
            version: HttpVersion::Http11,
            headers: Vec::new(),
        }
    }

    /// Add a header
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Serialize to bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut head = format!("{} {} {}\r\n", self.method, self.path, self.version);
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str("\r\n");
        head.into_bytes()
    }
}

/// HTTP/1.1 response
#[derive(Debug, Clone)]
pub struct Http1Response {
    /// HTTP version
    pub version: HttpVersion,
    /// Status code
    pub status: u16,
    /// Status reason phrase
    pub reason: String,
    /// Response headers, names lowercased
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Vec<u8>,
}

impl Http1Response {
    /// Get header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Check if connection should be kept alive
    pub fn keep_alive(&self) -> bool {
        if self.version == HttpVersion::Http10 {
            // HTTP/1.0: keep-alive only if explicitly requested
            self.header("connection")
                .map(|v| v.eq_ignore_ascii_case("keep-alive"))
                .unwrap_or(false)
        } else {
            // HTTP/1.1: keep-alive by default unless "close"
            !self.header("connection")
                .map(|v| v.eq_ignore_ascii_case("close"))
                .unwrap_or(false)
        }
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Body as UTF-8 text
    pub fn text(&self) -> Result<String, NetError> {
        String::from_utf8(self.body.clone())
            .map_err(|_| NetError::ProtocolViolation("response body is not valid UTF-8".into()))
    }
}

/// HTTP/1.1 response parser
#[derive(Debug, Default)]
pub struct Http1Parser {
    version: HttpVersion,
    status: u16,
    reason: String,
    headers: Vec<(String, String)>,
}

impl Http1Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one response from a connection
    ///
    /// Consumes exactly the status line, headers and `content-length` body
    /// bytes; anything after stays buffered in `conn`.
    pub fn parse<S: Read + Write>(conn: &mut BufferedConnection<S>) -> Result<Http1Response, NetError> {
        let mut parser = Self::new();

        let line = read_text_line(conn)?;
        parser.parse_status_line(&line)?;

        loop {
            let line = read_text_line(conn)?;
            if line.is_empty() {
                break;
            }
            parser.parse_header_line(&line)?;
        }

        for name in ["transfer-encoding", "content-encoding"] {
            if let Some(value) = parser.header(name) {
                return Err(NetError::unsupported_encoding(name, value));
            }
        }

        let content_length = match parser.header("content-length") {
            Some(value) => value.parse::<usize>().map_err(|_| {
                NetError::ProtocolViolation(format!("invalid content-length: {}", value))
            })?,
            None => 0,
        };

        let body = conn.read_exact(content_length).map_err(NetError::Network)?;

        Ok(Http1Response {
            version: parser.version,
            status: parser.status,
            reason: parser.reason,
            headers: parser.headers,
            body,
        })
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn parse_status_line(&mut self, line: &str) -> Result<(), NetError> {
        let parts: Vec<&str> = line.trim().splitn(3, ' ').collect();
        let [version, status, reason] = parts.as_slice() else {
            return Err(NetError::ProtocolViolation(format!("malformed status line: {:?}", line)));
        };

        self.version = HttpVersion::parse(version)
            .ok_or_else(|| NetError::ProtocolViolation(format!("unsupported HTTP version: {}", version)))?;

        self.status = status.parse()
            .map_err(|_| NetError::ProtocolViolation(format!("invalid status code: {}", status)))?;

        self.reason = reason.to_string();

        Ok(())
    }

    fn parse_header_line(&mut self, line: &str) -> Result<(), NetError> {
        let (name, value) = line.split_once(':')
            .ok_or_else(|| NetError::ProtocolViolation(format!("malformed header line: {:?}", line)))?;

        let name = name.trim().to_lowercase();
        let value = value.trim().to_string();

        // Last occurrence wins
        match self.headers.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.headers.push((name, value)),
        }

        Ok(())
    }
}

fn read_text_line<S: Read + Write>(conn: &mut BufferedConnection<S>) -> Result<String, NetError> {
    let line = conn.read_line().map_err(NetError::Network)?;
    String::from_utf8(line)
        .map_err(|_| NetError::ProtocolViolation("response head is not valid UTF-8".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    fn parse(raw: &str) -> Result<Http1Response, NetError> {
        let mut conn = BufferedConnection::new(Cursor::new(raw.as_bytes().to_vec()));
        Http1Parser::parse(&mut conn)
    }

    #[test]
    fn test_request_serialize() {
        let req = Http1Request::get("/index.html")
            .header("Host", "example.com")
            .header("User-Agent", "toy-browser/1.0")
            .header("Connection", "keep-alive");

        let s = String::from_utf8(req.serialize()).unwrap();
        assert_eq!(
            s,
            "GET /index.html HTTP/1.1\r\nHost: example.com\r\nUser-Agent: toy-browser/1.0\r\nConnection: keep-alive\r\n\r\n"
        );
    }

    #[test]
    fn test_response_parse() {
        let resp = parse("HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 5\r\n\r\nHello").unwrap();

        assert_eq!(resp.version, HttpVersion::Http11);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.reason, "OK");
        assert_eq!(resp.header("Content-Type"), Some("text/html"));
        assert_eq!(resp.headers[0].0, "content-type");
        assert_eq!(resp.body, b"Hello");
        assert!(resp.is_success());
    }

    #[test]
    fn test_multi_word_reason() {
        let resp = parse("HTTP/1.0 404 Not Found\r\n\r\n").unwrap();
        assert_eq!(resp.version, HttpVersion::Http10);
        assert_eq!(resp.reason, "Not Found");
        assert!(resp.body.is_empty());
        assert!(!resp.keep_alive());
    }

    #[test]
    fn test_body_stops_at_content_length() {
        let mut conn = BufferedConnection::new(Cursor::new(
            b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nHelloGARBAGE".to_vec(),
        ));
        let resp = Http1Parser::parse(&mut conn).unwrap();

        assert_eq!(resp.body, b"Hello");
        assert_eq!(conn.buffered(), b"GARBAGE");
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let resp = parse("HTTP/1.1 200 OK\r\nX-Thing: one\r\nx-thing:   two  \r\n\r\n").unwrap();
        assert_eq!(resp.headers.len(), 1);
        assert_eq!(resp.header("x-thing"), Some("two"));
    }

    #[test]
    fn test_short_status_line() {
        assert!(matches!(parse("HTTP/1.1 200\r\n\r\n"), Err(NetError::ProtocolViolation(_))));
        assert!(matches!(parse("HTTP/1.1 abc OK\r\n\r\n"), Err(NetError::ProtocolViolation(_))));
        assert!(matches!(parse("SPDY/3 200 OK\r\n\r\n"), Err(NetError::ProtocolViolation(_))));
    }

    #[test]
    fn test_malformed_header() {
        let result = parse("HTTP/1.1 200 OK\r\nno colon here\r\n\r\n");
        assert!(matches!(result, Err(NetError::ProtocolViolation(_))));
    }

    #[test]
    fn test_rejects_encodings() {
        let err = parse("HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nHello\r\n0\r\n\r\n").unwrap_err();
        assert!(matches!(err, NetError::ProtocolViolation(ref m) if m.contains("transfer-encoding")));

        let err = parse("HTTP/1.1 200 OK\r\nContent-Encoding: gzip\r\nContent-Length: 3\r\n\r\nabc").unwrap_err();
        assert!(matches!(err, NetError::ProtocolViolation(ref m) if m.contains("content-encoding")));
    }

    #[test]
    fn test_bad_content_length() {
        let result = parse("HTTP/1.1 200 OK\r\nContent-Length: lots\r\n\r\n");
        assert!(matches!(result, Err(NetError::ProtocolViolation(_))));
    }

    #[test]
    fn test_oversized_content_length() {
        let err = parse("HTTP/1.1 200 OK\r\nContent-Length: 18446744073709551615\r\n\r\nabc").unwrap_err();
        assert!(matches!(err, NetError::Network(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));

        let err = parse("HTTP/1.1 200 OK\r\nContent-Length: 99999999999999999999999\r\n\r\n").unwrap_err();
        assert!(matches!(err, NetError::ProtocolViolation(_)));
    }

    #[test]
    fn test_truncated_body() {
        let result = parse("HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nshort");
        assert!(matches!(result, Err(NetError::Network(_))));
    }

    #[test]
    fn test_closed_before_status() {
        let err = parse("").unwrap_err();
        assert!(matches!(err, NetError::Network(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_keep_alive() {
        let resp = parse("HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n").unwrap();
        assert!(!resp.keep_alive());

        let resp = parse("HTTP/1.1 200 OK\r\n\r\n").unwrap();
        assert!(resp.keep_alive());
    }

    #[test]
    fn test_text() {
        let resp = parse("HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\né").unwrap();
        assert_eq!(resp.text().unwrap(), "é");
    }
}

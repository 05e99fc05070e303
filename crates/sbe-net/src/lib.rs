//! sbe Networking
//!
//! URL parsing and document fetching: `file:` and `data:` resources are
//! served locally, `http:`/`https:` go through an HTTP/1.1 client that keeps
//! one pooled connection per endpoint.

pub mod url;
pub mod file;
pub mod tcp;
pub mod tls;
pub mod transport;
pub mod connection_pool;
pub mod http1;
pub mod client;
pub mod fetch;

use std::io;

pub use url::{ParsedUrl, Resource, NetworkLocation, Scheme};
pub use file::{read_local_file, LocalFileError};
pub use tcp::{TcpConnection, TcpConfig, BufferedConnection};
pub use tls::{TlsStream, TlsConfig};
pub use transport::{Transport, Connector, NetConnector};
pub use connection_pool::{ConnectionPool, PooledConnection, HostKey, PoolStats};
pub use http1::{Http1Request, Http1Response, Http1Parser, HttpVersion};
pub use client::{HttpClient, HttpClientBuilder, ClientConfig};
pub use fetch::{Fetcher, Renderer};

/// Fetch a URL string through the process-wide [`Fetcher`]
///
/// Network connections opened here are cached for the lifetime of the
/// process and reused by later calls to the same endpoint.
pub fn fetch(url: &str) -> Result<String, NetError> {
    Fetcher::global().fetch_url(url)
}

/// Network error
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("Unsupported URL scheme in {0}")]
    UnsupportedScheme(String),

    #[error("Malformed port in {0}")]
    MalformedPort(String),

    #[error("Connection to {host}:{port} failed: {source}")]
    ConnectionFailure {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Network error: {0}")]
    Network(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl NetError {
    /// Response declared an encoding the client cannot decode
    pub fn unsupported_encoding(header: &str, value: &str) -> Self {
        NetError::ProtocolViolation(format!("unsupported encoding {}: {}", header, value))
    }

    /// Whether the error happened on (or while opening) a network connection
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            NetError::ConnectionFailure { .. } | NetError::ProtocolViolation(_) | NetError::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NetError::UnsupportedScheme("ftp://x".into());
        assert_eq!(err.to_string(), "Unsupported URL scheme in ftp://x");

        let err = NetError::unsupported_encoding("transfer-encoding", "chunked");
        assert!(err.to_string().contains("transfer-encoding: chunked"));
    }

    #[test]
    fn test_is_network() {
        assert!(NetError::ProtocolViolation("bad".into()).is_network());
        assert!(!NetError::MalformedPort("http://h:x".into()).is_network());
        assert!(!NetError::Io(io::Error::other("disk")).is_network());
    }

    #[test]
    fn test_fetch_data_url() {
        let doc = fetch("view-source:data:<b>hi</b>").unwrap();
        assert_eq!(doc, "<b>hi</b>");
    }
}

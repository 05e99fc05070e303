//! Transport seam between the HTTP engine and the network
//!
//! The engine opens connections through a [`Connector`]: first the TCP
//! stream, then (for https) the TLS layer over that stream. Tests swap in
//! their own connector to observe or script both steps.

use std::io::{self, Read, Write};
use std::sync::{Arc, OnceLock};

use rustls::ClientConfig;

use crate::tcp::{TcpConnection, TcpConfig};
use crate::tls::{create_client_config, TlsStream, TlsConfig};

/// Bidirectional byte stream a request can run over
pub trait Transport: Read + Write + Send {}

impl<T: Read + Write + Send> Transport for T {}

/// Opens transports for the connection pool
pub trait Connector: Send + Sync {
    /// Open a TCP stream to `host:port`
    fn connect(&self, host: &str, port: u16) -> io::Result<Box<dyn Transport>>;

    /// Wrap an established stream in TLS, verifying `host`
    fn handshake(&self, stream: Box<dyn Transport>, host: &str) -> io::Result<Box<dyn Transport>>;
}

/// Real network connector: `std::net` TCP plus rustls
#[derive(Debug, Clone, Default)]
pub struct NetConnector {
    pub tcp: TcpConfig,
    pub tls: TlsConfig,
    /// rustls config built from `tls` on the first handshake
    client_config: OnceLock<Arc<ClientConfig>>,
}

impl NetConnector {
    pub fn new(tcp: TcpConfig, tls: TlsConfig) -> Self {
        Self {
            tcp,
            tls,
            client_config: OnceLock::new(),
        }
    }

    /// The rustls client config, built once per connector
    pub fn client_config(&self) -> io::Result<Arc<ClientConfig>> {
        if let Some(config) = self.client_config.get() {
            return Ok(config.clone());
        }

        let config = create_client_config(&self.tls)?;
        Ok(self.client_config.get_or_init(|| config).clone())
    }
}

impl Connector for NetConnector {
    fn connect(&self, host: &str, port: u16) -> io::Result<Box<dyn Transport>> {
        let conn = TcpConnection::connect_with_config(host, port, &self.tcp)?;
        tracing::debug!("TCP connected to {}", conn.remote_addr());
        Ok(Box::new(conn))
    }

    fn handshake(&self, stream: Box<dyn Transport>, host: &str) -> io::Result<Box<dyn Transport>> {
        let tls = TlsStream::connect(stream, host, self.client_config()?)?;
        tracing::debug!(
            "TLS established with {} ({})",
            tls.server_name(),
            tls.protocol_version().unwrap_or("Unknown")
        );
        Ok(Box::new(tls))
    }
}

//! TLS Layer
//!
//! TLS over an already established stream using rustls, verified against
//! the bundled Mozilla root store.

use std::io::{self, Read, Write};
use std::sync::Arc;

use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use rustls_pki_types::ServerName;

/// TLS configuration
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// ALPN protocols offered to the server
    pub alpn_protocols: Vec<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            alpn_protocols: vec!["http/1.1".into()],
        }
    }
}

/// Create the rustls client configuration, shared by every handshake
pub fn create_client_config(config: &TlsConfig) -> io::Result<Arc<ClientConfig>> {
    let mut root_store = RootCertStore::empty();

    // Add Mozilla's root certificates
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(io::Error::other)?
        .with_root_certificates(root_store)
        .with_no_client_auth();

    tls_config.alpn_protocols = config.alpn_protocols
        .iter()
        .map(|s| s.as_bytes().to_vec())
        .collect();

    Ok(Arc::new(tls_config))
}

/// TLS stream wrapper using rustls
pub struct TlsStream<S: Read + Write> {
    /// Rustls stream owning the transport
    stream: StreamOwned<ClientConnection, S>,
    /// Server name (SNI)
    server_name: String,
}

impl<S: Read + Write> TlsStream<S> {
    /// Run the TLS handshake over `inner`, which must already be connected
    pub fn connect(mut inner: S, server_name: &str, tls_config: Arc<ClientConfig>) -> io::Result<Self> {
        let server_name_parsed = ServerName::try_from(server_name.to_string())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Invalid server name"))?;

        let mut conn = ClientConnection::new(tls_config, server_name_parsed)
            .map_err(io::Error::other)?;

        while conn.is_handshaking() {
            conn.complete_io(&mut inner)?;
        }

        Ok(Self {
            stream: StreamOwned::new(conn, inner),
            server_name: server_name.to_string(),
        })
    }

    /// Get server name
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Get negotiated protocol version
    pub fn protocol_version(&self) -> Option<&'static str> {
        self.stream.conn.protocol_version().map(|v| match v {
            rustls::ProtocolVersion::TLSv1_2 => "TLSv1.2",
            rustls::ProtocolVersion::TLSv1_3 => "TLSv1.3",
            _ => "Unknown",
        })
    }
}

impl<S: Read + Write> Read for TlsStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl<S: Read + Write> Write for TlsStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

//! HTTP Client
//!
//! Runs `GET` requests over pooled keep-alive connections.
//!
//! Any failure while opening a connection or exchanging a request/response
//! evicts the endpoint from the pool and closes the stream before the error
//! is returned. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use crate::connection_pool::{ConnectionPool, HostKey, PooledConnection};
use crate::http1::{Http1Request, Http1Response, Http1Parser};
use crate::tcp::{BufferedConnection, TcpConfig};
use crate::tls::TlsConfig;
use crate::transport::{Connector, NetConnector};
use crate::NetError;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string
    pub user_agent: String,
    /// Keep connections open between requests
    pub keep_alive: bool,
    /// TCP settings for new connections
    pub tcp: TcpConfig,
    /// TLS settings for https connections
    pub tls: TlsConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "toy-browser/1.0".into(),
            keep_alive: true,
            tcp: TcpConfig::default(),
            tls: TlsConfig::default(),
        }
    }
}

/// HTTP client builder
pub struct HttpClientBuilder {
    config: ClientConfig,
    connector: Option<Arc<dyn Connector>>,
    pool: Option<Arc<ConnectionPool>>,
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            connector: None,
            pool: None,
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn user_agent(mut self, ua: &str) -> Self {
        self.config.user_agent = ua.to_string();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.tcp.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.tcp.read_timeout = timeout;
        self.config.tcp.write_timeout = timeout;
        self
    }

    /// Send `Connection: close` and never reuse connections
    pub fn keep_alive(mut self, enabled: bool) -> Self {
        self.config.keep_alive = enabled;
        self
    }

    /// Open connections through `connector` instead of the network
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Share an existing pool
    pub fn pool(mut self, pool: Arc<ConnectionPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn build(self) -> HttpClient {
        let connector = self.connector.unwrap_or_else(|| {
            Arc::new(NetConnector::new(self.config.tcp.clone(), self.config.tls.clone()))
        });

        HttpClient {
            config: self.config,
            pool: self.pool.unwrap_or_default(),
            connector,
        }
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client
#[derive(Clone)]
pub struct HttpClient {
    /// Configuration
    config: ClientConfig,
    /// Connection pool
    pool: Arc<ConnectionPool>,
    /// Opens new connections
    connector: Arc<dyn Connector>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a client builder
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// GET `path` from the endpoint `key`
    pub fn get(&self, key: &HostKey, path: &str) -> Result<Http1Response, NetError> {
        self.request(key, path, Ok)
    }

    /// GET `path` and decode the body as UTF-8 text
    ///
    /// A body that is not valid UTF-8 counts as a protocol violation and
    /// evicts the connection like any other failure.
    pub fn get_text(&self, key: &HostKey, path: &str) -> Result<String, NetError> {
        self.request(key, path, |response| response.text())
    }

    fn request<T>(
        &self,
        key: &HostKey,
        path: &str,
        read: impl FnOnce(Http1Response) -> Result<T, NetError>,
    ) -> Result<T, NetError> {
        let req = self.build_request(key, path);

        let mut conn = match self.pool.acquire(key) {
            Some(conn) => {
                tracing::info!("Reusing existing connection to {}:{}", key.host, key.port);
                conn
            }
            None => self.open(key)?,
        };

        let result = Self::exchange(&mut conn, &req).and_then(|response| {
            let reusable = response.keep_alive();
            read(response).map(|value| (value, reusable))
        });

        match result {
            Ok((value, reusable)) => {
                if self.config.keep_alive && reusable {
                    self.pool.release(conn);
                } else {
                    self.pool.close(conn);
                }
                Ok(value)
            }
            Err(e) => {
                tracing::warn!("Evicting connection {} to {}: {}", conn.id, key, e);
                self.pool.evict(key, Some(conn));
                Err(e)
            }
        }
    }

    fn build_request(&self, key: &HostKey, path: &str) -> Http1Request {
        let connection = if self.config.keep_alive { "keep-alive" } else { "close" };

        Http1Request::get(path)
            .header("Host", &key.host)
            .header("User-Agent", &self.config.user_agent)
            .header("Connection", connection)
    }

    /// Open a connection: TCP first, then TLS over it for https
    fn open(&self, key: &HostKey) -> Result<PooledConnection, NetError> {
        tracing::info!("Creating new connection to {}:{}", key.host, key.port);

        let failure = |source: std::io::Error| NetError::ConnectionFailure {
            host: key.host.to_string(),
            port: key.port,
            source,
        };

        let opened = self.connector.connect(&key.host, key.port)
            .and_then(|stream| {
                if key.is_tls {
                    self.connector.handshake(stream, &key.host)
                } else {
                    Ok(stream)
                }
            });

        match opened {
            Ok(stream) => {
                let stream = BufferedConnection::with_capacity(stream, self.config.tcp.read_buf_size);
                Ok(self.pool.register(key, stream))
            }
            Err(e) => {
                self.pool.evict(key, None);
                Err(failure(e))
            }
        }
    }

    fn exchange(conn: &mut PooledConnection, req: &Http1Request) -> Result<Http1Response, NetError> {
        tracing::debug!("{} {} on connection {}", req.method, req.path, conn.id);

        conn.stream.write_all(&req.serialize()).map_err(NetError::Network)?;
        let response = Http1Parser::parse(&mut conn.stream)?;

        tracing::debug!(
            "{} {} ({} bytes)",
            response.status,
            response.reason,
            response.body.len()
        );
        Ok(response)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

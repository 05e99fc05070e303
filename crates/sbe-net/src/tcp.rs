//! TCP Connection Layer
//!
//! Blocking TCP connections and the line-buffered reader the HTTP engine
//! runs on top of (plain or TLS-wrapped).

use std::io::{self, Read, Write};
use std::net::{TcpStream as StdTcpStream, ToSocketAddrs, SocketAddr};
use std::time::Duration;

/// TCP connection configuration
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Read timeout
    pub read_timeout: Option<Duration>,
    /// Write timeout
    pub write_timeout: Option<Duration>,
    /// TCP nodelay (disable Nagle's algorithm)
    pub nodelay: bool,
    /// Read buffer size
    pub read_buf_size: usize,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Some(Duration::from_secs(60)),
            write_timeout: Some(Duration::from_secs(60)),
            nodelay: true,
            read_buf_size: 8192,
        }
    }
}

/// TCP connection wrapper
#[derive(Debug)]
pub struct TcpConnection {
    /// Underlying stream
    stream: StdTcpStream,
    /// Remote address
    remote_addr: SocketAddr,
}

impl TcpConnection {
    /// Connect to `host:port`, trying each resolved address in turn
    pub fn connect_with_config(host: &str, port: u16, config: &TcpConfig) -> io::Result<Self> {
        Self::connect_any((host, port).to_socket_addrs()?, config)
    }

    /// Connect to the first address that accepts; the last error otherwise
    pub fn connect_any<I>(addrs: I, config: &TcpConfig) -> io::Result<Self>
    where
        I: IntoIterator<Item = SocketAddr>,
    {
        let mut last_err = None;

        for addr in addrs {
            match Self::connect_to_addr(addr, config) {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "DNS resolution failed")
        }))
    }

    /// Connect to a SocketAddr
    pub fn connect_to_addr(addr: SocketAddr, config: &TcpConfig) -> io::Result<Self> {
        let stream = StdTcpStream::connect_timeout(&addr, config.connect_timeout)?;

        stream.set_nodelay(config.nodelay)?;
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;

        Ok(Self {
            stream,
            remote_addr: addr,
        })
    }

    /// Get remote address
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}

impl Read for TcpConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for TcpConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

/// Line-buffered connection
///
/// Bytes read past the end of one response stay buffered for the next one
/// on the same connection.
pub struct BufferedConnection<S> {
    /// Inner stream
    inner: S,
    /// Read buffer
    read_buf: Vec<u8>,
    /// Current read position
    read_pos: usize,
    /// Data available in read buffer
    read_available: usize,
}

impl<S: Read + Write> BufferedConnection<S> {
    /// Create new buffered connection
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, TcpConfig::default().read_buf_size)
    }

    pub fn with_capacity(inner: S, read_buf_size: usize) -> Self {
        Self {
            inner,
            read_buf: vec![0u8; read_buf_size.max(1)],
            read_pos: 0,
            read_available: 0,
        }
    }

    /// Read one line, without its `\n` or `\r\n` terminator
    ///
    /// End of stream before any byte of the line is `UnexpectedEof`.
    pub fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();

        loop {
            while self.read_pos < self.read_available {
                let byte = self.read_buf[self.read_pos];
                self.read_pos += 1;

                if byte == b'\n' {
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    return Ok(line);
                }

                line.push(byte);
            }

            // Need more data
            self.read_pos = 0;
            self.read_available = 0;
            self.read_available = self.inner.read(&mut self.read_buf)?;

            if self.read_available == 0 {
                if line.is_empty() {
                    return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Connection closed"));
                }
                return Ok(line);
            }
        }
    }

    /// Read exactly `count` bytes
    ///
    /// The buffer grows as bytes arrive, so `count` is never allocated up
    /// front. A stream that ends early is `UnexpectedEof`.
    pub fn read_exact(&mut self, count: usize) -> io::Result<Vec<u8>> {
        // First, use buffered data
        let take = (self.read_available - self.read_pos).min(count);
        let mut result = self.read_buf[self.read_pos..self.read_pos + take].to_vec();
        self.read_pos += take;

        // Read the rest directly
        let remaining = (count - take) as u64;
        if remaining > 0 {
            let read = (&mut self.inner).take(remaining).read_to_end(&mut result)?;
            if (read as u64) < remaining {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("Connection closed after {} of {} body bytes", take + read, count),
                ));
            }
        }

        Ok(result)
    }

    /// Write all of `data` and flush
    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.inner.write_all(data)?;
        self.inner.flush()
    }

    /// Bytes received but not consumed yet
    pub fn buffered(&self) -> &[u8] {
        &self.read_buf[self.read_pos..self.read_available]
    }

    /// Get inner stream reference
    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

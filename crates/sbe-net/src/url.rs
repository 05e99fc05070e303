//! Resource Locator
//!
//! Parses URL strings into a typed descriptor. No I/O happens here.

use std::fmt;
use std::str::FromStr;

use crate::connection_pool::HostKey;
use crate::NetError;

const VIEW_SOURCE_PREFIX: &str = "view-source:";
const DATA_PREFIX: &str = "data:";
const FILE_PREFIX: &str = "file://";

/// URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    File,
    Data,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::File => "file",
            Scheme::Data => "data",
        }
    }

    /// Port used when the URL does not name one
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Scheme::Http => Some(80),
            Scheme::Https => Some(443),
            Scheme::File | Scheme::Data => None,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host, port and path of a network resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkLocation {
    pub host: String,
    pub port: u16,
    /// Always starts with `/`
    pub path: String,
}

impl NetworkLocation {
    /// Connection pool key for this location
    pub fn endpoint(&self, is_tls: bool) -> HostKey {
        HostKey::new(&self.host, self.port, is_tls)
    }
}

/// What a URL points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Http(NetworkLocation),
    Https(NetworkLocation),
    /// Local file, path taken verbatim (relative paths resolve against the
    /// working directory)
    File { path: String },
    /// Inline document
    Data { payload: String },
}

/// A parsed URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    resource: Resource,
    view_source: bool,
}

impl ParsedUrl {
    /// Parse a raw URL string
    pub fn parse(raw: &str) -> Result<Self, NetError> {
        let (view_source, rest) = match raw.strip_prefix(VIEW_SOURCE_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let resource = if let Some(payload) = rest.strip_prefix(DATA_PREFIX) {
            Resource::Data { payload: payload.to_string() }
        } else if let Some(path) = rest.strip_prefix(FILE_PREFIX) {
            Resource::File { path: path.to_string() }
        } else if let Some(after) = rest.strip_prefix("http://") {
            Resource::Http(parse_location(raw, after, Scheme::Http)?)
        } else if let Some(after) = rest.strip_prefix("https://") {
            Resource::Https(parse_location(raw, after, Scheme::Https)?)
        } else {
            return Err(NetError::UnsupportedScheme(raw.to_string()));
        };

        Ok(Self { resource, view_source })
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// True when the URL carried a `view-source:` prefix
    pub fn view_source(&self) -> bool {
        self.view_source
    }

    pub fn scheme(&self) -> Scheme {
        match &self.resource {
            Resource::Http(_) => Scheme::Http,
            Resource::Https(_) => Scheme::Https,
            Resource::File { .. } => Scheme::File,
            Resource::Data { .. } => Scheme::Data,
        }
    }

    /// Network location for http/https URLs
    pub fn location(&self) -> Option<&NetworkLocation> {
        match &self.resource {
            Resource::Http(loc) | Resource::Https(loc) => Some(loc),
            Resource::File { .. } | Resource::Data { .. } => None,
        }
    }

    /// Host name, empty for file and data URLs
    pub fn host(&self) -> &str {
        self.location().map(|loc| loc.host.as_str()).unwrap_or("")
    }

    pub fn port(&self) -> Option<u16> {
        self.location().map(|loc| loc.port)
    }

    /// Path of a network or file URL, empty for data URLs
    pub fn path(&self) -> &str {
        match &self.resource {
            Resource::Http(loc) | Resource::Https(loc) => &loc.path,
            Resource::File { path } => path,
            Resource::Data { .. } => "",
        }
    }

    pub fn inline_data(&self) -> Option<&str> {
        match &self.resource {
            Resource::Data { payload } => Some(payload),
            _ => None,
        }
    }

    /// Connection pool key for network URLs
    pub fn endpoint(&self) -> Option<HostKey> {
        match &self.resource {
            Resource::Http(loc) => Some(loc.endpoint(false)),
            Resource::Https(loc) => Some(loc.endpoint(true)),
            Resource::File { .. } | Resource::Data { .. } => None,
        }
    }
}

/// Split `host[:port][/path]` for a network scheme
fn parse_location(raw: &str, rest: &str, scheme: Scheme) -> Result<NetworkLocation, NetError> {
    let (host_part, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };

    let (host, port) = match host_part.split_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>()
                .map_err(|_| NetError::MalformedPort(raw.to_string()))?;
            (host, port)
        }
        None => (host_part, scheme.default_port().unwrap_or(80)),
    };

    Ok(NetworkLocation {
        host: host.to_string(),
        port,
        path: path.to_string(),
    })
}

impl FromStr for ParsedUrl {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ParsedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.view_source {
            f.write_str(VIEW_SOURCE_PREFIX)?;
        }
        match &self.resource {
            Resource::Http(loc) | Resource::Https(loc) => {
                let scheme = self.scheme();
                write!(f, "{}://{}", scheme, loc.host)?;
                if scheme.default_port() != Some(loc.port) {
                    write!(f, ":{}", loc.port)?;
                }
                f.write_str(&loc.path)
            }
            Resource::File { path } => write!(f, "{}{}", FILE_PREFIX, path),
            Resource::Data { payload } => write!(f, "{}{}", DATA_PREFIX, payload),
        }
    }
}

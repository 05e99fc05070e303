//! Browser configuration
//!
//! Read from a JSON file; every field is optional.
//!
//! ```json
//! { "default_url": "http://example.com", "keep_alive": false }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use sbe_net::ClientConfig;
use sbe_text::LayoutConfig;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowserConfig {
    /// Page opened when no URL is given
    pub default_url: String,
    pub user_agent: String,
    /// Reuse connections between requests
    pub keep_alive: bool,
    /// Connect timeout, seconds
    pub connection_timeout_secs: u64,
    /// Read/write timeout, seconds (0 disables)
    pub read_timeout_secs: u64,
    pub width: i32,
    pub hstep: i32,
    pub vstep: i32,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        let layout = LayoutConfig::default();

        Self {
            default_url: "file://test.html".into(),
            user_agent: client.user_agent,
            keep_alive: client.keep_alive,
            connection_timeout_secs: client.tcp.connect_timeout.as_secs(),
            read_timeout_secs: client.tcp.read_timeout.map(|t| t.as_secs()).unwrap_or(0),
            width: layout.width,
            hstep: layout.hstep,
            vstep: layout.vstep,
            log_filter: "info".into(),
        }
    }
}

impl BrowserConfig {
    /// Load from `path`, or defaults when there is none
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                Self::from_json(&text)
                    .with_context(|| format!("parsing config {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Settings for the HTTP client
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig {
            user_agent: self.user_agent.clone(),
            keep_alive: self.keep_alive,
            ..Default::default()
        };
        config.tcp.connect_timeout = Duration::from_secs(self.connection_timeout_secs);
        let read_timeout = (self.read_timeout_secs > 0)
            .then(|| Duration::from_secs(self.read_timeout_secs));
        config.tcp.read_timeout = read_timeout;
        config.tcp.write_timeout = read_timeout;
        config
    }

    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            width: self.width,
            hstep: self.hstep,
            vstep: self.vstep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BrowserConfig::default();
        assert_eq!(config.default_url, "file://test.html");
        assert_eq!(config.user_agent, "toy-browser/1.0");
        assert!(config.keep_alive);
        assert_eq!(config.connection_timeout_secs, 30);
        assert_eq!(config.layout_config(), LayoutConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config = BrowserConfig::from_json(r#"{ "keep_alive": false, "width": 400 }"#).unwrap();
        assert!(!config.keep_alive);
        assert_eq!(config.width, 400);
        assert_eq!(config.user_agent, "toy-browser/1.0");
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(BrowserConfig::from_json(r#"{ "colour": "red" }"#).is_err());
    }

    #[test]
    fn test_client_config() {
        let config = BrowserConfig {
            connection_timeout_secs: 5,
            read_timeout_secs: 0,
            ..Default::default()
        };
        let client = config.client_config();
        assert_eq!(client.tcp.connect_timeout, Duration::from_secs(5));
        assert_eq!(client.tcp.read_timeout, None);
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "default_url": "data:hello" }}"#).unwrap();

        let config = BrowserConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.default_url, "data:hello");
        assert_eq!(BrowserConfig::load(None).unwrap(), BrowserConfig::default());
    }
}

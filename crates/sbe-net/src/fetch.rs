//! Fetcher
//!
//! Turns a [`ParsedUrl`] into document text. Local file errors become the
//! document ("Error: File not found: ..."); network errors are returned.

use std::sync::{Arc, OnceLock};

use crate::client::{ClientConfig, HttpClient};
use crate::connection_pool::ConnectionPool;
use crate::file::{read_local_file, LocalFileError};
use crate::url::{ParsedUrl, Resource};
use crate::NetError;

/// Turns fetched markup into displayable text
pub trait Renderer: Send + Sync {
    fn render(&self, source: &str) -> String;
}

impl<F> Renderer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn render(&self, source: &str) -> String {
        self(source)
    }
}

/// Document fetcher
#[derive(Clone)]
pub struct Fetcher {
    client: HttpClient,
    renderer: Arc<dyn Renderer>,
}

impl Fetcher {
    /// Fetcher with default client settings and tag-stripping rendering
    pub fn new() -> Self {
        Self::with_client(HttpClient::new())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_client(HttpClient::builder().config(config).build())
    }

    pub fn with_client(client: HttpClient) -> Self {
        Self {
            client,
            renderer: Arc::new(sbe_text::render),
        }
    }

    /// Replace the renderer applied to non view-source documents
    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// The process-wide fetcher used by [`crate::fetch`]
    pub fn global() -> &'static Fetcher {
        static GLOBAL: OnceLock<Fetcher> = OnceLock::new();
        GLOBAL.get_or_init(Fetcher::new)
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        self.client.pool()
    }

    /// Parse and fetch a URL string
    pub fn fetch_url(&self, raw: &str) -> Result<String, NetError> {
        let url = ParsedUrl::parse(raw)?;
        self.fetch(&url)
    }

    /// Fetch a document
    ///
    /// The raw text is returned for view-source URLs, otherwise it goes
    /// through the renderer first.
    pub fn fetch(&self, url: &ParsedUrl) -> Result<String, NetError> {
        tracing::info!("Fetching {}", url);

        let source = self.fetch_source(url)?;

        if url.view_source() {
            Ok(source)
        } else {
            Ok(self.renderer.render(&source))
        }
    }

    /// Fetch on the blocking thread pool
    pub async fn fetch_async(&self, url: ParsedUrl) -> Result<String, NetError> {
        let fetcher = self.clone();
        smol::unblock(move || fetcher.fetch(&url)).await
    }

    fn fetch_source(&self, url: &ParsedUrl) -> Result<String, NetError> {
        match url.resource() {
            Resource::File { path } => Self::fetch_file(path),
            Resource::Data { payload } => Ok(payload.clone()),
            Resource::Http(loc) => self.client.get_text(&loc.endpoint(false), &loc.path),
            Resource::Https(loc) => self.client.get_text(&loc.endpoint(true), &loc.path),
        }
    }

    fn fetch_file(path: &str) -> Result<String, NetError> {
        match read_local_file(path) {
            Ok(text) => Ok(text),
            Err(LocalFileError::Io(e)) => Err(NetError::Io(e)),
            Err(e) => {
                tracing::warn!("{}", e);
                Ok(e.placeholder().unwrap_or_default())
            }
        }
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

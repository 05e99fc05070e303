//! Page Loader
//!
//! Fetches documents and lays them out.

use sbe_net::{Fetcher, NetError};
use sbe_text::LayoutConfig;

use crate::config::BrowserConfig;
use crate::page::Page;

/// Page loader
pub struct Loader {
    fetcher: Fetcher,
    layout: LayoutConfig,
}

impl Loader {
    /// Create a loader from browser settings
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            fetcher: Fetcher::with_config(config.client_config()),
            layout: config.layout_config(),
        }
    }

    pub fn with_fetcher(fetcher: Fetcher, layout: LayoutConfig) -> Self {
        Self { fetcher, layout }
    }

    /// Load a page (blocking)
    pub fn load(&self, url: &str) -> Result<Page, NetError> {
        let text = self.fetcher.fetch_url(url)?;
        let page = Page::new(url, text, &self.layout);

        tracing::info!(
            "Loaded {} ({} glyphs, {}px tall)",
            url,
            page.display_list.len(),
            page.content_height(&self.layout)
        );
        Ok(page)
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }
}

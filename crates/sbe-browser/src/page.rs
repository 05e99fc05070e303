//! Page Representation
//!
//! A loaded document, ready to draw.

use sbe_text::{layout, DisplayItem, LayoutConfig};

/// A loaded page
#[derive(Debug)]
pub struct Page {
    /// Page URL
    pub url: String,
    /// Document text (rendered, or raw for view-source)
    pub text: String,
    /// Positioned glyphs
    pub display_list: Vec<DisplayItem>,
}

impl Page {
    /// Lay out `text` for display
    pub fn new(url: &str, text: String, config: &LayoutConfig) -> Self {
        let display_list = layout(&text, config);
        Self {
            url: url.to_string(),
            text,
            display_list,
        }
    }

    /// Height of the laid-out content
    pub fn content_height(&self, config: &LayoutConfig) -> i32 {
        self.display_list.iter()
            .map(|item| item.y)
            .max()
            .map(|y| y + config.vstep)
            .unwrap_or(0)
    }
}

//! sbe Browser
//!
//! Command-line shell around the fetcher: loads one URL, renders it and
//! lays it out on the character grid.

pub mod args;
pub mod config;
pub mod loader;
pub mod page;

pub use args::Args;
pub use config::BrowserConfig;
pub use loader::Loader;
pub use page::Page;

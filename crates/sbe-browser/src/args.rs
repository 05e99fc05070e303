//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

/// Fetch a page and print it as text
#[derive(Debug, Default, PartialEq, Eq, Parser)]
#[command(name = "sbe-browser", version)]
#[command(about = "Fetch a page and print it as text", long_about = None)]
pub struct Args {
    /// URL to open; the configured default when absent
    pub url: Option<String>,

    /// JSON config file
    #[arg(long, env = "SBE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the laid-out glyphs instead of the text
    #[arg(long)]
    pub display_list: bool,
}

//! sbe Browser - Main Entry Point

use anyhow::Context;
use clap::Parser;
use sbe_browser::{Args, BrowserConfig, Loader};
use tracing_subscriber::EnvFilter;

fn main() {
    // Usage errors and --help exit here with clap's own status
    let args = Args::parse();

    if let Err(err) = run(args) {
        eprintln!("sbe-browser error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    // The log filter comes from the config, so config errors are not logged
    let config = BrowserConfig::load(args.config.as_deref())?;
    init_logging(&config);

    let url = args.url.unwrap_or_else(|| config.default_url.clone());
    tracing::info!("Starting sbe browser at {}", url);

    let loader = Loader::new(&config);
    let page = loader.load(&url).with_context(|| format!("failed to load {}", url))?;

    if args.display_list {
        for item in &page.display_list {
            println!("{} {} {}", item.x, item.y, item.glyph);
        }
    } else {
        println!("{}", page.text);
    }

    Ok(())
}

/// Log to stderr; stdout carries only the document
fn init_logging(config: &BrowserConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

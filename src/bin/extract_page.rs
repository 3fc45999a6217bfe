//! Extracts content from a saved page and prints it as JSON.
//!
//! ```text
//! extract_page https://x.com/jack/status/20 page.html
//! curl -s https://example.org/post | extract_page https://example.org/post --items
//! ```
//!
//! Logging goes to stderr; set `RUST_LOG` (default `warn`).

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rs_social_extract::{MemoryPage, Options, StrategyDispatcher};

#[derive(Debug, Parser)]
#[command(name = "extract_page", about = "Extract structured content from a saved social media page")]
struct Cli {
    /// URL the page was saved from; selects the platform.
    url: String,

    /// HTML file to read. Reads stdin when omitted.
    file: Option<PathBuf>,

    /// Options file (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print every item on the page instead of the main one.
    #[arg(long)]
    items: bool,

    /// Print compact JSON.
    #[arg(long)]
    compact: bool,
}

fn read_html(file: Option<&PathBuf>) -> io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut html = String::new();
            io::stdin().read_to_string(&mut html)?;
            Ok(html)
        }
    }
}

fn load_options(path: Option<&PathBuf>) -> Result<Options, String> {
    // A saved page never changes, so nothing is expanded or observed.
    let mut options = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
            Options::from_toml_str(&raw).map_err(|e| e.to_string())?
        }
        None => Options::default(),
    };
    let offline = Options::offline();
    options.throttle = offline.throttle;
    options.features.expand_threads = false;
    options.features.observe_mutations = false;
    Ok(options)
}

fn to_json<T: serde::Serialize>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let options = match load_options(cli.config.as_ref()) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("invalid options: {err}");
            return ExitCode::from(2);
        }
    };
    let html = match read_html(cli.file.as_ref()) {
        Ok(html) => html,
        Err(err) => {
            eprintln!("failed to read page: {err}");
            return ExitCode::FAILURE;
        }
    };

    let page = MemoryPage::new(&cli.url, &html);
    let dispatcher = StrategyDispatcher::new(&options);

    let (json, failed) = if cli.items {
        let items = dispatcher.dispatch_items(&page).await;
        (to_json(&items, cli.compact), items.is_empty())
    } else {
        let dispatched = dispatcher.dispatch(&page).await;
        (to_json(&dispatched.content, cli.compact), dispatched.is_placeholder())
    };
    dispatcher.cleanup();

    match json {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to serialize output: {err}");
            return ExitCode::FAILURE;
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

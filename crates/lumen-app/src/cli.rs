use std::path::PathBuf;

use clap::Parser;

/// Lumen: open a native webview window.
///
/// Command-line values override the config file.
#[derive(Parser, Debug)]
#[command(name = "lumen", version, about)]
pub struct Args {
    /// URL to open. Wins over --html.
    #[arg(short = 'u', long)]
    pub url: Option<String>,

    /// Inline HTML document to show.
    #[arg(long)]
    pub html: Option<String>,

    /// Window title.
    #[arg(short = 't', long)]
    pub title: Option<String>,

    #[arg(long)]
    pub width: Option<i32>,

    #[arg(long)]
    pub height: Option<i32>,

    /// Enable the engine's developer tools.
    #[arg(long)]
    pub devtools: bool,

    /// Run the event loop on a dedicated thread.
    #[arg(long)]
    pub background: bool,

    /// Path to the webview shared library.
    #[arg(long)]
    pub library: Option<PathBuf>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the effective config as JSON and exit.
    #[arg(long)]
    pub print_config: bool,
}

pub fn parse() -> Args {
    Args::parse()
}

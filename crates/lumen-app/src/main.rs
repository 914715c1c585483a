mod cli;
mod launch;

use std::process::ExitCode;
use std::sync::Arc;

use lumen_common::{ConfigError, LumenError};
use lumen_config::LumenConfig;
use tracing_subscriber::EnvFilter;

use launch::LaunchPlan;

/// Defines `window.lumen` helpers around the bound host functions.
const BRIDGE_SCRIPT: &str = "window.lumen = { echo: (...args) => window.echo(...args), quit: () => window.quit() };";

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        eprintln!("\n--- Lumen crashed ---");
        eprintln!("Run with --log-level debug for more detail.");
        eprintln!("---------------------\n");
        default_hook(info);
    }));
}

fn load_config(args: &cli::Args) -> Result<LumenConfig, ConfigError> {
    match &args.config {
        Some(path) => lumen_config::toml_loader::load_from_path(path),
        None => lumen_config::load_config(),
    }
}

/// `--log-level` beats `RUST_LOG`, which beats the config file.
fn init_logging(cli_level: Option<&str>, config_level: &str) {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level)),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn open(plan: &LaunchPlan) -> Result<(), LumenError> {
    let webview = Arc::new(plan.builder().build()?);
    match webview.version() {
        Ok(version) => tracing::info!(version = %version.version_number, "webview engine loaded"),
        Err(e) => tracing::warn!(error = %e, "could not read engine version"),
    }

    webview.bind_json("echo", |args: serde_json::Value| Ok(args))?;
    let handle = Arc::downgrade(&webview);
    webview.bind("quit", move |_| {
        if let Some(webview) = handle.upgrade() {
            webview.close()?;
        }
        Ok(None)
    })?;
    webview.set_init_script_top_only(BRIDGE_SCRIPT)?;

    tracing::info!(mode = ?webview.mode(), "entering webview loop");
    webview.run()?;
    if !webview.is_owner_thread() {
        webview.wait_closed()?;
    }
    tracing::info!("shutdown complete");
    Ok(())
}

fn main() -> ExitCode {
    install_panic_hook();

    let args = cli::parse();

    let loaded = load_config(&args);
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(args.log_level.as_deref(), &config.logging.level);

    tracing::info!("Lumen v{} starting...", env!("CARGO_PKG_VERSION"));
    match &loaded {
        Ok(config) => {
            if let Err(e) = lumen_config::validation::validate(config) {
                tracing::warn!(error = %e, "config has invalid values");
            }
        }
        Err(e) => tracing::warn!(error = %e, "config load failed, using defaults"),
    }

    if args.print_config {
        println!("{}", lumen_config::config_to_json(&config));
        return ExitCode::SUCCESS;
    }

    let plan = LaunchPlan::resolve(&config, &args);
    match open(&plan) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "lumen failed");
            eprintln!("lumen: {e}");
            ExitCode::FAILURE
        }
    }
}

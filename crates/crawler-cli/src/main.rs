//! `crawler-cli` – command line front end for the Crawler motion stack.
//!
//! This binary:
//!
//! 1. Initialises structured logging (`RUST_LOG`, `CRAWLER_LOG_FORMAT=json`,
//!    optional OTLP export via `OTEL_EXPORTER_OTLP_ENDPOINT`).
//! 2. Loads `~/.crawler/config.toml`, writing the reference tuning there on
//!    first run.
//! 3. Drops the user into an **interactive REPL** that runs recipes against
//!    the simulated robot.
//! 4. Routes **Ctrl-C** to the active motion's cancel token; when idle it
//!    exits.

mod config;
mod repl;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use crawler_runtime::{CancelToken, init_tracing};
use crawler_types::CrawlerConfig;
use tracing::warn;

fn main() {
    let _telemetry = init_tracing("crawler");

    print_banner();

    let cancel = CancelToken::new();
    let busy = Arc::new(AtomicBool::new(false));

    let handler_cancel = cancel.clone();
    let handler_busy = Arc::clone(&busy);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        if handler_busy.load(Ordering::SeqCst) {
            println!("{}", "⚠  Ctrl-C received – stopping the robot …".yellow().bold());
            handler_cancel.cancel();
        } else {
            println!("{}", "  ✓ Exiting Crawler.".green());
            std::process::exit(0);
        }
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; motions cannot be interrupted");
    }

    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => first_run(),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            CrawlerConfig::default()
        }
    };

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    repl::run(repl::Session::new(cfg, cancel, busy));
}

/// Write the reference tuning (plus any `CRAWLER_*` overrides) to disk.
fn first_run() -> CrawlerConfig {
    println!();
    println!("  No configuration found. Writing the reference tuning.");

    let mut cfg = CrawlerConfig::default();
    config::apply_env_overrides(&mut cfg);
    if let Err(e) = cfg.validate() {
        println!("{}: {}", "Ignoring invalid overrides".red(), e);
        cfg = CrawlerConfig::default();
    }

    match config::save(&cfg) {
        Ok(()) => println!(
            "  {} Config saved to {}",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    cfg
}

fn print_banner() {
    println!();
    println!("{}", r#"   ___                   __         "#.bold().cyan());
    println!("{}", r#"  / __\ __ __ ___      _/ /__ _ __  "#.bold().cyan());
    println!("{}", r#" / / | '__/ _` \ \ /\ / / / _ \ '__| "#.bold().cyan());
    println!("{}", r#"/ /__| | | (_| |\ V  V /| |  __/ |   "#.bold().cyan());
    println!("{}", r#"\____/_|  \__,_| \_/\_/ |_|\___|_|   "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "Crawler".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Mecanum motion control");
    println!();
}

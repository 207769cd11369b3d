//! Photoframe - a shared photo directory served live to every connected frame.

mod actor;
mod auth;
mod cli;
mod config;
mod core;
mod gateway;
mod logger;
mod photo;
mod realtime;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{FrameConfig, cfg, init_config};
use owo_colors::OwoColorize;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    init_config(FrameConfig::load(&cli)?);
    let config = cfg();

    match &cli.command {
        Commands::Serve { .. } => {
            let password = resolve_password(&config);
            cli::serve::serve(config, &password)
        }
        Commands::List { pretty, .. } => cli::list::list_photos(&config, *pretty),
    }
}

/// Configured admin password, or a fresh one printed once at startup.
fn resolve_password(config: &FrameConfig) -> String {
    if let Some(password) = &config.auth.password {
        return password.clone();
    }

    let password = auth::generate_password();
    log!("auth"; "no admin password configured, generated one for this run");
    log!("auth"; "username: {}  password: {}", config.auth.username, password.bold());
    password
}

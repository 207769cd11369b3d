//! Frame configuration management for `photoframe.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── auth       # [auth]
//! │   ├── serve      # [serve]
//! │   ├── storage    # [storage]
//! │   └── watch      # [watch]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   ├── field      # FieldPath
//! │   └── handle     # Global config handle
//! └── mod.rs         # FrameConfig (this file)
//! ```
//!
//! # Precedence
//!
//! Defaults, then the config file, then environment variables
//! (`PORT`, `ADMIN_USER`, `ADMIN_PASS`, `PHOTOS_DIR`), then CLI flags.

pub mod section;
pub mod types;
mod util;

use util::{find_config_file, resolve_path};

pub use section::{AuthConfig, ServeConfig, StorageConfig, WatchConfig};
pub use types::{ConfigDiagnostics, ConfigError, cfg, init_config};

use crate::cli::{Cli, Commands, ServeArgs};
use crate::log;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing photoframe.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative paths resolve against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl FrameConfig {
    /// Load configuration for the given command line.
    ///
    /// Searches upward from cwd for the config file. A missing file is not
    /// an error: defaults apply and paths resolve against cwd.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                config.config_path = path;
                config
            }
            None => {
                crate::debug!("config"; "{} not found, using defaults", cli.config.display());
                Self {
                    config_path: cwd.join(&cli.config),
                    root: cwd,
                    ..Self::default()
                }
            }
        };

        config.apply_env()?;
        config.apply_command_options(cli);
        config.normalize_paths();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // environment and cli overrides
    // ========================================================================

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides read through `lookup`.
    fn apply_env_with(
        &mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = lookup("PORT") {
            self.serve.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Env("PORT", format!("`{port}` is not a port number")))?;
        }
        if let Some(user) = lookup("ADMIN_USER") {
            self.auth.username = user;
        }
        if let Some(pass) = lookup("ADMIN_PASS") {
            self.auth.password = Some(pass);
        }
        if let Some(dir) = lookup("PHOTOS_DIR") {
            self.storage.dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Serve { args } => self.apply_serve_args(args),
            Commands::List { dir, .. } => {
                Self::update_option(&mut self.storage.dir, dir.as_ref());
            }
        }
    }

    fn apply_serve_args(&mut self, args: &ServeArgs) {
        Self::update_option(&mut self.serve.interface, args.interface.as_ref());
        Self::update_option(&mut self.serve.port, args.port.as_ref());
        Self::update_option(&mut self.storage.dir, args.dir.as_ref());
        Self::update_option(&mut self.watch.enable, args.watch.as_ref());
        Self::update_option(&mut self.watch.poll, args.poll.as_ref());
        if args.ws_port.is_some() {
            self.serve.ws_port = args.ws_port;
        }
        crate::logger::set_verbose(args.verbose);
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve `~` and relative paths against the config root.
    fn normalize_paths(&mut self) {
        self.storage.dir = resolve_path(&self.root, &self.storage.dir);
        if let Some(dir) = &self.serve.public_dir {
            self.serve.public_dir = Some(resolve_path(&self.root, dir));
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.serve.validate(&mut diag);
        self.storage.validate(&mut diag);
        self.watch.validate(&mut diag);
        self.auth.validate(&mut diag);

        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse a config snippet. Panics on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> FrameConfig {
    let (parsed, ignored) = FrameConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

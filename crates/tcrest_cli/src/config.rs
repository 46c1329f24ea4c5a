//! Configuration file support for tcrest.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `TCREST_`, e.g., `TCREST_SERVER_URL`)
//! 3. Config file (./tcrest.toml or ~/.config/tcrest/config.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [server]
//! url = "https://teamcity.example.com"
//! prefix = "/guestAuth"  # optional, requests go to <url><prefix>/app/rest/...
//! timeout = 30           # seconds
//!
//! [output]
//! format = "table"  # or "json"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use tcrest::TeamCity;

use crate::commands::output::OutputFormat;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server connection.
    pub server: ServerConfig,
    /// Output defaults.
    pub output: OutputConfig,
}

/// Server connection.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TeamCity server URL, e.g. "https://teamcity.example.com".
    /// Can also be set via TCREST_SERVER_URL environment variable.
    pub url: Option<String>,
    /// Path prefix placed before `/app/rest`, e.g. "/guestAuth".
    pub prefix: Option<String>,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: None,
            prefix: None,
            timeout: 30,
        }
    }
}

/// Output defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format used when `--output` is not given.
    pub format: OutputFormat,
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/tcrest/config.toml)
    /// 3. Local config file (./tcrest.toml)
    /// 4. Environment variables with TCREST_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(config_path) = Self::default_config_path()
            && config_path.exists()
        {
            tracing::debug!("Loading config from {:?}", config_path);
            builder = builder.add_source(
                File::from(config_path)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("tcrest.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./tcrest.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., TCREST_SERVER_URL -> server.url
        builder = builder.add_source(
            Environment::with_prefix("TCREST")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tcrest").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build a session from the server settings.
    pub fn session(&self) -> Result<TeamCity, Box<dyn std::error::Error>> {
        let url = self.server.url.as_deref().ok_or(
            "No TeamCity server configured. Pass --server, set TCREST_SERVER_URL, \
             or add [server] url to tcrest.toml",
        )?;

        let mut builder =
            TeamCity::builder(url).timeout(Duration::from_secs(self.server.timeout));
        if let Some(prefix) = &self.server.prefix {
            builder = builder.path_prefix(prefix);
        }
        Ok(builder.build()?)
    }
}

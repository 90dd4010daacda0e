//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `ACME_CHAT_BASE_URL` and `ACME_CHAT_LOG_LEVEL` env
//! overrides. Every key has a default, so a missing file still yields a
//! working config pointed at the local backend.

use std::{env, fs, path::Path};

use serde::Deserialize;

use crate::error::AppError;

/// Backend connection configuration (`[backend]` in the TOML).
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Origin of the RAG backend, no trailing slash (e.g. `http://localhost:8000`).
    pub base_url: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// Console presentation configuration (`[console]` in the TOML).
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Heading printed in the startup banner.
    pub title: String,
}

/// Fully-resolved client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub backend: BackendConfig,
    pub console: ConsoleConfig,
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    backend: RawBackend,
    #[serde(default)]
    console: RawConsole,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            backend: RawBackend::default(),
            console: RawConsole::default(),
        }
    }
}

#[derive(Deserialize)]
struct RawBackend {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawBackend {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawConsole {
    #[serde(default = "default_title")]
    title: String,
}

impl Default for RawConsole {
    fn default() -> Self {
        Self { title: default_title() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_title() -> String {
    "Acme Tech Solutions".to_string()
}

/// Load config from `config/default.toml`, then apply env-var overrides.
pub fn load() -> Result<Config, AppError> {
    let base_url_override = env::var("ACME_CHAT_BASE_URL").ok();
    let log_level_override = env::var("ACME_CHAT_LOG_LEVEL").ok();
    load_from(
        Path::new("config/default.toml"),
        base_url_override.as_deref(),
        log_level_override.as_deref(),
    )
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    base_url_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let parsed: RawConfig = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw)
            .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?,
        // Missing file falls back to defaults; anything else is a real error.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => RawConfig::default(),
        Err(e) => {
            return Err(AppError::Config(format!("cannot read {}: {e}", path.display())));
        }
    };

    let base_url = base_url_override
        .unwrap_or(&parsed.backend.base_url)
        .trim_end_matches('/')
        .to_string();
    let log_level = log_level_override.unwrap_or(&parsed.log_level).to_string();

    Ok(Config {
        log_level,
        backend: BackendConfig {
            base_url,
            timeout_seconds: parsed.backend.timeout_seconds,
        },
        console: ConsoleConfig {
            title: parsed.console.title,
        },
    })
}

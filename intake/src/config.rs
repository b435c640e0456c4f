//! Service configuration loading
//!
//! Loads `menage.toml` from the working directory (or the path in
//! `MENAGE_CONFIG`). A missing file yields defaults. Environment overrides
//! are applied on top of whatever the file says.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{IntakeError, Result};

/// Admin token used when nothing else is configured.
pub const DEFAULT_ADMIN_TOKEN: &str = "changeme";

/// Root configuration for the intake service
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IntakeConfig {
    /// Socket address the HTTP server binds
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Shared secret for the admin listing
    #[serde(default = "default_admin_token")]
    pub admin_token: String,

    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Root of the per-submission upload directories
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Rows shown on the admin page
    #[serde(default = "default_admin_list_limit")]
    pub admin_list_limit: usize,
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_admin_token() -> String {
    DEFAULT_ADMIN_TOKEN.to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("instance").join("submissions.sqlite3")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_body_bytes() -> usize {
    32 * 1024 * 1024
}

fn default_admin_list_limit() -> usize {
    100
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            admin_token: default_admin_token(),
            db_path: default_db_path(),
            upload_dir: default_upload_dir(),
            max_body_bytes: default_max_body_bytes(),
            admin_list_limit: default_admin_list_limit(),
        }
    }
}

impl IntakeConfig {
    /// Environment variable that overrides the config path
    pub const ENV_CONFIG_PATH: &'static str = "MENAGE_CONFIG";

    /// Default config filename
    pub const DEFAULT_CONFIG_FILENAME: &'static str = "menage.toml";

    /// Load configuration from the process environment.
    ///
    /// Resolution order for the file:
    /// 1. `explicit` (the `--config` flag)
    /// 2. `MENAGE_CONFIG` environment variable
    /// 3. `./menage.toml`
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with_env(explicit, |key| std::env::var(key).ok())
    }

    /// Same as [`IntakeConfig::load`] with an injected environment lookup.
    pub fn load_with_env<F>(explicit: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = explicit.map(Path::to_path_buf).unwrap_or_else(|| {
            env(Self::ENV_CONFIG_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_FILENAME))
        });

        let mut cfg = if path.exists() {
            Self::load_from_path(&path)?
        } else {
            if explicit.is_some() {
                return Err(IntakeError::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            tracing::info!(path = %path.display(), "Config not found, using defaults");
            Self::default()
        };

        cfg.apply_env(env)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from a specific path, without env overrides
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            IntakeError::config_with_source(
                format!("failed to read config at {}", path.display()),
                e,
            )
        })?;

        Self::parse(&contents)
    }

    /// Parse configuration from TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let cfg: IntakeConfig = toml::from_str(contents)
            .map_err(|e| IntakeError::config_with_source("failed to parse config", e))?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = env("MENAGE_BIND") {
            self.bind = bind;
        } else if let Some(port) = env("PORT") {
            let port: u16 = port.trim().parse().map_err(|e| {
                IntakeError::config_with_source(format!("PORT is not a port number: {port}"), e)
            })?;
            self.bind = with_port(&self.bind, port);
        }
        if let Some(token) = env("ADMIN_TOKEN") {
            self.admin_token = token;
        }
        if let Some(db_path) = env("MENAGE_DB_PATH") {
            self.db_path = PathBuf::from(db_path);
        }
        if let Some(upload_dir) = env("MENAGE_UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(upload_dir);
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.bind.trim().is_empty() {
            return Err(IntakeError::config("bind address is empty"));
        }
        if self.max_body_bytes == 0 {
            return Err(IntakeError::config("max_body_bytes must be > 0"));
        }
        if self.admin_list_limit == 0 {
            return Err(IntakeError::config("admin_list_limit must be > 0"));
        }
        if self.admin_token.is_empty() {
            return Err(IntakeError::config("admin_token is empty"));
        }
        if self.uses_default_token() {
            tracing::warn!("admin_token is the default; set ADMIN_TOKEN before deploying");
        }
        Ok(())
    }

    pub fn uses_default_token(&self) -> bool {
        self.admin_token == DEFAULT_ADMIN_TOKEN
    }
}

/// Replace the port of `bind`, keeping its host part.
fn with_port(bind: &str, port: u16) -> String {
    let host = match bind.rsplit_once(':') {
        Some((host, _)) if !host.is_empty() => host,
        _ => "0.0.0.0",
    };
    format!("{host}:{port}")
}

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Environment prefix for overrides, e.g. `TWISSPARK_SERVER__PORT=9000`.
const ENV_PREFIX: &str = "TWISSPARK_";

/// Environment variable pointing at an explicit config file.
const CONFIG_PATH_ENV: &str = "TWISSPARK_CONFIG";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub responses: ResponsesConfig,
    pub accounts: AccountsConfig,
    pub logging: LoggingConfig,
}

/// HTTP dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of episodes shown on the panel view.
    pub panel_recent_limit: usize,
    /// Idle lifetime of a login session, in seconds.
    pub session_ttl_secs: u64,
}

/// Data directory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

/// Response picker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponsesConfig {
    /// Directory holding the category documents.
    pub dir: PathBuf,
    /// Commands exposed as `GET /{command}`, each backed by `{command}.json`.
    pub commands: Vec<String>,
    /// Placeholder replaced under the substituted policy.
    pub money_token: String,
    pub money_min: u32,
    pub money_max: u32,
}

/// Account and password hashing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    /// Argon2 memory cost in KiB.
    pub hash_memory_kib: u32,
    /// Argon2 iteration count.
    pub hash_iterations: u32,
    /// Largest decoded avatar accepted, in bytes.
    pub avatar_max_bytes: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub default_filter: String,
    /// Override the log directory (defaults to `<data_dir>/logs`).
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            panel_recent_limit: 5,
            session_ttl_secs: 60 * 60 * 24,
        }
    }
}

impl Default for ResponsesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("static/json"),
            commands: ["work", "rob", "crime", "heal", "pay", "deliver", "me"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            money_token: "{dinero}".to_string(),
            money_min: 50,
            money_max: 500,
        }
    }
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            hash_memory_kib: 19 * 1024,
            hash_iterations: 2,
            avatar_max_bytes: 2 * 1024 * 1024,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from `TWISSPARK_CONFIG` or `~/.config/twisspark/config.toml`,
    /// layered with `TWISSPARK_*` environment overrides.
    /// Returns `Default` if the sources cannot be merged.
    pub fn load() -> Self {
        let config_path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(Self::config_path);
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file plus environment overrides.
    pub fn load_from(config_path: &std::path::Path) -> Self {
        if config_path.exists() {
            log::info!("Loading config from {}", config_path.display());
        } else {
            log::debug!(
                "No config file at {}, using defaults and environment",
                config_path.display()
            );
        }

        match Self::figment(config_path).extract() {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Failed to load config from {}: {e}; using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    fn figment(config_path: &std::path::Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("twisspark"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    /// Resolved log directory.
    pub fn log_dir(&self) -> PathBuf {
        self.logging
            .log_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("logs"))
    }

    /// Socket address string the dispatcher binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("twisspark").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}

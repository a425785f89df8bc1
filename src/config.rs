use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use window_graph::{BackendKind, SearchKind, DEFAULT_WINDOW_SECS};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Trailing window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u32,
    #[serde(default)]
    pub backend: BackendKind,
    /// Insertion strategy for the ordered backend.
    #[serde(default)]
    pub search: SearchKind,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            backend: BackendKind::default(),
            search: SearchKind::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_window_secs() -> u32 {
    DEFAULT_WINDOW_SECS
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(path);
        let content = fs::read_to_string(expanded_path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;

        Ok(config)
    }

    /// Load `path` if given, otherwise fall back to defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_secs == 0 {
            anyhow::bail!("window_secs must be at least 1");
        }

        match self.logging.level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            other => anyhow::bail!("Unknown log level: {}", other),
        }

        Ok(())
    }
}

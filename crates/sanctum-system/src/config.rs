//! System configuration.
//!
//! Read from `config/default.toml`; every field has a default, so a missing
//! or partial file is fine. Environment variables override the file:
//!
//! | Variable           | Effect                                     |
//! |--------------------|--------------------------------------------|
//! | `SANCTUM_DATA_DIR` | durable store becomes `<dir>/sanctum.db`   |
//! | `SANCTUM_LOG`      | default log level                          |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SystemError};

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name of the SQLite database inside the data directory.
pub const DATABASE_FILE: &str = "sanctum.db";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub system: SystemSection,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemSection {
    /// Reported in the system info snapshot.
    pub version: String,
    /// Launch apps whose manifest sets `autostart` during boot.
    pub autostart: bool,
}

impl Default for SystemSection {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            autostart: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database backing the durable tier.
    pub path: PathBuf,
    /// Skip the durable tier entirely.
    pub in_memory: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: Path::new("data").join(DATABASE_FILE),
            in_memory: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

impl SystemConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SystemError::Config {
            reason: e.to_string(),
        })
    }

    /// Load `path`, falling back to defaults when it is missing or
    /// malformed.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let (config, fallback) = Self::try_load(path);
        match fallback {
            Some(reason) => tracing::warn!(path = %path.display(), "{reason}"),
            None => tracing::debug!(path = %path.display(), "config loaded"),
        }
        config
    }

    /// Like [`load`](Self::load) but logs nothing: the reason for falling
    /// back to defaults is returned for the caller to report once a
    /// subscriber is installed.
    pub fn try_load(path: impl AsRef<Path>) -> (Self, Option<String>) {
        let content = match std::fs::read_to_string(path.as_ref()) {
            Ok(content) => content,
            Err(e) => {
                return (
                    Self::default(),
                    Some(format!("config not readable ({e}), using defaults")),
                );
            }
        };
        match Self::from_toml_str(&content) {
            Ok(config) => (config, None),
            Err(e) => (
                Self::default(),
                Some(format!("config malformed ({e}), using defaults")),
            ),
        }
    }

    /// Apply `SANCTUM_DATA_DIR` and `SANCTUM_LOG` from the process
    /// environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(dir) = non_empty("SANCTUM_DATA_DIR") {
            self.storage.path = Path::new(&dir).join(DATABASE_FILE);
            self.storage.in_memory = false;
        }
        if let Some(level) = non_empty("SANCTUM_LOG") {
            self.logging.level = level;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = SystemConfig::from_toml_str(
            r#"
            [system]
            autostart = false

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert!(!config.system.autostart);
        assert_eq!(config.system.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn malformed_is_a_config_error() {
        let err = SystemConfig::from_toml_str("[system\nversion = ").unwrap_err();
        assert!(matches!(err, SystemError::Config { .. }));
    }

    #[test]
    fn missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            SystemConfig::load(dir.path().join("absent.toml")),
            SystemConfig::default()
        );
    }

    #[test]
    fn malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "logging = 3 = 4").unwrap();
        assert_eq!(SystemConfig::load(&path), SystemConfig::default());
    }

    #[test]
    fn try_load_reports_why_it_fell_back() {
        let dir = tempfile::tempdir().unwrap();
        let (config, reason) = SystemConfig::try_load(dir.path().join("absent.toml"));
        assert_eq!(config, SystemConfig::default());
        assert!(reason.unwrap().contains("not readable"));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "logging = 3 = 4").unwrap();
        assert!(SystemConfig::try_load(&bad).1.unwrap().contains("malformed"));

        let good = dir.path().join("good.toml");
        std::fs::write(&good, "[logging]\nlevel = \"warn\"\n").unwrap();
        let (config, reason) = SystemConfig::try_load(&good);
        assert_eq!(config.logging.level, "warn");
        assert!(reason.is_none());
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> =
            [("SANCTUM_DATA_DIR", "/var/lib/sanctum"), ("SANCTUM_LOG", "")].into();
        let config = SystemConfig {
            storage: StorageConfig {
                in_memory: true,
                ..StorageConfig::default()
            },
            ..SystemConfig::default()
        }
        .with_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.storage.path, Path::new("/var/lib/sanctum/sanctum.db"));
        assert!(!config.storage.in_memory);
        assert_eq!(config.logging.level, "info");
    }
}

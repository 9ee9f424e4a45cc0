//! Application-level configuration loading: listen port and storage backend selection.

use std::{env, fmt, fs, io::ErrorKind, path::PathBuf, str::FromStr};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TEBOT_BACK_CONFIG_PATH";
const PORT_ENV: &str = "PORT";
const STORE_BACKEND_ENV: &str = "STORE_BACKEND";
const DEFAULT_PORT: u16 = 3000;

/// Which [`DocumentStore`](crate::dao::document_store::DocumentStore) implementation to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local maps; data is lost on restart.
    #[default]
    Memory,
    /// MongoDB, configured by `MONGO_URI`/`MONGO_DB`.
    Mongo,
    /// CouchDB, configured by the `COUCH_*` variables.
    Couch,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Mongo => "mongo",
            StoreBackend::Couch => "couch",
        })
    }
}

/// Backend name that matches no [`StoreBackend`].
#[derive(Debug, Error)]
#[error("unknown store backend `{0}` (expected memory, mongo or couch)")]
pub struct UnknownBackend(String);

impl FromStr for StoreBackend {
    type Err = UnknownBackend;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "couch" | "couchdb" => Ok(StoreBackend::Couch),
            _ => Err(UnknownBackend(value.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration resolved once at startup.
pub struct AppConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Selected storage backend.
    pub store: StoreBackend,
}

impl AppConfig {
    /// Load the configuration file, then apply `PORT` and `STORE_BACKEND` from the environment.
    pub fn load() -> Self {
        Self::from_file().with_overrides(env::var(PORT_ENV).ok(), env::var(STORE_BACKEND_ENV).ok())
    }

    fn from_file() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        port = app_config.port,
                        store = %app_config.store,
                        "loaded config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Environment values win over the file; unparseable ones are ignored with a warning.
    fn with_overrides(mut self, port: Option<String>, store: Option<String>) -> Self {
        if let Some(raw) = port {
            match raw.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(err) => warn!(value = %raw, error = %err, "ignoring invalid {PORT_ENV}"),
            }
        }
        if let Some(raw) = store {
            match raw.parse::<StoreBackend>() {
                Ok(store) => self.store = store,
                Err(err) => warn!(error = %err, "ignoring invalid {STORE_BACKEND_ENV}"),
            }
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            store: StoreBackend::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    store: Option<StoreBackend>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            port: value.port.unwrap_or(defaults.port),
            store: value.store.unwrap_or(defaults.store),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{"store": "couch"}"#).unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.store, StoreBackend::Couch);
    }

    #[test]
    fn environment_overrides_file_values() {
        let config = AppConfig::default().with_overrides(Some("8081".into()), Some("Mongo".into()));
        assert_eq!(
            config,
            AppConfig {
                port: 8081,
                store: StoreBackend::Mongo,
            }
        );
    }

    #[test]
    fn invalid_overrides_are_ignored() {
        let config =
            AppConfig::default().with_overrides(Some("not-a-port".into()), Some("redis".into()));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn backend_names_accept_long_forms() {
        assert_eq!("mongodb".parse::<StoreBackend>().unwrap(), StoreBackend::Mongo);
        assert_eq!(" CouchDB ".parse::<StoreBackend>().unwrap(), StoreBackend::Couch);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }
}

use std::time::Duration;

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime configuration describing how to reach the CouchDB database.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server root, e.g. `http://localhost:5984`.
    pub base_url: String,
    /// Database holding every collection.
    pub database: String,
    /// Basic auth user and password.
    pub credentials: Option<(String, String)>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl CouchConfig {
    /// Anonymous access with the default timeout.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            credentials: None,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Authenticate with basic auth.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Build a configuration from `COUCH_BASE_URL`, `COUCH_DB` and the optional
    /// `COUCH_USERNAME`/`COUCH_PASSWORD`/`COUCH_TIMEOUT_SECS` variables.
    pub fn from_env() -> CouchResult<Self> {
        let base_url = required_var("COUCH_BASE_URL")?;
        let database = required_var("COUCH_DB")?;

        let mut config = Self::new(base_url, database);

        if let (Ok(username), Ok(password)) = (
            std::env::var("COUCH_USERNAME"),
            std::env::var("COUCH_PASSWORD"),
        ) {
            config = config.with_credentials(username, password);
        }

        if let Some(seconds) = std::env::var("COUCH_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_secs(seconds);
        }

        Ok(config)
    }
}

fn required_var(var: &'static str) -> CouchResult<String> {
    std::env::var(var).map_err(|_| CouchDaoError::MissingEnvVar { var })
}

//! Server configuration read from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `DYNLANG_DB_PATH` | `dynlang.db` |
//! | `DYNLANG_PORT` | `3001` |
//! | `DYNLANG_BIND` | `0.0.0.0` |
//! | `DYNLANG_COLLABORATOR_TIMEOUT_MS` | `10000` |
//! | `DYNLANG_VALIDATE_BOUND_DATA` | `false` |

use std::time::Duration;

use dynlang_core::BoundDataPolicy;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub db_path: String,
    pub bind: String,
    pub port: u16,
    /// Upper bound on any single collaborator call.
    pub collaborator_timeout: Duration,
    pub bound_data_policy: BoundDataPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            db_path: "dynlang.db".to_string(),
            bind: "0.0.0.0".to_string(),
            port: 3001,
            collaborator_timeout: Duration::from_millis(10_000),
            bound_data_policy: BoundDataPolicy::Permissive,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source. Unset variables
    /// keep their defaults; unparsable ones are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = ServerConfig::default();
        if let Some(path) = lookup("DYNLANG_DB_PATH") {
            config.db_path = path;
        }
        if let Some(bind) = lookup("DYNLANG_BIND") {
            config.bind = bind;
        }
        if let Some(port) = lookup("DYNLANG_PORT") {
            config.port = port
                .parse()
                .map_err(|_| format!("DYNLANG_PORT: invalid port '{port}'"))?;
        }
        if let Some(ms) = lookup("DYNLANG_COLLABORATOR_TIMEOUT_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| format!("DYNLANG_COLLABORATOR_TIMEOUT_MS: invalid duration '{ms}'"))?;
            config.collaborator_timeout = Duration::from_millis(ms);
        }
        if let Some(flag) = lookup("DYNLANG_VALIDATE_BOUND_DATA") {
            config.bound_data_policy = match flag.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => BoundDataPolicy::Validate,
                "0" | "false" | "no" | "" => BoundDataPolicy::Permissive,
                other => return Err(format!("DYNLANG_VALIDATE_BOUND_DATA: expected a boolean, got '{other}'")),
            };
        }
        Ok(config)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

//! Server configuration and environment variable handling.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::auth::AuthConfig;
use crate::db::RepositoryType;
use crate::services::DEFAULT_FETCH_DEADLINE;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Configuration for the HTTP server, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind (default: 0.0.0.0)
    pub host: String,
    /// Port to bind (default: 8080)
    pub port: u16,
    /// Session token verification settings
    pub auth: AuthConfig,
    /// Upper bound on one survey fetch
    pub fetch_deadline: Duration,
    /// Backend serving survey responses
    pub repository_type: RepositoryType,
}

impl ServerConfig {
    /// Create a new server configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `JWT_SECRET` (required): HMAC secret shared with the login endpoint
    /// - `HOST` (optional, default: 0.0.0.0)
    /// - `PORT` (optional, default: 8080)
    /// - `AUTH_ISSUER` (optional): required `iss` claim
    /// - `AUTH_REQUIRE_EXP` (optional, default: false): reject tokens without `exp`
    /// - `FETCH_DEADLINE_MS` (optional, default: 10000)
    /// - `REPOSITORY_TYPE` (optional): `postgres` | `local`; see [`RepositoryType::from_env`]
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|key| env::var(key).ok())?;
        config.repository_type = RepositoryType::from_env();
        Ok(config)
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// `repository_type` is left as `Local` unless `REPOSITORY_TYPE` is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                expected: "a valid port number",
                value: raw,
            })?,
            None => 8080,
        };

        let issuer = lookup("AUTH_ISSUER").filter(|s| !s.is_empty());

        let require_exp = match lookup("AUTH_REQUIRE_EXP") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::Invalid {
                name: "AUTH_REQUIRE_EXP",
                expected: "true or false",
                value: raw,
            })?,
            None => false,
        };

        let fetch_deadline = match lookup("FETCH_DEADLINE_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .ok_or(ConfigError::Invalid {
                    name: "FETCH_DEADLINE_MS",
                    expected: "a positive number of milliseconds",
                    value: raw,
                })?,
            None => DEFAULT_FETCH_DEADLINE,
        };

        let repository_type = match lookup("REPOSITORY_TYPE") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "REPOSITORY_TYPE",
                expected: "postgres or local",
                value: raw,
            })?,
            None => RepositoryType::Local,
        };

        Ok(Self {
            host,
            port,
            auth: AuthConfig {
                secret,
                issuer,
                require_exp,
            },
            fetch_deadline,
            repository_type,
        })
    }

    /// Socket address to bind.
    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: "HOST",
                expected: "an IP address",
                value: self.host.clone(),
            })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

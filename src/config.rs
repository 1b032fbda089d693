//! # Environment-driven configuration
//!
//! On the platform everything arrives through environment variables:
//! `K_SERVICE` and `PORT` are injected at instance boot, the
//! `WARM_HANDOFF_*` variables tune the agent itself.
use crate::handoff::self_call::SelfCallConfig;
use crate::metadata::DEFAULT_METADATA_ENDPOINT;
use crate::server::ServerConfig;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Platform-supplied variable naming the running service.
pub const SERVICE_NAME_ENV: &str = "K_SERVICE";
/// Platform-supplied variable naming the port of the request listener.
pub const PORT_ENV: &str = "PORT";
pub const METADATA_ENDPOINT_ENV: &str = "WARM_HANDOFF_METADATA_ENDPOINT";
pub const CONTROL_PLANE_ENDPOINT_ENV: &str = "WARM_HANDOFF_CONTROL_PLANE_ENDPOINT";
pub const DEADLINE_ENV: &str = "WARM_HANDOFF_DEADLINE";
pub const ATTEMPT_INTERVAL_ENV: &str = "WARM_HANDOFF_ATTEMPT_INTERVAL";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set or empty")]
    MissingEnv(&'static str),
    #[error("invalid value for `{var}`: `{err}`")]
    InvalidValue { var: &'static str, err: String },
}

/// Name of the running service. Immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceName(String);

impl TryFrom<String> for ServiceName {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(ConfigError::MissingEnv(SERVICE_NAME_ENV));
        }
        Ok(Self(value))
    }
}

impl ServiceName {
    /// Reads the platform-provided service name. Empty counts as absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        env::var(SERVICE_NAME_ENV).unwrap_or_default().try_into()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub server: ServerConfig,
    pub metadata_endpoint: Url,
    pub control_plane_endpoint: Option<Url>,
    pub self_call: SelfCallConfig,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match optional_env(PORT_ENV) {
            Some(value) => value.parse().map_err(|err: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    var: PORT_ENV,
                    err: err.to_string(),
                }
            })?,
            None => ServerConfig::default().port,
        };

        let metadata_endpoint = match optional_env(METADATA_ENDPOINT_ENV) {
            Some(value) => parse_url(METADATA_ENDPOINT_ENV, &value)?,
            None => Url::parse(DEFAULT_METADATA_ENDPOINT).expect("constant valid URL"),
        };

        let control_plane_endpoint = optional_env(CONTROL_PLANE_ENDPOINT_ENV)
            .map(|value| parse_url(CONTROL_PLANE_ENDPOINT_ENV, &value))
            .transpose()?;

        let mut self_call = SelfCallConfig::default();
        if let Some(value) = optional_env(DEADLINE_ENV) {
            self_call.deadline = parse_duration(DEADLINE_ENV, &value)?;
        }
        if let Some(value) = optional_env(ATTEMPT_INTERVAL_ENV) {
            self_call.attempt_interval = parse_duration(ATTEMPT_INTERVAL_ENV, &value)?;
        }

        Ok(Self {
            server: ServerConfig {
                port,
                ..Default::default()
            },
            metadata_endpoint,
            control_plane_endpoint,
            self_call,
        })
    }
}

fn optional_env(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.is_empty())
}

fn parse_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|err| ConfigError::InvalidValue {
        var,
        err: err.to_string(),
    })
}

fn parse_duration(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    duration_str::parse(value).map_err(|err| ConfigError::InvalidValue {
        var,
        err: err.to_string(),
    })
}

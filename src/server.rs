//! # Request server
//!
//! The application-facing listener. It is an external collaborator of the
//! hand-off core: it serves a placeholder responder and the core never
//! depends on it beyond sharing the process.
pub mod handler;
pub mod runner;

use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
pub(crate) const DEFAULT_WORKERS: usize = 2;

/// Listener settings. The port comes from the platform-provided `PORT`
/// variable.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Error, Debug)]
pub enum RequestServerError {
    #[error("timeout after {0:?} waiting for the request server to start")]
    StartupTimeout(Duration),
    #[error("the request server startup channel was closed")]
    StartupChannelClosed,
    #[error("could not bind the listener: `{0}`")]
    BindError(String),
}

//! Logging setup. Everything is written to stdout, the platform captures it
//! from there.
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const DEFAULT_FILTER: &str = "info";

/// Represents errors while setting up tracing.
#[derive(Error, Debug)]
pub enum TracingError {
    #[error("could not start tracing: {0}")]
    Init(String),
}

/// Initializes the global subscriber with an env-filtered stdout layer.
pub fn try_init_tracing() -> Result<(), TracingError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .boxed();
    Registry::default()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|err| TracingError::Init(err.to_string()))
}

//! # Warm hand-off sequence
//!
//! One full hand-off: resolve where this instance runs, find the public URL
//! of its own service through the control plane and call that URL until a
//! warm replacement instance answers.
pub mod orchestrator;
pub mod self_call;

use crate::config::{ConfigError, ServiceName};
use crate::control_plane::{ResolveError, ServiceLocator};
use crate::credentials::ambient::AmbientTokenProvider;
use crate::credentials::identity::IdentityTokenProvider;
use crate::http::client::HttpClient;
use crate::metadata::{MetadataClient, MetadataError};
use self_call::{SelfCallError, SelfCaller};
use thiserror::Error;
use tracing::info;
use url::Url;

#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("could not resolve the instance placement: `{0}`")]
    Metadata(#[from] MetadataError),
    #[error("could not determine the service name: `{0}`")]
    MissingServiceName(#[from] ConfigError),
    #[error("could not resolve the service URL: `{0}`")]
    EndpointResolution(#[from] ResolveError),
    #[error("self call did not succeed: `{0}`")]
    SelfCall(#[from] SelfCallError),
}

/// A runnable shutdown sequence. The orchestrator only depends on this seam.
pub trait HandoffSequence {
    /// Runs the sequence to completion, returning the endpoint that answered.
    fn execute(&self) -> Result<Url, HandoffError>;
}

pub struct WarmHandoff<C> {
    metadata: MetadataClient<C>,
    locator: ServiceLocator<C, AmbientTokenProvider<C>>,
    self_caller: SelfCaller<C>,
}

impl<C: HttpClient> WarmHandoff<C> {
    pub fn new(
        metadata: MetadataClient<C>,
        locator: ServiceLocator<C, AmbientTokenProvider<C>>,
        self_caller: SelfCaller<C>,
    ) -> Self {
        Self {
            metadata,
            locator,
            self_caller,
        }
    }
}

impl<C: HttpClient> HandoffSequence for WarmHandoff<C> {
    fn execute(&self) -> Result<Url, HandoffError> {
        let placement = self.metadata.project_and_region()?;
        info!(
            project_number = %placement.project_number,
            region = %placement.region,
            "resolved instance placement"
        );

        let service = ServiceName::from_env()?;
        let endpoint = self.locator.service_url(&placement, &service)?;
        info!(%endpoint, "resolved service URL, performing self call");

        let token_provider = IdentityTokenProvider::new(self.metadata.clone(), endpoint.clone());
        self.self_caller.call(&endpoint, &token_provider)?;
        Ok(endpoint)
    }
}

//! # Credential providers
//!
//! The agent needs two kinds of platform credentials: an ambient
//! service-account token for control-plane calls and an audience-scoped
//! identity token for the self call. Both sit behind [`TokenProvider`] so
//! call sites never know which mechanism supplies a given call's
//! authorization.
pub mod ambient;
pub mod identity;

use crate::metadata::MetadataError;
use std::fmt;
use thiserror::Error;

/// Opaque bearer credential attached to outbound calls.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl From<String> for BearerToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens must not leak through debug logging.
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[derive(Error, Debug)]
pub enum TokenProviderError {
    #[error("`{0}`")]
    Metadata(#[from] MetadataError),
    #[error("could not decode the token document: `{0}`")]
    Decode(#[from] serde_json::Error),
    #[error("the token document contained an empty token")]
    EmptyToken,
}

/// Supplies the bearer credential for an outbound call.
pub trait TokenProvider {
    fn retrieve(&self) -> Result<BearerToken, TokenProviderError>;
}

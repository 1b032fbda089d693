use super::{BearerToken, TokenProvider, TokenProviderError};
use crate::http::client::HttpClient;
use crate::metadata::MetadataClient;
use url::Url;

/// Audience-scoped identity tokens from the metadata endpoint. The audience
/// must be the exact URL the token will be presented to.
pub struct IdentityTokenProvider<C> {
    metadata: MetadataClient<C>,
    audience: Url,
}

impl<C> IdentityTokenProvider<C> {
    pub fn new(metadata: MetadataClient<C>, audience: Url) -> Self {
        Self { metadata, audience }
    }
}

impl<C: HttpClient> TokenProvider for IdentityTokenProvider<C> {
    fn retrieve(&self) -> Result<BearerToken, TokenProviderError> {
        let token = self.metadata.identity_token(&self.audience)?;
        if token.is_empty() {
            return Err(TokenProviderError::EmptyToken);
        }
        Ok(BearerToken::from(token))
    }
}

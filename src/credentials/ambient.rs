use super::{BearerToken, TokenProvider, TokenProviderError};
use crate::http::client::HttpClient;
use crate::metadata::MetadataClient;
use serde::Deserialize;

/// Minimal decode of the service-account token document, only the access
/// token is load-bearing.
#[derive(Deserialize)]
struct TokenDocument {
    access_token: String,
}

/// Ambient default credentials: the access token of the instance's default
/// service account, as handed out by the metadata endpoint.
pub struct AmbientTokenProvider<C> {
    metadata: MetadataClient<C>,
}

impl<C> AmbientTokenProvider<C> {
    pub fn new(metadata: MetadataClient<C>) -> Self {
        Self { metadata }
    }
}

impl<C: HttpClient> TokenProvider for AmbientTokenProvider<C> {
    fn retrieve(&self) -> Result<BearerToken, TokenProviderError> {
        let body = self.metadata.service_account_token()?;
        let document: TokenDocument = serde_json::from_slice(&body)?;
        if document.access_token.is_empty() {
            return Err(TokenProviderError::EmptyToken);
        }
        Ok(BearerToken::from(document.access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::client::HttpClientReqwest;
    use crate::http::config::HttpConfig;
    use assert_matches::assert_matches;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;
    use std::sync::Arc;
    use url::Url;

    fn provider(server: &MockServer) -> AmbientTokenProvider<HttpClientReqwest> {
        let http_client = HttpClientReqwest::try_new(HttpConfig::default()).unwrap();
        let metadata = MetadataClient::new(
            Arc::new(http_client),
            Url::parse(&server.base_url()).unwrap(),
        );
        AmbientTokenProvider::new(metadata)
    }

    #[test]
    fn decodes_the_access_token_only() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/computeMetadata/v1/instance/service-accounts/default/token")
                .header("Metadata-Flavor", "Google");
            then.status(200).json_body(json!({
                "access_token": "ambient-token",
                "expires_in": 3599,
                "token_type": "Bearer"
            }));
        });

        let token = provider(&server).retrieve().unwrap();

        assert_eq!(token.as_str(), "ambient-token");
        mock.assert();
    }

    #[test]
    fn invalid_document_is_a_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/computeMetadata/v1/instance/service-accounts/default/token");
            then.status(200).body("{ not json");
        });

        let result = provider(&server).retrieve();

        assert_matches!(result, Err(TokenProviderError::Decode(_)));
    }

    #[test]
    fn empty_access_token_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/computeMetadata/v1/instance/service-accounts/default/token");
            then.status(200).json_body(json!({"access_token": ""}));
        });

        let result = provider(&server).retrieve();

        assert_matches!(result, Err(TokenProviderError::EmptyToken));
    }
}

//! # Instance metadata endpoint client
//!
//! The metadata endpoint is a network-local service exposing facts about the
//! running instance (placement, credentials) that are unreachable from
//! outside the instance. All queries carry the `Metadata-Flavor: Google`
//! header.
pub mod placement;

use crate::http::client::{HttpClient, HttpClientError};
use http::{HeaderMap, HeaderValue};
use placement::{InstancePlacement, PlacementParseError};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Default instance metadata endpoint.
pub const DEFAULT_METADATA_ENDPOINT: &str = "http://metadata.google.internal";

const REGION_PATH: &str = "/computeMetadata/v1/instance/region";
const IDENTITY_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/identity";
const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

const FLAVOR_HEADER: &str = "Metadata-Flavor";
const FLAVOR_VALUE: &str = "Google";

#[derive(Error, Debug)]
pub enum MetadataError {
    /// Internal HTTP error.
    #[error("`{0}`")]
    HttpError(#[from] HttpClientError),
    /// Error building the query URL.
    #[error("metadata URL error: `{0}`")]
    UrlError(String),
    /// Unsuccessful HTTP response.
    #[error("status code: `{0}`, canonical reason: `{1}`")]
    UnsuccessfulResponse(u16, String),
    /// The endpoint answered bytes that are not text.
    #[error("metadata response is not valid UTF-8: `{0}`")]
    InvalidBody(#[from] std::string::FromUtf8Error),
    /// The placement path did not match the expected shape.
    #[error("malformed placement path: {0}")]
    MalformedPlacement(#[from] PlacementParseError),
}

/// Client for the local instance metadata endpoint.
pub struct MetadataClient<C> {
    http_client: Arc<C>,
    endpoint: Url,
}

impl<C> Clone for MetadataClient<C> {
    fn clone(&self) -> Self {
        Self {
            http_client: self.http_client.clone(),
            endpoint: self.endpoint.clone(),
        }
    }
}

impl<C: HttpClient> MetadataClient<C> {
    pub fn new(http_client: Arc<C>, endpoint: Url) -> Self {
        Self {
            http_client,
            endpoint,
        }
    }

    /// Resolves the placement of the running instance. The endpoint answers a
    /// `projects/<projectNumber>/regions/<region>` path which is parsed
    /// structurally; malformed answers are a typed error.
    pub fn project_and_region(&self) -> Result<InstancePlacement, MetadataError> {
        let path = self.get_text(REGION_PATH, &[])?;
        Ok(path.trim().parse()?)
    }

    /// Fetches a short-lived identity token bound to `audience`. Tokens issued
    /// for one audience are not valid for another.
    pub fn identity_token(&self, audience: &Url) -> Result<String, MetadataError> {
        self.get_text(IDENTITY_PATH, &[("audience", audience.as_str())])
    }

    /// Fetches the token document of the default service account. The caller
    /// decodes it.
    pub fn service_account_token(&self) -> Result<Vec<u8>, MetadataError> {
        self.get(TOKEN_PATH, &[])
    }

    fn get_text(&self, path: &str, query: &[(&str, &str)]) -> Result<String, MetadataError> {
        Ok(String::from_utf8(self.get(path, query)?)?)
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<u8>, MetadataError> {
        let mut url = self
            .endpoint
            .join(path)
            .map_err(|err| MetadataError::UrlError(err.to_string()))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let mut headers = HeaderMap::new();
        headers.insert(FLAVOR_HEADER, HeaderValue::from_static(FLAVOR_VALUE));

        let response = self.http_client.get(url.to_string(), headers)?;
        if !response.status().is_success() {
            return Err(MetadataError::UnsuccessfulResponse(
                response.status().as_u16(),
                response
                    .status()
                    .canonical_reason()
                    .unwrap_or_default()
                    .to_string(),
            ));
        }
        Ok(response.into_body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::client::tests::MockHttpClientMock;
    use assert_matches::assert_matches;
    use http::Response;

    fn client(mock: MockHttpClientMock) -> MetadataClient<MockHttpClientMock> {
        MetadataClient::new(
            Arc::new(mock),
            Url::parse("http://metadata.google.internal").unwrap(),
        )
    }

    #[test]
    fn project_and_region_parses_the_placement_path() {
        let mut mock = MockHttpClientMock::new();
        mock.expect_send()
            .once()
            .withf(|request| {
                request.uri().path() == "/computeMetadata/v1/instance/region"
                    && request
                        .headers()
                        .get("Metadata-Flavor")
                        .is_some_and(|v| v == "Google")
            })
            .returning(|_| {
                Ok(Response::builder()
                    .status(200)
                    .body(b"projects/123456/regions/europe-west1".to_vec())
                    .unwrap())
            });

        let placement = client(mock).project_and_region().unwrap();

        assert_eq!(placement.project_number, "123456");
        assert_eq!(placement.region, "europe-west1");
    }

    #[test]
    fn malformed_placement_is_a_typed_error() {
        let mut mock = MockHttpClientMock::new();
        mock.should_send(
            Response::builder()
                .status(200)
                .body(b"unexpected".to_vec())
                .unwrap(),
        );

        let result = client(mock).project_and_region();

        assert_matches!(result, Err(MetadataError::MalformedPlacement(_)));
    }

    #[test]
    fn unsuccessful_response_is_reported() {
        let mut mock = MockHttpClientMock::new();
        mock.should_send(Response::builder().status(404).body(Vec::new()).unwrap());

        let result = client(mock).project_and_region();

        assert_matches!(result, Err(MetadataError::UnsuccessfulResponse(404, _)));
    }

    #[test]
    fn transport_errors_propagate() {
        let mut mock = MockHttpClientMock::new();
        mock.should_not_send(HttpClientError::TransportError("connection reset".into()));

        let result = client(mock).project_and_region();

        assert_matches!(result, Err(MetadataError::HttpError(_)));
    }

    #[test]
    fn identity_token_carries_the_audience() {
        let audience = Url::parse("https://myapp-abcd.run.app").unwrap();
        let mut mock = MockHttpClientMock::new();
        mock.expect_send()
            .once()
            .withf(|request| {
                let uri = request.uri();
                uri.path() == "/computeMetadata/v1/instance/service-accounts/default/identity"
                    && uri
                        .query()
                        .is_some_and(|q| q.contains("audience=https%3A%2F%2Fmyapp-abcd.run.app"))
            })
            .returning(|_| {
                Ok(Response::builder()
                    .status(200)
                    .body(b"header.payload.signature".to_vec())
                    .unwrap())
            });

        let token = client(mock).identity_token(&audience).unwrap();

        assert_eq!(token, "header.payload.signature");
    }
}

//! # Control-plane service locator
//!
//! Translates the (region, project number, service name) triple into the
//! service's externally reachable base URL by querying the platform's
//! management API with the ambient service-account credential.
use crate::config::ServiceName;
use crate::credentials::{TokenProvider, TokenProviderError};
use crate::http::client::{HttpClient, HttpClientError};
use crate::metadata::placement::InstancePlacement;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Domain of the control-plane API; the regional endpoint is derived as
/// `https://<region>-<domain>`.
const API_DOMAIN: &str = "run.googleapis.com";
const SERVICES_PATH: &str = "apis/serving.knative.dev/v1/namespaces";

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("could not obtain control-plane credentials: `{0}`")]
    Credentials(#[from] TokenProviderError),
    #[error("could not build auth headers: `{0}`")]
    AuthorizationHeaders(String),
    #[error("`{0}`")]
    HttpError(#[from] HttpClientError),
    #[error("control-plane URL error: `{0}`")]
    UrlError(String),
    #[error("status code: `{0}`, canonical reason: `{1}`")]
    UnsuccessfulResponse(u16, String),
    #[error("could not decode the service document: `{0}`")]
    Decode(#[from] serde_json::Error),
    #[error("the service document has no status.url")]
    MissingUrl,
}

/// Minimal decode of the service document, only `status.url` is load-bearing.
#[derive(Deserialize)]
struct ServiceDocument {
    #[serde(default)]
    status: Option<ServiceStatus>,
}

#[derive(Deserialize)]
struct ServiceStatus {
    #[serde(default)]
    url: Option<String>,
}

pub struct ServiceLocator<C, T> {
    http_client: Arc<C>,
    token_provider: T,
    endpoint_override: Option<Url>,
}

impl<C, T> ServiceLocator<C, T>
where
    C: HttpClient,
    T: TokenProvider,
{
    pub fn new(http_client: Arc<C>, token_provider: T) -> Self {
        Self {
            http_client,
            token_provider,
            endpoint_override: None,
        }
    }

    /// Replaces the derived regional endpoint, used when targeting an
    /// emulator or a test double.
    pub fn with_endpoint(self, endpoint: Url) -> Self {
        Self {
            endpoint_override: Some(endpoint),
            ..self
        }
    }

    /// Resolves the externally reachable base URL of `service`. An absent or
    /// empty `status.url` in the document is an explicit resolution failure.
    pub fn service_url(
        &self,
        placement: &InstancePlacement,
        service: &ServiceName,
    ) -> Result<Url, ResolveError> {
        let api_url = self.api_url(placement, service)?;
        let token = self.token_provider.retrieve()?;

        let mut auth_value =
            HeaderValue::from_str(&format!("Bearer {}", token.as_str())).map_err(|err| {
                ResolveError::AuthorizationHeaders(format!(
                    "error converting the token to a header value: {err}"
                ))
            })?;
        auth_value.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);

        let response = self.http_client.get(api_url.to_string(), headers)?;
        if !response.status().is_success() {
            return Err(ResolveError::UnsuccessfulResponse(
                response.status().as_u16(),
                response
                    .status()
                    .canonical_reason()
                    .unwrap_or_default()
                    .to_string(),
            ));
        }

        let document: ServiceDocument = serde_json::from_slice(response.body())?;
        let url = document
            .status
            .and_then(|status| status.url)
            .filter(|url| !url.is_empty())
            .ok_or(ResolveError::MissingUrl)?;
        Url::parse(&url).map_err(|err| ResolveError::UrlError(err.to_string()))
    }

    fn api_url(
        &self,
        placement: &InstancePlacement,
        service: &ServiceName,
    ) -> Result<Url, ResolveError> {
        let base = match &self.endpoint_override {
            Some(endpoint) => endpoint.clone(),
            None => Url::parse(&format!("https://{}-{}", placement.region, API_DOMAIN))
                .map_err(|err| ResolveError::UrlError(err.to_string()))?,
        };
        base.join(&format!(
            "{SERVICES_PATH}/{}/services/{}",
            placement.project_number, service
        ))
        .map_err(|err| ResolveError::UrlError(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::tests::MockTokenProviderMock;
    use crate::http::client::tests::MockHttpClientMock;
    use assert_matches::assert_matches;
    use http::Response;

    fn placement() -> InstancePlacement {
        InstancePlacement {
            project_number: "123456".to_string(),
            region: "europe-west1".to_string(),
        }
    }

    fn service() -> ServiceName {
        ServiceName::try_from("myapp".to_string()).unwrap()
    }

    fn locator(
        http_client: MockHttpClientMock,
        token_provider: MockTokenProviderMock,
    ) -> ServiceLocator<MockHttpClientMock, MockTokenProviderMock> {
        ServiceLocator::new(Arc::new(http_client), token_provider)
    }

    #[test]
    fn resolves_the_service_url_from_the_document() {
        let mut token_provider = MockTokenProviderMock::new();
        token_provider.should_retrieve("ambient-token");

        let mut http_client = MockHttpClientMock::new();
        http_client
            .expect_send()
            .once()
            .withf(|request| {
                request.uri().to_string()
                    == "https://europe-west1-run.googleapis.com/apis/serving.knative.dev/v1/namespaces/123456/services/myapp"
                    && request
                        .headers()
                        .get(AUTHORIZATION)
                        .is_some_and(|v| v == "Bearer ambient-token")
            })
            .returning(|_| {
                Ok(Response::builder()
                    .status(200)
                    .body(
                        br#"{
                            "apiVersion": "serving.knative.dev/v1",
                            "metadata": {"name": "myapp"},
                            "status": {
                                "observedGeneration": 3,
                                "url": "https://svc.example"
                            }
                        }"#
                        .to_vec(),
                    )
                    .unwrap())
            });

        let url = locator(http_client, token_provider)
            .service_url(&placement(), &service())
            .unwrap();

        assert_eq!(url.as_str(), "https://svc.example/");
    }

    #[test]
    fn missing_status_url_is_an_explicit_failure() {
        let mut token_provider = MockTokenProviderMock::new();
        token_provider.should_retrieve("ambient-token");

        let mut http_client = MockHttpClientMock::new();
        http_client.should_send(
            Response::builder()
                .status(200)
                .body(br#"{"metadata": {"name": "myapp"}}"#.to_vec())
                .unwrap(),
        );

        let result = locator(http_client, token_provider).service_url(&placement(), &service());

        assert_matches!(result, Err(ResolveError::MissingUrl));
    }

    #[test]
    fn empty_status_url_is_an_explicit_failure() {
        let mut token_provider = MockTokenProviderMock::new();
        token_provider.should_retrieve("ambient-token");

        let mut http_client = MockHttpClientMock::new();
        http_client.should_send(
            Response::builder()
                .status(200)
                .body(br#"{"status": {"url": ""}}"#.to_vec())
                .unwrap(),
        );

        let result = locator(http_client, token_provider).service_url(&placement(), &service());

        assert_matches!(result, Err(ResolveError::MissingUrl));
    }

    #[test]
    fn unsuccessful_status_is_reported() {
        let mut token_provider = MockTokenProviderMock::new();
        token_provider.should_retrieve("ambient-token");

        let mut http_client = MockHttpClientMock::new();
        http_client.should_send(Response::builder().status(403).body(Vec::new()).unwrap());

        let result = locator(http_client, token_provider).service_url(&placement(), &service());

        assert_matches!(result, Err(ResolveError::UnsuccessfulResponse(403, _)));
    }

    #[test]
    fn credential_failures_abort_before_the_call() {
        let mut token_provider = MockTokenProviderMock::new();
        token_provider
            .expect_retrieve()
            .once()
            .return_once(|| Err(TokenProviderError::EmptyToken));

        let http_client = MockHttpClientMock::new();

        let result = locator(http_client, token_provider).service_url(&placement(), &service());

        assert_matches!(result, Err(ResolveError::Credentials(_)));
    }
}

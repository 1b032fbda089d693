//! # Blocking HTTP client seam
//!
//! All outbound calls of the agent (metadata endpoint, control-plane API and
//! the self call) go through the [`HttpClient`] trait so the wire layer can be
//! replaced in tests.
use super::config::HttpConfig;
use http::{HeaderMap, Request, Response};
use reqwest::blocking::Client;
use thiserror::Error;

/// An enumeration of potential errors related to the HTTP client.
#[derive(Error, Debug)]
pub enum HttpClientError {
    /// Represents an error building the HTTP client.
    #[error("could not build the HTTP client: `{0}`")]
    BuildingClient(String),
    /// Represents an error building the HTTP request.
    #[error("could not build the HTTP request: `{0}`")]
    BuildingRequest(String),
    /// Represents an HTTP transport error.
    #[error("transport HTTP client error: `{0}`")]
    TransportError(String),
    /// Represents an error reading or rebuilding the HTTP response.
    #[error("could not read the HTTP response: `{0}`")]
    InvalidResponse(String),
}

/// The `HttpClient` trait defines the HTTP send interface to be implemented
/// by HTTP clients.
pub trait HttpClient {
    /// Returns a `http::Response<Vec<u8>>` structure as the HTTP response or
    /// HttpClientError if an error was found.
    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpClientError>;

    /// Performs a GET request with the provided url and headers.
    fn get(&self, url: String, headers: HeaderMap) -> Result<Response<Vec<u8>>, HttpClientError> {
        let mut request = Request::builder()
            .method("GET")
            .uri(url)
            .body(Vec::new())
            .map_err(|e| HttpClientError::BuildingRequest(e.to_string()))?;
        request.headers_mut().extend(headers);
        self.send(request)
    }
}

/// An implementation of the [`HttpClient`] trait using the reqwest blocking client.
pub struct HttpClientReqwest {
    client: Client,
}

impl HttpClientReqwest {
    pub fn try_new(config: HttpConfig) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .use_rustls_tls()
            .tls_built_in_native_certs(true)
            .timeout(config.timeout)
            .connect_timeout(config.conn_timeout)
            .build()
            .map_err(|err| HttpClientError::BuildingClient(err.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for HttpClientReqwest {
    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpClientError> {
        let request = reqwest::blocking::Request::try_from(request)
            .map_err(|err| HttpClientError::BuildingRequest(err.to_string()))?;
        let response = self
            .client
            .execute(request)
            .map_err(|err| HttpClientError::TransportError(err.to_string()))?;
        try_build_response(response)
    }
}

/// Helper to build a [http::Response<Vec<u8>>] from a reqwest's blocking response.
/// It includes status, version and body. Headers are not included but they could be added if needed.
fn try_build_response(
    res: reqwest::blocking::Response,
) -> Result<Response<Vec<u8>>, HttpClientError> {
    let status = res.status();
    let version = res.version();
    let body: Vec<u8> = res
        .bytes()
        .map_err(|err| HttpClientError::InvalidResponse(err.to_string()))?
        .into();
    Response::builder()
        .status(status)
        .version(version)
        .body(body)
        .map_err(|err| HttpClientError::InvalidResponse(err.to_string()))
}

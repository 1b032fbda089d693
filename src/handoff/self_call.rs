use crate::credentials::{BearerToken, TokenProvider, TokenProviderError};
use crate::http::client::{HttpClient, HttpClientError};
use crate::utils::retry::retry_until_deadline;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::warn;
use url::Url;

pub const DEFAULT_ATTEMPT_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Retry policy for the self call. The deadline is a wall-clock budget for
/// the whole loop, the interval is the pause between failed attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfCallConfig {
    pub attempt_interval: Duration,
    pub deadline: Duration,
}

impl Default for SelfCallConfig {
    fn default() -> Self {
        Self {
            attempt_interval: DEFAULT_ATTEMPT_INTERVAL,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

#[derive(Error, Debug)]
pub enum SelfCallError {
    #[error("could not obtain an identity token: `{0}`")]
    Credentials(#[from] TokenProviderError),
    #[error("could not build auth headers: `{0}`")]
    AuthorizationHeaders(String),
    #[error("no successful response after {attempts} attempts within {deadline:?}, last error: `{last_error}`")]
    DeadlineExceeded {
        attempts: usize,
        deadline: Duration,
        last_error: String,
    },
}

#[derive(Error, Debug)]
enum AttemptError {
    #[error("`{0}`")]
    Http(#[from] HttpClientError),
    #[error("status code: `{0}`")]
    UnsuccessfulResponse(u16),
}

/// Performs authenticated GETs against a target URL until a success response
/// is observed or the configured deadline passes. It never touches the
/// process lifecycle, the caller decides what a failed hand-off means.
pub struct SelfCaller<C> {
    http_client: Arc<C>,
    config: SelfCallConfig,
}

impl<C: HttpClient> SelfCaller<C> {
    pub fn new(http_client: Arc<C>, config: SelfCallConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Calls `url` with an identity token scoped to it. The token is fetched
    /// once and reused across retries; the retry budget is far below the
    /// token lifetime.
    pub fn call(
        &self,
        url: &Url,
        token_provider: &impl TokenProvider,
    ) -> Result<(), SelfCallError> {
        let token = token_provider.retrieve()?;
        let headers = authorization_headers(&token)?;

        let deadline = Instant::now() + self.config.deadline;
        retry_until_deadline(self.config.attempt_interval, deadline, || {
            self.attempt(url, headers.clone())
                .inspect_err(|err| warn!(%err, "self call attempt failed, retrying"))
        })
        .map_err(|(attempts, last_error)| SelfCallError::DeadlineExceeded {
            attempts,
            deadline: self.config.deadline,
            last_error: last_error.to_string(),
        })
    }

    fn attempt(&self, url: &Url, headers: HeaderMap) -> Result<(), AttemptError> {
        let response = self.http_client.get(url.to_string(), headers)?;
        // Anything below 300 counts as a warm instance answering.
        let status = response.status().as_u16();
        if status >= 300 {
            return Err(AttemptError::UnsuccessfulResponse(status));
        }
        Ok(())
    }
}

fn authorization_headers(token: &BearerToken) -> Result<HeaderMap, SelfCallError> {
    let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
        .map_err(|err| SelfCallError::AuthorizationHeaders(err.to_string()))?;
    auth_value.set_sensitive(true);
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth_value);
    Ok(headers)
}

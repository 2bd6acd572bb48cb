//! Shared HTTP plumbing: client construction and response classification.
//!
//! Every adapter funnels its exchanges through these helpers so that
//! transport failures collapse into the two-kind error taxonomy in exactly
//! one place.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::{CommunicatorError, Result};

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Literal body some backends return with a 200 status to signal rejected
/// credentials.
const NULL_SENTINEL: &str = "null";

/// Builds the per-instance HTTP client. Returns `None` instead of failing so
/// that adapter construction stays infallible; a missing client surfaces as
/// a connection error on first use.
pub(crate) fn build_client(backend: &'static str, with_cookies: bool) -> Option<Client> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));
    if with_cookies {
        builder = builder.cookie_store(true);
    }
    match builder.build() {
        Ok(client) => Some(client),
        Err(err) => {
            warn!(backend, error = %err, "failed to build http client");
            None
        }
    }
}

/// Maps a send-level failure (endpoint unreachable, DNS, timeout) to a
/// connection error.
pub(crate) fn classify_send_error(backend: &'static str, err: reqwest::Error) -> CommunicatorError {
    warn!(backend, error = %err, "request failed before a response arrived");
    CommunicatorError::connection(backend)
}

/// Reads a response body, classifying the status and the null sentinel.
///
/// Not-found and timeout-class statuses mean the configured URL does not
/// point at the backend; any other non-success status, and a success body of
/// literal `null`, mean the credentials were rejected.
pub(crate) async fn read_body(backend: &'static str, response: Response) -> Result<String> {
    let status = response.status();
    if is_unreachable_status(status) {
        warn!(backend, %status, "endpoint not reachable at configured URL");
        return Err(CommunicatorError::connection(backend));
    }
    if !status.is_success() {
        warn!(backend, %status, "backend rejected the request");
        return Err(CommunicatorError::authentication(backend));
    }
    let text = response
        .text()
        .await
        .map_err(|err| classify_send_error(backend, err))?;
    if text == NULL_SENTINEL {
        return Err(CommunicatorError::authentication(backend));
    }
    Ok(text)
}

/// Parses a success body as JSON into `T`; a body that does not decode is
/// treated as a credentials problem, not a transport one.
pub(crate) async fn expect_json<T>(backend: &'static str, response: Response) -> Result<T>
where
    T: DeserializeOwned,
{
    let body = read_body(backend, response).await?;
    serde_json::from_str(&body).map_err(|err| {
        warn!(backend, error = %err, "unexpected response body");
        CommunicatorError::authentication(backend)
    })
}

/// Parses a success body as JSON, falling back to a raw-text passthrough
/// value when the body is not JSON. Used by form-encoded backends whose
/// endpoints answer with plain text.
pub(crate) async fn value_or_text(backend: &'static str, response: Response) -> Result<Value> {
    let body = read_body(backend, response).await?;
    Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
}

fn is_unreachable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::NOT_FOUND | StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT
    )
}

#[cfg(test)]
mod tests {
    use super::is_unreachable_status;
    use reqwest::StatusCode;

    #[test]
    fn not_found_and_timeouts_count_as_unreachable() {
        assert!(is_unreachable_status(StatusCode::NOT_FOUND));
        assert!(is_unreachable_status(StatusCode::REQUEST_TIMEOUT));
        assert!(is_unreachable_status(StatusCode::GATEWAY_TIMEOUT));
        assert!(!is_unreachable_status(StatusCode::UNAUTHORIZED));
        assert!(!is_unreachable_status(StatusCode::INTERNAL_SERVER_ERROR));
    }
}

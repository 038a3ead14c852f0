//! HTTP plumbing shared by the provider adapters.

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::warn;

use crate::error::{Error, Result};

/// Build the HTTP client used by a backend
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("clip-translate/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::BackendInit(format!("Failed to create HTTP client: {e}")))
}

/// Map a transport failure to a backend call error
pub fn request_error(e: &reqwest::Error) -> Error {
    warn!("Request failed: {}", e);
    if e.is_timeout() {
        Error::TranslationTimeout
    } else {
        Error::TranslationRequest(e.to_string())
    }
}

/// Pass successful responses through, map everything else to an error
pub async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());

        warn!("Rate limited, retry after {:?}s", retry_after);
        return Err(Error::TranslationRateLimited { retry_after });
    }

    let body = response.text().await.unwrap_or_default();
    warn!("API error: {} - {}", status, body);

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Error::TranslationAuth(format!("HTTP {status}: {body}")));
    }

    Err(Error::TranslationRequest(format!("HTTP {status}: {body}")))
}

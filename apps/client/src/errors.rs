use serde::Deserialize;
use thiserror::Error;

/// Error type for all backend calls made by [`crate::api::ApiClient`].
///
/// `Unauthorized` is kept distinct so the shell can route the user back to
/// login; the core never redirects on its own. Context-sync failures are
/// swallowed inside the store and never reach a caller as this type.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized")]
    Unauthorized,
}

#[derive(Debug, Deserialize)]
struct DetailBody {
    detail: String,
}

/// Extracts the human-readable message from a FastAPI-style error body
/// (`{"detail": "..."}`), falling back to the raw body.
pub(crate) fn error_detail(body: &str) -> String {
    serde_json::from_str::<DetailBody>(body)
        .map(|b| b.detail)
        .unwrap_or_else(|_| body.to_string())
}

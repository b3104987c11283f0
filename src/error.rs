use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failure of a book handler. The `Display` text of the user-facing variants
/// is the exact response body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing required field {0}")]
    MissingField(&'static str),

    /// Covers both malformed and unknown ids.
    #[error("no book exists")]
    NoBook,

    #[error("{message}")]
    Store {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn store(message: &'static str) -> impl FnOnce(anyhow::Error) -> ApiError {
        move |source| ApiError::Store { message, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Store { message, source } => {
                tracing::error!(error = %crate::unpack_error(&*source), "{}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
            // User errors keep a 200 status; clients match on the body text.
            other => (StatusCode::OK, other.to_string()).into_response(),
        }
    }
}

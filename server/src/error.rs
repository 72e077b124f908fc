//! Mapping of handler failures onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use seatkey_license::{ErrorClass, LicenseError};
use tokio::task::JoinError;
use tracing::error;

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    /// The activation body is not a JSON object of strings.
    InvalidJson,
    /// The license layer refused or failed the request.
    License(LicenseError),
    /// The blocking worker running the request panicked or was cancelled.
    Worker(JoinError),
}

impl From<LicenseError> for ApiError {
    fn from(err: LicenseError) -> Self {
        Self::License(err)
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        Self::Worker(err)
    }
}

impl ApiError {
    /// Status code and short reason sent to the caller.
    #[must_use]
    pub fn status_and_reason(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidJson => (StatusCode::BAD_REQUEST, "Invalid JSON"),
            Self::Worker(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            Self::License(err) => match err.class() {
                ErrorClass::Authentication => (StatusCode::BAD_REQUEST, "Bad signature"),
                ErrorClass::MalformedEvent => (StatusCode::BAD_REQUEST, "Malformed event"),
                ErrorClass::Validation => {
                    (StatusCode::BAD_REQUEST, "Missing device_id or license_key")
                }
                ErrorClass::NotFound => (StatusCode::NOT_FOUND, "License not found"),
                ErrorClass::Capacity => (StatusCode::FORBIDDEN, "No seats available"),
                ErrorClass::Store => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Worker(err) = &self {
            error!(error = %err, "request worker failed");
        }
        self.status_and_reason().into_response()
    }
}

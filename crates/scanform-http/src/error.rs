//! Errors rendered as plain-text HTTP responses.

use crate::response::{IntoResponse, Response};
use http::StatusCode;
use std::fmt;

/// Result alias used across the kernel and its consumers.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error carrying an HTTP status and a short plain-text message.
///
/// The kernel serves browser-facing form endpoints, so errors render as
/// small text bodies rather than structured payloads.
#[derive(Debug, Clone)]
pub struct Error {
    status: StatusCode,
    message: String,
}

impl Error {
    /// Create an error with an explicit status and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 with a caller-supplied message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 403 with the fixed body `Forbidden`.
    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden")
    }

    /// 404 for unrouted paths.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found")
    }

    /// 405 for routed paths without a handler for the method.
    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    }

    /// 413 for bodies over the configured cap.
    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Request body exceeds limit of {} bytes", limit),
        )
    }

    /// 500 with a caller-supplied message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// The HTTP status this error renders with.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The message used as the response body.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

impl From<serde_urlencoded::de::Error> for Error {
    fn from(err: serde_urlencoded::de::Error) -> Self {
        Self::bad_request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_expected_statuses() {
        assert_eq!(Error::not_found().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::method_not_allowed().status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(Error::forbidden().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::payload_too_large(64).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn forbidden_body_is_exactly_forbidden() {
        assert_eq!(Error::forbidden().message(), "Forbidden");
    }

    #[test]
    fn renders_message_as_body() {
        let res = Error::bad_request("invalid form").into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn display_shows_the_message() {
        let err = Error::internal("template rendering failed");
        assert_eq!(err.to_string(), "template rendering failed");
    }
}

//! Error handling module for the dataset controller.
//!
//! Handlers are the only layer that turns failures into HTTP responses. Bodies are plain text
//! with a trailing newline; upstream details are logged, never returned.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::clients::UpstreamError;
use crate::headers::HeaderError;
use crate::mapper::MappingError;
use crate::metadata::{PatchError, ReadError, WriteError};

/// Error codes used in log lines.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Missing header, malformed patch or undecodable body
    Validation(String),
    /// Upstream reported 404
    NotFound(String),
    /// Any other upstream failure; the string is the public phrase
    Upstream(String),
    /// Local failure after the upstream calls succeeded
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Upstream(_) => codes::UPSTREAM_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Upstream(msg) => msg.clone(),
            AppError::Internal(msg) => msg.clone(),
        }
    }

    /// Map an upstream failure to a response. A 404 passes through; everything else becomes a
    /// 500 carrying only `phrase`.
    pub fn from_upstream(err: &UpstreamError, phrase: &str) -> Self {
        if err.is_not_found() {
            AppError::NotFound(phrase.to_string())
        } else {
            AppError::Upstream(phrase.to_string())
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<HeaderError> for AppError {
    fn from(err: HeaderError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<PatchError> for AppError {
    fn from(err: PatchError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<WriteError> for AppError {
    fn from(err: WriteError) -> Self {
        AppError::from_upstream(err.upstream(), err.phrase())
    }
}

impl From<ReadError> for AppError {
    fn from(err: ReadError) -> Self {
        AppError::from_upstream(err.upstream(), err.phrase())
    }
}

impl From<MappingError> for AppError {
    fn from(err: MappingError) -> Self {
        tracing::error!("Mapping error: {}", err);
        AppError::Internal("error mapping version metadata".to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::warn!("JSON error: {}", err);
        AppError::Validation("error unmarshalling body".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::debug!(
            code = self.error_code(),
            status = %status,
            "responding with error: {}",
            self.message()
        );
        let body = format!("{}\n", self.message());
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(status: StatusCode) -> UpstreamError {
        UpstreamError::Status {
            service: "dataset-api",
            status,
            url: "http://localhost:22000/datasets/cpih01".to_string(),
        }
    }

    #[test]
    fn test_header_errors_are_bad_requests() {
        let err: AppError = HeaderError::MissingAccessToken.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "no user access token header set");

        let err: AppError = HeaderError::MissingCollectionId.into();
        assert_eq!(err.message(), "no collection ID header set");
    }

    #[test]
    fn test_upstream_not_found_passes_through() {
        let err = AppError::from_upstream(&upstream(StatusCode::NOT_FOUND), "failed to get version");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_other_upstream_failures_are_500_with_phrase() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::CONFLICT,
            StatusCode::PRECONDITION_FAILED,
            StatusCode::BAD_GATEWAY,
        ] {
            let err = AppError::from_upstream(&upstream(status), "failed to get dataset details");
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.message(), "failed to get dataset details");
        }
    }

    #[test]
    fn test_write_error_uses_step_phrase() {
        let err: AppError =
            WriteError::DatasetCollection(upstream(StatusCode::INTERNAL_SERVER_ERROR)).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "error adding dataset to collection");
    }

    #[test]
    fn test_read_error_uses_step_phrase() {
        let err: AppError = ReadError::Dataset(upstream(StatusCode::BAD_GATEWAY)).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "failed to get dataset details");

        let err: AppError = ReadError::Version(upstream(StatusCode::NOT_FOUND)).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_patch_error_is_validation() {
        let err: AppError = PatchError::UnknownPath("/unknown_field".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.message().contains("/unknown_field"));
    }

    #[test]
    fn test_display_includes_code() {
        let err = AppError::Internal("boom".to_string());
        assert_eq!(err.to_string(), "INTERNAL_ERROR: boom");
    }

    #[tokio::test]
    async fn test_into_response_is_plain_text() {
        let resp = AppError::Validation("no collection ID header set".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"no collection ID header set\n");
    }

    #[test]
    fn test_error_codes_per_variant() {
        assert_eq!(AppError::Validation(String::new()).error_code(), codes::VALIDATION_ERROR);
        assert_eq!(AppError::NotFound(String::new()).error_code(), codes::NOT_FOUND);
        assert_eq!(AppError::Upstream(String::new()).error_code(), codes::UPSTREAM_ERROR);
        assert_eq!(AppError::Internal(String::new()).error_code(), codes::INTERNAL_ERROR);
    }
}

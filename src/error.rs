//! Error type for the edgequake-pdf2png library.
//!
//! Every failure in the conversion path is a [`Pdf2PngError`]. The enum does
//! double duty: the `Display` text is the operator-facing detail that ends up
//! in logs, while [`Pdf2PngError::user_message`] and
//! [`Pdf2PngError::status_code`] decide what an HTTP client sees.
//!
//! Client mistakes (no file, wrong content type, oversized body) map to `400`
//! and never leak internal detail. Failures of the rasterizer or the host map
//! to `500` and carry the underlying detail in the envelope's `error` field so
//! a caller can tell a corrupt PDF apart from a missing `pdftoppm`.

use crate::output::ApiResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// All errors returned by the edgequake-pdf2png library.
#[derive(Debug, Error)]
pub enum Pdf2PngError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// The multipart form had no file under the expected field name.
    #[error("No file uploaded in form field '{field}'")]
    MissingFile { field: String },

    /// The uploaded part declared a content type other than `application/pdf`.
    #[error("Unsupported content type '{content_type}': only application/pdf is accepted")]
    UnsupportedMediaType { content_type: String },

    /// The upload claimed to be a PDF but does not start with `%PDF`.
    #[error("Uploaded file is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// The request body exceeded the configured upload limit.
    #[error("Upload exceeds the {limit_bytes}-byte limit")]
    PayloadTooLarge { limit_bytes: usize },

    /// A form field carried a value we could not interpret.
    #[error("Invalid value '{value}' for form field '{field}'")]
    InvalidField { field: String, value: String },

    /// The multipart body could not be parsed.
    #[error("Malformed multipart body: {0}")]
    Multipart(String),

    /// A local input file (CLI path) does not exist.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    // ── Rasterizer errors ─────────────────────────────────────────────────
    /// The rasterizer binary could not be spawned because it does not exist.
    #[error("Rasterizer '{program}' not found\nInstall poppler-utils or pass --pdftoppm <PATH>.")]
    RasterizerNotFound { program: String },

    /// The rasterizer ran but exited unsuccessfully.
    #[error("Rasterizer exited with {status}: {stderr}")]
    RasterizerFailed { status: String, stderr: String },

    /// The rasterizer did not finish within the configured timeout.
    #[error("Rasterizer timed out after {timeout:?}")]
    RasterizerTimeout { timeout: Duration },

    /// The rasterizer reported success but the expected PNG is missing.
    #[error("Rasterizer produced no image at '{path}'")]
    NoImageProduced { path: PathBuf },

    // ── Image errors ──────────────────────────────────────────────────────
    /// Decoding or re-encoding the rendered PNG failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(#[from] image::ImageError),

    // ── Host errors ───────────────────────────────────────────────────────
    #[error("I/O error while {action}: {source}")]
    Io {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2PngError {
    pub(crate) fn io(action: &'static str, source: std::io::Error) -> Self {
        Pdf2PngError::Io { action, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Pdf2PngError::MissingFile { .. }
            | Pdf2PngError::UnsupportedMediaType { .. }
            | Pdf2PngError::NotAPdf { .. }
            | Pdf2PngError::PayloadTooLarge { .. }
            | Pdf2PngError::InvalidField { .. }
            | Pdf2PngError::Multipart(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure was caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Short message placed in the envelope's `message` field.
    pub fn user_message(&self) -> String {
        match self {
            Pdf2PngError::MissingFile { .. } => "Please upload a PDF file".to_string(),
            Pdf2PngError::UnsupportedMediaType { .. } => {
                "Only PDF files are supported".to_string()
            }
            Pdf2PngError::NotAPdf { .. } => "Uploaded file is not a valid PDF".to_string(),
            Pdf2PngError::PayloadTooLarge { .. } => "File too large".to_string(),
            Pdf2PngError::InvalidField { field, .. } => {
                format!("Invalid value for form field '{field}'")
            }
            Pdf2PngError::Multipart(_) => "Malformed upload".to_string(),
            Pdf2PngError::NoImageProduced { .. } => {
                "Conversion failed: no image file was generated".to_string()
            }
            Pdf2PngError::RasterizerNotFound { .. }
            | Pdf2PngError::RasterizerFailed { .. }
            | Pdf2PngError::RasterizerTimeout { .. }
            | Pdf2PngError::ImageProcessing(_) => "Conversion failed".to_string(),
            Pdf2PngError::FileNotFound { .. }
            | Pdf2PngError::Io { .. }
            | Pdf2PngError::InvalidConfig(_)
            | Pdf2PngError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Detail placed in the envelope's `error` field. Client errors carry none.
    pub fn detail(&self) -> Option<String> {
        match self {
            Pdf2PngError::NoImageProduced { .. } => None,
            e if e.is_client_error() => None,
            e => Some(e.to_string()),
        }
    }
}

impl IntoResponse for Pdf2PngError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            tracing::debug!("Client error: {}", self);
        } else {
            tracing::error!("Conversion error: {}", self);
        }

        let body = ApiResponse::<()>::failure(self.user_message(), self.detail());
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_bad_request() {
        let errors = [
            Pdf2PngError::MissingFile { field: "pdf".into() },
            Pdf2PngError::UnsupportedMediaType {
                content_type: "image/png".into(),
            },
            Pdf2PngError::NotAPdf {
                magic: b"GIF8".to_vec(),
            },
            Pdf2PngError::PayloadTooLarge { limit_bytes: 10 },
            Pdf2PngError::Multipart("boundary".into()),
        ];
        for e in errors {
            assert_eq!(e.status_code(), StatusCode::BAD_REQUEST, "{e}");
            assert!(e.detail().is_none(), "{e} should not leak detail");
        }
    }

    #[test]
    fn rasterizer_failure_carries_stderr() {
        let e = Pdf2PngError::RasterizerFailed {
            status: "exit status: 1".into(),
            stderr: "Syntax Error: Couldn't find trailer dictionary".into(),
        };
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.user_message(), "Conversion failed");
        assert!(e.detail().unwrap().contains("trailer dictionary"));
    }

    #[test]
    fn no_image_produced_has_specific_message() {
        let e = Pdf2PngError::NoImageProduced {
            path: PathBuf::from("/tmp/x.png"),
        };
        assert_eq!(
            e.user_message(),
            "Conversion failed: no image file was generated"
        );
        assert!(e.detail().is_none());
    }

    #[test]
    fn timeout_display() {
        let e = Pdf2PngError::RasterizerTimeout {
            timeout: Duration::from_secs(30),
        };
        assert!(e.to_string().ends_with("after 30s"), "{e}");

        let e = Pdf2PngError::RasterizerTimeout {
            timeout: Duration::from_millis(200),
        };
        assert!(e.to_string().ends_with("after 200ms"), "{e}");
    }

    #[test]
    fn into_response_uses_status_code() {
        let resp = Pdf2PngError::PayloadTooLarge { limit_bytes: 1 }.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = Pdf2PngError::Internal("boom".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

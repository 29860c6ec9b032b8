//! Response types returned by the HTTP endpoints and the library API.
//!
//! Every JSON body the service emits is an [`ApiResponse`] envelope:
//! `success` + `message`, with `data` on success and an optional `error`
//! detail on failure. Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON envelope shared by all endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error,
        }
    }
}

/// The rendered first page, ready to embed in HTML or JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedImage {
    /// `data:image/png;base64,<payload>`.
    pub base64: String,
    /// Size of the PNG in bytes.
    pub file_size: usize,
    /// Length of the base64 payload, excluding the data-URI prefix.
    pub base64_length: usize,
}

/// Result of a single conversion, as returned by [`crate::convert`].
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// Encoded image for the JSON response.
    pub image: ConvertedImage,
    /// Raw PNG bytes (after rotation, if any).
    pub png: Vec<u8>,
    /// Whether auto-rotation turned a landscape page upright.
    pub rotated: bool,
    /// Wall-clock time spent on the whole conversion.
    pub duration_ms: u64,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub success: bool,
    pub message: String,
    pub version: String,
    /// Rasterizer version line, or its description when the version probe failed.
    pub rasterizer: String,
    pub endpoints: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converted_image_uses_camel_case() {
        let resp = ApiResponse::ok(
            "Conversion succeeded",
            ConvertedImage {
                base64: "data:image/png;base64,AAAA".into(),
                file_size: 3,
                base64_length: 4,
            },
        );
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["fileSize"], 3);
        assert_eq!(json["data"]["base64Length"], 4);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failure_omits_data_and_optional_error() {
        let json = serde_json::to_value(ApiResponse::<()>::failure("Please upload a PDF file", None))
            .unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
        assert!(json.get("error").is_none());

        let json = serde_json::to_value(ApiResponse::<()>::failure(
            "Conversion failed",
            Some("exit status: 1".into()),
        ))
        .unwrap();
        assert_eq!(json["error"], "exit status: 1");
    }
}

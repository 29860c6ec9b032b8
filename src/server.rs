//! HTTP surface: router, shared state and handlers.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `POST /convert-pdf` | [`convert_pdf`] |
//! | `GET /health` | [`health`] |
//! | `GET /` | [`index`] |
//!
//! The request body limit is enforced by axum's `DefaultBodyLimit`; an
//! oversized upload surfaces as a multipart error with status 413, which the
//! handler turns into [`Pdf2PngError::PayloadTooLarge`].

use crate::config::ServiceConfig;
use crate::convert::{convert_pdf_bytes, ConvertOptions};
use crate::error::Pdf2PngError;
use crate::output::{ApiResponse, ConvertedImage, HealthStatus, ServiceInfo};
use crate::pipeline::render::{PdftoppmRasterizer, Rasterizer};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{debug, info, warn, Level};

/// Multipart field carrying the PDF.
pub const UPLOAD_FIELD: &str = "pdf";
/// Optional multipart field overriding the configured auto-rotate default.
pub const AUTO_ROTATE_FIELD: &str = "autoRotate";

const ENDPOINTS: [(&str, &str); 3] = [
    (
        "POST /convert-pdf",
        "Upload a PDF file; returns the first page as a base64 PNG",
    ),
    ("GET /health", "Health check"),
    ("GET /", "Service information"),
];

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub rasterizer: Arc<dyn Rasterizer>,
    /// Version line reported by the rasterizer at startup, if probed.
    pub rasterizer_version: Option<Arc<str>>,
}

impl AppState {
    pub fn new(config: ServiceConfig, rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self {
            config: Arc::new(config),
            rasterizer,
            rasterizer_version: None,
        }
    }

    pub fn with_rasterizer_version(mut self, version: Option<String>) -> Self {
        self.rasterizer_version = version.map(Arc::from);
        self
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/convert-pdf", post(convert_pdf))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

// POST /convert-pdf - Render the first page of an uploaded PDF
pub async fn convert_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<ConvertedImage>>, Pdf2PngError> {
    let mut multipart = multipart.map_err(|e| {
        debug!("Rejected non-multipart request: {}", e);
        Pdf2PngError::MissingFile {
            field: UPLOAD_FIELD.to_string(),
        }
    })?;

    let limit = state.config.max_upload_bytes;
    let form = read_form(&mut multipart, limit).await?;
    let upload = form.file.ok_or_else(|| Pdf2PngError::MissingFile {
        field: UPLOAD_FIELD.to_string(),
    })?;

    let options = ConvertOptions {
        auto_rotate: form.auto_rotate.unwrap_or(state.config.auto_rotate),
        rotation: state.config.rotation,
    };

    let output = convert_pdf_bytes(
        &upload.bytes,
        upload.file_name.as_deref(),
        &options,
        state.rasterizer.as_ref(),
        state.config.temp_root.as_deref(),
    )
    .await?;

    Ok(Json(ApiResponse::ok("Conversion succeeded", output.image)))
}

// GET /health - Liveness check
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        success: true,
        message: "PDF conversion service is running".to_string(),
        timestamp: chrono::Utc::now(),
    })
}

// GET / - Service information
pub async fn index(State(state): State<AppState>) -> Json<ServiceInfo> {
    let endpoints: BTreeMap<String, String> = ENDPOINTS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    Json(ServiceInfo {
        success: true,
        message: "PDF to Base64 conversion service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rasterizer: match state.rasterizer_version {
            Some(ref v) => v.to_string(),
            None => state.rasterizer.describe(),
        },
        endpoints,
    })
}

/// The uploaded file part.
struct UploadedFile {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

/// Fields of the conversion form we care about.
#[derive(Default)]
struct ConvertForm {
    file: Option<UploadedFile>,
    auto_rotate: Option<bool>,
}

async fn read_form(multipart: &mut Multipart, limit: usize) -> Result<ConvertForm, Pdf2PngError> {
    let mut form = ConvertForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| map_multipart_error(e, limit))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            UPLOAD_FIELD => {
                if form.file.is_some() {
                    debug!("Ignoring extra '{}' part", UPLOAD_FIELD);
                    continue;
                }
                let content_type = field.content_type().unwrap_or("").to_string();
                if !is_pdf_content_type(&content_type) {
                    return Err(Pdf2PngError::UnsupportedMediaType { content_type });
                }
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| map_multipart_error(e, limit))?;
                form.file = Some(UploadedFile {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            AUTO_ROTATE_FIELD => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| map_multipart_error(e, limit))?;
                form.auto_rotate = Some(parse_bool(&value).ok_or_else(|| {
                    Pdf2PngError::InvalidField {
                        field: AUTO_ROTATE_FIELD.to_string(),
                        value,
                    }
                })?);
            }
            other => debug!("Ignoring unknown form field '{}'", other),
        }
    }

    Ok(form)
}

fn map_multipart_error(e: MultipartError, limit: usize) -> Pdf2PngError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Pdf2PngError::PayloadTooLarge { limit_bytes: limit }
    } else {
        Pdf2PngError::Multipart(e.body_text())
    }
}

/// `application/pdf`, ignoring case and parameters.
pub fn is_pdf_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|t| t.trim().eq_ignore_ascii_case("application/pdf"))
        .unwrap_or(false)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Bind, log the endpoint listing and serve until `shutdown` resolves.
///
/// Probes the rasterizer version once at startup; a missing `pdftoppm` is
/// logged as a warning rather than refusing to start, since the binary may be
/// installed after the service is deployed.
pub async fn serve<F>(config: ServiceConfig, shutdown: F) -> Result<(), Pdf2PngError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let rasterizer = PdftoppmRasterizer::from_config(&config);
    let version = rasterizer.version().await;
    match version {
        Some(ref v) => info!("Using {} [{}]", rasterizer.describe(), v),
        None => warn!(
            "Rasterizer '{}' did not respond to -v; conversions will fail until it is installed",
            rasterizer.program().display()
        ),
    }

    let addr = config.bind_address();
    let state = AppState::new(config, Arc::new(rasterizer)).with_rasterizer_version(version);
    serve_with_state(state, &addr, shutdown).await
}

/// Serve an already-assembled [`AppState`] on `addr`.
pub async fn serve_with_state<F>(state: AppState, addr: &str, shutdown: F) -> Result<(), Pdf2PngError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Pdf2PngError::io("binding listener", e))?;

    let local = listener
        .local_addr()
        .map_err(|e| Pdf2PngError::io("reading listener address", e))?;
    info!("PDF conversion service listening on {}", local);
    for (route, description) in ENDPOINTS {
        info!("  {:<18} - {}", route, description);
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Pdf2PngError::io("serving HTTP", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_content_type_matching() {
        assert!(is_pdf_content_type("application/pdf"));
        assert!(is_pdf_content_type("Application/PDF"));
        assert!(is_pdf_content_type("application/pdf; name=a.pdf"));
        assert!(!is_pdf_content_type("application/octet-stream"));
        assert!(!is_pdf_content_type("application/pdfx"));
        assert!(!is_pdf_content_type(""));
    }

    #[test]
    fn bool_field_parsing() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool(" YES "), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool(""), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}

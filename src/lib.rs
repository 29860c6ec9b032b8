//! # edgequake-pdf2png
//!
//! Render the first page of an uploaded PDF to PNG and return it as a base64
//! data URI, over HTTP or from the command line.
//!
//! ## Pipeline Overview
//!
//! ```text
//! multipart upload (field "pdf")
//!  │
//!  ├─ 1. Validate  content type application/pdf, %PDF magic
//!  ├─ 2. Stage     write to a private TempDir as <unix-millis>-<name>.pdf
//!  ├─ 3. Render    pdftoppm -png -f 1 -l 1 -singlefile
//!  ├─ 4. Rotate    optional: landscape → portrait (image crate)
//!  ├─ 5. Encode    PNG → data:image/png;base64,...
//!  └─ 6. Clean up  TempDir removed, JSON envelope returned
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2png::{serve, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::builder().port(3000).auto_rotate(true).build()?;
//!     serve(config, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! ```text
//! $ curl -F "pdf=@invoice.pdf;type=application/pdf" http://localhost:3000/convert-pdf
//! {"success":true,"message":"Conversion succeeded",
//!  "data":{"base64":"data:image/png;base64,iVBOR...","fileSize":48213,"base64Length":64284}}
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2png` binary (clap + anyhow + tracing-subscriber) |
//!
//! ## Requirements
//!
//! `pdftoppm` from poppler-utils must be installed (`apt install poppler-utils`,
//! `brew install poppler`), or its location passed via `--pdftoppm`.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RotationDirection, ServiceConfig, ServiceConfigBuilder};
pub use convert::{convert_file, convert_pdf_bytes, ConvertOptions};
pub use error::Pdf2PngError;
pub use output::{ApiResponse, ConversionOutput, ConvertedImage, HealthStatus, ServiceInfo};
pub use pipeline::render::{PdftoppmRasterizer, Rasterizer};
pub use server::{router, serve, serve_with_state, AppState};

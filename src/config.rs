//! Configuration types for the PDF-to-PNG service.
//!
//! All service behaviour is controlled through [`ServiceConfig`], built via
//! its [`ServiceConfigBuilder`]. The CLI maps flags and environment variables
//! onto the builder; tests construct it directly.
//!
//! Setters clamp out-of-range values where a sane neighbour exists (DPI) and
//! leave the rest to [`ServiceConfigBuilder::build`], which rejects values the
//! service cannot run with.

use crate::error::Pdf2PngError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Smallest and largest DPI handed to the rasterizer.
pub const MIN_DPI: u32 = 36;
pub const MAX_DPI: u32 = 600;

/// Configuration for the conversion service.
///
/// # Example
/// ```rust
/// use edgequake_pdf2png::{RotationDirection, ServiceConfig};
///
/// let config = ServiceConfig::builder()
///     .port(8080)
///     .dpi(200)
///     .auto_rotate(true)
///     .rotation(RotationDirection::CounterClockwise)
///     .build()
///     .unwrap();
/// assert_eq!(config.bind_address(), "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Interface to bind. Default: `0.0.0.0`.
    pub host: String,

    /// TCP port. Default: 3000.
    pub port: u16,

    /// Path or name of the `pdftoppm` binary. Default: `pdftoppm` (looked up on `PATH`).
    pub pdftoppm_path: PathBuf,

    /// Rendering resolution passed as `-r`. Range: 36–600. Default: 150.
    ///
    /// 150 matches pdftoppm's own default, so an unconfigured service renders
    /// exactly what running `pdftoppm -png` by hand would.
    pub dpi: u32,

    /// Rotate landscape pages upright unless the request says otherwise. Default: false.
    pub auto_rotate: bool,

    /// Direction used when auto-rotation applies. Default: clockwise.
    pub rotation: RotationDirection,

    /// Maximum accepted request body in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,

    /// Kill the rasterizer if it runs longer than this. Default: 30.
    pub rasterize_timeout_secs: u64,

    /// Parent directory for per-request scratch directories.
    /// `None` uses the OS temp directory.
    pub temp_root: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            pdftoppm_path: PathBuf::from("pdftoppm"),
            dpi: 150,
            auto_rotate: false,
            rotation: RotationDirection::default(),
            max_upload_bytes: 50 * 1024 * 1024,
            rasterize_timeout_secs: 30,
            temp_root: None,
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn rasterize_timeout(&self) -> Duration {
        Duration::from_secs(self.rasterize_timeout_secs)
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn pdftoppm_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdftoppm_path = path.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(MIN_DPI, MAX_DPI);
        self
    }

    pub fn auto_rotate(mut self, v: bool) -> Self {
        self.config.auto_rotate = v;
        self
    }

    pub fn rotation(mut self, direction: RotationDirection) -> Self {
        self.config.rotation = direction;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn rasterize_timeout_secs(mut self, secs: u64) -> Self {
        self.config.rasterize_timeout_secs = secs;
        self
    }

    pub fn temp_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_root = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, Pdf2PngError> {
        let c = &self.config;
        if c.pdftoppm_path.as_os_str().is_empty() {
            return Err(Pdf2PngError::InvalidConfig(
                "pdftoppm path must not be empty".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(Pdf2PngError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        if c.rasterize_timeout_secs == 0 {
            return Err(Pdf2PngError::InvalidConfig(
                "Rasterize timeout must be ≥ 1s".into(),
            ));
        }
        if let Some(ref dir) = c.temp_root {
            if !dir.is_dir() {
                return Err(Pdf2PngError::InvalidConfig(format!(
                    "Temp directory '{}' does not exist",
                    dir.display()
                )));
            }
        }
        Ok(self.config)
    }
}

/// Which way a landscape page is turned to make it portrait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationDirection {
    /// 90° clockwise. (default)
    #[default]
    Clockwise,
    /// 90° counter-clockwise.
    CounterClockwise,
}

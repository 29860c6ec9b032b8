//! PDF rasterisation: render page 1 to PNG by running `pdftoppm`.
//!
//! The service never links a PDF engine. It shells out to poppler's
//! `pdftoppm`, which is installed on most Linux hosts and container images:
//!
//! ```text
//! pdftoppm -png -f 1 -l 1 -r <dpi> -singlefile <in.pdf> <out_prefix>
//! ```
//!
//! `-singlefile` makes the output name exactly `<out_prefix>.png`. Without it
//! pdftoppm appends a page number zero-padded to the width of the document's
//! page count (`-1.png`, `-01.png`, `-001.png`), which the caller would have
//! to guess.
//!
//! The child runs with `kill_on_drop`, so a timed-out or cancelled request
//! does not leave a stray process behind.

use crate::config::ServiceConfig;
use crate::error::Pdf2PngError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Anything that can turn the first page of a PDF on disk into a PNG on disk.
///
/// The HTTP layer only talks to this trait, which lets tests swap in a
/// rasterizer that does not need poppler installed.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Render page 1 of `pdf` and return the path of the PNG written next to
    /// `out_prefix`.
    async fn rasterize_first_page(
        &self,
        pdf: &Path,
        out_prefix: &Path,
    ) -> Result<PathBuf, Pdf2PngError>;

    /// Human-readable name for logs and the info endpoint.
    fn describe(&self) -> String {
        "rasterizer".to_string()
    }
}

/// [`Rasterizer`] backed by the poppler `pdftoppm` binary.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: PathBuf,
    dpi: u32,
    timeout: Duration,
}

impl PdftoppmRasterizer {
    pub fn new(program: impl Into<PathBuf>, dpi: u32, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            dpi,
            timeout,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            config.pdftoppm_path.clone(),
            config.dpi,
            config.rasterize_timeout(),
        )
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed to `pdftoppm`, in order.
    pub fn args(&self, pdf: &Path, out_prefix: &Path) -> Vec<OsString> {
        vec![
            "-png".into(),
            "-f".into(),
            "1".into(),
            "-l".into(),
            "1".into(),
            "-r".into(),
            self.dpi.to_string().into(),
            "-singlefile".into(),
            pdf.as_os_str().to_owned(),
            out_prefix.as_os_str().to_owned(),
        ]
    }

    /// Probe `pdftoppm -v` and return its version line, if the binary runs.
    ///
    /// pdftoppm prints its version to stderr and, depending on the poppler
    /// release, exits with 0 or 99, so the exit status is ignored. A binary
    /// that does not answer within the rasterize timeout counts as absent.
    pub async fn version(&self) -> Option<String> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-v")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                debug!("Could not run {} -v: {}", self.program.display(), e);
                return None;
            }
            Err(_) => {
                debug!("{} -v did not exit within {:?}", self.program.display(), self.timeout);
                return None;
            }
        };

        let line = [&output.stderr, &output.stdout]
            .into_iter()
            .filter_map(|buf| {
                String::from_utf8_lossy(buf)
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .map(str::to_string)
            })
            .next();
        line
    }
}

#[async_trait]
impl Rasterizer for PdftoppmRasterizer {
    async fn rasterize_first_page(
        &self,
        pdf: &Path,
        out_prefix: &Path,
    ) -> Result<PathBuf, Pdf2PngError> {
        let args = self.args(pdf, out_prefix);
        debug!("Running {} {:?}", self.program.display(), args);

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Pdf2PngError::RasterizerNotFound {
                    program: self.program.display().to_string(),
                });
            }
            Ok(Err(e)) => return Err(Pdf2PngError::io("spawning pdftoppm", e)),
            Err(_) => {
                return Err(Pdf2PngError::RasterizerTimeout {
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            return Err(Pdf2PngError::RasterizerFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let png = png_path_for(out_prefix);
        if !tokio::fs::try_exists(&png).await.unwrap_or(false) {
            return Err(Pdf2PngError::NoImageProduced { path: png });
        }

        info!("Rendered page 1 → {}", png.display());
        Ok(png)
    }

    fn describe(&self) -> String {
        format!("pdftoppm ({}, {} dpi)", self.program.display(), self.dpi)
    }
}

/// The file `pdftoppm -png -singlefile` writes for `out_prefix`.
pub fn png_path_for(out_prefix: &Path) -> PathBuf {
    let mut name = out_prefix.as_os_str().to_owned();
    name.push(".png");
    PathBuf::from(name)
}

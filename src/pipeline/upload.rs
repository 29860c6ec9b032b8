//! Upload staging: persist the uploaded PDF where the rasterizer can read it.
//!
//! `pdftoppm` only reads from the file system, so every request gets its own
//! `TempDir` holding the PDF and, later, the rendered PNG. The PDF is named
//! `<unix-millis>-<sanitized original name>`. Dropping [`StagedUpload`]
//! removes the directory and everything in it, so cleanup also happens when a
//! later stage fails or the request future is cancelled.

use crate::error::Pdf2PngError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Name used when the client sent no usable file name.
pub const FALLBACK_FILE_NAME: &str = "upload.pdf";

const MAX_NAME_LEN: usize = 96;

static RE_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());

/// A PDF written to a private scratch directory.
#[derive(Debug)]
pub struct StagedUpload {
    pdf_path: PathBuf,
    dir: TempDir,
}

impl StagedUpload {
    /// Validate `bytes` and write them into a fresh scratch directory.
    ///
    /// `temp_root` selects the parent directory; `None` uses the OS default.
    pub async fn stage(
        bytes: &[u8],
        original_name: Option<&str>,
        temp_root: Option<&Path>,
    ) -> Result<Self, Pdf2PngError> {
        check_pdf_magic(bytes)?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("pdf2png-");
        let dir = match temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| Pdf2PngError::io("creating scratch directory", e))?;

        let file_name = format!(
            "{}-{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize_file_name(original_name)
        );
        let pdf_path = dir.path().join(file_name);

        tokio::fs::write(&pdf_path, bytes)
            .await
            .map_err(|e| Pdf2PngError::io("writing uploaded PDF", e))?;

        debug!("Staged {} bytes at {}", bytes.len(), pdf_path.display());
        Ok(Self { pdf_path, dir })
    }

    pub fn pdf_path(&self) -> &Path {
        &self.pdf_path
    }

    /// Path prefix handed to the rasterizer: the PDF path without `.pdf`.
    pub fn output_prefix(&self) -> PathBuf {
        let stem = self
            .pdf_path
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| "page".into());
        self.dir.path().join(stem)
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the scratch directory now, logging (not failing) on error.
    pub fn cleanup(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Failed to remove scratch dir {}: {}", path.display(), e);
        }
    }
}

/// Reject anything that does not start with the `%PDF` header.
pub fn check_pdf_magic(bytes: &[u8]) -> Result<(), Pdf2PngError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        return Err(Pdf2PngError::NotAPdf {
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

/// Reduce a client-supplied file name to a safe single path component.
///
/// Directory parts are dropped, runs of characters outside `[A-Za-z0-9._-]`
/// become `_`, leading dots are stripped and a `.pdf` extension is ensured.
pub fn sanitize_file_name(name: Option<&str>) -> String {
    let base = name
        .and_then(|n| n.rsplit(['/', '\\']).next())
        .unwrap_or("");
    let cleaned = RE_UNSAFE.replace_all(base, "_");
    let mut cleaned = cleaned.trim_start_matches('.').to_string();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        return FALLBACK_FILE_NAME.to_string();
    }

    cleaned.truncate(MAX_NAME_LEN);
    if !cleaned.to_ascii_lowercase().ends_with(".pdf") {
        cleaned.push_str(".pdf");
    }
    cleaned
}

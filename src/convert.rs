//! Conversion entry points.
//!
//! [`convert_pdf_bytes`] runs the whole pipeline for an in-memory upload and
//! is what the HTTP handler calls. [`convert_file`] reads a local PDF first
//! and is what the CLI calls. Both return a [`ConversionOutput`] and leave no
//! files behind, whether they succeed or fail.

use crate::config::{RotationDirection, ServiceConfig};
use crate::error::Pdf2PngError;
use crate::output::ConversionOutput;
use crate::pipeline::render::Rasterizer;
use crate::pipeline::upload::StagedUpload;
use crate::pipeline::{encode, rotate};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Per-conversion knobs that a request may override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertOptions {
    pub auto_rotate: bool,
    pub rotation: RotationDirection,
}

impl From<&ServiceConfig> for ConvertOptions {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            auto_rotate: config.auto_rotate,
            rotation: config.rotation,
        }
    }
}

/// Render page 1 of an uploaded PDF to a PNG data URI.
///
/// # Arguments
/// * `bytes` — the uploaded PDF
/// * `original_name` — client-supplied file name, used (sanitised) for the temp file
/// * `options` — rotation settings for this request
/// * `rasterizer` — the page renderer
/// * `temp_root` — parent for the scratch directory; `None` uses the OS temp dir
///
/// # Errors
/// - [`Pdf2PngError::NotAPdf`] if the bytes lack the `%PDF` header
/// - rasterizer errors (`RasterizerFailed`, `RasterizerTimeout`, ...)
/// - [`Pdf2PngError::ImageProcessing`] if rotation cannot decode the render
pub async fn convert_pdf_bytes(
    bytes: &[u8],
    original_name: Option<&str>,
    options: &ConvertOptions,
    rasterizer: &dyn Rasterizer,
    temp_root: Option<&Path>,
) -> Result<ConversionOutput, Pdf2PngError> {
    let start = Instant::now();

    // ── Step 1: Stage upload ─────────────────────────────────────────────
    let staged = StagedUpload::stage(bytes, original_name, temp_root).await?;

    // ── Step 2: Rasterise page 1 ─────────────────────────────────────────
    let png_path = rasterizer
        .rasterize_first_page(staged.pdf_path(), &staged.output_prefix())
        .await?;

    let png = match tokio::fs::read(&png_path).await {
        Ok(png) => png,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Pdf2PngError::NoImageProduced { path: png_path });
        }
        Err(e) => return Err(Pdf2PngError::io("reading rendered PNG", e)),
    };

    // ── Step 3: Rotate ───────────────────────────────────────────────────
    let (png, rotated) = if options.auto_rotate {
        let out = rotate::auto_rotate(png, options.rotation).await?;
        (out.png, out.rotated)
    } else {
        (png, false)
    };

    // ── Step 4: Encode ───────────────────────────────────────────────────
    let image = encode::to_data_uri(&png);

    // ── Step 5: Clean up ─────────────────────────────────────────────────
    debug!("Removing scratch dir {}", staged.dir().display());
    staged.cleanup();

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Converted {} ({} bytes PDF → {} bytes PNG, rotated={}) in {}ms",
        original_name.unwrap_or("<unnamed>"),
        bytes.len(),
        png.len(),
        rotated,
        duration_ms
    );

    Ok(ConversionOutput {
        image,
        png,
        rotated,
        duration_ms,
    })
}

/// Render page 1 of a local PDF file.
pub async fn convert_file(
    path: impl AsRef<Path>,
    options: &ConvertOptions,
    rasterizer: &dyn Rasterizer,
    temp_root: Option<&Path>,
) -> Result<ConversionOutput, Pdf2PngError> {
    let path = path.as_ref();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Pdf2PngError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(Pdf2PngError::io("reading input PDF", e)),
    };

    let name = path.file_name().and_then(|n| n.to_str());
    convert_pdf_bytes(&bytes, name, options, rasterizer, temp_root).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::Mutex;

    const PDF: &[u8] = b"%PDF-1.7\n1 0 obj\n";

    /// Writes a fixed-size PNG and remembers where the PDF lived.
    struct FakeRasterizer {
        size: (u32, u32),
        seen_pdf: Mutex<Option<PathBuf>>,
    }

    impl FakeRasterizer {
        fn new(w: u32, h: u32) -> Self {
            Self {
                size: (w, h),
                seen_pdf: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Rasterizer for FakeRasterizer {
        async fn rasterize_first_page(
            &self,
            pdf: &Path,
            out_prefix: &Path,
        ) -> Result<PathBuf, Pdf2PngError> {
            *self.seen_pdf.lock().unwrap() = Some(pdf.to_path_buf());
            let img = DynamicImage::ImageRgba8(RgbaImage::new(self.size.0, self.size.1));
            let mut buf = Vec::new();
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
                .unwrap();
            let png = crate::pipeline::render::png_path_for(out_prefix);
            std::fs::write(&png, buf).unwrap();
            Ok(png)
        }
    }

    fn dims(png: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(png).unwrap();
        (img.width(), img.height())
    }

    #[tokio::test]
    async fn converts_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let raster = FakeRasterizer::new(6, 3);

        let out = convert_pdf_bytes(
            PDF,
            Some("scan.pdf"),
            &ConvertOptions::default(),
            &raster,
            Some(root.path()),
        )
        .await
        .unwrap();

        assert!(!out.rotated);
        assert_eq!(dims(&out.png), (6, 3));
        assert_eq!(out.image.file_size, out.png.len());
        assert!(out.image.base64.starts_with(encode::PNG_DATA_URI_PREFIX));

        let seen = raster.seen_pdf.lock().unwrap().clone().unwrap();
        assert!(seen.to_string_lossy().ends_with("-scan.pdf"));
        assert!(!seen.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn auto_rotate_turns_landscape_upright() {
        let root = tempfile::tempdir().unwrap();
        let options = ConvertOptions {
            auto_rotate: true,
            rotation: RotationDirection::Clockwise,
        };

        let out = convert_pdf_bytes(
            PDF,
            None,
            &options,
            &FakeRasterizer::new(6, 3),
            Some(root.path()),
        )
        .await
        .unwrap();

        assert!(out.rotated);
        assert_eq!(dims(&out.png), (3, 6));
    }

    #[tokio::test]
    async fn rasterizer_without_output_is_no_image() {
        struct Silent;

        #[async_trait]
        impl Rasterizer for Silent {
            async fn rasterize_first_page(
                &self,
                _pdf: &Path,
                out_prefix: &Path,
            ) -> Result<PathBuf, Pdf2PngError> {
                Ok(crate::pipeline::render::png_path_for(out_prefix))
            }
        }

        let root = tempfile::tempdir().unwrap();
        let err = convert_pdf_bytes(PDF, None, &ConvertOptions::default(), &Silent, Some(root.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2PngError::NoImageProduced { .. }));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn convert_file_reports_missing_input() {
        let err = convert_file(
            "/definitely/not/here.pdf",
            &ConvertOptions::default(),
            &FakeRasterizer::new(1, 1),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Pdf2PngError::FileNotFound { .. }));
    }

    #[test]
    fn options_follow_config() {
        let config = ServiceConfig::builder()
            .auto_rotate(true)
            .rotation(RotationDirection::CounterClockwise)
            .build()
            .unwrap();
        let options = ConvertOptions::from(&config);
        assert!(options.auto_rotate);
        assert_eq!(options.rotation, RotationDirection::CounterClockwise);
    }
}

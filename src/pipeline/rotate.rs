//! Auto-rotation: turn landscape renders upright.
//!
//! Scanned documents are often stored sideways. When auto-rotation is on and
//! the rendered page is wider than it is tall, the PNG is decoded, rotated by
//! 90° and re-encoded. Portrait and square pages are returned untouched, byte
//! for byte, so turning the feature on costs nothing for them beyond a decode.
//!
//! Decoding and encoding are CPU-bound and run on the blocking pool.

use crate::config::RotationDirection;
use crate::error::Pdf2PngError;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Outcome of [`auto_rotate`].
#[derive(Debug, Clone)]
pub struct RotatedPng {
    pub png: Vec<u8>,
    pub rotated: bool,
    pub width: u32,
    pub height: u32,
}

/// Rotate `png` upright if it is landscape. Runs in `spawn_blocking`.
pub async fn auto_rotate(
    png: Vec<u8>,
    direction: RotationDirection,
) -> Result<RotatedPng, Pdf2PngError> {
    tokio::task::spawn_blocking(move || auto_rotate_blocking(png, direction))
        .await
        .map_err(|e| Pdf2PngError::Internal(format!("Rotate task panicked: {}", e)))?
}

/// Blocking implementation of [`auto_rotate`].
pub fn auto_rotate_blocking(
    png: Vec<u8>,
    direction: RotationDirection,
) -> Result<RotatedPng, Pdf2PngError> {
    let img = image::load_from_memory_with_format(&png, ImageFormat::Png)?;
    let (width, height) = (img.width(), img.height());

    if width <= height {
        return Ok(RotatedPng {
            png,
            rotated: false,
            width,
            height,
        });
    }

    let upright = rotate(&img, direction);
    let mut buf = Vec::with_capacity(png.len());
    upright.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;

    debug!(
        "Rotated {}x{} → {}x{} ({:?})",
        width,
        height,
        upright.width(),
        upright.height(),
        direction
    );

    Ok(RotatedPng {
        png: buf,
        rotated: true,
        width: upright.width(),
        height: upright.height(),
    })
}

fn rotate(img: &DynamicImage, direction: RotationDirection) -> DynamicImage {
    match direction {
        RotationDirection::Clockwise => img.rotate90(),
        RotationDirection::CounterClockwise => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    /// A `w`×`h` white PNG with a single red pixel at the top-left corner.
    fn png_with_marker(w: u32, h: u32) -> Vec<u8> {
        let mut img = RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn red_pixel(png: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(png).unwrap().to_rgba8();
        img.enumerate_pixels()
            .find(|(_, _, p)| p.0 == [255, 0, 0, 255])
            .map(|(x, y, _)| (x, y))
            .unwrap()
    }

    #[test]
    fn portrait_is_passed_through_unchanged() {
        let png = png_with_marker(2, 4);
        let out = auto_rotate_blocking(png.clone(), RotationDirection::Clockwise).unwrap();
        assert!(!out.rotated);
        assert_eq!(out.png, png);
        assert_eq!((out.width, out.height), (2, 4));
    }

    #[test]
    fn square_is_not_rotated() {
        let png = png_with_marker(3, 3);
        let out = auto_rotate_blocking(png.clone(), RotationDirection::Clockwise).unwrap();
        assert!(!out.rotated);
        assert_eq!(out.png, png);
    }

    #[test]
    fn landscape_clockwise() {
        let out = auto_rotate_blocking(png_with_marker(4, 2), RotationDirection::Clockwise)
            .unwrap();
        assert!(out.rotated);
        assert_eq!((out.width, out.height), (2, 4));
        // Top-left moves to top-right.
        assert_eq!(red_pixel(&out.png), (1, 0));
    }

    #[test]
    fn landscape_counter_clockwise() {
        let out = auto_rotate_blocking(
            png_with_marker(4, 2),
            RotationDirection::CounterClockwise,
        )
        .unwrap();
        assert!(out.rotated);
        assert_eq!((out.width, out.height), (2, 4));
        // Top-left moves to bottom-left.
        assert_eq!(red_pixel(&out.png), (0, 3));
    }

    #[tokio::test]
    async fn garbage_is_an_image_error() {
        let err = auto_rotate(b"not a png".to_vec(), RotationDirection::Clockwise)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2PngError::ImageProcessing(_)));
    }
}

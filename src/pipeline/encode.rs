//! Image encoding: PNG bytes → base64 data URI.
//!
//! Standard alphabet with padding, which is what browsers accept in an
//! `<img src="data:...">` attribute.

use crate::output::ConvertedImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Wrap a PNG as a `data:image/png;base64,...` URI with size stats.
pub fn to_data_uri(png: &[u8]) -> ConvertedImage {
    let b64 = STANDARD.encode(png);
    debug!("Encoded image → {} bytes base64", b64.len());

    ConvertedImage {
        file_size: png.len(),
        base64_length: b64.len(),
        base64: format!("{PNG_DATA_URI_PREFIX}{b64}"),
    }
}

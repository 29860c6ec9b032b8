//! Pipeline stages for PDF-to-PNG conversion.
//!
//! Each submodule implements exactly one step, so each can be tested without
//! an HTTP server or a poppler install.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ render ──▶ rotate ──▶ encode
//! (TempDir)  (pdftoppm)  (image)    (base64)
//! ```
//!
//! 1. [`upload`] — validate `%PDF` magic and write the bytes into a private
//!    scratch directory with a timestamped name
//! 2. [`render`] — run the rasterizer on page 1; the only stage that spawns a
//!    process
//! 3. [`rotate`] — optionally turn a landscape render upright; runs in
//!    `spawn_blocking` because PNG decode/encode is CPU-bound
//! 4. [`encode`] — base64-wrap the PNG as a data URI

pub mod encode;
pub mod render;
pub mod rotate;
pub mod upload;

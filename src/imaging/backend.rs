//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait splits the work into two steps: `open` decodes a
//! source once (with EXIF orientation applied) and `render` turns that decoded
//! source into one output file per call. The pipeline drops the decoded value
//! before moving to the next source, so at most one source is held in memory.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::VariantParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions, as displayed (orientation applied).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// A decoded, upright source image.
    type Source;

    /// Decode a source file and normalize its orientation.
    fn open(&self, path: &Path) -> Result<Self::Source, BackendError>;

    /// Displayed dimensions of an opened source.
    fn dimensions(&self, source: &Self::Source) -> Dimensions;

    /// Crop, resize, encode and write one variant. Returns the number of
    /// bytes written.
    fn render(&self, source: &Self::Source, params: &VariantParams) -> Result<u64, BackendError>;
}

//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they take a
//! target description, compute the crop window, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::calculate_crop;
use super::params::{CropRect, OutputFormat, Quality, VariantParams};
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Exact output size and encoding for one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantTarget {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
    pub format: OutputFormat,
}

/// A variant written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedVariant {
    pub output: PathBuf,
    pub crop: CropRect,
    pub width: u32,
    pub height: u32,
    /// Encoded file size in bytes.
    pub bytes: u64,
}

/// Plan a variant without executing it.
///
/// The crop depends only on the source dimensions and the target ratio, so
/// every profile gets its own window from the untouched source.
pub fn plan_variant(source: Dimensions, target: &VariantTarget, output: &Path) -> VariantParams {
    VariantParams {
        output: output.to_path_buf(),
        crop: calculate_crop(source.as_tuple(), (target.width, target.height)),
        width: target.width,
        height: target.height,
        quality: target.quality,
        format: target.format,
    }
}

/// Crop, resize and encode one variant of an opened source.
pub fn create_variant<B: ImageBackend>(
    backend: &B,
    source: &B::Source,
    target: &VariantTarget,
    output: &Path,
) -> Result<GeneratedVariant> {
    let params = plan_variant(backend.dimensions(source), target, output);
    let bytes = backend.render(source, &params)?;

    Ok(GeneratedVariant {
        output: params.output,
        crop: params.crop,
        width: params.width,
        height: params.height,
        bytes,
    })
}

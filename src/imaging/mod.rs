//! Image processing: decode, crop, resize, encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode + orient** | `image::ImageReader` + EXIF orientation |
//! | **Decode AVIF** | `avif-parse` + `rav1d` |
//! | **Crop window** | [`calculate_crop`] (pure) |
//! | **Resize** | Lanczos3, exact target size |
//! | **Encode** | libwebp (`webp` crate) or rav1e AVIF |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop math (unit testable)
//! - **Parameters**: Data structures describing a variant
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

mod avif_decode;
pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::calculate_crop;
pub use operations::{GeneratedVariant, VariantTarget, create_variant, plan_variant};
pub use params::{CropRect, OutputFormat, Quality, VariantParams};
pub use rust_backend::{RustBackend, supported_input_extensions};

//! Pure Rust decode/resize pipeline with a libwebp encoder.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` → `into_decoder` |
//! | Decode (AVIF) | `avif-parse` (container) + `rav1d` (AV1), BT.601 YUV → RGB |
//! | EXIF orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Crop | `DynamicImage::crop_imm` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → WebP (lossy) | `webp::Encoder::encode_advanced`, `method = 6` |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 1) |

use super::avif_decode::{decode_avif, is_avif};
use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{OutputFormat, VariantParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::path::Path;
use std::sync::LazyLock;

/// rav1e speed preset: 1 is the slowest and smallest.
const AVIF_SPEED: u8 = 1;

/// libwebp compression method: 6 is the slowest and smallest.
const WEBP_METHOD: i32 = 6;

/// Extensions decoded through the `image` crate.
///
/// AVIF is not listed: the `"avif"` feature of the `image` crate only enables
/// the encoder, while `ImageFormat::reading_enabled()` still claims AVIF
/// support. It is appended separately below.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("webp", ImageFormat::WebP),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut exts: Vec<&'static str> = PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect();
    exts.push("avif");
    exts
});

/// Returns the set of source extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Backend built on the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, err: image::ImageError) -> BackendError {
    BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), err))
}

/// Decode an image and rotate/flip it upright according to its EXIF tag.
///
/// AVIF sources go through the rav1d decoder and carry no EXIF orientation.
fn load_oriented(path: &Path) -> Result<DynamicImage, BackendError> {
    if is_avif(path) {
        return decode_avif(path);
    }
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()
        .map_err(|e| decode_error(path, e))?;
    let orientation = decoder.orientation().map_err(|e| decode_error(path, e))?;
    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| decode_error(path, e))?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Force an 8-bit RGB or RGBA layout, keeping alpha only when present.
///
/// The WebP encoder only accepts 8-bit RGB or RGBA buffers.
fn normalize_color(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => img,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

fn encode_webp(img: &DynamicImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    let encoder = webp::Encoder::from_image(img).map_err(|e| {
        BackendError::ProcessingFailed(format!("WebP encoder rejected image: {}", e))
    })?;
    let mut config = webp::WebPConfig::new()
        .map_err(|_| BackendError::ProcessingFailed("WebP config init failed".into()))?;
    config.lossless = 0;
    config.quality = quality as f32;
    config.method = WEBP_METHOD;
    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {:?}", e)))?;
    Ok(memory.to_vec())
}

fn encode_avif(img: &DynamicImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    let mut buffer = Vec::new();
    let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(
        &mut buffer,
        AVIF_SPEED,
        quality as u8,
    );
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("AVIF encode failed: {}", e)))?;
    Ok(buffer)
}

impl ImageBackend for RustBackend {
    type Source = DynamicImage;

    fn open(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        load_oriented(path)
    }

    fn dimensions(&self, source: &DynamicImage) -> Dimensions {
        Dimensions {
            width: source.width(),
            height: source.height(),
        }
    }

    fn render(&self, source: &DynamicImage, params: &VariantParams) -> Result<u64, BackendError> {
        let crop = params.crop;
        let cropped = source.crop_imm(crop.x, crop.y, crop.width, crop.height);
        let resized = cropped.resize_exact(params.width, params.height, FilterType::Lanczos3);
        let final_img = normalize_color(resized);

        let quality = params.quality.value();
        let bytes = match params.format {
            OutputFormat::Webp => encode_webp(&final_img, quality)?,
            OutputFormat::Avif => encode_avif(&final_img, quality)?,
        };
        std::fs::write(&params.output, &bytes)?;
        Ok(bytes.len() as u64)
    }
}

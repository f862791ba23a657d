//! Shared test utilities: synthetic source images and config builders.
//!
//! Every fixture is generated on the fly into a `TempDir`, so tests never
//! depend on binary files checked into the repository.

use crate::config::{OptimizeConfig, Profile};
use crate::imaging::OutputFormat;
use image::{ImageEncoder, RgbImage};
use std::path::Path;

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write an opaque RGB PNG.
pub fn write_png(path: &Path, width: u32, height: u32) {
    gradient(width, height).save(path).unwrap();
}

/// Write an RGBA PNG with a transparent left half.
pub fn write_rgba_png(path: &Path, width: u32, height: u32) {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if x < width / 2 { 0 } else { 255 };
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, alpha])
    });
    img.save(path).unwrap();
}

/// Write an 8-bit grayscale PNG.
pub fn write_gray_png(path: &Path, width: u32, height: u32) {
    let img = image::GrayImage::from_fn(width, height, |x, y| image::Luma([((x + y) % 256) as u8]));
    img.save(path).unwrap();
}

fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

/// Write an AVIF through the `image` crate's rav1e encoder (fastest preset).
pub fn write_avif(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let mut bytes = Vec::new();
    image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut bytes, 10, 85)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    std::fs::write(path, bytes).unwrap();
}

/// Write a baseline JPEG.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, encode_jpeg(width, height)).unwrap();
}

/// Write a JPEG carrying an EXIF APP1 segment with the given orientation tag.
pub fn write_jpeg_with_orientation(path: &Path, width: u32, height: u32, orientation: u16) {
    let jpeg = encode_jpeg(width, height);

    // "Exif\0\0" + big-endian TIFF header + one-entry IFD0 (tag 0x0112, SHORT)
    let mut payload = b"Exif\0\0MM\0\x2a\0\0\0\x08\0\x01\x01\x12\0\x03\0\0\0\x01".to_vec();
    payload.extend_from_slice(&orientation.to_be_bytes());
    payload.extend_from_slice(&[0, 0, 0, 0, 0, 0]);

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]); // SOI
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    std::fs::write(path, out).unwrap();
}

// =========================================================================
// Config builders
// =========================================================================

/// A small profile pair (16:9 and 9:16) so real encodes stay fast.
pub fn small_profiles() -> Vec<Profile> {
    vec![
        Profile {
            name: "mobile-9x16".to_string(),
            width: 36,
            height: 64,
            quality: 75,
            format: OutputFormat::Webp,
        },
        Profile {
            name: "desktop-16x9".to_string(),
            width: 64,
            height: 36,
            quality: 78,
            format: OutputFormat::Webp,
        },
    ]
}

/// Stock config rooted at `root/assets` → `root/assets/optimized`.
pub fn config_in(root: &Path) -> OptimizeConfig {
    let config = OptimizeConfig {
        source_dir: root.join("assets"),
        output_dir: root.join("assets").join("optimized"),
        profiles: small_profiles(),
        ..OptimizeConfig::default()
    };
    std::fs::create_dir_all(&config.source_dir).unwrap();
    config
}

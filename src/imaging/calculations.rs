//! Pure calculation functions for crop windows.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::CropRect;

/// Aspect ratios closer than this are treated as equal.
const RATIO_TOLERANCE: f64 = 1e-6;

/// Calculate the centered crop window that gives `source` the aspect ratio of
/// `target`.
///
/// One axis is always kept whole; the other is shortened symmetrically. When
/// the removed amount is odd, the extra pixel comes off the right/bottom edge
/// because the offset is floored.
///
/// # Arguments
/// * `source` - Oriented source dimensions (width, height)
/// * `target` - Output dimensions (width, height); only their ratio matters
///
/// # Examples
/// ```
/// # use asset_optimizer::imaging::{CropRect, calculate_crop};
/// // 4:3 source, 16:9 target → trim top and bottom
/// assert_eq!(
///     calculate_crop((1600, 1200), (1024, 576)),
///     CropRect { x: 0, y: 150, width: 1600, height: 900 }
/// );
/// ```
pub fn calculate_crop(source: (u32, u32), target: (u32, u32)) -> CropRect {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    if src_w == 0 || src_h == 0 || tgt_w == 0 || tgt_h == 0 {
        return CropRect::full(src_w, src_h);
    }

    let src_ratio = src_w as f64 / src_h as f64;
    let tgt_ratio = tgt_w as f64 / tgt_h as f64;

    if (src_ratio - tgt_ratio).abs() < RATIO_TOLERANCE {
        return CropRect::full(src_w, src_h);
    }

    if src_ratio > tgt_ratio {
        // Wider than target: keep full height, trim left and right
        let width = ((src_h as f64 * tgt_ratio).round() as u32).clamp(1, src_w);
        CropRect {
            x: (src_w - width) / 2,
            y: 0,
            width,
            height: src_h,
        }
    } else {
        // Taller than target: keep full width, trim top and bottom
        let height = ((src_w as f64 / tgt_ratio).round() as u32).clamp(1, src_h);
        CropRect {
            x: 0,
            y: (src_h - height) / 2,
            width: src_w,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_within_bounds(crop: CropRect, source: (u32, u32)) {
        assert!(crop.width >= 1 && crop.height >= 1, "{crop:?}");
        assert!(crop.x + crop.width <= source.0, "{crop:?} exceeds {source:?}");
        assert!(crop.y + crop.height <= source.1, "{crop:?} exceeds {source:?}");
    }

    #[test]
    fn landscape_source_to_desktop_trims_top_and_bottom() {
        // 1600x1200 (4:3) → 16:9: height = 1600 / (16/9) = 900
        let crop = calculate_crop((1600, 1200), (1024, 576));
        assert_eq!(
            crop,
            CropRect {
                x: 0,
                y: 150,
                width: 1600,
                height: 900
            }
        );
    }

    #[test]
    fn landscape_source_to_mobile_trims_sides() {
        // 1600x1200 → 9:16: width = round(1200 * 0.5625) = 675, left = floor(925 / 2)
        let crop = calculate_crop((1600, 1200), (576, 1024));
        assert_eq!(
            crop,
            CropRect {
                x: 462,
                y: 0,
                width: 675,
                height: 1200
            }
        );
    }

    #[test]
    fn matching_ratio_is_full_frame() {
        let crop = calculate_crop((3840, 2160), (1920, 1080));
        assert!(crop.is_full(3840, 2160));
    }

    #[test]
    fn near_matching_ratio_is_full_frame() {
        // 1920x1080 vs 1024x576 are both exactly 16:9
        assert!(calculate_crop((1920, 1080), (1024, 576)).is_full(1920, 1080));
    }

    #[test]
    fn square_source_to_portrait() {
        let crop = calculate_crop((1000, 1000), (1080, 1920));
        assert_eq!(crop.height, 1000);
        assert_eq!(crop.width, 563); // round(1000 * 0.5625) = 562.5 → 563
        assert_eq!(crop.x, 218); // floor(437 / 2)
        assert_within_bounds(crop, (1000, 1000));
    }

    #[test]
    fn tall_source_to_landscape() {
        let crop = calculate_crop((1200, 2000), (1920, 1080));
        assert_eq!(crop.width, 1200);
        assert_eq!(crop.height, 675); // 1200 / (16/9)
        assert_eq!(crop.y, 662); // floor(1325 / 2)
        assert_within_bounds(crop, (1200, 2000));
    }

    #[test]
    fn tiny_sources_stay_in_bounds() {
        for source in [(1, 1), (1, 500), (500, 1), (3, 2), (2, 3)] {
            for target in [(1920, 1080), (1080, 1920), (1, 1)] {
                assert_within_bounds(calculate_crop(source, target), source);
            }
        }
    }

    #[test]
    fn crop_keeps_target_ratio() {
        let crop = calculate_crop((4032, 3024), (1920, 1080));
        let ratio = crop.width as f64 / crop.height as f64;
        assert!((ratio - 16.0 / 9.0).abs() < 0.002, "ratio {ratio}");
    }

    #[test]
    fn profiles_are_independent() {
        let source = (1600, 1200);
        let desktop = calculate_crop(source, (1920, 1080));
        let mobile = calculate_crop(source, (1080, 1920));
        assert_eq!(calculate_crop(source, (1920, 1080)), desktop);
        assert_ne!(desktop, mobile);
    }

    #[test]
    fn zero_dimensions_fall_back_to_full() {
        assert_eq!(calculate_crop((0, 0), (16, 9)), CropRect::full(0, 0));
    }
}

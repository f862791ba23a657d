//! AVIF source decoding.
//!
//! The `image` crate's `"avif"` feature only compiles the rav1e encoder;
//! its decoder needs the C library dav1d. Sources are decoded here instead:
//! `avif-parse` pulls the primary AV1 item out of the HEIF container and
//! `rav1d` (the Rust port of dav1d) decodes it to YUV planes, which are
//! converted to RGB8 with BT.601 coefficients.
//!
//! Only the primary color item is read. Alpha items and the `irot`/`imir`
//! transform boxes are ignored.

use super::backend::BackendError;
use image::{DynamicImage, RgbImage};
use rav1d::include::dav1d::data::Dav1dData;
use rav1d::include::dav1d::dav1d::Dav1dSettings;
use rav1d::include::dav1d::headers::{
    DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
    DAV1D_PIXEL_LAYOUT_I444,
};
use rav1d::include::dav1d::picture::Dav1dPicture;
use rav1d::src::lib as dav1d;
use std::mem::MaybeUninit;
use std::path::Path;
use std::ptr::NonNull;

/// Whether a path names an AVIF file (by extension, case-insensitive).
pub fn is_avif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("avif"))
}

fn failed(path: &Path, what: impl std::fmt::Display) -> BackendError {
    BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), what))
}

/// Decode the primary image of an AVIF file to RGB8.
pub fn decode_avif(path: &Path) -> Result<DynamicImage, BackendError> {
    let file_data = std::fs::read(path)?;
    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(&file_data))
        .map_err(|e| failed(path, format!("AVIF container: {e:?}")))?;
    let av1_bytes: &[u8] = &avif.primary_item;

    let mut settings = MaybeUninit::<Dav1dSettings>::uninit();
    // SAFETY: dav1d_default_settings fully initializes the struct it is given.
    let mut settings = unsafe {
        dav1d::dav1d_default_settings(NonNull::from(&mut settings).cast::<Dav1dSettings>());
        settings.assume_init()
    };
    settings.n_threads = 1;
    settings.max_frame_delay = 1;

    let mut ctx = None;
    // SAFETY: both pointers come from live locals.
    let rc = unsafe { dav1d::dav1d_open(NonNull::new(&mut ctx), NonNull::new(&mut settings)) };
    if rc.0 != 0 {
        return Err(failed(path, format!("rav1d open returned {}", rc.0)));
    }

    // The context is closed on every path once this returns.
    let decoded = (|| -> Result<DynamicImage, BackendError> {
        let mut data = Dav1dData::default();
        // SAFETY: `data` is a live local; the returned buffer has `len` bytes.
        let buf = unsafe { dav1d::dav1d_data_create(NonNull::new(&mut data), av1_bytes.len()) };
        if buf.is_null() {
            return Err(failed(path, "rav1d could not allocate input buffer"));
        }
        // SAFETY: `buf` was just allocated with exactly `av1_bytes.len()` bytes.
        unsafe { std::ptr::copy_nonoverlapping(av1_bytes.as_ptr(), buf, av1_bytes.len()) };

        // SAFETY: ctx is open; on success the decoder takes ownership of `data`.
        let rc = unsafe { dav1d::dav1d_send_data(ctx, NonNull::new(&mut data)) };
        if rc.0 != 0 {
            // SAFETY: `data` still owns its buffer after a rejected send.
            unsafe { dav1d::dav1d_data_unref(NonNull::new(&mut data)) };
            return Err(failed(path, format!("rav1d send_data returned {}", rc.0)));
        }

        // SAFETY: Dav1dPicture is plain data; all-zero is its empty state.
        let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
        // SAFETY: ctx is open and `pic` is a live local.
        let rc = unsafe { dav1d::dav1d_get_picture(ctx, NonNull::new(&mut pic)) };
        if rc.0 != 0 {
            return Err(failed(path, format!("rav1d get_picture returned {}", rc.0)));
        }

        let converted = picture_to_rgb(path, &pic);
        // SAFETY: `pic` holds a reference obtained from dav1d_get_picture.
        unsafe { dav1d::dav1d_picture_unref(NonNull::new(&mut pic)) };
        converted
    })();

    // SAFETY: ctx was opened above and is not used afterwards.
    unsafe { dav1d::dav1d_close(NonNull::new(&mut ctx)) };
    decoded
}

/// One YUV plane inside a decoded picture.
#[derive(Clone, Copy)]
struct Plane {
    ptr: *const u8,
    stride: isize,
}

impl Plane {
    /// Sample value at `(x, y)`. High bit depths are stored as `u16`.
    ///
    /// # Safety
    ///
    /// `(x, y)` must lie inside the plane the pointer was taken from.
    unsafe fn sample(self, x: u32, y: u32, bpc: u32) -> f32 {
        if bpc <= 8 {
            let offset = y as isize * self.stride + x as isize;
            // SAFETY: in bounds per the caller's contract.
            f32::from(unsafe { *self.ptr.offset(offset) })
        } else {
            let offset = y as isize * self.stride + x as isize * 2;
            // SAFETY: in bounds per the caller's contract; rows are u16-aligned.
            f32::from(unsafe { *(self.ptr.offset(offset) as *const u16) })
        }
    }
}

fn plane(pic: &Dav1dPicture, index: usize, path: &Path) -> Result<Plane, BackendError> {
    let ptr = pic.data[index]
        .ok_or_else(|| failed(path, format!("decoded picture has no plane {index}")))?
        .as_ptr() as *const u8;
    let stride = pic.stride[index.min(1)];
    Ok(Plane { ptr, stride })
}

fn picture_to_rgb(path: &Path, pic: &Dav1dPicture) -> Result<DynamicImage, BackendError> {
    let width = pic.p.w as u32;
    let height = pic.p.h as u32;
    let bpc = pic.p.bpc as u32;
    let layout = pic.p.layout;

    let luma = plane(pic, 0, path)?;
    // (subsample x, subsample y), or None for monochrome
    let chroma = match layout {
        DAV1D_PIXEL_LAYOUT_I400 => None,
        DAV1D_PIXEL_LAYOUT_I420 => Some((true, true)),
        DAV1D_PIXEL_LAYOUT_I422 => Some((true, false)),
        DAV1D_PIXEL_LAYOUT_I444 => Some((false, false)),
        _ => return Err(failed(path, format!("unsupported pixel layout {layout}"))),
    };
    let chroma = match chroma {
        Some(subsampling) => Some((plane(pic, 1, path)?, plane(pic, 2, path)?, subsampling)),
        None => None,
    };

    let scale = 255.0 / ((1u32 << bpc) - 1) as f32;
    let center = (1u32 << (bpc - 1)) as f32;
    let to_u8 = |v: f32| (v * scale).clamp(0.0, 255.0) as u8;

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            // SAFETY: x < w and y < h of the decoded picture.
            let luma_value = unsafe { luma.sample(x, y, bpc) };
            match chroma {
                None => {
                    let v = to_u8(luma_value);
                    rgb.extend_from_slice(&[v, v, v]);
                }
                Some((u, v, (ss_x, ss_y))) => {
                    let cx = if ss_x { x / 2 } else { x };
                    let cy = if ss_y { y / 2 } else { y };
                    // SAFETY: subsampled coordinates stay inside the chroma planes.
                    let (cb, cr) = unsafe { (u.sample(cx, cy, bpc), v.sample(cx, cy, bpc)) };
                    let (cb, cr) = (cb - center, cr - center);
                    rgb.extend_from_slice(&[
                        to_u8(luma_value + 1.402 * cr),
                        to_u8(luma_value - 0.344136 * cb - 0.714136 * cr),
                        to_u8(luma_value + 1.772 * cb),
                    ]);
                }
            }
        }
    }

    RgbImage::from_raw(width, height, rgb)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| failed(path, "decoded AVIF buffer has the wrong size"))
}

// Ordered-dither thresholder: source bitmap -> reduced-resolution binary mask.
// Visual: the image becomes a field of phosphor dots, denser where the source
// is bright, like a 1-bit terminal rendering of a photograph.

use crate::types::Mask;
use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Working-resolution bounds per axis.
pub const MASK_MIN: u32 = 32;
pub const MASK_MAX: u32 = 200;

/// Extra reduction below the fitted size; chunkier dots read better.
const REDUCTION: f32 = 0.3;

/// Classic 8x8 Bayer matrix; thresholds 0..63 arranged so that ramping
/// brightness turns cells on in a maximally dispersed order.
pub const BAYER8: [[u8; 8]; 8] = [
    [0, 48, 12, 60, 3, 51, 15, 63],
    [32, 16, 44, 28, 35, 19, 47, 31],
    [8, 56, 4, 52, 11, 59, 7, 55],
    [40, 24, 36, 20, 43, 27, 39, 23],
    [2, 50, 14, 62, 1, 49, 13, 61],
    [34, 18, 46, 30, 33, 17, 45, 29],
    [10, 58, 6, 54, 9, 57, 5, 53],
    [42, 26, 38, 22, 41, 25, 37, 21],
];

/// Rec.601 luma, normalized to [0,1]. Shared by the thresholder and the
/// compositor's grayscale pass.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0
}

/// Dither threshold for a mask cell, in (0,1). Position wraps modulo 8.
#[inline]
pub fn dither_threshold(x: usize, y: usize) -> f32 {
    (BAYER8[y & 7][x & 7] as f32 + 0.5) / 64.0
}

/// Working resolution for the mask: fit the source into the target area,
/// reduce, floor, clamp to [MASK_MIN, MASK_MAX] per axis.
pub fn mask_resolution(src_w: u32, src_h: u32, target_w: usize, target_h: usize) -> (u32, u32) {
    let scale = (target_w as f32 / src_w as f32).min(target_h as f32 / src_h as f32);
    let w = ((src_w as f32 * scale * REDUCTION).floor() as u32).clamp(MASK_MIN, MASK_MAX);
    let h = ((src_h as f32 * scale * REDUCTION).floor() as u32).clamp(MASK_MIN, MASK_MAX);
    (w, h)
}

/// Build the binary mask for a source bitmap and target display area.
pub fn mono_mask(img: &RgbaImage, target_w: usize, target_h: usize) -> Mask {
    let (w, h) = mask_resolution(img.width(), img.height(), target_w, target_h);
    // Nearest-neighbor keeps hard pixel edges through the downsample.
    let small = imageops::resize(img, w, h, FilterType::Nearest);

    let (w, h) = (w as usize, h as usize);
    let mut bits = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let px = small.get_pixel(x as u32, y as u32);
            let lum = luminance(px[0], px[1], px[2]);
            bits[y * w + x] = u8::from(lum > dither_threshold(x, y));
        }
    }
    Mask { width: w, height: h, bits }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_image(w: u32, h: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, image::Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    #[test]
    fn resolution_is_clamped_per_axis() {
        // Huge source into a huge target: both axes hit the upper clamp.
        let (w, h) = mask_resolution(4000, 4000, 4000, 4000);
        assert_eq!((w, h), (MASK_MAX, MASK_MAX));
        // Tiny source: both axes hit the lower clamp.
        let (w, h) = mask_resolution(16, 16, 100, 100);
        assert_eq!((w, h), (MASK_MIN, MASK_MIN));
    }

    #[test]
    fn resolution_preserves_aspect_within_rounding() {
        let (w, h) = mask_resolution(800, 600, 400, 300);
        assert_eq!((w, h), (120, 90));
        // 4:3 held exactly here; in general within one pixel of rounding.
        assert!((w as f32 / h as f32 - 4.0 / 3.0).abs() < 0.02);
        assert!(w <= 200 && h <= 150);
    }

    #[test]
    fn white_always_draws_and_black_never_does() {
        // The extreme thresholds are 0.5/64 and 63.5/64, so pure white beats
        // every cell and pure black beats none, at every dither position.
        let white = mono_mask(&flat_image(64, 64, [255, 255, 255]), 256, 256);
        assert!(white.bits.iter().all(|&b| b == 1));
        let black = mono_mask(&flat_image(64, 64, [0, 0, 0]), 256, 256);
        assert!(black.bits.iter().all(|&b| b == 0));
    }

    #[test]
    fn mid_gray_dithers_to_roughly_half_coverage() {
        let mask = mono_mask(&flat_image(64, 64, [128, 128, 128]), 256, 256);
        let on = mask.bits.iter().filter(|&&b| b == 1).count();
        let total = mask.bits.len();
        let ratio = on as f32 / total as f32;
        assert!((0.4..0.6).contains(&ratio), "coverage {ratio}");
    }

    #[test]
    fn luminance_weights_are_rec601() {
        assert!((luminance(255, 0, 0) - 0.299).abs() < 1e-3);
        assert!((luminance(0, 255, 0) - 0.587).abs() < 1e-3);
        assert!((luminance(0, 0, 255) - 0.114).abs() < 1e-3);
        assert!((luminance(255, 255, 255) - 1.0).abs() < 1e-6);
    }
}

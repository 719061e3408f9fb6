//! Per-pixel importance weights for sampling, clustering, and dithering.
//!
//! Smooth regions get weights near 1.0 so the palette protects them;
//! textured regions get weights down to 0.1 because quantization error is
//! visually masked there. Pixels below the configured opacity floor are
//! scaled down further so near-invisible colors don't claim palette entries.

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use crate::image::SourceImage;
use crate::oklab::srgb_to_oklab;

const BLOCK: usize = 4;

/// Compute importance weights for every pixel of `image`, in [0.1, 1.0]
/// before alpha scaling.
pub fn importance_weights(image: &SourceImage, min_opacity: u8) -> Vec<f32> {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let pixels = image.pixels();

    let luminance: Vec<f32> = pixels
        .iter()
        .map(|p| srgb_to_oklab(p.r, p.g, p.b).l)
        .collect();
    let contrast = local_contrast(&luminance, width, height);

    let block_w = width.div_ceil(BLOCK);
    let block_h = height.div_ceil(BLOCK);
    let blocks = erode_to_blocks(&contrast, width, height, block_w, block_h);
    let masking = upscale_bilinear(&blocks, block_w, block_h, width, height);

    let mut weights = contrast_to_weights(&masking);
    scale_by_opacity(&mut weights, pixels, min_opacity);
    weights
}

/// Local contrast: (L - avg of 4-neighbors)², clamped to [0, 0.2].
fn local_contrast(luminance: &[f32], width: usize, height: usize) -> Vec<f32> {
    let mut contrast = vec![0.0f32; luminance.len()];

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let center = luminance[idx];

            let mut sum = 0.0f32;
            let mut count = 0u32;
            if x > 0 {
                sum += luminance[idx - 1];
                count += 1;
            }
            if x + 1 < width {
                sum += luminance[idx + 1];
                count += 1;
            }
            if y > 0 {
                sum += luminance[idx - width];
                count += 1;
            }
            if y + 1 < height {
                sum += luminance[idx + width];
                count += 1;
            }

            let avg = if count > 0 { sum / count as f32 } else { center };
            let diff = center - avg;
            contrast[idx] = (diff * diff).min(0.2);
        }
    }

    contrast
}

/// Min-biased erosion: per 4×4 block, weighted average of the 4 smallest
/// contrast values. Heavier min-bias protects smooth gradients from being
/// classified as texture by a few noisy pixels.
fn erode_to_blocks(
    contrast: &[f32],
    width: usize,
    height: usize,
    block_w: usize,
    block_h: usize,
) -> Vec<f32> {
    const RANK_WEIGHTS: [f32; 4] = [0.40, 0.25, 0.20, 0.15];

    let mut blocks = vec![0.0f32; block_w * block_h];

    for by in 0..block_h {
        for bx in 0..block_w {
            let y_start = by * BLOCK;
            let x_start = bx * BLOCK;
            let y_end = (y_start + BLOCK).min(height);
            let x_end = (x_start + BLOCK).min(width);

            let mut values = Vec::with_capacity(BLOCK * BLOCK);
            for y in y_start..y_end {
                for x in x_start..x_end {
                    values.push(contrast[y * width + x]);
                }
            }
            if values.is_empty() {
                continue;
            }
            values.sort_unstable_by(|a, b| a.total_cmp(b));

            let n = values.len().min(RANK_WEIGHTS.len());
            let mut weighted_sum = 0.0f32;
            let mut weight_sum = 0.0f32;
            for i in 0..n {
                weighted_sum += values[i] * RANK_WEIGHTS[i];
                weight_sum += RANK_WEIGHTS[i];
            }
            blocks[by * block_w + bx] = weighted_sum / weight_sum;
        }
    }

    blocks
}

/// Bilinear upscale from the block grid back to per-pixel resolution.
fn upscale_bilinear(
    blocks: &[f32],
    block_w: usize,
    block_h: usize,
    width: usize,
    height: usize,
) -> Vec<f32> {
    let mut output = vec![0.0f32; width * height];
    let half = (BLOCK / 2) as f32;

    for y in 0..height {
        for x in 0..width {
            // Block centers sit at (bx * 4 + 2, by * 4 + 2)
            let bx_f = (x as f32 - half) / BLOCK as f32;
            let by_f = (y as f32 - half) / BLOCK as f32;

            let bx0 = (bx_f.floor() as isize).max(0) as usize;
            let by0 = (by_f.floor() as isize).max(0) as usize;
            let bx1 = (bx0 + 1).min(block_w - 1);
            let by1 = (by0 + 1).min(block_h - 1);

            let fx = (bx_f - bx0 as f32).clamp(0.0, 1.0);
            let fy = (by_f - by0 as f32).clamp(0.0, 1.0);

            let v00 = blocks[by0 * block_w + bx0];
            let v10 = blocks[by0 * block_w + bx1];
            let v01 = blocks[by1 * block_w + bx0];
            let v11 = blocks[by1 * block_w + bx1];

            let top = v00 * (1.0 - fx) + v10 * fx;
            let bot = v01 * (1.0 - fx) + v11 * fx;
            output[y * width + x] = top * (1.0 - fy) + bot * fy;
        }
    }

    output
}

/// Low contrast (smooth) → high weight, high contrast (texture) → low weight.
fn contrast_to_weights(masking: &[f32]) -> Vec<f32> {
    const K: f32 = 4.0;

    masking
        .iter()
        .map(|&m| {
            let w = 0.1 + 0.9 / (1.0 + K * m.sqrt());
            w.clamp(0.1, 1.0)
        })
        .collect()
}

/// Pixels under the opacity floor contribute reduced weight, proportional to
/// how visible they actually are — but never zero, since even mostly
/// transparent regions must land on *some* palette entry.
fn scale_by_opacity(weights: &mut [f32], pixels: &[rgb::RGBA<u8>], min_opacity: u8) {
    if min_opacity == 0 {
        return;
    }
    const FLOOR: f32 = 1.0 / 16.0;
    for (w, p) in weights.iter_mut().zip(pixels.iter()) {
        if p.a < min_opacity {
            *w *= (p.a as f32 / 255.0).max(FLOOR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_image(r: u8, g: u8, b: u8, w: u32, h: u32) -> SourceImage {
        let px = vec![rgb::RGBA { r, g, b, a: 255 }; (w * h) as usize];
        SourceImage::new(px, w, h, 0.0).unwrap()
    }

    #[test]
    fn flat_image_high_weights() {
        let img = flat_image(128, 128, 128, 16, 16);
        let weights = importance_weights(&img, 0);
        assert_eq!(weights.len(), 256);
        for &w in &weights {
            assert!(w > 0.95, "expected high weight for flat image, got {w}");
        }
    }

    #[test]
    fn checkerboard_low_weights() {
        let mut px = Vec::with_capacity(16 * 16);
        for y in 0..16 {
            for x in 0..16 {
                let v = if (x + y) % 2 == 0 { 0 } else { 255 };
                px.push(rgb::RGBA { r: v, g: v, b: v, a: 255 });
            }
        }
        let img = SourceImage::new(px, 16, 16, 0.0).unwrap();
        let weights = importance_weights(&img, 0);
        let mean: f32 = weights.iter().sum::<f32>() / weights.len() as f32;
        assert!(mean < 0.5, "expected low mean weight for checkerboard, got {mean}");
    }

    #[test]
    fn weights_in_valid_range() {
        let mut px = Vec::with_capacity(32 * 32);
        for i in 0..(32 * 32) {
            let v = (i % 256) as u8;
            px.push(rgb::RGBA { r: v, g: v, b: v, a: 255 });
        }
        let img = SourceImage::new(px, 32, 32, 0.0).unwrap();
        for &w in &importance_weights(&img, 0) {
            assert!((0.1..=1.0).contains(&w), "weight {w} out of range");
        }
    }

    #[test]
    fn low_opacity_pixels_downweighted() {
        let mut px = vec![rgb::RGBA { r: 10, g: 20, b: 30, a: 255 }; 64];
        px[5].a = 4; // nearly invisible
        let img = SourceImage::new(px, 8, 8, 0.0).unwrap();

        let unscaled = importance_weights(&img, 0);
        let scaled = importance_weights(&img, 128);
        assert!(scaled[5] < unscaled[5]);
        assert!(scaled[5] > 0.0, "reduced, never dropped");
        // Opaque neighbors are untouched
        assert_eq!(scaled[6], unscaled[6]);
    }
}

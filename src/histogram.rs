//! Color Sampler: reduces the source image to a bounded set of weighted
//! sample colors for the palette builder.

extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::error::QuantizeError;
use crate::image::SourceImage;
use crate::oklab::{rgba_to_oklaba, OKLabA};
use crate::Config;

/// Sampled colors plus the flags the rest of the pipeline needs.
#[derive(Debug)]
pub struct Histogram {
    /// Weighted bucket centroids in OKLab + alpha.
    pub entries: Vec<(OKLabA, f32)>,
    /// Whether any fully transparent pixel was seen (reserves a palette slot).
    pub has_transparent: bool,
    /// When the image holds few enough distinct colors, the exact sRGBA
    /// values (with accumulated weights) — no clustering needed, and the
    /// output palette reproduces the input byte-for-byte.
    pub exact: Option<Vec<(rgb::RGBA<u8>, f32)>>,
}

/// Pixel stride for the given speed setting. Low speeds sample every pixel;
/// high speeds subsample to bound work to the sampled subset.
fn sample_stride(speed: u8) -> usize {
    match speed {
        1..=3 => 1,
        4..=6 => 2,
        7..=8 => 3,
        _ => 4,
    }
}

/// Bits of per-channel precision discarded before bucketing. Speeds 9-10
/// imply at least one bit even if the caller asked for none.
fn effective_posterization(config: &Config) -> u8 {
    let implied = if config.speed >= 9 { 1 } else { 0 };
    config.min_posterization.max(implied)
}

/// Zero the low `bits` of a channel, replicating the kept high bits into the
/// discarded positions so 255 stays 255 and 0 stays 0.
fn posterize(v: u8, bits: u8) -> u8 {
    if bits == 0 {
        return v;
    }
    let kept = v & (0xFFu8 << bits);
    kept | (kept >> (8 - bits))
}

fn bucket_key(px: rgb::RGBA<u8>) -> u32 {
    (px.r as u32) << 24 | (px.g as u32) << 16 | (px.b as u32) << 8 | px.a as u32
}

fn key_to_rgba(key: u32) -> rgb::RGBA<u8> {
    rgb::RGBA {
        r: (key >> 24) as u8,
        g: (key >> 16) as u8,
        b: (key >> 8) as u8,
        a: key as u8,
    }
}

/// Accumulated bucket sums, f64 for stability on large images.
#[derive(Debug, Default)]
struct Accum {
    l: f64,
    a: f64,
    b: f64,
    alpha: f64,
    weight: f64,
}

/// Sample the image into a weighted histogram.
///
/// `weights` must be one importance weight per pixel. Fully transparent
/// pixels never enter a color bucket; they only flag the reserved
/// transparent entry.
pub fn sample_image(
    image: &SourceImage,
    weights: &[f32],
    config: &Config,
) -> Result<Histogram, QuantizeError> {
    debug_assert_eq!(image.pixels().len(), weights.len());

    let width = image.width() as usize;
    let height = image.height() as usize;
    let pixels = image.pixels();

    let stride = sample_stride(config.speed);
    let bits = effective_posterization(config);

    let mut has_transparent = false;
    let mut buckets: BTreeMap<u32, Accum> = BTreeMap::new();

    for y in 0..height {
        let row_start = y * width;
        // Offset per row so subsampling doesn't alias onto columns
        let mut x = (y * 3) % stride;
        while x < width {
            let idx = row_start + x;
            x += stride;

            let px = pixels[idx];
            if px.a == 0 {
                has_transparent = true;
                continue;
            }

            let posterized = rgb::RGBA {
                r: posterize(px.r, bits),
                g: posterize(px.g, bits),
                b: posterize(px.b, bits),
                a: posterize(px.a, bits),
            };
            let laba = rgba_to_oklaba(posterized);
            let w = weights[idx] as f64;

            let entry = buckets.entry(bucket_key(posterized)).or_default();
            entry.l += laba.l as f64 * w;
            entry.a += laba.a as f64 * w;
            entry.b += laba.b as f64 * w;
            entry.alpha += laba.alpha as f64 * w;
            entry.weight += w;
        }
    }

    let reserved = has_transparent as usize;
    if stride == 1 && buckets.len() + reserved <= config.max_colors as usize {
        let exact: Vec<(rgb::RGBA<u8>, f32)> = buckets
            .iter()
            .map(|(&key, acc)| (key_to_rgba(key), acc.weight as f32))
            .collect();
        return Ok(Histogram {
            entries: Vec::new(),
            has_transparent,
            exact: Some(exact),
        });
    }

    let mut entries = Vec::new();
    entries
        .try_reserve_exact(buckets.len())
        .map_err(|_| QuantizeError::OutOfMemory { stage: "color sampling" })?;
    for acc in buckets.into_values() {
        if acc.weight < 1e-10 {
            continue;
        }
        let centroid = OKLabA::new(
            (acc.l / acc.weight) as f32,
            (acc.a / acc.weight) as f32,
            (acc.b / acc.weight) as f32,
            (acc.alpha / acc.weight) as f32,
        );
        entries.push((centroid, acc.weight as f32));
    }

    Ok(Histogram {
        entries,
        has_transparent,
        exact: None,
    })
}

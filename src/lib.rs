#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

//! Palette quantization for indexed-color images.
//!
//! The pipeline reduces an RGBA image to at most `max_colors` representative
//! colors: weighted color sampling, median-cut + k-means palette building in
//! OKLab + alpha, error-diffusion remapping, and assembly of the palette /
//! transparency / gamma metadata a palette-based container needs.
//!
//! ```
//! use palquant::{Config, SourceImage};
//!
//! let pixels = vec![rgb::RGBA { r: 120, g: 40, b: 200, a: 255 }; 64];
//! let image = SourceImage::new(pixels, 8, 8, 0.0)?;
//! let output = palquant::quantize_image(&image, &Config::default())?;
//! assert!(output.palette_len() <= 256);
//! # Ok::<(), palquant::QuantizeError>(())
//! ```

extern crate alloc;

#[cfg(feature = "std")]
pub mod codec;
pub mod dither;
pub mod error;
pub mod histogram;
pub mod image;
pub mod median_cut;
pub mod oklab;
pub mod output;
pub mod palette;
pub mod remap;
pub mod weights;

#[cfg(feature = "std")]
pub use codec::{ImageDecoder, ImageEncoder, Pipeline};
pub use dither::DitherMode;
pub use error::{ErrorKind, QuantizeError};
pub use image::{AncillaryChunk, SourceImage};
pub use output::OutputImage;
pub use palette::Palette;

use alloc::vec::Vec;
use log::debug;

use median_cut::{build_palette, quality_from_mse, BuiltPalette};

/// Tunables for one quantization run.
///
/// Immutable once validated; safe to share across concurrent runs. Defaults
/// match the documented option surface: 256 colors, quality 0..=100,
/// speed 3, no opacity floor, no posterization, adaptive dithering.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum palette entries (2..=256).
    pub max_colors: u32,
    /// Reject the run if the fidelity score lands below this (0..=100).
    pub quality_min: u8,
    /// Stop spending palette entries once this score is reached (0..=100).
    pub quality_max: u8,
    /// 1 (slowest, best) to 10 (fastest). Drives sampling density and the
    /// refinement iteration budget.
    pub speed: u8,
    /// Alpha threshold below which a pixel's clustering weight is reduced.
    pub min_opacity: u8,
    /// Low bits to discard per channel before clustering (0..=4).
    pub min_posterization: u8,
    /// Remap dithering mode.
    pub dither: DitherMode,
    /// Override the diffused-error fraction (0.0..=1.0). `None` uses the
    /// mode's default.
    pub dither_strength: Option<f32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_colors: 256,
            quality_min: 0,
            quality_max: 100,
            speed: 3,
            min_opacity: 0,
            min_posterization: 0,
            dither: DitherMode::default(),
            dither_strength: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_colors(mut self, n: u32) -> Self {
        self.max_colors = n;
        self
    }

    pub fn quality(mut self, min: u8, max: u8) -> Self {
        self.quality_min = min;
        self.quality_max = max;
        self
    }

    pub fn speed(mut self, speed: u8) -> Self {
        self.speed = speed;
        self
    }

    pub fn min_opacity(mut self, alpha: u8) -> Self {
        self.min_opacity = alpha;
        self
    }

    pub fn min_posterization(mut self, bits: u8) -> Self {
        self.min_posterization = bits;
        self
    }

    pub fn dither(mut self, mode: DitherMode) -> Self {
        self.dither = mode;
        self
    }

    pub fn dither_strength(mut self, strength: f32) -> Self {
        self.dither_strength = Some(strength);
        self
    }

    /// Range-check every option, before any processing begins.
    pub fn validate(&self) -> Result<(), QuantizeError> {
        let check = |option, value: i64, min: i64, max: i64| {
            if value < min || value > max {
                Err(QuantizeError::OptionOutOfRange {
                    option,
                    value,
                    min,
                    max,
                })
            } else {
                Ok(())
            }
        };

        check("max_colors", self.max_colors as i64, 2, 256)?;
        check("quality_min", self.quality_min as i64, 0, 100)?;
        check("quality_max", self.quality_max as i64, 0, 100)?;
        check("speed", self.speed as i64, 1, 10)?;
        check("min_posterization", self.min_posterization as i64, 0, 4)?;
        if self.quality_min > self.quality_max {
            return Err(QuantizeError::QualityRangeInverted {
                min: self.quality_min,
                max: self.quality_max,
            });
        }
        Ok(())
    }

    /// The `configure` boundary operation: consume raw options and return a
    /// validated configuration.
    pub fn validated(self) -> Result<Self, QuantizeError> {
        self.validate()?;
        Ok(self)
    }

    fn resolved_dither_strength(&self) -> f32 {
        self.dither_strength
            .unwrap_or_else(|| self.dither.default_strength())
            .clamp(0.0, 1.0)
    }
}

/// K-means iteration budget for a speed setting: speed 1 refines hardest,
/// speed 10 barely at all.
fn iteration_budget(speed: u8) -> usize {
    (11 - speed.clamp(1, 10)) as usize
}

/// A built palette plus the per-run context needed to remap against the
/// same statistics: the fidelity score and the importance weights.
///
/// Scoped to one quantization run; remap it (possibly several times) and
/// drop it.
#[derive(Debug)]
pub struct QuantizeResult {
    palette: Palette,
    quality: u8,
    dither: DitherMode,
    dither_strength: f32,
    weights: Vec<f32>,
}

impl QuantizeResult {
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Fidelity score of the palette against the sampled colors (0..=100).
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Remap `image` to palette indices and assemble the output descriptor.
    /// `image` must be the image this result was quantized from.
    pub fn remapped(&self, image: &SourceImage) -> Result<OutputImage, QuantizeError> {
        let pixels = image.pixels();
        if pixels.len() != self.weights.len() {
            return Err(QuantizeError::DimensionMismatch {
                len: pixels.len(),
                width: image.width() as usize,
                height: image.height() as usize,
            });
        }

        let indices = match self.dither {
            DitherMode::None => remap::remap_plain(pixels, &self.palette)?,
            mode => dither::remap_dithered(
                pixels,
                image.width() as usize,
                image.height() as usize,
                &self.weights,
                &self.palette,
                self.dither_strength,
                mode == DitherMode::Adaptive,
            )?,
        };

        output::assemble(image, &self.palette, indices)
    }
}

/// Build a palette for `image`, gated by the configured quality range.
///
/// Fails with `QualityTooLow` instead of silently returning a palette whose
/// fidelity score is below `quality_min`.
pub fn quantize(image: &SourceImage, config: &Config) -> Result<QuantizeResult, QuantizeError> {
    config.validate()?;

    let weights = weights::importance_weights(image, config.min_opacity);
    let hist = histogram::sample_image(image, &weights, config)?;

    if let Some(exact) = hist.exact {
        debug!(
            "exact palette: {} colors, transparent={}",
            exact.len(),
            hist.has_transparent
        );
        return Ok(QuantizeResult {
            palette: Palette::from_exact(exact, hist.has_transparent),
            quality: 100,
            dither: config.dither,
            dither_strength: config.resolved_dither_strength(),
            weights,
        });
    }

    // The dedicated transparent entry occupies one of the slots
    let slots = config.max_colors as usize - hist.has_transparent as usize;
    let budget = iteration_budget(config.speed);

    let mut built = build_palette(&hist.entries, slots, budget);
    let mut quality = quality_from_mse(built.mse);
    debug!(
        "clustered {} samples into {} entries, quality {}",
        hist.entries.len(),
        built.centroids.len(),
        quality
    );

    if quality > config.quality_max {
        (built, quality) = shrink_to_quality(&hist.entries, built, quality, config, budget);
    }

    if quality < config.quality_min {
        return Err(QuantizeError::QualityTooLow {
            achieved: quality,
            required: config.quality_min,
        });
    }

    Ok(QuantizeResult {
        palette: Palette::from_centroids(built.centroids, hist.has_transparent),
        quality,
        dither: config.dither,
        dither_strength: config.resolved_dither_strength(),
        weights,
    })
}

/// The caller asked for no more quality than `quality_max`: binary-search
/// the smallest palette that still reaches it, so entries aren't spent on
/// fidelity nobody asked for.
fn shrink_to_quality(
    entries: &[(oklab::OKLabA, f32)],
    full: BuiltPalette,
    full_quality: u8,
    config: &Config,
    budget: usize,
) -> (BuiltPalette, u8) {
    let mut lo = 2usize;
    let mut hi = full.centroids.len();
    let mut best = (full, full_quality);

    while lo < hi {
        let mid = (lo + hi) / 2;
        let candidate = build_palette(entries, mid, budget);
        let q = quality_from_mse(candidate.mse);
        if q >= config.quality_max {
            best = (candidate, q);
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }

    debug!(
        "palette shrunk to {} entries for quality_max {}",
        best.0.centroids.len(),
        config.quality_max
    );
    best
}

/// The one-shot invocation boundary: quantize and remap in a single call.
pub fn quantize_image(image: &SourceImage, config: &Config) -> Result<OutputImage, QuantizeError> {
    quantize(image, config)?.remapped(image)
}

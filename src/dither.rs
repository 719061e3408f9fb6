//! Error-diffusion remapping.
//!
//! Floyd–Steinberg diffusion over an OKLab + alpha working buffer, in fixed
//! raster order (left to right, top to bottom) so output is deterministic.

extern crate alloc;
use alloc::vec::Vec;

use crate::error::QuantizeError;
use crate::oklab::{rgba_to_oklaba, OKLabA};
use crate::palette::Palette;

/// Dithering mode for the remap stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherMode {
    /// Nearest color only.
    None,
    /// Classic Floyd–Steinberg error diffusion at full strength.
    FloydSteinberg,
    /// Floyd–Steinberg modulated by the importance weights: smooth regions
    /// receive full diffusion, textured regions (where noise would be
    /// visible on top of noise) receive less.
    #[default]
    Adaptive,
}

impl DitherMode {
    /// Fraction of quantization error diffused when the caller didn't
    /// override it.
    pub(crate) fn default_strength(self) -> f32 {
        match self {
            Self::None => 0.0,
            Self::FloydSteinberg => 1.0,
            Self::Adaptive => 0.5,
        }
    }
}

// Floyd–Steinberg kernel: right 7/16, below-left 3/16, below 5/16,
// below-right 1/16.
const KERNEL: [(isize, isize, f32); 4] = [
    (1, 0, 7.0 / 16.0),
    (-1, 1, 3.0 / 16.0),
    (0, 1, 5.0 / 16.0),
    (1, 1, 1.0 / 16.0),
];

/// Remap with error diffusion. `strength` scales the diffused error;
/// `adaptive` additionally modulates it by the receiving pixel's weight.
/// Error is never pushed into fully transparent pixels.
#[allow(clippy::too_many_arguments)]
pub fn remap_dithered(
    pixels: &[rgb::RGBA<u8>],
    width: usize,
    height: usize,
    weights: &[f32],
    palette: &Palette,
    strength: f32,
    adaptive: bool,
) -> Result<Vec<u8>, QuantizeError> {
    let strength = strength.clamp(0.0, 1.0);

    let mut indices = Vec::new();
    indices
        .try_reserve_exact(pixels.len())
        .map_err(|_| QuantizeError::OutOfMemory { stage: "index buffer" })?;

    // Working buffer the diffused error accumulates into
    let mut buf: Vec<[f32; 4]> = Vec::new();
    buf.try_reserve_exact(pixels.len())
        .map_err(|_| QuantizeError::OutOfMemory { stage: "dither buffer" })?;
    buf.extend(pixels.iter().map(|p| {
        let laba = rgba_to_oklaba(*p);
        [laba.l, laba.a, laba.b, laba.alpha]
    }));

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;

            if pixels[idx].a == 0 {
                let t = match palette.transparent_index() {
                    Some(t) => t,
                    None => palette.nearest(rgba_to_oklaba(pixels[idx])),
                };
                indices.push(t);
                continue;
            }

            let current = OKLabA::new(buf[idx][0], buf[idx][1], buf[idx][2], buf[idx][3]);
            let chosen = palette.nearest(current);
            indices.push(chosen);

            let entry = palette.laba(chosen);
            let err = [
                (current.l - entry.l) * strength,
                (current.a - entry.a) * strength,
                (current.b - entry.b) * strength,
                (current.alpha - entry.alpha) * strength,
            ];

            for &(dx, dy, fraction) in &KERNEL {
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if nx < 0 || nx >= width as isize || ny >= height as isize {
                    continue;
                }
                let ni = ny as usize * width + nx as usize;
                if pixels[ni].a == 0 {
                    continue;
                }
                let scale = if adaptive {
                    fraction * weights[ni]
                } else {
                    fraction
                };
                for c in 0..4 {
                    buf[ni][c] += err[c] * scale;
                }
            }
        }
    }

    Ok(indices)
}

//! Undithered pixel remapping: one nearest-entry lookup per pixel.

extern crate alloc;
use alloc::vec::Vec;

use crate::error::QuantizeError;
use crate::oklab::rgba_to_oklaba;
use crate::palette::Palette;

/// Map every pixel to its nearest palette index in OKLab + alpha.
/// Fully transparent pixels short-circuit to the dedicated transparent
/// entry when one exists.
pub fn remap_plain(
    pixels: &[rgb::RGBA<u8>],
    palette: &Palette,
) -> Result<Vec<u8>, QuantizeError> {
    let mut indices = Vec::new();
    indices
        .try_reserve_exact(pixels.len())
        .map_err(|_| QuantizeError::OutOfMemory { stage: "index buffer" })?;

    for px in pixels {
        let idx = match palette.transparent_index() {
            Some(t) if px.a == 0 => t,
            _ => palette.nearest(rgba_to_oklaba(*px)),
        };
        indices.push(idx);
    }

    Ok(indices)
}

//! Output Assembler: the pipeline's terminal artifact, ready for an
//! external encoder.

extern crate alloc;
use alloc::vec::Vec;

use crate::error::QuantizeError;
use crate::image::{AncillaryChunk, SourceImage};
use crate::palette::Palette;

/// A palette-indexed image plus everything a palette-based container needs
/// to reconstruct it: the color table, the per-entry alpha sequence with its
/// transparent-suffix count, gamma, and the source's ancillary metadata.
#[derive(Debug, Clone)]
pub struct OutputImage {
    width: u32,
    height: u32,
    gamma: f64,
    palette: Vec<rgb::RGBA<u8>>,
    alphas: Vec<u8>,
    transparent_count: usize,
    indices: Vec<u8>,
    chunks: Vec<AncillaryChunk>,
}

/// Populate an [`OutputImage`] from the remapped indices and the palette.
/// Allocation failure aborts with `OutOfMemory`; a partially populated
/// value is never returned.
pub(crate) fn assemble(
    source: &SourceImage,
    palette: &Palette,
    indices: Vec<u8>,
) -> Result<OutputImage, QuantizeError> {
    let oom = |stage| QuantizeError::OutOfMemory { stage };

    let mut entries = Vec::new();
    entries
        .try_reserve_exact(palette.len())
        .map_err(|_| oom("palette table"))?;
    entries.extend_from_slice(palette.entries());

    let mut chunks = Vec::new();
    chunks
        .try_reserve_exact(source.chunks().len())
        .map_err(|_| oom("ancillary chunks"))?;
    chunks.extend_from_slice(source.chunks());

    Ok(OutputImage {
        width: source.width(),
        height: source.height(),
        gamma: source.gamma(),
        alphas: palette.alphas(),
        transparent_count: palette.transparent_count(),
        palette: entries,
        indices,
        chunks,
    })
}

impl OutputImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// The color table, opaque prefix first.
    pub fn palette(&self) -> &[rgb::RGBA<u8>] {
        &self.palette
    }

    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }

    /// Per-entry alpha values, aligned 1:1 with `palette()`.
    pub fn alphas(&self) -> &[u8] {
        &self.alphas
    }

    /// Number of trailing entries that need their alpha stored.
    pub fn transparent_count(&self) -> usize {
        self.transparent_count
    }

    /// Alpha values of just the trailing transparent entries — what a
    /// truncated per-entry alpha table stores.
    pub fn alpha_table(&self) -> &[u8] {
        &self.alphas[self.alphas.len() - self.transparent_count..]
    }

    /// Row-major palette indices, one per pixel.
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// One row of indices, by computed stride.
    pub fn row(&self, y: u32) -> &[u8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.indices[start..start + w]
    }

    /// Ancillary metadata carried through from the source, unchanged.
    pub fn chunks(&self) -> &[AncillaryChunk] {
        &self.chunks
    }
}

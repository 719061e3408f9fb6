extern crate alloc;
use alloc::vec::Vec;

use crate::error::QuantizeError;

/// Gamma assumed when the decoder reports none. This is the sRGB-ish 1/2.2
/// value palette-based containers default to.
pub const DEFAULT_GAMMA: f64 = 0.45455;

/// An opaque ancillary metadata block carried through the pipeline unchanged.
///
/// The pipeline never inspects these; they exist so a container's non-color
/// chunks (text comments, timestamps, ...) survive quantization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncillaryChunk {
    /// Four-byte chunk name as the container defines it.
    pub name: [u8; 4],
    pub data: Vec<u8>,
}

/// A decoded RGBA image: the pipeline's input.
///
/// Pixels are one owned contiguous row-major buffer; rows are reached through
/// the computed-stride [`row`](SourceImage::row) accessor rather than a
/// row-pointer table. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct SourceImage {
    width: u32,
    height: u32,
    gamma: f64,
    pixels: Vec<rgb::RGBA<u8>>,
    chunks: Vec<AncillaryChunk>,
}

impl SourceImage {
    /// Validate geometry and take ownership of the pixel buffer.
    ///
    /// `gamma <= 0.0` means "unknown" and is normalized to [`DEFAULT_GAMMA`].
    pub fn new(
        pixels: Vec<rgb::RGBA<u8>>,
        width: u32,
        height: u32,
        gamma: f64,
    ) -> Result<Self, QuantizeError> {
        if width == 0 || height == 0 {
            return Err(QuantizeError::ZeroDimension);
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(QuantizeError::DimensionMismatch {
                len: pixels.len(),
                width: width as usize,
                height: height as usize,
            });
        }
        let gamma = if gamma > 0.0 { gamma } else { DEFAULT_GAMMA };
        Ok(Self {
            width,
            height,
            gamma,
            pixels,
            chunks: Vec::new(),
        })
    }

    /// Attach ancillary metadata blocks to be passed through to the output.
    pub fn with_chunks(mut self, chunks: Vec<AncillaryChunk>) -> Self {
        self.chunks = chunks;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn pixels(&self) -> &[rgb::RGBA<u8>] {
        &self.pixels
    }

    pub fn chunks(&self) -> &[AncillaryChunk] {
        &self.chunks
    }

    /// One row of pixels, by computed stride.
    pub fn row(&self, y: u32) -> &[rgb::RGBA<u8>] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.pixels[start..start + w]
    }
}

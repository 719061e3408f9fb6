//! External codec collaborator boundary.
//!
//! The container format's decoder and encoder live outside this crate; here
//! they are just traits over owned byte buffers. [`Pipeline`] wires them to
//! the quantizer and serializes access to the codec per call — many codec
//! libraries are not thread-safe, but the CPU-bound clustering and remap
//! work between the two calls must still overlap across concurrent runs.

use std::sync::Mutex;
use std::vec::Vec;

use crate::error::QuantizeError;
use crate::image::SourceImage;
use crate::output::OutputImage;
use crate::{quantize_image, Config};

/// Decodes container bytes into a [`SourceImage`].
/// Failures surface as [`QuantizeError::Decode`] with context.
pub trait ImageDecoder {
    fn decode(&mut self, bytes: &[u8]) -> Result<SourceImage, QuantizeError>;
}

/// Encodes an [`OutputImage`] into container bytes.
/// Failures surface as [`QuantizeError::Encode`] with context.
pub trait ImageEncoder {
    fn encode(&mut self, image: &OutputImage) -> Result<Vec<u8>, QuantizeError>;
}

/// Decode → quantize → encode, with the codec behind a per-call critical
/// section.
pub struct Pipeline<C> {
    codec: Mutex<C>,
}

impl<C> Pipeline<C>
where
    C: ImageDecoder + ImageEncoder,
{
    pub fn new(codec: C) -> Self {
        Self {
            codec: Mutex::new(codec),
        }
    }

    /// Quantize encoded image bytes into re-encoded indexed-color bytes.
    ///
    /// The codec lock is held only for the duration of each codec call, so
    /// concurrent `convert` invocations overlap their quantization work.
    pub fn convert(&self, bytes: &[u8], config: &Config) -> Result<Vec<u8>, QuantizeError> {
        let source = {
            let mut codec = self.lock();
            codec.decode(bytes)?
        };

        let output = quantize_image(&source, config)?;

        let mut codec = self.lock();
        codec.encode(&output)
    }

    /// Recover the codec, e.g. to tear it down explicitly.
    pub fn into_inner(self) -> C {
        self.codec.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, C> {
        // A poisoned codec stays usable for the next call; the panic that
        // poisoned it already surfaced in the invocation that caused it.
        self.codec.lock().unwrap_or_else(|e| e.into_inner())
    }
}

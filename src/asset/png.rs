//! Lossy PNG compression.
//!
//! Colour channels are posterized to a bit depth derived from the quality
//! percentage, then re-encoded with maximum deflate effort. Only the critical
//! chunks are written, so text, time and colour-profile metadata is dropped.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageError, ImageFormat, Pixel};

/// Accepted quality range in percent. The higher bound is tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityRange {
    pub min: u8,
    pub max: u8,
}

impl QualityRange {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    /// Candidate qualities, best first.
    fn candidates(self) -> impl Iterator<Item = u8> {
        let second = (self.min != self.max).then_some(self.min);
        std::iter::once(self.max).chain(second)
    }
}

/// Result of compressing one image.
#[derive(Debug)]
pub enum Compressed {
    /// Re-encoded bytes, strictly smaller than the input.
    Smaller(Vec<u8>),
    /// No candidate quality beat the input size.
    NotSmaller,
}

/// Compress a PNG within the given quality range.
///
/// Fails when the input is not a decodable PNG.
pub fn compress_png(bytes: &[u8], range: QualityRange) -> Result<Compressed, ImageError> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
    let has_alpha = img.color().has_alpha();

    for quality in range.candidates() {
        let bits = channel_bits(quality);
        let mut out = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
        if has_alpha {
            let mut buf = img.to_rgba8();
            buf.pixels_mut()
                .for_each(|p| posterize(&mut p.channels_mut()[..3], bits));
            buf.write_with_encoder(encoder)?;
        } else {
            let mut buf = img.to_rgb8();
            buf.pixels_mut()
                .for_each(|p| posterize(p.channels_mut(), bits));
            buf.write_with_encoder(encoder)?;
        }
        if out.len() < bytes.len() {
            return Ok(Compressed::Smaller(out));
        }
    }
    Ok(Compressed::NotSmaller)
}

/// Bits kept per colour channel: `ceil(8 * quality / 100)`, at least 1.
fn channel_bits(quality: u8) -> u32 {
    let quality = u32::from(quality.min(100));
    (8 * quality).div_ceil(100).clamp(1, 8)
}

/// Snap each channel to the nearest of `2^bits` evenly spaced levels.
#[allow(clippy::cast_possible_truncation)] // Result is always <= 255
fn posterize(channels: &mut [u8], bits: u32) {
    if bits >= 8 {
        return;
    }
    let levels = (1u32 << bits) - 1;
    for c in channels {
        let step = (u32::from(*c) * levels + 127) / 255;
        *c = ((step * 255 + levels / 2) / levels) as u8;
    }
}

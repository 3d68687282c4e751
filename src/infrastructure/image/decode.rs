//! Decode-time downscaling.
//!
//! Images are probed for their native bounds first, without allocating pixels, then
//! decoded and reduced by an integer sample factor so the result is no larger than the
//! display target needs.
//!
//! `image` has no subsampled decode, so the full bitmap is materialised before the
//! resize. [`decode_limits`] caps what that bitmap may cost.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Limits};
use tracing::trace;

use crate::domain::entities::TargetSize;
use crate::domain::errors::LoadError;

/// Largest accepted width or height, in pixels.
pub const MAX_DIMENSION: u32 = 16_384;
const MAX_DECODE_BYTES: u64 = 256 * 1024 * 1024;

/// Limits applied to every full decode.
#[must_use]
pub fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DIMENSION);
    limits.max_image_height = Some(MAX_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_BYTES);
    limits
}

/// Reads the native width and height from the image header only.
///
/// # Errors
/// Returns a decode error if the format is unknown or the header is corrupt.
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::decode("empty image data"));
    }
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    Ok(reader.into_dimensions()?)
}

/// Integer downscale factor for an image of `native_width` x `native_height` shown at
/// `required`.
///
/// Each axis contributes `round(native / required)`, never less than one; the larger of
/// the two wins.
#[must_use]
pub fn sample_factor(native_width: u32, native_height: u32, required: TargetSize) -> u32 {
    axis_factor(native_width, required.width).max(axis_factor(native_height, required.height))
}

fn axis_factor(native: u32, required: u32) -> u32 {
    let required = required.max(1);
    if native <= required {
        return 1;
    }
    // Round half up without going through floats.
    let native = u64::from(native);
    let required = u64::from(required);
    let rounded = (native + required / 2) / required;
    u32::try_from(rounded).unwrap_or(u32::MAX).max(1)
}

/// Decodes `bytes` and downscales by the sample factor for `required`.
///
/// # Errors
/// Returns a decode error if the bytes are not a supported image or exceed
/// [`decode_limits`].
pub fn decode_downscaled(bytes: &[u8], required: TargetSize) -> Result<DynamicImage, LoadError> {
    let (width, height) = probe_dimensions(bytes)?;
    let factor = sample_factor(width, height, required);
    trace!(width, height, factor, "Decoding with sample factor");

    let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    reader.limits(decode_limits());
    let image = reader.decode()?;

    if factor == 1 {
        return Ok(image);
    }

    let scaled_width = (image.width() / factor).max(1);
    let scaled_height = (image.height() / factor).max(1);
    Ok(image.resize_exact(scaled_width, scaled_height, FilterType::Triangle))
}

//! Transparency classification.
//!
//! An image is transparent when any of these holds, checked in order:
//! 1. **Metadata**: the file declares format-level transparency (a `tRNS`
//!    color key or partial palette alpha table).
//! 2. **Palette**: the image is indexed and one of the palette indices it
//!    actually uses is the designated transparent index.
//! 3. **Alpha**: the image natively carries an alpha channel (RGBA or
//!    gray-alpha) and its alpha minimum is below 255.
//!
//! The palette and alpha checks are exclusive and keyed on the native color
//! mode. Gray and RGB images stop after the metadata check.

use crate::decode::{ColorMode, DecodedImage};
use crate::error::DecodeError;

/// Fully opaque 8-bit alpha.
const OPAQUE: u8 = u8::MAX;

/// Decode `bytes` and report whether the image has any non-opaque pixel.
///
/// # Errors
///
/// Returns a [`DecodeError`] when the buffer is empty, of an unknown format,
/// or malformed. A decode failure is never reported as `false`.
pub fn classify(bytes: &[u8]) -> Result<bool, DecodeError> {
    let image = DecodedImage::decode(bytes)?;
    Ok(has_transparency(&image))
}

/// Classify an already decoded image.
#[must_use]
pub fn has_transparency(image: &DecodedImage) -> bool {
    if image.transparency().is_some() {
        return true;
    }

    match image.mode() {
        ColorMode::Indexed => {
            let Some(transparent) = image.transparent_index() else {
                return false;
            };
            image
                .colors()
                .is_some_and(|colors| colors.iter().any(|c| c.index == transparent))
        }
        ColorMode::Rgba | ColorMode::GrayAlpha => image.extrema()[3].0 < OPAQUE,
        ColorMode::Gray | ColorMode::Rgb => false,
    }
}

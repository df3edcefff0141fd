//! Decoded pixel data for a single mipmap level.

use crate::error::{ImageError, Result};

/// One decoded mipmap level as tightly packed, top-down RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMipmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedMipmap {
    /// Wraps an RGBA buffer, checking that it holds exactly `width * height` pixels.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        let expected = rgba_len(width, height)?;
        if rgba.len() != expected {
            return Err(ImageError::BufferSizeMismatch {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }

        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Encodes this mipmap as a 32-bit bitmap file.
    pub fn to_bitmap(&self) -> Result<Vec<u8>> {
        crate::bitmap::encode_bitmap(&self.rgba, self.width, self.height)
    }
}

/// Byte length of a `width` x `height` RGBA8 buffer. Zero-sized images are rejected.
pub(crate) fn rgba_len(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidDimensions { width, height });
    }

    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or(ImageError::InvalidDimensions { width, height })
}

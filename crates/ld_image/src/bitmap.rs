//! Uncompressed 32-bit bitmap encoding.
//!
//! The output is a `BITMAPV5HEADER` bitmap with `BI_BITFIELDS` channel masks and an
//! sRGB color space tag. Only four header fields vary between images: the file size,
//! the width, the height and the pixel data length.

use binrw::binrw;
use std::io::Cursor;

use crate::error::{ImageError, Result};
use crate::mipmap::rgba_len;

/// Size of the `BITMAPFILEHEADER`.
pub const FILE_HEADER_SIZE: u32 = 14;
/// Size of the `BITMAPV5HEADER`.
pub const INFO_HEADER_SIZE: u32 = 124;
/// Offset of the pixel array from the start of the file.
pub const HEADER_SIZE: u32 = FILE_HEADER_SIZE + INFO_HEADER_SIZE;

pub const RED_MASK: u32 = 0x00FF_0000;
pub const GREEN_MASK: u32 = 0x0000_FF00;
pub const BLUE_MASK: u32 = 0x0000_00FF;
pub const ALPHA_MASK: u32 = 0xFF00_0000;

const BI_BITFIELDS: u32 = 3;
/// `"sRGB"` read as a little-endian u32.
const LCS_SRGB: u32 = 0x7352_4742;
const LCS_GM_ABS_COLORIMETRIC: u32 = 8;

/// File header and V5 info header, laid out exactly as they appear on disk.
#[binrw]
#[brw(little, magic = b"BM")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapHeader {
    pub file_size: u32,
    pub reserved: u32,
    pub pixel_offset: u32,

    pub info_size: u32,
    pub width: u32,
    pub height: u32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_pixels_per_meter: u32,
    pub y_pixels_per_meter: u32,
    pub colors_used: u32,
    pub colors_important: u32,

    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
    pub alpha_mask: u32,
    pub color_space: u32,
    /// CIEXYZTRIPLE endpoints, unused for sRGB.
    pub endpoints: [u32; 9],
    pub gamma_red: u32,
    pub gamma_green: u32,
    pub gamma_blue: u32,
    pub intent: u32,
    pub profile_data: u32,
    pub profile_size: u32,
    pub reserved_v5: u32,
}

impl BitmapHeader {
    /// Builds the header for a `width` x `height` image with `image_size` bytes of pixels.
    pub fn new(width: u32, height: u32, image_size: u32) -> Self {
        Self {
            file_size: HEADER_SIZE + image_size,
            reserved: 0,
            pixel_offset: HEADER_SIZE,
            info_size: INFO_HEADER_SIZE,
            width,
            height,
            planes: 1,
            bit_count: 32,
            compression: BI_BITFIELDS,
            image_size,
            x_pixels_per_meter: 0,
            y_pixels_per_meter: 0,
            colors_used: 0,
            colors_important: 0,
            red_mask: RED_MASK,
            green_mask: GREEN_MASK,
            blue_mask: BLUE_MASK,
            alpha_mask: ALPHA_MASK,
            color_space: LCS_SRGB,
            endpoints: [0; 9],
            gamma_red: 0,
            gamma_green: 0,
            gamma_blue: 0,
            intent: LCS_GM_ABS_COLORIMETRIC,
            profile_data: 0,
            profile_size: 0,
            reserved_v5: 0,
        }
    }
}

/// Encodes a top-down RGBA8 buffer as a complete bitmap file.
///
/// Rows are written bottom-up and every pixel is reordered from RGBA to BGRA; no other
/// conversion takes place. `rgba` must hold exactly `width * height * 4` bytes.
pub fn encode_bitmap(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected = rgba_len(width, height)?;
    if rgba.len() != expected {
        return Err(ImageError::BufferSizeMismatch {
            width,
            height,
            expected,
            actual: rgba.len(),
        });
    }

    let image_size = u32::try_from(expected)
        .ok()
        .filter(|size| size.checked_add(HEADER_SIZE).is_some())
        .ok_or(ImageError::InvalidDimensions { width, height })?;

    let mut out = Cursor::new(Vec::with_capacity(HEADER_SIZE as usize + expected));
    binrw::BinWrite::write(&BitmapHeader::new(width, height, image_size), &mut out)?;

    let mut out = out.into_inner();
    let row_len = width as usize * 4;
    for row in rgba.chunks_exact(row_len).rev() {
        for px in row.chunks_exact(4) {
            out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
        }
    }

    Ok(out)
}

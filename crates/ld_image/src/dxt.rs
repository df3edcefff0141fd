//! S3TC (DXT1/DXT3/DXT5) block decompression into RGBA8.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ImageError, Result};
use crate::mipmap::rgba_len;

/// Block compression variant of a DXT-encoded mipmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DxtFormat {
    Dxt1,
    Dxt3,
    Dxt5,
}

impl DxtFormat {
    /// Size of one compressed 4x4 block.
    pub fn block_size(self) -> usize {
        match self {
            DxtFormat::Dxt1 => 8,
            DxtFormat::Dxt3 | DxtFormat::Dxt5 => 16,
        }
    }
}

/// Number of compressed bytes needed for a `width` x `height` surface.
pub fn compressed_len(format: DxtFormat, width: u32, height: u32) -> Result<usize> {
    let blocks_x = (width as usize).div_ceil(4).max(1);
    let blocks_y = (height as usize).div_ceil(4).max(1);
    blocks_x
        .checked_mul(blocks_y)
        .and_then(|blocks| blocks.checked_mul(format.block_size()))
        .ok_or(ImageError::InvalidDimensions { width, height })
}

/// Decompresses a DXT surface into top-down RGBA8 pixels.
pub fn decompress(format: DxtFormat, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected = compressed_len(format, width, height)?;
    let out_len = rgba_len(width, height)?;
    if data.len() < expected {
        return Err(ImageError::DataTooShort {
            expected,
            actual: data.len(),
        });
    }

    let (width, height) = (width as usize, height as usize);
    let blocks_x = width.div_ceil(4).max(1);
    let mut out = vec![0u8; out_len];

    for (index, block) in data[..expected]
        .chunks_exact(format.block_size())
        .enumerate()
    {
        let decoded = match format {
            DxtFormat::Dxt1 => decode_color_block(block, true),
            DxtFormat::Dxt3 => {
                let mut pixels = decode_color_block(&block[8..], false);
                apply_explicit_alpha(&block[..8], &mut pixels);
                pixels
            }
            DxtFormat::Dxt5 => {
                let mut pixels = decode_color_block(&block[8..], false);
                apply_interpolated_alpha(&block[..8], &mut pixels);
                pixels
            }
        };

        let bx = (index % blocks_x) * 4;
        let by = (index / blocks_x) * 4;
        for (i, px) in decoded.iter().enumerate() {
            let x = bx + i % 4;
            let y = by + i / 4;
            // Blocks overhang the surface when a dimension is not a multiple of 4.
            if x < width && y < height {
                let offset = (y * width + x) * 4;
                out[offset..offset + 4].copy_from_slice(px);
            }
        }
    }

    Ok(out)
}

fn expand_565(color: u16) -> [u8; 3] {
    let r = ((color >> 11) & 0x1F) as u8;
    let g = ((color >> 5) & 0x3F) as u8;
    let b = (color & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

fn mix(a: u8, b: u8, wa: u16, wb: u16) -> u8 {
    ((a as u16 * wa + b as u16 * wb) / (wa + wb)) as u8
}

/// Decodes the 8-byte color half of a block. `allow_punch_through` enables the DXT1
/// three-color mode with a transparent fourth entry.
fn decode_color_block(block: &[u8], allow_punch_through: bool) -> [[u8; 4]; 16] {
    let c0 = LittleEndian::read_u16(&block[0..2]);
    let c1 = LittleEndian::read_u16(&block[2..4]);
    let indices = LittleEndian::read_u32(&block[4..8]);

    let a = expand_565(c0);
    let b = expand_565(c1);

    let mut palette = [[0u8; 4]; 4];
    palette[0] = [a[0], a[1], a[2], 255];
    palette[1] = [b[0], b[1], b[2], 255];

    if c0 > c1 || !allow_punch_through {
        for ch in 0..3 {
            palette[2][ch] = mix(a[ch], b[ch], 2, 1);
            palette[3][ch] = mix(a[ch], b[ch], 1, 2);
        }
        palette[2][3] = 255;
        palette[3][3] = 255;
    } else {
        for ch in 0..3 {
            palette[2][ch] = mix(a[ch], b[ch], 1, 1);
        }
        palette[2][3] = 255;
        palette[3] = [0, 0, 0, 0];
    }

    let mut pixels = [[0u8; 4]; 16];
    for (i, px) in pixels.iter_mut().enumerate() {
        *px = palette[((indices >> (i * 2)) & 0b11) as usize];
    }
    pixels
}

/// DXT3: sixteen 4-bit alpha values, low nibble first.
fn apply_explicit_alpha(block: &[u8], pixels: &mut [[u8; 4]; 16]) {
    for (i, px) in pixels.iter_mut().enumerate() {
        let nibble = (block[i / 2] >> ((i % 2) * 4)) & 0x0F;
        px[3] = nibble * 17;
    }
}

/// DXT5: two endpoint alphas followed by sixteen 3-bit indices.
fn apply_interpolated_alpha(block: &[u8], pixels: &mut [[u8; 4]; 16]) {
    let a0 = block[0] as u16;
    let a1 = block[1] as u16;

    let mut alphas = [0u8; 8];
    alphas[0] = a0 as u8;
    alphas[1] = a1 as u8;
    if a0 > a1 {
        for i in 1..7u16 {
            alphas[i as usize + 1] = (((7 - i) * a0 + i * a1) / 7) as u8;
        }
    } else {
        for i in 1..5u16 {
            alphas[i as usize + 1] = (((5 - i) * a0 + i * a1) / 5) as u8;
        }
        alphas[6] = 0;
        alphas[7] = 255;
    }

    let bits = LittleEndian::read_u48(&block[2..8]);
    for (i, px) in pixels.iter_mut().enumerate() {
        px[3] = alphas[((bits >> (i * 3)) & 0b111) as usize];
    }
}

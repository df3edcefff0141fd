//! BLP2 texture reading.
//!
//! A BLP2 file starts with a fixed header describing the pixel encoding, the base
//! dimensions and up to sixteen mipmap levels stored as `(offset, size)` pairs into the
//! file. Direct-content textures also carry a 256-entry BGRA palette used by the
//! palettised encoding.
//!
//! Supported encodings:
//!
//! - **Palettised** (`compression = 1`): one palette index per pixel, followed by an
//!   optional 1, 4 or 8-bit alpha plane.
//! - **DXT** (`compression = 2`): S3TC blocks, see [`crate::dxt`].
//! - **Raw** (`compression = 3`): uncompressed BGRA8.
//!
//! JPEG-content textures are rejected.

use binrw::{binrw, BinRead};
use std::io::Cursor;

use crate::dxt::{self, DxtFormat};
use crate::error::{ImageError, Result};
use crate::mipmap::{rgba_len, DecodedMipmap};

pub const MAX_MIPMAPS: usize = 16;
pub const PALETTE_LEN: usize = 256;

pub const CONTENT_JPEG: u32 = 0;
pub const CONTENT_DIRECT: u32 = 1;

pub const COMPRESSION_PALETTE: u8 = 1;
pub const COMPRESSION_DXT: u8 = 2;
pub const COMPRESSION_RAW: u8 = 3;

const ALPHA_TYPE_DXT5: u8 = 7;

#[binrw]
#[brw(little, magic = b"BLP2")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlpHeader {
    pub content: u32,
    pub compression: u8,
    pub alpha_depth: u8,
    pub alpha_type: u8,
    pub has_mips: u8,
    pub width: u32,
    pub height: u32,
    pub mip_offsets: [u32; MAX_MIPMAPS],
    pub mip_sizes: [u32; MAX_MIPMAPS],
    /// BGRA palette stored as little-endian `0xAARRGGBB` words. Only present for
    /// direct-content textures.
    #[br(if(content == CONTENT_DIRECT))]
    pub palette: Option<[u32; PALETTE_LEN]>,
}

/// A parsed BLP2 texture borrowing the file bytes it was read from.
#[derive(Debug)]
pub struct BlpImage<'a> {
    header: BlpHeader,
    data: &'a [u8],
}

impl<'a> BlpImage<'a> {
    /// Parses the header of a BLP2 file.
    pub fn from_bytes(data: &'a [u8]) -> Result<Self> {
        let header = BlpHeader::read(&mut Cursor::new(data))?;

        if header.content != CONTENT_DIRECT {
            return Err(ImageError::UnsupportedContent(header.content));
        }
        if !matches!(header.alpha_depth, 0 | 1 | 4 | 8) {
            return Err(ImageError::UnsupportedAlphaDepth(header.alpha_depth));
        }
        if header.width == 0 || header.height == 0 {
            return Err(ImageError::InvalidDimensions {
                width: header.width,
                height: header.height,
            });
        }

        Ok(Self { header, data })
    }

    pub fn header(&self) -> &BlpHeader {
        &self.header
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Number of mipmap levels stored in the file.
    pub fn mipmap_count(&self) -> usize {
        if self.header.has_mips == 0 {
            return 1;
        }

        self.header
            .mip_offsets
            .iter()
            .zip(self.header.mip_sizes.iter())
            .take_while(|&(&offset, &size)| offset != 0 && size != 0)
            .count()
    }

    /// Dimensions of a mipmap level; each level halves the previous one, down to 1.
    pub fn mipmap_dimensions(&self, level: usize) -> (u32, u32) {
        let shift = level.min(31) as u32;
        (
            (self.header.width >> shift).max(1),
            (self.header.height >> shift).max(1),
        )
    }

    /// Decodes one mipmap level into top-down RGBA8 pixels.
    pub fn decode_mipmap(&self, level: usize) -> Result<DecodedMipmap> {
        let available = self.mipmap_count();
        if level >= available {
            return Err(ImageError::MissingMipmap { level, available });
        }

        let offset = self.header.mip_offsets[level] as usize;
        let size = self.header.mip_sizes[level] as usize;
        let raw = offset
            .checked_add(size)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(ImageError::MipmapOutOfBounds {
                level,
                offset,
                size,
                len: self.data.len(),
            })?;

        let (width, height) = self.mipmap_dimensions(level);
        tracing::trace!(
            level,
            width,
            height,
            compression = self.header.compression,
            alpha_depth = self.header.alpha_depth,
            "decoding BLP mipmap"
        );
        let rgba = match self.header.compression {
            COMPRESSION_PALETTE => self.decode_palettized(raw, width, height)?,
            COMPRESSION_DXT => dxt::decompress(self.dxt_format(), raw, width, height)?,
            COMPRESSION_RAW => decode_raw(raw, width, height)?,
            other => return Err(ImageError::UnsupportedCompression(other)),
        };

        DecodedMipmap::new(width, height, rgba)
    }

    fn dxt_format(&self) -> DxtFormat {
        if self.header.alpha_depth > 1 {
            if self.header.alpha_type == ALPHA_TYPE_DXT5 {
                DxtFormat::Dxt5
            } else {
                DxtFormat::Dxt3
            }
        } else {
            DxtFormat::Dxt1
        }
    }

    fn decode_palettized(&self, raw: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        let pixel_count = rgba_len(width, height)? / 4;
        let alpha_len = match self.header.alpha_depth {
            1 => pixel_count.div_ceil(8),
            4 => pixel_count.div_ceil(2),
            8 => pixel_count,
            _ => 0,
        };

        let expected = pixel_count + alpha_len;
        if raw.len() < expected {
            return Err(ImageError::DataTooShort {
                expected,
                actual: raw.len(),
            });
        }

        let palette = self
            .header
            .palette
            .as_ref()
            .ok_or(ImageError::UnsupportedContent(self.header.content))?;
        let (indices, alpha) = raw[..expected].split_at(pixel_count);

        let mut out = Vec::with_capacity(pixel_count * 4);
        for (i, &index) in indices.iter().enumerate() {
            let color = palette[index as usize];
            let a = match self.header.alpha_depth {
                1 => ((alpha[i / 8] >> (i % 8)) & 0x01) * 0xFF,
                4 => ((alpha[i / 2] >> ((i % 2) * 4)) & 0x0F) * 17,
                8 => alpha[i],
                _ => 0xFF,
            };
            out.extend_from_slice(&[(color >> 16) as u8, (color >> 8) as u8, color as u8, a]);
        }

        Ok(out)
    }
}

fn decode_raw(raw: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected = rgba_len(width, height)?;
    if raw.len() < expected {
        return Err(ImageError::DataTooShort {
            expected,
            actual: raw.len(),
        });
    }

    let mut out = Vec::with_capacity(expected);
    for px in raw[..expected].chunks_exact(4) {
        out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
    }
    Ok(out)
}

/// Decodes one mipmap level of a BLP2 file.
pub fn decode_mipmap(data: &[u8], level: usize) -> Result<DecodedMipmap> {
    BlpImage::from_bytes(data)?.decode_mipmap(level)
}

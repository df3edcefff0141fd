//! Texture decoding and bitmap encoding for locale comparison renders.
//!
//! [`blp`] reads BLP2 textures (palettised, DXT and raw encodings) into a
//! [`DecodedMipmap`]; [`bitmap`] writes any RGBA8 buffer as a self-contained 32-bit
//! bitmap file that common image viewers open without extra codecs.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), ld_image::ImageError> {
//! let bytes = std::fs::read("interface/icons/inv_misc_questionmark.blp")?;
//! let mip = ld_image::decode_mipmap(&bytes, 0)?;
//! std::fs::write("questionmark.bmp", mip.to_bitmap()?)?;
//! # Ok(())
//! # }
//! ```

pub mod bitmap;
pub mod blp;
pub mod dxt;
pub mod error;
pub mod mipmap;

pub use bitmap::{encode_bitmap, BitmapHeader};
pub use blp::{decode_mipmap, BlpHeader, BlpImage};
pub use error::{ImageError, Result};
pub use mipmap::DecodedMipmap;

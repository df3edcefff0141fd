use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur while decoding textures or encoding bitmaps.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A fixed binary layout could not be read or written (bad BLP magic,
    /// truncated header).
    #[error("Binary layout error: {0}")]
    Binary(#[from] binrw::Error),

    /// The texture stores its pixels as JPEG, which this decoder does not handle.
    #[error("Unsupported BLP content type: {0}")]
    UnsupportedContent(u32),

    /// The texture uses a compression scheme this decoder does not handle.
    #[error("Unsupported BLP compression: {0}")]
    UnsupportedCompression(u8),

    /// The texture uses an alpha depth that is not 0, 1, 4 or 8.
    #[error("Unsupported BLP alpha depth: {0}")]
    UnsupportedAlphaDepth(u8),

    /// The requested mipmap level is not present in the texture.
    #[error("Mipmap level {level} is not present (texture has {available})")]
    MissingMipmap { level: usize, available: usize },

    /// A mipmap's declared offset/size points outside the file.
    #[error("Mipmap level {level} data out of bounds: {offset}+{size} > {len}")]
    MipmapOutOfBounds {
        level: usize,
        offset: usize,
        size: usize,
        len: usize,
    },

    /// A mipmap holds fewer bytes than its encoding requires.
    #[error("Mipmap data too short: expected {expected} bytes, got {actual}")]
    DataTooShort { expected: usize, actual: usize },

    /// Width or height is zero.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The pixel buffer does not hold exactly `width * height * 4` bytes.
    #[error("RGBA buffer length mismatch: {width}x{height} needs {expected} bytes, got {actual}")]
    BufferSizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

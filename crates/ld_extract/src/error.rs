//! Error types for extraction runs.
//!
//! Fatal errors (no build identifier, unreadable listfile, archive that cannot be
//! opened) abort the run. Errors raised while processing a single asset are wrapped in
//! [`Error::Candidate`] so they carry the asset ID and path into the log.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::archive::ContentKey;
use crate::listfile::FileId;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Texture decoding or bitmap encoding failed.
    #[error("Image error: {0}")]
    Image(#[from] ld_image::ImageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid path pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A blocking decode task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The build marker could not be moved into place.
    #[error("Failed to persist build marker: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// The listfile could not be read at all.
    #[error("Failed to read listfile {path}: {source}")]
    Listfile {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A structured table export is malformed.
    #[error("Invalid table {table}: {message}")]
    Table { table: String, message: String },

    /// The archive mirror is missing or its index cannot be read.
    #[error("Archive unavailable at {path}: {message}")]
    ArchiveUnavailable { path: Utf8PathBuf, message: String },

    /// A line of the archive root index could not be parsed.
    #[error("Malformed archive index line {line}: {content}")]
    MalformedIndexLine { line: usize, content: String },

    #[error("Invalid content key: {0}")]
    InvalidContentKey(String),

    /// No payload is stored for a content key.
    #[error("Content not found for key {0}")]
    ContentNotFound(ContentKey),

    /// A fetch exceeded the configured per-fetch timeout.
    #[error("Fetch timed out for key {0}")]
    FetchTimeout(ContentKey),

    #[error("Unknown locale: {0}")]
    UnknownLocale(String),

    /// Both comparison locales are the same.
    #[error("Comparison locales must differ, got {0} twice")]
    SameLocale(String),

    /// The patch service response has an unexpected shape.
    #[error("Invalid versions response: {0}")]
    VersionsFormat(String),

    #[error("Region '{0}' not found in versions response")]
    RegionNotFound(String),

    /// A logical asset path would escape the output directory.
    #[error("Refusing to write asset path outside the output tree: {0}")]
    UnsafeAssetPath(String),

    /// A failure while processing one asset.
    #[error("Asset {id} ({name}): {source}")]
    Candidate {
        id: FileId,
        name: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attaches asset identity to an error raised while processing that asset.
    pub fn for_candidate(self, id: FileId, name: impl Into<String>) -> Self {
        Error::Candidate {
            id,
            name: name.into(),
            source: Box::new(self),
        }
    }
}

//! Content-addressed archive access.
//!
//! The archive resolves a file ID to one or more [`ContentKeyRecord`]s (one per locale
//! variant, or one shared by several locales) and serves payload bytes by
//! [`ContentKey`]. This module only defines the capability; [`LocalArchive`] is the
//! mirror-backed implementation the command-line tool uses.
//!
//! [`LocalArchive`]: crate::local_archive::LocalArchive

use async_trait::async_trait;
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::listfile::FileId;
use crate::locale::LocaleFlags;

/// Length of a content key in bytes.
pub const CONTENT_KEY_LEN: usize = 16;

/// Opaque MD5-sized key addressing one payload, displayed as lower-case hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentKey(pub [u8; CONTENT_KEY_LEN]);

impl ContentKey {
    pub fn as_bytes(&self) -> &[u8; CONTENT_KEY_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentKey({})", self.to_hex())
    }
}

impl FromStr for ContentKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut key = [0u8; CONTENT_KEY_LEN];
        hex::decode_to_slice(s.trim(), &mut key)
            .map_err(|_| Error::InvalidContentKey(s.to_string()))?;
        Ok(ContentKey(key))
    }
}

/// One localized variant of a file: the locales it applies to and its payload key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentKeyRecord {
    pub locale_flags: LocaleFlags,
    pub ckey: ContentKey,
}

/// Read access to a content-addressed archive.
///
/// Implementations must be shareable across concurrently processed assets. Any
/// concurrency ceiling the backing store needs is the implementation's concern.
#[async_trait]
pub trait ContentArchive: Send + Sync {
    /// All content-key records for a file ID, or `None` if the archive does not know it.
    fn content_keys(&self, id: FileId) -> Option<Vec<ContentKeyRecord>>;

    /// Fetches the payload addressed by `ckey`.
    async fn fetch(&self, ckey: &ContentKey) -> Result<Vec<u8>>;
}

#[async_trait]
impl<T: ContentArchive + ?Sized> ContentArchive for std::sync::Arc<T> {
    fn content_keys(&self, id: FileId) -> Option<Vec<ContentKeyRecord>> {
        (**self).content_keys(id)
    }

    async fn fetch(&self, ckey: &ContentKey) -> Result<Vec<u8>> {
        (**self).fetch(ckey).await
    }
}

//! Archive backed by a local mirror directory.
//!
//! Layout:
//!
//! ```text
//! <root>/root.txt                      fileDataID;localeFlagsHex;cKeyHex per line
//! <root>/data/<k0k1>/<k2k3>/<ckey>     payload bytes, named by content key
//! ```
//!
//! The root index is read once when the archive is opened. Several lines may share a
//! file ID, one per locale variant.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;

use crate::archive::{ContentArchive, ContentKey, ContentKeyRecord};
use crate::error::{Error, Result};
use crate::listfile::FileId;
use crate::locale::LocaleFlags;

pub const INDEX_FILE_NAME: &str = "root.txt";
pub const DATA_DIR_NAME: &str = "data";

pub struct LocalArchive {
    root: Utf8PathBuf,
    index: HashMap<FileId, Vec<ContentKeyRecord>>,
}

impl LocalArchive {
    /// Opens the mirror at `root`, loading its root index.
    pub async fn open(root: impl AsRef<Utf8Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let index_path = root.join(INDEX_FILE_NAME);

        let text = tokio::fs::read_to_string(index_path.as_std_path())
            .await
            .map_err(|e| Error::ArchiveUnavailable {
                path: index_path.clone(),
                message: e.to_string(),
            })?;

        let index = parse_root_index(&text)?;
        tracing::info!(
            "Opened archive mirror {} ({} file IDs)",
            root,
            index.len()
        );

        Ok(Self { root, index })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Path of the payload file for a content key.
    pub fn blob_path(&self, ckey: &ContentKey) -> Utf8PathBuf {
        let hex = ckey.to_hex();
        self.root
            .join(DATA_DIR_NAME)
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(&hex)
    }
}

#[async_trait]
impl ContentArchive for LocalArchive {
    fn content_keys(&self, id: FileId) -> Option<Vec<ContentKeyRecord>> {
        self.index.get(&id).cloned()
    }

    async fn fetch(&self, ckey: &ContentKey) -> Result<Vec<u8>> {
        let path = self.blob_path(ckey);
        match tokio::fs::read(path.as_std_path()).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::ContentNotFound(*ckey))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Parses the root index. Any malformed line fails the whole index.
pub fn parse_root_index(text: &str) -> Result<HashMap<FileId, Vec<ContentKeyRecord>>> {
    let mut index: HashMap<FileId, Vec<ContentKeyRecord>> = HashMap::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let malformed = || Error::MalformedIndexLine {
            line: i + 1,
            content: line.to_string(),
        };

        let mut fields = line.split(';');
        let (Some(id), Some(flags), Some(ckey), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed());
        };

        let id: FileId = id.trim().parse().map_err(|_| malformed())?;
        let flags = flags.trim();
        let flags = flags
            .strip_prefix("0x")
            .or_else(|| flags.strip_prefix("0X"))
            .unwrap_or(flags);
        let locale_flags = LocaleFlags::from_str_radix(flags, 16).map_err(|_| malformed())?;
        let ckey: ContentKey = ckey.parse().map_err(|_| malformed())?;

        index.entry(id).or_default().push(ContentKeyRecord { locale_flags, ckey });
    }

    Ok(index)
}

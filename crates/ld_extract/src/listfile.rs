//! Listfile for resolving file IDs to human-readable asset paths.

use camino::Utf8Path;

use crate::error::{Error, Result};

/// Numeric identifier of a logical game asset, independent of locale.
pub type FileId = u32;

/// One `id;path` line of the listfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListfileEntry {
    /// `None` when the ID column did not parse. Such entries never match any ID set
    /// and are never extracted.
    pub id: Option<FileId>,
    pub name: String,
}

impl ListfileEntry {
    pub fn new(id: FileId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }
}

/// The listfile mapping file IDs to their logical paths, in file order.
#[derive(Debug, Clone, Default)]
pub struct Listfile {
    entries: Vec<ListfileEntry>,
}

impl Listfile {
    /// Creates a new empty listfile.
    pub fn new() -> Self {
        Listfile {
            entries: Vec::new(),
        }
    }

    /// Reads and parses a listfile from disk.
    ///
    /// A missing or unreadable file is an error: there is nothing to extract without it.
    pub async fn load(path: impl AsRef<Utf8Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path.as_std_path())
            .await
            .map_err(|source| Error::Listfile {
                path: path.to_path_buf(),
                source,
            })?;

        let listfile = Self::parse(&text);
        tracing::info!("Loaded {} listfile entries from {}", listfile.len(), path);
        Ok(listfile)
    }

    /// Parses listfile text.
    ///
    /// File format: each line holds a decimal file ID, a semicolon and the path.
    /// Example: `136235;interface/icons/inv_misc_questionmark.blp`
    pub fn parse(text: &str) -> Self {
        let mut listfile = Self::new();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut components = line.split(';');
            let id_text = components.next().unwrap_or_default();
            let Some(name) = components.next() else {
                tracing::warn!("Skipping listfile line {} without a path: {}", index + 1, line);
                continue;
            };

            listfile.entries.push(ListfileEntry {
                id: id_text.trim().parse().ok(),
                name: name.to_string(),
            });
        }

        listfile
    }

    pub fn entries(&self) -> &[ListfileEntry] {
        &self.entries
    }

    pub fn push(&mut self, entry: ListfileEntry) {
        self.entries.push(entry);
    }

    /// Returns the number of entries in the listfile.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the listfile is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ListfileEntry> for Listfile {
    fn from_iter<T: IntoIterator<Item = ListfileEntry>>(iter: T) -> Self {
        Listfile {
            entries: iter.into_iter().collect(),
        }
    }
}

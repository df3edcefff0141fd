//! Per-asset locale comparison.
//!
//! For each in-scope entry the archive's content-key records are split by locale. An
//! asset is worth extracting only when both locales have a record and the two content
//! keys differ; identical keys mean identical bytes.

use crate::archive::{ContentArchive, ContentKey, ContentKeyRecord};
use crate::listfile::{FileId, ListfileEntry};
use crate::locale::{Locale, LocalePair};

/// An asset whose two locale variants differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffCandidate {
    pub id: FileId,
    pub name: String,
    pub key_a: ContentKey,
    pub key_b: ContentKey,
}

impl DiffCandidate {
    pub fn key_for(&self, locales: LocalePair, locale: Locale) -> ContentKey {
        if locale == locales.a {
            self.key_a
        } else {
            self.key_b
        }
    }
}

/// Why an asset was or was not selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    Differs(DiffCandidate),
    /// The archive has no records for the ID.
    NoContentKeys,
    /// No record carries this locale's bit.
    NotLocalized(Locale),
    /// Both locales resolve to the same content key.
    Identical,
}

/// The first record whose locale flags include `locale`.
pub fn select_key(records: &[ContentKeyRecord], locale: Locale) -> Option<ContentKey> {
    records
        .iter()
        .find(|record| locale.is_set_in(record.locale_flags))
        .map(|record| record.ckey)
}

/// Compares the records of one file across the two locales.
pub fn compare_records(
    id: FileId,
    name: &str,
    records: &[ContentKeyRecord],
    locales: LocalePair,
) -> DiffOutcome {
    if records.is_empty() {
        return DiffOutcome::NoContentKeys;
    }

    let Some(key_a) = select_key(records, locales.a) else {
        return DiffOutcome::NotLocalized(locales.a);
    };
    let Some(key_b) = select_key(records, locales.b) else {
        return DiffOutcome::NotLocalized(locales.b);
    };

    if key_a == key_b {
        return DiffOutcome::Identical;
    }

    DiffOutcome::Differs(DiffCandidate {
        id,
        name: name.to_string(),
        key_a,
        key_b,
    })
}

/// Resolves one entry against the archive.
pub fn resolve_entry<A: ContentArchive + ?Sized>(
    archive: &A,
    entry: &ListfileEntry,
    locales: LocalePair,
) -> DiffOutcome {
    let Some(id) = entry.id else {
        return DiffOutcome::NoContentKeys;
    };

    match archive.content_keys(id) {
        Some(records) => compare_records(id, &entry.name, &records, locales),
        None => DiffOutcome::NoContentKeys,
    }
}

/// Resolves all in-scope entries, keeping only those whose locales differ.
pub fn resolve_diffs<A: ContentArchive + ?Sized>(
    archive: &A,
    entries: &[&ListfileEntry],
    locales: LocalePair,
) -> Vec<DiffCandidate> {
    let mut candidates = Vec::new();
    let (mut missing, mut unlocalized, mut identical) = (0usize, 0usize, 0usize);

    for entry in entries {
        match resolve_entry(archive, entry, locales) {
            DiffOutcome::Differs(candidate) => candidates.push(candidate),
            DiffOutcome::NoContentKeys => missing += 1,
            DiffOutcome::NotLocalized(locale) => {
                tracing::debug!("{} has no {} variant", entry.name, locale);
                unlocalized += 1;
            }
            DiffOutcome::Identical => identical += 1,
        }
    }

    tracing::info!(
        "{} of {} candidates differ between {} and {} ({} without content keys, {} not localized, {} identical)",
        candidates.len(),
        entries.len(),
        locales.a,
        locales.b,
        missing,
        unlocalized,
        identical
    );

    candidates
}

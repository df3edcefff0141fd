//! Fetching, writing and rendering of differing assets.
//!
//! Each [`DiffCandidate`] is processed independently:
//!
//! 1. Both locale payloads are fetched concurrently.
//! 2. Each payload is written to `<output>/<locale>/<logical path>`.
//! 3. BLP textures additionally get mipmap 0 decoded and written as
//!    `<output>/compare/<logical path without .blp>.<locale>.bmp`.
//!
//! Candidates run with bounded concurrency and complete in any order. A failure in one
//! candidate is logged and recorded in the [`PipelineSummary`]; the others continue.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use futures::stream::{self, StreamExt};
use std::time::Duration;

use crate::archive::{ContentArchive, ContentKey};
use crate::diff::DiffCandidate;
use crate::error::{Error, Result};
use crate::listfile::FileId;
use crate::locale::{Locale, LocalePair};

/// Directory under the output root that receives comparison bitmaps.
pub const COMPARE_DIR_NAME: &str = "compare";

const TILED_IMAGE_EXTENSION: &str = ".blp";
const BITMAP_EXTENSION: &str = "bmp";

pub const DEFAULT_CONCURRENCY: usize = 16;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_root: Utf8PathBuf,
    pub locales: LocalePair,
    /// Maximum number of candidates in flight.
    pub concurrency: usize,
    /// Optional limit on each individual fetch.
    pub fetch_timeout: Option<Duration>,
}

impl PipelineConfig {
    pub fn new(output_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            locales: LocalePair::default(),
            concurrency: DEFAULT_CONCURRENCY,
            fetch_timeout: None,
        }
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub extracted: Vec<FileId>,
    /// Failed assets with the rendered error.
    pub failed: Vec<(FileId, String)>,
}

impl PipelineSummary {
    pub fn total(&self) -> usize {
        self.extracted.len() + self.failed.len()
    }
}

pub struct FetchAndRenderPipeline<'a, A: ContentArchive + ?Sized> {
    archive: &'a A,
    config: PipelineConfig,
}

impl<'a, A: ContentArchive + ?Sized> FetchAndRenderPipeline<'a, A> {
    pub fn new(archive: &'a A, config: PipelineConfig) -> Self {
        Self { archive, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Processes every candidate. Never fails as a whole; per-asset failures are
    /// reported in the summary.
    pub async fn run(&self, candidates: Vec<DiffCandidate>) -> PipelineSummary {
        let results: Vec<(FileId, Result<()>)> = stream::iter(candidates)
            .map(|candidate| async move {
                let result = self
                    .process(&candidate)
                    .await
                    .map_err(|e| e.for_candidate(candidate.id, candidate.name.as_str()));
                (candidate.id, result)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut summary = PipelineSummary::default();
        for (id, result) in results {
            match result {
                Ok(()) => summary.extracted.push(id),
                Err(e) => {
                    tracing::warn!("{}", e);
                    summary.failed.push((id, e.to_string()));
                }
            }
        }

        // Completion order is arbitrary.
        summary.extracted.sort_unstable();
        summary.failed.sort_unstable_by_key(|(id, _)| *id);

        tracing::info!(
            "Pipeline finished: {} extracted, {} failed",
            summary.extracted.len(),
            summary.failed.len()
        );

        summary
    }

    /// Fetches both variants of one asset, then writes and renders each.
    pub async fn process(&self, candidate: &DiffCandidate) -> Result<()> {
        tracing::info!("Processing {}", candidate.name);

        let locales = self.config.locales;
        let (bytes_a, bytes_b) = tokio::try_join!(
            self.fetch(&candidate.key_a),
            self.fetch(&candidate.key_b)
        )?;

        // Both locales finish even if one fails, so each gets its raw file.
        let (written_a, written_b) = tokio::join!(
            self.write_locale(candidate, locales.a, bytes_a),
            self.write_locale(candidate, locales.b, bytes_b)
        );

        written_a.and(written_b)
    }

    async fn fetch(&self, ckey: &ContentKey) -> Result<Vec<u8>> {
        match self.config.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, self.archive.fetch(ckey))
                .await
                .map_err(|_| Error::FetchTimeout(*ckey))?,
            None => self.archive.fetch(ckey).await,
        }
    }

    /// Writes one locale's payload and, for textures, its comparison bitmap.
    async fn write_locale(
        &self,
        candidate: &DiffCandidate,
        locale: Locale,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let raw_path = raw_output_path(&self.config.output_root, locale, &candidate.name)?;
        write_file(&raw_path, &bytes).await?;

        let Some(compare_path) =
            compare_output_path(&self.config.output_root, locale, &candidate.name)?
        else {
            return Ok(());
        };

        let bitmap = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
            let mipmap = ld_image::decode_mipmap(&bytes, 0)?;
            Ok(mipmap.to_bitmap()?)
        })
        .await??;

        write_file(&compare_path, &bitmap).await
    }
}

/// Whether a logical path names a BLP texture.
pub fn is_tiled_image(name: &str) -> bool {
    name.len()
        .checked_sub(TILED_IMAGE_EXTENSION.len())
        .and_then(|start| name.get(start..))
        .is_some_and(|extension| extension.eq_ignore_ascii_case(TILED_IMAGE_EXTENSION))
}

/// `<root>/<locale>/<name>`.
pub fn raw_output_path(root: &Utf8Path, locale: Locale, name: &str) -> Result<Utf8PathBuf> {
    Ok(root.join(locale.tag()).join(relative_asset_path(name)?))
}

/// `<root>/compare/<name without .blp>.<locale>.bmp`, or `None` for non-texture assets.
pub fn compare_output_path(
    root: &Utf8Path,
    locale: Locale,
    name: &str,
) -> Result<Option<Utf8PathBuf>> {
    if !is_tiled_image(name) {
        return Ok(None);
    }

    let stem = &name[..name.len() - TILED_IMAGE_EXTENSION.len()];
    let file_name = format!("{}.{}.{}", stem, locale.tag(), BITMAP_EXTENSION);
    Ok(Some(
        root.join(COMPARE_DIR_NAME)
            .join(relative_asset_path(&file_name)?),
    ))
}

/// Validates that a logical path stays inside the directory it is joined to.
fn relative_asset_path(name: &str) -> Result<Utf8PathBuf> {
    let path = Utf8Path::new(name);
    let is_plain = path.components().count() > 0
        && path
            .components()
            .all(|component| matches!(component, Utf8Component::Normal(_)));

    if !is_plain {
        return Err(Error::UnsafeAssetPath(name.to_string()));
    }
    Ok(path.to_path_buf())
}

/// Creates the parent directory (racing creators are fine) and writes the file.
async fn write_file(path: &Utf8Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent.as_std_path()).await?;
    }
    tokio::fs::write(path.as_std_path(), bytes).await?;
    Ok(())
}

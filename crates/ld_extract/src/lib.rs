//! Extraction of assets whose content differs between two client locales.
//!
//! A run walks through these stages:
//!
//! - **Build gate**: skip everything when the upstream build has not changed since
//!   the last successful run ([`gate`], [`versions`])
//! - **Scope**: pick candidate file IDs from the listfile using path rules and
//!   table-derived include/exclude sets ([`scope`], [`tables`], [`listfile`])
//! - **Diff**: keep only IDs whose two locale content keys differ ([`diff`])
//! - **Fetch and render**: write both raw payloads and, for BLP textures, one
//!   comparison bitmap per locale ([`pipeline`])
//!
//! Archive access goes through the [`ContentArchive`] trait; [`LocalArchive`] reads a
//! local mirror.
//!
//! # Example
//!
//! ```no_run
//! use ld_extract::{
//!     run_extraction, AssetScope, BuildGate, BuildMarker, Job, JobSource, Listfile,
//!     LocalArchive, PatchServiceVersions, PipelineConfig, Result, DEFAULT_VERSION_URL,
//! };
//!
//! struct Mirror;
//!
//! #[async_trait::async_trait]
//! impl JobSource for Mirror {
//!     type Archive = LocalArchive;
//!
//!     async fn open(&self) -> Result<Job<LocalArchive>> {
//!         Ok(Job {
//!             archive: LocalArchive::open("archive").await?,
//!             listfile: Listfile::load("community-listfile.csv").await?,
//!             scope: AssetScope::default(),
//!         })
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let versions = PatchServiceVersions::new(DEFAULT_VERSION_URL, "wow", "us")?;
//! let gate = BuildGate::new(BuildMarker::new("buildInfo.txt"), &versions, false);
//! let outcome = run_extraction(&gate, &Mirror, PipelineConfig::new("output")).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod diff;
pub mod error;
pub mod gate;
pub mod listfile;
pub mod local_archive;
pub mod locale;
pub mod pipeline;
pub mod run;
pub mod scope;
pub mod tables;
pub mod versions;

pub use archive::{ContentArchive, ContentKey, ContentKeyRecord};
pub use diff::{resolve_diffs, DiffCandidate, DiffOutcome};
pub use error::{Error, Result};
pub use gate::{append_ci_output, BuildGate, BuildMarker, GateDecision, RunReport};
pub use listfile::{FileId, Listfile, ListfileEntry};
pub use local_archive::LocalArchive;
pub use locale::{Locale, LocaleFlags, LocalePair};
pub use pipeline::{FetchAndRenderPipeline, PipelineConfig, PipelineSummary};
pub use run::{run_extraction, Job, JobSource, RunOutcome};
pub use scope::{compute_scope_sets, AssetScope, ScopeRules, ScopeSets, ScopeTables};
pub use tables::{Table, TableRow, TableSource};
pub use versions::{PatchServiceVersions, VersionSource, DEFAULT_VERSION_URL};

//! Top-level extraction run: gate, scope, diff, pipeline, commit.

use async_trait::async_trait;

use crate::archive::ContentArchive;
use crate::diff::resolve_diffs;
use crate::error::Result;
use crate::gate::{BuildGate, GateDecision, RunReport};
use crate::listfile::Listfile;
use crate::pipeline::{FetchAndRenderPipeline, PipelineConfig, PipelineSummary};
use crate::scope::AssetScope;
use crate::versions::VersionSource;

/// Everything a run reads once the gate lets it through.
pub struct Job<A> {
    pub archive: A,
    pub listfile: Listfile,
    pub scope: AssetScope,
}

/// Opens the inputs of a run. Only called when the build changed (or the run is
/// forced), so an unchanged build never touches the archive or the listfile.
#[async_trait]
pub trait JobSource: Send + Sync {
    type Archive: ContentArchive;

    async fn open(&self) -> Result<Job<Self::Archive>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    UpToDate { build: String },
    Completed {
        report: RunReport,
        summary: PipelineSummary,
    },
}

/// Runs one extraction. The build marker is written last, after every candidate has
/// been processed; per-asset failures do not prevent it.
pub async fn run_extraction<V, J>(
    gate: &BuildGate<'_, V>,
    jobs: &J,
    config: PipelineConfig,
) -> Result<RunOutcome>
where
    V: VersionSource + ?Sized,
    J: JobSource + ?Sized,
{
    let build = match gate.evaluate().await? {
        GateDecision::UpToDate { build } => {
            tracing::info!("Build {} already processed, nothing to do", build);
            return Ok(RunOutcome::UpToDate { build });
        }
        GateDecision::Outdated { current, .. } => current,
    };

    let job = jobs.open().await?;
    let candidates = job.scope.candidates(job.listfile.entries());
    tracing::info!(
        "{} of {} listfile entries in scope",
        candidates.len(),
        job.listfile.len()
    );

    let diffs = resolve_diffs(&job.archive, &candidates, config.locales);
    let summary = FetchAndRenderPipeline::new(&job.archive, config)
        .run(diffs)
        .await;

    let report = gate.commit(&build).await?;
    Ok(RunOutcome::Completed { report, summary })
}

//! Build-change detection and the persisted build marker.
//!
//! A run starts by comparing the marker left by the last successful run with the
//! current upstream build. When they match (and the run is not forced) nothing else
//! happens. The marker is only rewritten once all pipeline work is done, so an
//! interrupted run leaves the previous value in place and the next run retries.

use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;

use crate::error::Result;
use crate::versions::VersionSource;

pub const DEFAULT_MARKER_FILE: &str = "buildInfo.txt";

/// The file holding the last successfully processed build identifier.
#[derive(Debug, Clone)]
pub struct BuildMarker {
    path: Utf8PathBuf,
}

impl BuildMarker {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Reads the stored build. A missing, blank or unreadable marker is `None`, so the
    /// next run treats the build as outdated.
    pub async fn load(&self) -> Option<String> {
        match tokio::fs::read_to_string(self.path.as_std_path()).await {
            Ok(text) => {
                let build = text.trim();
                (!build.is_empty()).then(|| build.to_string())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Ignoring unreadable build marker {}: {}", self.path, e);
                None
            }
        }
    }

    /// Replaces the marker through a temp file and rename in the same directory.
    pub async fn store(&self, build: &str) -> Result<()> {
        let path = self.path.clone();
        let build = build.to_string();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let parent = match path.parent() {
                Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
                _ => Utf8PathBuf::from("."),
            };
            std::fs::create_dir_all(parent.as_std_path())?;

            let mut file = tempfile::NamedTempFile::new_in(parent.as_std_path())?;
            file.write_all(build.as_bytes())?;
            file.as_file().sync_all()?;
            file.persist(path.as_std_path())?;
            Ok(())
        })
        .await?
    }
}

/// What the gate decided at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The stored build matches upstream; the run does nothing.
    UpToDate { build: String },
    /// The pipeline must run for `current`.
    Outdated {
        previous: Option<String>,
        current: String,
        forced: bool,
    },
}

impl GateDecision {
    /// Compares the stored build with the current one.
    pub fn decide(previous: Option<String>, current: String, force: bool) -> Self {
        if !force && previous.as_deref() == Some(current.as_str()) {
            return GateDecision::UpToDate { build: current };
        }

        GateDecision::Outdated {
            previous,
            current,
            forced: force,
        }
    }

    pub fn build(&self) -> &str {
        match self {
            GateDecision::UpToDate { build } => build,
            GateDecision::Outdated { current, .. } => current,
        }
    }
}

/// Result reported to the automation that triggered the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub updated: bool,
    pub build: String,
}

impl RunReport {
    /// `key=value` lines in the format CI step outputs expect.
    pub fn to_ci_output(&self) -> String {
        format!("updated={}\nbuild={}\n", self.updated, self.build)
    }
}

/// Appends the report to a CI output file (`GITHUB_OUTPUT`), creating it if needed.
pub async fn append_ci_output(path: impl AsRef<Utf8Path>, report: &RunReport) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref().as_std_path())
        .await?;
    file.write_all(report.to_ci_output().as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

pub struct BuildGate<'a, V: VersionSource + ?Sized> {
    marker: BuildMarker,
    versions: &'a V,
    force: bool,
}

impl<'a, V: VersionSource + ?Sized> BuildGate<'a, V> {
    pub fn new(marker: BuildMarker, versions: &'a V, force: bool) -> Self {
        Self {
            marker,
            versions,
            force,
        }
    }

    pub fn marker(&self) -> &BuildMarker {
        &self.marker
    }

    /// Loads the marker and fetches the current build. Failing to learn the current
    /// build is fatal.
    pub async fn evaluate(&self) -> Result<GateDecision> {
        let previous = self.marker.load().await;
        let current = self.versions.current_build().await?;

        tracing::info!(
            "Previous build: {}, current build: {}",
            previous.as_deref().unwrap_or("<none>"),
            current
        );

        let decision = GateDecision::decide(previous, current, self.force);
        if let GateDecision::Outdated { forced: true, .. } = &decision {
            tracing::info!("Forced run, ignoring build marker");
        }
        Ok(decision)
    }

    /// Persists `build` after a successful run.
    pub async fn commit(&self, build: &str) -> Result<RunReport> {
        self.marker.store(build).await?;
        tracing::info!("Build marker updated to {}", build);

        Ok(RunReport {
            updated: true,
            build: build.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedVersion(&'static str);

    #[async_trait]
    impl VersionSource for FixedVersion {
        async fn current_build(&self) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn marker_in(dir: &tempfile::TempDir) -> BuildMarker {
        BuildMarker::new(Utf8PathBuf::from_path_buf(dir.path().join("buildInfo.txt")).unwrap())
    }

    #[test]
    fn decide_matches_previous() {
        assert_eq!(
            GateDecision::decide(Some("1".into()), "1".into(), false),
            GateDecision::UpToDate { build: "1".into() }
        );
        assert_eq!(
            GateDecision::decide(Some("1".into()), "2".into(), false),
            GateDecision::Outdated {
                previous: Some("1".into()),
                current: "2".into(),
                forced: false
            }
        );
        assert!(matches!(
            GateDecision::decide(None, "1".into(), false),
            GateDecision::Outdated { previous: None, .. }
        ));
    }

    #[test]
    fn decide_forced_ignores_marker() {
        let decision = GateDecision::decide(Some("1".into()), "1".into(), true);
        assert!(matches!(decision, GateDecision::Outdated { forced: true, .. }));
        assert_eq!(decision.build(), "1");
    }

    #[test]
    fn ci_output_format() {
        let report = RunReport {
            updated: true,
            build: "54205".into(),
        };
        assert_eq!(report.to_ci_output(), "updated=true\nbuild=54205\n");
    }

    #[tokio::test]
    async fn marker_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let marker = marker_in(&dir);

        assert_eq!(marker.load().await, None);
        marker.store("54205").await.unwrap();
        assert_eq!(marker.load().await.as_deref(), Some("54205"));
        marker.store("54206").await.unwrap();
        assert_eq!(marker.load().await.as_deref(), Some("54206"));
    }

    #[tokio::test]
    async fn marker_ignores_surrounding_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let marker = marker_in(&dir);
        std::fs::write(marker.path(), "  54205\n").unwrap();
        assert_eq!(marker.load().await.as_deref(), Some("54205"));
    }

    #[tokio::test]
    async fn corrupt_marker_counts_as_outdated() {
        let dir = tempfile::tempdir().unwrap();
        let marker = marker_in(&dir);
        std::fs::write(marker.path(), [0xFF, 0xFE, 0x00]).unwrap();
        assert_eq!(marker.load().await, None);

        let versions = FixedVersion("7");
        let gate = BuildGate::new(marker, &versions, false);
        assert!(matches!(
            gate.evaluate().await.unwrap(),
            GateDecision::Outdated { previous: None, .. }
        ));
    }

    #[tokio::test]
    async fn directory_at_marker_path_counts_as_outdated() {
        let dir = tempfile::tempdir().unwrap();
        let marker = marker_in(&dir);
        std::fs::create_dir(marker.path()).unwrap();
        assert_eq!(marker.load().await, None);
    }

    #[tokio::test]
    async fn gate_skips_when_current() {
        let dir = tempfile::tempdir().unwrap();
        let marker = marker_in(&dir);
        marker.store("7").await.unwrap();

        let versions = FixedVersion("7");
        let gate = BuildGate::new(marker, &versions, false);
        assert_eq!(
            gate.evaluate().await.unwrap(),
            GateDecision::UpToDate { build: "7".into() }
        );
    }

    #[tokio::test]
    async fn commit_writes_marker() {
        let dir = tempfile::tempdir().unwrap();
        let versions = FixedVersion("8");
        let gate = BuildGate::new(marker_in(&dir), &versions, false);

        let report = gate.commit("8").await.unwrap();
        assert!(report.updated);
        assert_eq!(gate.marker().load().await.as_deref(), Some("8"));
    }

    #[tokio::test]
    async fn ci_output_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("github_output")).unwrap();
        std::fs::write(&path, "existing=1\n").unwrap();

        let report = RunReport {
            updated: true,
            build: "9".into(),
        };
        append_ci_output(&path, &report).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "existing=1\nupdated=true\nbuild=9\n");
    }
}

//! End-to-end extraction runs against an in-memory archive.
//!
//! The archive and version source are fakes implementing the production traits; the
//! build marker and all output go to a temp directory.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ld_extract::{
    compute_scope_sets, run_extraction, AssetScope, BuildGate, BuildMarker, ContentArchive,
    ContentKey, ContentKeyRecord, Error, FileId, Job, JobSource, Listfile, Locale,
    PipelineConfig, Result, RunOutcome, ScopeRules, ScopeTables, Table, TableRow,
    VersionSource,
};

const EN: u32 = 0x2;
const ZH: u32 = 0x40;

fn key(byte: u8) -> ContentKey {
    ContentKey([byte; 16])
}

/// 1x1 raw BGRA BLP2 texture.
fn blp_pixel(bgra: [u8; 4]) -> Vec<u8> {
    const HEADER_LEN: u32 = 4 + 4 + 4 + 8 + 16 * 8 + 256 * 4;

    let mut out = Vec::new();
    out.extend_from_slice(b"BLP2");
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&[3, 8, 0, 0]);
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    for i in 0..16 {
        let offset = if i == 0 { HEADER_LEN } else { 0 };
        out.extend_from_slice(&offset.to_le_bytes());
    }
    for i in 0..16 {
        let size: u32 = if i == 0 { 4 } else { 0 };
        out.extend_from_slice(&size.to_le_bytes());
    }
    out.extend_from_slice(&[0u8; 256 * 4]);
    out.extend_from_slice(&bgra);
    out
}

#[derive(Default)]
struct FakeArchive {
    records: HashMap<FileId, Vec<ContentKeyRecord>>,
    blobs: HashMap<ContentKey, Vec<u8>>,
    fetches: AtomicUsize,
}

impl FakeArchive {
    fn with_file(mut self, id: FileId, variants: &[(u32, u8, Option<Vec<u8>>)]) -> Self {
        for (flags, byte, payload) in variants {
            self.records.entry(id).or_default().push(ContentKeyRecord {
                locale_flags: *flags,
                ckey: key(*byte),
            });
            if let Some(payload) = payload {
                self.blobs.insert(key(*byte), payload.clone());
            }
        }
        self
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentArchive for FakeArchive {
    fn content_keys(&self, id: FileId) -> Option<Vec<ContentKeyRecord>> {
        self.records.get(&id).cloned()
    }

    async fn fetch(&self, ckey: &ContentKey) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.blobs
            .get(ckey)
            .cloned()
            .ok_or(Error::ContentNotFound(*ckey))
    }
}

struct FakeVersions(&'static str);

#[async_trait]
impl VersionSource for FakeVersions {
    async fn current_build(&self) -> Result<String> {
        Ok(self.0.to_string())
    }
}

struct FailingVersions;

#[async_trait]
impl VersionSource for FailingVersions {
    async fn current_build(&self) -> Result<String> {
        Err(Error::RegionNotFound("us".to_string()))
    }
}

struct FakeJobs {
    archive: Arc<FakeArchive>,
    listfile: &'static str,
    loading_screens: Table,
    opens: AtomicUsize,
}

impl FakeJobs {
    fn new(archive: FakeArchive, listfile: &'static str) -> Self {
        Self {
            archive: Arc::new(archive),
            listfile,
            loading_screens: Table::new("LoadingScreens"),
            opens: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl JobSource for FakeJobs {
    type Archive = Arc<FakeArchive>;

    async fn open(&self) -> Result<Job<Arc<FakeArchive>>> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        let empty = Table::new("UiMapArtTile");
        let sets = compute_scope_sets(&ScopeTables {
            loading_screens: &self.loading_screens,
            ui_map_art_tiles: &empty,
            world_map_overlay_tiles: &empty,
        });

        Ok(Job {
            archive: Arc::clone(&self.archive),
            listfile: Listfile::parse(self.listfile),
            scope: AssetScope::new(ScopeRules::default(), sets),
        })
    }
}

/// Inputs whose listfile is missing from disk.
struct MissingListfile {
    path: Utf8PathBuf,
}

#[async_trait]
impl JobSource for MissingListfile {
    type Archive = FakeArchive;

    async fn open(&self) -> Result<Job<FakeArchive>> {
        Ok(Job {
            archive: FakeArchive::default(),
            listfile: Listfile::load(&self.path).await?,
            scope: AssetScope::default(),
        })
    }
}

struct Workspace {
    _dir: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        Self { _dir: dir, root }
    }

    fn marker(&self) -> BuildMarker {
        BuildMarker::new(self.root.join("buildInfo.txt"))
    }

    fn output(&self) -> Utf8PathBuf {
        self.root.join("output")
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig::new(self.output())
    }
}

fn exists(path: impl AsRef<Utf8Path>) -> bool {
    path.as_ref().as_std_path().exists()
}

async fn run(
    workspace: &Workspace,
    versions: &dyn VersionSource,
    jobs: &FakeJobs,
    force: bool,
) -> Result<RunOutcome> {
    let gate = BuildGate::new(workspace.marker(), versions, force);
    run_extraction(&gate, jobs, workspace.config()).await
}

fn foo_and_addon_archive() -> FakeArchive {
    FakeArchive::default()
        .with_file(
            123,
            &[
                (EN, 1, Some(blp_pixel([10, 20, 30, 255]))),
                (ZH, 2, Some(blp_pixel([40, 50, 60, 255]))),
            ],
        )
        .with_file(456, &[(EN | ZH, 3, Some(blp_pixel([0, 0, 0, 255])))])
}

const FOO_AND_ADDON: &str = "123;interface/foo.blp\n456;interface/addons/bar.blp\n";

#[tokio::test]
async fn only_differing_in_scope_asset_is_extracted() {
    let workspace = Workspace::new();
    let jobs = FakeJobs::new(foo_and_addon_archive(), FOO_AND_ADDON);

    let outcome = run(&workspace, &FakeVersions("100"), &jobs, false)
        .await
        .unwrap();

    let RunOutcome::Completed { report, summary } = outcome else {
        panic!("expected a completed run");
    };
    assert!(report.updated);
    assert_eq!(report.build, "100");
    assert_eq!(summary.extracted, vec![123]);
    assert!(summary.failed.is_empty());
    assert_eq!(jobs.archive.fetches(), 2);

    let output = workspace.output();
    assert_eq!(
        std::fs::read(output.join("enUS/interface/foo.blp")).unwrap(),
        blp_pixel([10, 20, 30, 255])
    );
    assert_eq!(
        std::fs::read(output.join("zhCN/interface/foo.blp")).unwrap(),
        blp_pixel([40, 50, 60, 255])
    );

    let bitmap = std::fs::read(output.join("compare/interface/foo.enUS.bmp")).unwrap();
    assert_eq!(&bitmap[0..2], b"BM");
    assert_eq!(&bitmap[138..142], &[10, 20, 30, 255]);
    assert!(exists(output.join("compare/interface/foo.zhCN.bmp")));

    assert!(!exists(output.join("enUS/interface/addons")));
    assert!(!exists(output.join("zhCN/interface/addons")));

    assert_eq!(
        workspace.marker().load().await.as_deref(),
        Some("100")
    );
}

#[tokio::test]
async fn explicit_include_outside_root_is_extracted() {
    let workspace = Workspace::new();
    let archive = FakeArchive::default().with_file(
        789,
        &[
            (EN, 7, Some(blp_pixel([1, 1, 1, 255]))),
            (ZH, 8, Some(blp_pixel([2, 2, 2, 255]))),
        ],
    );
    let mut jobs = FakeJobs::new(archive, "789;textures/loadingscreens/main.blp\n");
    jobs.loading_screens
        .insert(1, TableRow::new().with("MainImageFileDataID", 789));

    let outcome = run(&workspace, &FakeVersions("100"), &jobs, false)
        .await
        .unwrap();

    let RunOutcome::Completed { summary, .. } = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(summary.extracted, vec![789]);
    assert!(exists(
        workspace
            .output()
            .join("zhCN/textures/loadingscreens/main.blp")
    ));
    assert!(exists(
        workspace
            .output()
            .join("compare/textures/loadingscreens/main.zhCN.bmp")
    ));
}

#[tokio::test]
async fn unchanged_build_does_no_work() {
    let workspace = Workspace::new();
    let jobs = FakeJobs::new(foo_and_addon_archive(), FOO_AND_ADDON);
    let versions = FakeVersions("100");

    run(&workspace, &versions, &jobs, false).await.unwrap();
    assert_eq!(jobs.archive.fetches(), 2);
    assert_eq!(jobs.opens.load(Ordering::SeqCst), 1);

    let outcome = run(&workspace, &versions, &jobs, false).await.unwrap();
    assert_eq!(
        outcome,
        RunOutcome::UpToDate {
            build: "100".to_string()
        }
    );
    assert_eq!(jobs.archive.fetches(), 2);
    assert_eq!(jobs.opens.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn forced_run_repeats_pipeline() {
    let workspace = Workspace::new();
    let jobs = FakeJobs::new(foo_and_addon_archive(), FOO_AND_ADDON);
    let versions = FakeVersions("100");

    run(&workspace, &versions, &jobs, false).await.unwrap();
    let outcome = run(&workspace, &versions, &jobs, true).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Completed { .. }));
    assert_eq!(jobs.archive.fetches(), 4);
}

#[tokio::test]
async fn new_build_reruns_pipeline() {
    let workspace = Workspace::new();
    let jobs = FakeJobs::new(foo_and_addon_archive(), FOO_AND_ADDON);

    run(&workspace, &FakeVersions("100"), &jobs, false)
        .await
        .unwrap();
    run(&workspace, &FakeVersions("101"), &jobs, false)
        .await
        .unwrap();

    assert_eq!(jobs.archive.fetches(), 4);
    assert_eq!(
        workspace.marker().load().await.as_deref(),
        Some("101")
    );
}

#[tokio::test]
async fn failed_asset_does_not_stop_run() {
    let workspace = Workspace::new();
    let archive = FakeArchive::default()
        .with_file(
            1,
            &[
                (EN, 1, Some(blp_pixel([1, 2, 3, 255]))),
                (ZH, 2, Some(blp_pixel([4, 5, 6, 255]))),
            ],
        )
        // zhCN payload missing from the archive.
        .with_file(2, &[(EN, 3, Some(b"text".to_vec())), (ZH, 4, None)])
        // Not a valid texture.
        .with_file(
            3,
            &[
                (EN, 5, Some(b"garbage".to_vec())),
                (ZH, 6, Some(b"garbage!".to_vec())),
            ],
        );
    let jobs = FakeJobs::new(
        archive,
        "1;interface/ok.blp\n2;interface/missing.lua\n3;interface/broken.blp\n",
    );

    let outcome = run(&workspace, &FakeVersions("100"), &jobs, false)
        .await
        .unwrap();

    let RunOutcome::Completed { report, summary } = outcome else {
        panic!("expected a completed run");
    };
    assert!(report.updated);
    assert_eq!(summary.extracted, vec![1]);
    assert_eq!(
        summary.failed.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
        vec![2, 3]
    );
    assert!(summary.failed[0].1.contains("interface/missing.lua"));

    assert!(exists(workspace.output().join("compare/interface/ok.enUS.bmp")));
    assert!(!exists(
        workspace.output().join("compare/interface/broken.enUS.bmp")
    ));
    assert_eq!(
        workspace.marker().load().await.as_deref(),
        Some("100")
    );
}

#[tokio::test]
async fn version_lookup_failure_is_fatal() {
    let workspace = Workspace::new();
    let jobs = FakeJobs::new(foo_and_addon_archive(), FOO_AND_ADDON);

    let result = run(&workspace, &FailingVersions, &jobs, false).await;

    assert!(matches!(result, Err(Error::RegionNotFound(_))));
    assert_eq!(jobs.opens.load(Ordering::SeqCst), 0);
    assert_eq!(workspace.marker().load().await, None);
}

#[tokio::test]
async fn failure_after_gate_keeps_previous_marker() {
    let workspace = Workspace::new();
    workspace.marker().store("99").await.unwrap();
    let jobs = MissingListfile {
        path: workspace.root.join("community-listfile.csv"),
    };

    let versions = FakeVersions("100");
    let gate = BuildGate::new(workspace.marker(), &versions, false);
    let result = run_extraction(&gate, &jobs, workspace.config()).await;

    assert!(matches!(result, Err(Error::Listfile { .. })));
    assert_eq!(workspace.marker().load().await.as_deref(), Some("99"));
    assert!(!exists(workspace.output()));
}

#[tokio::test]
async fn other_locale_pair() {
    let workspace = Workspace::new();
    let archive = FakeArchive::default().with_file(
        5,
        &[
            (Locale::DeDe.flag(), 1, Some(b"de".to_vec())),
            (Locale::FrFr.flag(), 2, Some(b"fr".to_vec())),
        ],
    );
    let jobs = FakeJobs::new(archive, "5;interface/strings.lua\n");

    let mut config = workspace.config();
    config.locales = ld_extract::LocalePair::new(Locale::DeDe, Locale::FrFr).unwrap();
    let versions = FakeVersions("1");
    let gate = BuildGate::new(workspace.marker(), &versions, false);
    run_extraction(&gate, &jobs, config).await.unwrap();

    assert_eq!(
        std::fs::read(workspace.output().join("deDE/interface/strings.lua")).unwrap(),
        b"de"
    );
    assert_eq!(
        std::fs::read(workspace.output().join("frFR/interface/strings.lua")).unwrap(),
        b"fr"
    );
    assert!(!exists(workspace.output().join("compare")));
}

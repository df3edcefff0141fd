//! Loading run inputs from the directories named in the configuration.

use async_trait::async_trait;
use camino::Utf8Path;
use ld_extract::{
    compute_scope_sets, AssetScope, Job, JobSource, Listfile, LocalArchive, Result, ScopeTables,
    Table,
};

use crate::utils::config::AppConfig;

pub const LOADING_SCREENS_TABLE: &str = "LoadingScreens";
pub const UI_MAP_ART_TILE_TABLE: &str = "UiMapArtTile";
pub const WORLD_MAP_OVERLAY_TILE_TABLE: &str = "WorldMapOverlayTile";

async fn load_table(tables_dir: &Utf8Path, name: &str) -> Result<Table> {
    Table::load_csv_or_empty(name, tables_dir.join(format!("{name}.csv"))).await
}

/// Builds the asset scope from the configured path rules and the CSV table exports.
pub async fn load_scope(config: &AppConfig) -> Result<AssetScope> {
    let rules = config.scope_rules()?;

    let (loading_screens, ui_map_art_tiles, world_map_overlay_tiles) = tokio::try_join!(
        load_table(&config.tables_dir, LOADING_SCREENS_TABLE),
        load_table(&config.tables_dir, UI_MAP_ART_TILE_TABLE),
        load_table(&config.tables_dir, WORLD_MAP_OVERLAY_TILE_TABLE),
    )?;

    let sets = compute_scope_sets(&ScopeTables {
        loading_screens: &loading_screens,
        ui_map_art_tiles: &ui_map_art_tiles,
        world_map_overlay_tiles: &world_map_overlay_tiles,
    });

    Ok(AssetScope::new(rules, sets))
}

/// Opens the local archive mirror, listfile and tables named by the configuration.
pub struct FsJobSource<'a> {
    config: &'a AppConfig,
}

impl<'a> FsJobSource<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl JobSource for FsJobSource<'_> {
    type Archive = LocalArchive;

    async fn open(&self) -> Result<Job<LocalArchive>> {
        let (archive, listfile, scope) = tokio::try_join!(
            LocalArchive::open(&self.config.archive_dir),
            Listfile::load(&self.config.listfile),
            load_scope(self.config),
        )?;

        Ok(Job {
            archive,
            listfile,
            scope,
        })
    }
}

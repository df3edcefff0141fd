//! Selection of the file IDs an extraction run looks at.
//!
//! Two inputs decide whether a listfile entry is in scope:
//!
//! 1. **Dynamic ID sets** ([`ScopeSets`]) built by [`compute_scope_sets`] from three
//!    structured tables. Loading-screen foreground images are explicitly included;
//!    loading-screen backgrounds and individual map tiles are explicitly excluded.
//! 2. **Path rules** ([`ScopeRules`]): a root prefix, a list of excluded sub-prefixes and
//!    an excluded pattern (per-zone world map directories by default).
//!
//! Precedence: an explicit include always wins; otherwise the path rules must pass and
//! the ID must not be excluded. Entries whose ID failed to parse are never in scope.

use regex::Regex;
use std::collections::HashSet;

use crate::error::Result;
use crate::listfile::{FileId, ListfileEntry};
use crate::tables::TableSource;

/// Loading-screen background variants, not wanted on their own.
pub const LOADING_SCREEN_BACKGROUND_FIELDS: [&str; 3] = [
    "NarrowScreenFileDataID",
    "WideScreenFileDataID",
    "WideScreen169FileDataID",
];

/// Loading-screen foreground assets, always wanted.
pub const LOADING_SCREEN_FOREGROUND_FIELDS: [&str; 2] = ["MainImageFileDataID", "LogoFileDataID"];

/// File-ID column of the map art and map overlay tile tables.
pub const MAP_TILE_FIELD: &str = "FileDataID";

pub const DEFAULT_ROOT: &str = "interface/";
pub const DEFAULT_EXCLUDED_PREFIXES: [&str; 5] = [
    "interface/addons/",
    "interface/cinematics/",
    "interface/framexml/",
    "interface/glues/",
    "interface/gluexml/",
];
pub const DEFAULT_EXCLUDED_PATTERN: &str = r"^interface/worldmap/.*/";

/// The tables scope resolution reads.
pub struct ScopeTables<'a> {
    pub loading_screens: &'a dyn TableSource,
    pub ui_map_art_tiles: &'a dyn TableSource,
    pub world_map_overlay_tiles: &'a dyn TableSource,
}

/// Explicit include and exclude sets derived from the tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSets {
    pub includes: HashSet<FileId>,
    pub excludes: HashSet<FileId>,
}

/// Scans the scope tables into include/exclude ID sets.
pub fn compute_scope_sets(tables: &ScopeTables<'_>) -> ScopeSets {
    let mut sets = ScopeSets::default();

    for id in tables.loading_screens.row_ids() {
        let Some(row) = tables.loading_screens.row(id) else {
            continue;
        };
        sets.excludes.extend(
            LOADING_SCREEN_BACKGROUND_FIELDS
                .iter()
                .filter_map(|field| row.field(field)),
        );
        sets.includes.extend(
            LOADING_SCREEN_FOREGROUND_FIELDS
                .iter()
                .filter_map(|field| row.field(field)),
        );
    }

    for table in [tables.ui_map_art_tiles, tables.world_map_overlay_tiles] {
        for id in table.row_ids() {
            if let Some(file_id) = table.row(id).and_then(|row| row.field(MAP_TILE_FIELD)) {
                sets.excludes.insert(file_id);
            }
        }
    }

    tracing::debug!(
        "Scope sets: {} explicit includes, {} explicit excludes",
        sets.includes.len(),
        sets.excludes.len()
    );

    sets
}

/// Static path rules.
#[derive(Debug, Clone)]
pub struct ScopeRules {
    root: String,
    excluded_prefixes: Vec<String>,
    excluded_pattern: Option<Regex>,
}

impl ScopeRules {
    pub fn new(
        root: impl Into<String>,
        excluded_prefixes: Vec<String>,
        excluded_pattern: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            excluded_prefixes,
            excluded_pattern: excluded_pattern.map(Regex::new).transpose()?,
        })
    }

    /// Whether a logical path passes the root, prefix and pattern rules.
    pub fn path_matches(&self, name: &str) -> bool {
        name.starts_with(&self.root)
            && !self
                .excluded_prefixes
                .iter()
                .any(|prefix| name.starts_with(prefix.as_str()))
            && !self
                .excluded_pattern
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(name))
    }
}

impl Default for ScopeRules {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
            excluded_pattern: Regex::new(DEFAULT_EXCLUDED_PATTERN).ok(),
        }
    }
}

/// Path rules combined with the table-derived ID sets.
#[derive(Debug, Clone, Default)]
pub struct AssetScope {
    rules: ScopeRules,
    sets: ScopeSets,
}

impl AssetScope {
    pub fn new(rules: ScopeRules, sets: ScopeSets) -> Self {
        Self { rules, sets }
    }

    pub fn sets(&self) -> &ScopeSets {
        &self.sets
    }

    pub fn is_candidate(&self, entry: &ListfileEntry) -> bool {
        let Some(id) = entry.id else {
            return false;
        };

        if self.sets.includes.contains(&id) {
            return true;
        }

        self.rules.path_matches(&entry.name) && !self.sets.excludes.contains(&id)
    }

    /// Candidate entries, in listfile order.
    pub fn candidates<'a>(&self, entries: &'a [ListfileEntry]) -> Vec<&'a ListfileEntry> {
        entries
            .iter()
            .filter(|entry| self.is_candidate(entry))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{Table, TableRow};

    fn tables() -> (Table, Table, Table) {
        let mut loading = Table::new("LoadingScreens");
        loading.insert(
            1,
            TableRow::new()
                .with("NarrowScreenFileDataID", 10)
                .with("WideScreenFileDataID", 11)
                .with("WideScreen169FileDataID", 12)
                .with("MainImageFileDataID", 13)
                .with("LogoFileDataID", 14),
        );
        loading.insert(2, TableRow::new().with("MainImageFileDataID", 0));

        let mut art = Table::new("UiMapArtTile");
        art.insert(1, TableRow::new().with("FileDataID", 20));

        let mut overlay = Table::new("WorldMapOverlayTile");
        overlay.insert(1, TableRow::new().with("FileDataID", 30));

        (loading, art, overlay)
    }

    fn scope_sets() -> ScopeSets {
        let (loading, art, overlay) = tables();
        compute_scope_sets(&ScopeTables {
            loading_screens: &loading,
            ui_map_art_tiles: &art,
            world_map_overlay_tiles: &overlay,
        })
    }

    #[test]
    fn sets_split_foreground_and_background() {
        let sets = scope_sets();
        assert_eq!(sets.includes, HashSet::from([13, 14]));
        assert_eq!(sets.excludes, HashSet::from([10, 11, 12, 20, 30]));
    }

    #[test]
    fn default_rules() {
        let rules = ScopeRules::default();
        assert!(rules.path_matches("interface/foo.blp"));
        assert!(rules.path_matches("interface/worldmap/foo.blp"));
        assert!(!rules.path_matches("interface/worldmap/elwynn/foo.blp"));
        assert!(!rules.path_matches("interface/addons/bar.blp"));
        assert!(!rules.path_matches("interface/glues/bar.blp"));
        assert!(!rules.path_matches("textures/foo.blp"));
    }

    #[test]
    fn include_beats_path_and_exclude() {
        let mut sets = scope_sets();
        sets.excludes.insert(13);
        let scope = AssetScope::new(ScopeRules::default(), sets);

        assert!(scope.is_candidate(&ListfileEntry::new(13, "textures/loading/main.blp")));
        assert!(scope.is_candidate(&ListfileEntry::new(14, "interface/addons/logo.blp")));
    }

    #[test]
    fn exclude_beats_path_rule() {
        let scope = AssetScope::new(ScopeRules::default(), scope_sets());
        assert!(!scope.is_candidate(&ListfileEntry::new(20, "interface/icons/tile.blp")));
        assert!(scope.is_candidate(&ListfileEntry::new(21, "interface/icons/tile.blp")));
    }

    #[test]
    fn unparsed_id_is_never_a_candidate() {
        let mut sets = ScopeSets::default();
        sets.includes.insert(0);
        let scope = AssetScope::new(ScopeRules::default(), sets);
        let entry = ListfileEntry {
            id: None,
            name: "interface/foo.blp".to_string(),
        };
        assert!(!scope.is_candidate(&entry));
    }

    #[test]
    fn candidates_keep_listfile_order() {
        let scope = AssetScope::new(ScopeRules::default(), scope_sets());
        let entries = vec![
            ListfileEntry::new(3, "interface/b.blp"),
            ListfileEntry::new(4, "interface/addons/x.blp"),
            ListfileEntry::new(13, "textures/main.blp"),
            ListfileEntry::new(1, "interface/a.blp"),
        ];
        let ids: Vec<_> = scope
            .candidates(&entries)
            .iter()
            .map(|entry| entry.id)
            .collect();
        assert_eq!(ids, vec![Some(3), Some(13), Some(1)]);
    }

    #[test]
    fn custom_rules_without_pattern() {
        let rules = ScopeRules::new("sound/", vec!["sound/music/".to_string()], None).unwrap();
        assert!(rules.path_matches("sound/interface/click.ogg"));
        assert!(!rules.path_matches("sound/music/theme.mp3"));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(ScopeRules::new("interface/", Vec::new(), Some("(")).is_err());
    }
}

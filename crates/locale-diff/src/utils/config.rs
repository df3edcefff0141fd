//! Run configuration stored in locale-diff.toml.

use camino::{Utf8Path, Utf8PathBuf};
use ld_extract::pipeline::DEFAULT_CONCURRENCY;
use ld_extract::scope::{DEFAULT_EXCLUDED_PATTERN, DEFAULT_EXCLUDED_PREFIXES, DEFAULT_ROOT};
use ld_extract::{Locale, LocalePair, PipelineConfig, ScopeRules, DEFAULT_VERSION_URL};
use serde::Deserialize;
use std::time::Duration;

use crate::errors::CliError;

pub const DEFAULT_CONFIG_FILE: &str = "locale-diff.toml";

/// Settings for one extraction setup. Every field has a default, so an empty or
/// missing file is valid.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub product: String,
    pub region: String,
    /// Patch service URL with `{region}` and `{product}` placeholders.
    pub version_url: String,
    pub listfile: Utf8PathBuf,
    pub archive_dir: Utf8PathBuf,
    pub tables_dir: Utf8PathBuf,
    pub output_dir: Utf8PathBuf,
    pub build_marker: Utf8PathBuf,
    pub locales: Vec<String>,
    pub concurrency: usize,
    pub fetch_timeout_secs: Option<u64>,
    pub scope: ScopeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            product: "wow".to_string(),
            region: "us".to_string(),
            version_url: DEFAULT_VERSION_URL.to_string(),
            listfile: Utf8PathBuf::from("community-listfile.csv"),
            archive_dir: Utf8PathBuf::from("archive"),
            tables_dir: Utf8PathBuf::from("tables"),
            output_dir: Utf8PathBuf::from("output"),
            build_marker: Utf8PathBuf::from(ld_extract::gate::DEFAULT_MARKER_FILE),
            locales: vec![Locale::EnUs.to_string(), Locale::ZhCn.to_string()],
            concurrency: DEFAULT_CONCURRENCY,
            fetch_timeout_secs: None,
            scope: ScopeConfig::default(),
        }
    }
}

/// Path rules for candidate selection.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScopeConfig {
    pub root: String,
    pub excluded_prefixes: Vec<String>,
    /// Regular expression; an empty string disables it.
    pub excluded_pattern: String,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
            excluded_pattern: DEFAULT_EXCLUDED_PATTERN.to_string(),
        }
    }
}

impl AppConfig {
    /// The two locales to compare, in reference-first order.
    pub fn locale_pair(&self) -> Result<LocalePair, CliError> {
        let [a, b] = self.locales.as_slice() else {
            return Err(CliError::invalid_locales(format!(
                "expected exactly two locales, found {}",
                self.locales.len()
            )));
        };

        let parse = |tag: &String| {
            tag.parse::<Locale>()
                .map_err(|e| CliError::invalid_locales(e.to_string()))
        };
        LocalePair::new(parse(a)?, parse(b)?).map_err(|e| CliError::invalid_locales(e.to_string()))
    }

    pub fn scope_rules(&self) -> ld_extract::Result<ScopeRules> {
        let pattern = Some(self.scope.excluded_pattern.as_str()).filter(|p| !p.is_empty());
        ScopeRules::new(
            self.scope.root.clone(),
            self.scope.excluded_prefixes.clone(),
            pattern,
        )
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }

    pub fn pipeline_config(&self, locales: LocalePair) -> PipelineConfig {
        PipelineConfig {
            output_root: self.output_dir.clone(),
            locales,
            concurrency: self.concurrency.max(1),
            fetch_timeout: self.fetch_timeout(),
        }
    }
}

/// Loads the configuration at `path`, or the default file in the working directory.
///
/// A missing file yields defaults. A file that exists but cannot be parsed is an error.
pub fn load_config(path: Option<&Utf8Path>) -> Result<AppConfig, CliError> {
    let path = path.unwrap_or(Utf8Path::new(DEFAULT_CONFIG_FILE));

    let content = match std::fs::read_to_string(path.as_std_path()) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No configuration at {}, using defaults", path);
            return Ok(AppConfig::default());
        }
        Err(e) => return Err(e.into()),
    };

    let config = parse_config(&content)
        .map_err(|e| CliError::config_parse_error(path.to_path_buf(), Box::new(e)))?;
    tracing::debug!("Loaded configuration from {}", path);
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str(content)
}

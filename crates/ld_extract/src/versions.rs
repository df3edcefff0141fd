//! Current build lookup from the product patch service.
//!
//! The patch service publishes a pipe-separated `versions` table per product:
//!
//! ```text
//! Region!STRING:0|BuildConfig!HEX:16|CDNConfig!HEX:16|KeyRing!HEX:16|BuildId!DEC:4|VersionsName!String:0|ProductConfig!HEX:16
//! ## seqn = 2934772
//! us|5e31...|9a11...||54205|11.0.0.54205|53020d...
//! eu|5e31...|9a11...||54205|11.0.0.54205|53020d...
//! ```
//!
//! The build identifier is the `BuildId` cell of the configured region's row.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_VERSION_URL: &str = "http://{region}.patch.battle.net:1119/{product}/versions";

const REGION_COLUMN: &str = "Region";
const BUILD_ID_COLUMN: &str = "BuildId";

/// Source of the current upstream build identifier.
#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn current_build(&self) -> Result<String>;
}

/// Reads the build identifier from the patch service over HTTP.
pub struct PatchServiceVersions {
    client: reqwest::Client,
    url: String,
    region: String,
}

impl PatchServiceVersions {
    /// `url_template` may contain `{region}` and `{product}` placeholders.
    pub fn new(url_template: &str, product: &str, region: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("locale-diff/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            url: url_template
                .replace("{region}", region)
                .replace("{product}", product),
            region: region.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl VersionSource for PatchServiceVersions {
    async fn current_build(&self) -> Result<String> {
        tracing::debug!("Fetching versions from {}", self.url);
        let text = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_versions(&text, &self.region)
    }
}

/// Extracts the `BuildId` of `region` from a versions table.
pub fn parse_versions(text: &str, region: &str) -> Result<String> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("##"));

    let header = lines
        .next()
        .ok_or_else(|| Error::VersionsFormat("empty response".to_string()))?;
    let columns: Vec<&str> = header
        .split('|')
        .map(|column| column.split('!').next().unwrap_or_default())
        .collect();

    let column_index = |name: &str| {
        columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::VersionsFormat(format!("missing {name} column")))
    };
    let region_index = column_index(REGION_COLUMN)?;
    let build_index = column_index(BUILD_ID_COLUMN)?;

    lines
        .map(|line| line.split('|').collect::<Vec<_>>())
        .find(|cells| {
            cells
                .get(region_index)
                .is_some_and(|cell| cell.eq_ignore_ascii_case(region))
        })
        .ok_or_else(|| Error::RegionNotFound(region.to_string()))?
        .get(build_index)
        .map(|cell| cell.trim().to_string())
        .filter(|build| !build.is_empty())
        .ok_or_else(|| Error::VersionsFormat(format!("empty BuildId for region {region}")))
}

//! Package index client for release metadata.
//!
//! Responses are cached on disk with a 24h TTL so repeated pin runs do
//! not hammer the index.

pub mod pin;

pub use pin::{PinnedDep, PinOptions};

use crate::config::WheelwrightConfig;
use crate::naming::canonicalize;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// One downloadable artifact of a release, as the index reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseFile {
    pub filename: String,
    pub url: String,
    pub digests: ReleaseDigests,
    /// The artifact's python tag (`cp39`, `py3`, or `source` for sdists).
    pub python_version: String,
    #[serde(default)]
    pub yanked: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseDigests {
    pub sha256: String,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    urls: Vec<ReleaseFile>,
}

/// Parses the body of a `{name}/{version}/json` index response.
pub fn parse_release_files(body: &str) -> Result<Vec<ReleaseFile>> {
    let response: ReleaseResponse =
        serde_json::from_str(body).context("Failed to parse index release JSON")?;
    Ok(response.urls)
}

pub struct IndexClient {
    base_url: String,
    timeout: Duration,
    cache_enabled: bool,
    cache_dir: PathBuf,
}

impl IndexClient {
    pub fn new(config: &WheelwrightConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.index_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.request_timeout_secs),
            cache_enabled: config.cache_enabled,
            cache_dir: config.cache_path()?,
        })
    }

    /// Fetches the release files for one `name == version` pin, going to
    /// the network only when the cached response is missing or stale.
    pub fn release_files(&self, name: &str, version: &str) -> Result<Vec<ReleaseFile>> {
        let body = self.release_json(name, version)?;
        parse_release_files(&body)
    }

    fn release_json(&self, name: &str, version: &str) -> Result<String> {
        let cache_file = self.cache_file(name, version);

        if self.cache_enabled && is_cache_fresh(&cache_file)? {
            debug!("Using cached index response {}", cache_file.display());
            return fs::read_to_string(&cache_file).with_context(|| {
                format!("Failed to read cached response {}", cache_file.display())
            });
        }

        let body = self.fetch_release_json(name, version)?;

        if self.cache_enabled {
            if let Some(parent) = cache_file.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create cache directory {}", parent.display())
                })?;
            }
            fs::write(&cache_file, &body).with_context(|| {
                format!("Failed to write cached response {}", cache_file.display())
            })?;
        }

        Ok(body)
    }

    fn fetch_release_json(&self, name: &str, version: &str) -> Result<String> {
        let url = format!("{}/{}/{}/json", self.base_url, name, version);
        debug!("Fetching {}", url);

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let response = client.get(&url).send().with_context(|| {
            format!("Failed to fetch {} (check network connectivity)", url)
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            bail!("Release {} {} not found at {}", name, version, url);
        }
        if !response.status().is_success() {
            bail!(
                "Index request failed with HTTP {} from {}",
                response.status(),
                url
            );
        }

        let body = response
            .text()
            .context("Failed to read index response body")?;
        if body.is_empty() {
            bail!("Index response from {} is empty (HTTP 200 but 0 bytes)", url);
        }

        Ok(body)
    }

    fn cache_file(&self, name: &str, version: &str) -> PathBuf {
        self.cache_dir
            .join("index")
            .join(format!("{}-{}.json", canonicalize(name), version))
    }
}

fn is_cache_fresh(cache_path: &Path) -> Result<bool> {
    if !cache_path.exists() {
        return Ok(false);
    }

    let metadata = fs::metadata(cache_path).context("Failed to read cache metadata")?;
    let modified = metadata
        .modified()
        .context("Failed to get cache modification time")?;
    let elapsed = SystemTime::now()
        .duration_since(modified)
        .context("System time is before cache modification time")?;

    Ok(elapsed < CACHE_TTL)
}

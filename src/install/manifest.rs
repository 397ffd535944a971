//! The install manifest: everything build glue needs to know about an
//! installed wheel, written as JSON next to the installed tree.

use crate::install::entry_points::InstalledEntryPoint;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILENAME: &str = "install_manifest.json";

/// Patterns always excluded from a package's data payload. RECORD is
/// excluded because it hashes files that change as the tree is installed.
pub fn default_data_exclude() -> Vec<String> {
    vec![
        "**/* *".to_string(),
        "**/*.py".to_string(),
        "**/*.pyc".to_string(),
        "**/*.dist-info/RECORD".to_string(),
    ]
}

/// Merges exclude patterns from all sources, deduplicated and sorted.
pub fn merge_data_exclude(user: &[String], annotation: &[String]) -> Vec<String> {
    let mut merged: BTreeSet<String> = default_data_exclude().into_iter().collect();
    merged.extend(user.iter().cloned());
    merged.extend(annotation.iter().cloned());
    merged.into_iter().collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallManifest {
    pub package: String,
    pub version: String,
    pub library_target: String,
    pub archive_target: String,
    pub dependencies: Vec<String>,
    pub dependency_targets: Vec<String>,
    pub archive_targets: Vec<String>,
    pub tags: Vec<String>,
    pub entry_points: Vec<InstalledEntryPoint>,
    pub data: Vec<String>,
    pub data_exclude: Vec<String>,
    pub srcs_exclude: Vec<String>,
    pub copied_files: Vec<String>,
    pub data_payloads: Vec<String>,
    pub namespace_packages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additive_content: Option<String>,
}

impl InstallManifest {
    /// Writes the manifest at the root of the installed tree.
    pub fn write(&self, root: &Path) -> Result<PathBuf> {
        let path = root.join(MANIFEST_FILENAME);
        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize install manifest")?;
        fs::write(&path, contents + "\n")
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid install manifest {}", path.display()))
    }
}

//! Per-package install overrides, loaded from a JSON file keyed by
//! package name.

use crate::naming::canonicalize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Failed to read annotations file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid annotations file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Overrides applied to a single package during install.
///
/// `copy_files` and `copy_executables` map source paths to destinations
/// inside the installed tree; executables get their execute bit set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Annotation {
    pub copy_files: BTreeMap<String, String>,
    pub copy_executables: BTreeMap<String, String>,
    pub data: Vec<String>,
    pub data_exclude_glob: Vec<String>,
    pub srcs_exclude_glob: Vec<String>,
    pub additive_content: Option<String>,
}

impl Annotation {
    pub fn is_empty(&self) -> bool {
        self == &Annotation::default()
    }
}

/// All annotations from one file, keyed by canonical package name.
///
/// Entries for packages that never get installed are simply never looked
/// up; unknown fields inside an entry are rejected at parse time.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    annotations: BTreeMap<String, Annotation>,
}

impl AnnotationSet {
    pub fn from_file(path: &Path) -> Result<Self, AnnotationError> {
        let contents = fs::read_to_string(path).map_err(|source| AnnotationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(text: &str) -> Result<Self, AnnotationError> {
        let raw: BTreeMap<String, Annotation> = serde_json::from_str(text)?;
        let annotations = raw
            .into_iter()
            .map(|(name, annotation)| (canonicalize(&name), annotation))
            .collect();
        Ok(Self { annotations })
    }

    pub fn get(&self, package: &str) -> Option<&Annotation> {
        self.annotations.get(&canonicalize(package))
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

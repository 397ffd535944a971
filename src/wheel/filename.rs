//! Wheel filename parsing and formatting.
//!
//! `dist-version[-build]-python-abi-platform.whl`, with the distribution,
//! version and build segments escaped on output. Escaped segments cannot
//! contain `-`, so parsing splits on dashes directly.

use crate::naming::escape_filename_segment;
use crate::tags::{expand_tag_triple, CompatTag};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WheelNameError {
    #[error("Wheel filename '{0}' does not end in .whl")]
    MissingSuffix(String),

    #[error("Wheel filename '{0}' has {1} dash-separated segments, expected 5 or 6")]
    SegmentCount(String, usize),

    #[error("Build tag '{tag}' in wheel filename '{filename}' must start with a digit")]
    InvalidBuildTag { filename: String, tag: String },
}

/// The parsed components of a wheel filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelFilename {
    pub distribution: String,
    pub version: String,
    pub build_tag: Option<String>,
    pub python_tag: String,
    pub abi_tag: String,
    pub platform_tag: String,
}

impl WheelFilename {
    pub fn new(distribution: &str, version: &str, python: &str, abi: &str, platform: &str) -> Self {
        Self {
            distribution: distribution.to_string(),
            version: version.to_string(),
            build_tag: None,
            python_tag: python.to_string(),
            abi_tag: abi.to_string(),
            platform_tag: platform.to_string(),
        }
    }

    pub fn with_build_tag(mut self, build_tag: &str) -> Self {
        if !build_tag.is_empty() {
            self.build_tag = Some(build_tag.to_string());
        }
        self
    }

    /// Parses a wheel filename into its components.
    pub fn parse(filename: &str) -> Result<Self, WheelNameError> {
        let stem = filename
            .strip_suffix(".whl")
            .ok_or_else(|| WheelNameError::MissingSuffix(filename.to_string()))?;

        let segments: Vec<&str> = stem.split('-').collect();
        let (distribution, version, build_tag, tags) = match segments.len() {
            5 => (segments[0], segments[1], None, &segments[2..]),
            6 => (segments[0], segments[1], Some(segments[2]), &segments[3..]),
            n => return Err(WheelNameError::SegmentCount(filename.to_string(), n)),
        };

        if let Some(tag) = build_tag {
            if !tag.chars().next().map_or(false, |c| c.is_ascii_digit()) {
                return Err(WheelNameError::InvalidBuildTag {
                    filename: filename.to_string(),
                    tag: tag.to_string(),
                });
            }
        }

        Ok(Self {
            distribution: distribution.to_string(),
            version: version.to_string(),
            build_tag: build_tag.map(str::to_string),
            python_tag: tags[0].to_string(),
            abi_tag: tags[1].to_string(),
            platform_tag: tags[2].to_string(),
        })
    }

    /// The canonical filename, with name, version and build tag escaped.
    pub fn format(&self) -> String {
        let mut components = vec![
            escape_filename_segment(&self.distribution),
            escape_filename_segment(&self.version),
        ];
        if let Some(build) = &self.build_tag {
            components.push(escape_filename_segment(build));
        }
        components.push(self.python_tag.clone());
        components.push(self.abi_tag.clone());
        components.push(self.platform_tag.clone());

        format!("{}.whl", components.join("-"))
    }

    /// Name of the `.dist-info` directory inside the archive.
    pub fn dist_info_dir(&self) -> String {
        format!(
            "{}-{}.dist-info",
            escape_filename_segment(&self.distribution),
            escape_filename_segment(&self.version)
        )
    }

    /// Name of the `.data` directory inside the archive.
    pub fn data_dir(&self) -> String {
        format!(
            "{}-{}.data",
            escape_filename_segment(&self.distribution),
            escape_filename_segment(&self.version)
        )
    }

    /// Purelib wheels install under a platform-independent site-packages.
    pub fn is_purelib(&self) -> bool {
        self.platform_tag == "any"
    }

    /// Every concrete compatibility tag this filename claims.
    pub fn expanded_tags(&self) -> Vec<CompatTag> {
        expand_tag_triple(&self.python_tag, &self.abi_tag, &self.platform_tag)
    }
}

impl fmt::Display for WheelFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

//! Selecting release artifacts and splicing pins into managed files.

use crate::index::ReleaseFile;
use crate::naming::sanitize;
use crate::tags::{rust_triple_for, suggest_platform};
use crate::wheel::filename::WheelFilename;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const PIN_START_MARKER: &str = "# START: managed by wheelwright pin";
pub const PIN_END_MARKER: &str = "# END: managed by wheelwright pin";

/// One pinned artifact: a concrete wheel for a python version and target
/// triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinnedDep {
    pub name: String,
    pub python: String,
    pub triple: String,
    pub url: String,
    pub sha256: String,
}

impl PinnedDep {
    pub fn target_name(&self, prefix: &str) -> String {
        format!(
            "{}_{}_{}",
            sanitize(&self.name, prefix),
            self.python,
            self.triple
        )
    }

    fn sort_key(&self) -> String {
        format!("{}_{}", self.python, self.triple)
    }
}

#[derive(Debug, Clone)]
pub struct PinOptions {
    pub name: String,
    pub version: String,
    /// Python tags worth pinning, e.g. `cp39`.
    pub python_versions: Vec<String>,
    pub label_prefix: String,
}

/// Filters release files down to pinnable wheels.
///
/// Yanked files, sdists, python tags outside the requested set and legacy
/// pymalloc (trailing `m`) ABI builds are dropped. Each remaining wheel
/// contributes one pin per platform tag that maps to a supported triple;
/// unmapped tags are skipped, with a hint when a supported tag is close.
pub fn select_pins(files: &[ReleaseFile], options: &PinOptions) -> Vec<PinnedDep> {
    let mut pins = Vec::new();

    for file in files {
        if file.yanked {
            debug!("Skipping yanked file {}", file.filename);
            continue;
        }
        if !file.filename.ends_with(".whl") {
            continue;
        }
        if !options.python_versions.contains(&file.python_version) {
            continue;
        }

        let parsed = match WheelFilename::parse(&file.filename) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Skipping {}: {}", file.filename, err);
                continue;
            }
        };
        if parsed.abi_tag == format!("{}m", file.python_version) {
            debug!("Skipping legacy pymalloc build {}", file.filename);
            continue;
        }

        for platform in parsed.platform_tag.split('.') {
            match rust_triple_for(platform) {
                Some(triple) => pins.push(PinnedDep {
                    name: options.name.clone(),
                    python: file.python_version.clone(),
                    triple: triple.to_string(),
                    url: file.url.clone(),
                    sha256: file.digests.sha256.clone(),
                }),
                None => match suggest_platform(platform) {
                    Some(suggestion) => warn!(
                        "Skipping unsupported platform tag '{}' (closest supported: '{}')",
                        platform, suggestion
                    ),
                    None => warn!("Skipping unsupported platform tag '{}'", platform),
                },
            }
        }
    }

    pins.sort_by_key(|pin| pin.sort_key());
    pins
}

/// Renders the pin table, one `[python.triple]` block per pin.
pub fn render_pin_table(pins: &[PinnedDep]) -> String {
    if pins.is_empty() {
        return String::new();
    }

    let blocks: Vec<String> = pins
        .iter()
        .map(|pin| {
            format!(
                "[{}.{}]\nurl = \"{}\"\nsha256 = \"{}\"",
                pin.python, pin.triple, pin.url, pin.sha256
            )
        })
        .collect();
    blocks.join("\n\n") + "\n"
}

/// Renders the sorted target-name list, one name per line.
pub fn render_target_list(pins: &[PinnedDep], prefix: &str) -> String {
    if pins.is_empty() {
        return String::new();
    }

    let mut names: Vec<String> = pins.iter().map(|pin| pin.target_name(prefix)).collect();
    names.sort();
    names.join("\n") + "\n"
}

/// Replaces the contents of the managed block, leaving everything outside
/// it untouched. The marker lines themselves stay in place.
pub fn splice_managed_block(
    original: &str,
    snippet: &str,
    start_marker: &str,
    end_marker: &str,
) -> Result<String> {
    let mut out: Vec<&str> = Vec::new();
    let mut in_block = false;
    let mut found = false;

    for line in original.lines() {
        if in_block {
            if !line.starts_with(end_marker) {
                continue;
            }
            in_block = false;
        }
        out.push(line);
        if line.starts_with(start_marker) {
            found = true;
            in_block = true;
            out.extend(snippet.lines());
        }
    }

    if !found {
        bail!("No '{}' marker found in managed file", start_marker);
    }
    if in_block {
        bail!(
            "Managed block after '{}' is never closed by '{}'",
            start_marker,
            end_marker
        );
    }

    Ok(out.join("\n") + "\n")
}

/// Minimal line diff between two renderings: dropped lines come out
/// prefixed with `-`, added lines with `+`.
pub fn line_diff(old: &str, new: &str) -> String {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();

    let mut prefix = 0;
    while prefix < old_lines.len()
        && prefix < new_lines.len()
        && old_lines[prefix] == new_lines[prefix]
    {
        prefix += 1;
    }

    let mut old_end = old_lines.len();
    let mut new_end = new_lines.len();
    while old_end > prefix && new_end > prefix && old_lines[old_end - 1] == new_lines[new_end - 1]
    {
        old_end -= 1;
        new_end -= 1;
    }

    let mut out = String::new();
    for line in &old_lines[prefix..old_end] {
        out.push('-');
        out.push_str(line);
        out.push('\n');
    }
    for line in &new_lines[prefix..new_end] {
        out.push('+');
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Splices `snippet` into the managed block of `path`. With `dry_run` the
/// file is left alone and the line diff is returned instead.
pub fn update_managed_file(path: &Path, snippet: &str, dry_run: bool) -> Result<Option<String>> {
    let original = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let updated = splice_managed_block(&original, snippet, PIN_START_MARKER, PIN_END_MARKER)?;

    if dry_run {
        return Ok(Some(line_diff(&original, &updated)));
    }

    fs::write(path, &updated).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(None)
}

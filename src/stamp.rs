//! Version stamping from workspace status files.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Substitutes `{KEY}` placeholders in `version` from status files.
///
/// Each status file holds `KEY value` lines (the value runs to end of line).
/// The volatile file is applied before the stable one; a placeholder is gone
/// once substituted, so the volatile value sticks when both files define the
/// same key.
pub fn resolve_version_stamp(
    version: &str,
    volatile_status: Option<&Path>,
    stable_status: Option<&Path>,
) -> Result<String> {
    let mut resolved = version.to_string();

    for path in [volatile_status, stable_status].into_iter().flatten() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read status file {}", path.display()))?;

        for line in content.lines() {
            if let Some((key, value)) = line.split_once(' ') {
                resolved = resolved.replace(&format!("{{{}}}", key), value);
            }
        }
    }

    Ok(resolved)
}

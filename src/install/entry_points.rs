//! Console-script shims for installed wheels.

use crate::wheel::metadata::ConsoleScript;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Shim filenames carry this prefix so they cannot collide with package
/// sources or directories inside the wheel.
pub const ENTRY_POINT_PREFIX: &str = "wheelwright_entry_point";

/// One shim written into the installed tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledEntryPoint {
    pub name: String,
    pub module: String,
    pub attribute: String,
    pub script: String,
}

/// Filename for an entry point's shim. Names that already end in `.py`
/// are mangled to `{name}_py` so the stem stays unique.
pub fn script_name(entry_point_name: &str) -> String {
    let stem = match entry_point_name.strip_suffix(".py") {
        Some(stripped) => format!("{}_py", stripped),
        None => entry_point_name.to_string(),
    };
    format!("{}_{}.py", ENTRY_POINT_PREFIX, stem)
}

/// Python stub that forwards to the entry point.
pub fn shim_contents(script: &ConsoleScript, shebang: &str) -> String {
    format!(
        "{shebang}\n\
         import sys\n\
         from {module} import {attribute}\n\
         if __name__ == \"__main__\":\n    \
         sys.exit({attribute}())\n",
        shebang = shebang,
        module = script.module,
        attribute = script.attribute,
    )
}

/// Writes one shim per console script at the root of the installed tree.
pub fn write_shims(
    root: &Path,
    console_scripts: &[ConsoleScript],
    shebang: &str,
) -> Result<Vec<InstalledEntryPoint>> {
    let mut installed = Vec::new();
    for script in console_scripts {
        let filename = script_name(&script.name);
        let path = root.join(&filename);
        fs::write(&path, shim_contents(script, shebang))
            .with_context(|| format!("Failed to write entry point shim {}", path.display()))?;
        installed.push(InstalledEntryPoint {
            name: script.name.clone(),
            module: script.module.clone(),
            attribute: script.attribute.clone(),
            script: filename,
        });
    }
    installed.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(installed)
}

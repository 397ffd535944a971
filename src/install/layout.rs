//! Spreading `*.data` payload directories into the installed root.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Payload subdirectories whose contents belong directly on the import
/// path.
const SPREAD_SUBDIRS: [&str; 2] = ["purelib", "platlib"];

/// Moves the contents of every `{dist}-{ver}.data/purelib` and `platlib`
/// directory into the root and prunes what empties out. Other payload
/// kinds (`scripts`, `data`) stay in place; their files are returned as
/// root-relative paths so callers can report them.
pub fn spread_data_dirs(root: &Path) -> Result<Vec<String>> {
    let mut data_dirs = Vec::new();
    let entries =
        fs::read_dir(root).with_context(|| format!("Failed to list {}", root.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", root.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".data") && entry.path().is_dir() {
            data_dirs.push(entry.path());
        }
    }
    data_dirs.sort();

    let mut remaining = Vec::new();
    for data_dir in data_dirs {
        for sub in SPREAD_SUBDIRS {
            let sub_path = data_dir.join(sub);
            if sub_path.is_dir() {
                debug!("Spreading {} into {}", sub_path.display(), root.display());
                move_tree_into(&sub_path, root)?;
            }
        }

        if dir_is_empty(&data_dir)? {
            fs::remove_dir(&data_dir)
                .with_context(|| format!("Failed to remove {}", data_dir.display()))?;
        } else {
            collect_files(&data_dir, root, &mut remaining)?;
        }
    }

    remaining.sort();
    Ok(remaining)
}

fn dir_is_empty(dir: &Path) -> Result<bool> {
    let mut entries =
        fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
    Ok(entries.next().is_none())
}

/// Moves every child of `src_dir` into `dest_dir`, merging directories that
/// already exist on the destination side, then removes the emptied source.
fn move_tree_into(src_dir: &Path, dest_dir: &Path) -> Result<()> {
    let entries =
        fs::read_dir(src_dir).with_context(|| format!("Failed to list {}", src_dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", src_dir.display()))?;
        let source = entry.path();
        let target = dest_dir.join(entry.file_name());

        if source.is_dir() && target.is_dir() {
            move_tree_into(&source, &target)?;
        } else {
            fs::rename(&source, &target).with_context(|| {
                format!(
                    "Failed to move {} to {}",
                    source.display(),
                    target.display()
                )
            })?;
        }
    }
    fs::remove_dir(src_dir).with_context(|| format!("Failed to remove {}", src_dir.display()))?;
    Ok(())
}

fn collect_files(dir: &Path, root: &Path, out: &mut Vec<String>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, root, out)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            out.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

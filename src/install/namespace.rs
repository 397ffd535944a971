//! Converting native namespace packages to pkgutil-style ones.
//!
//! Native namespace packages (directories holding modules but no
//! `__init__.py`) rely on import machinery that a spread-out install tree
//! cannot provide, so each one gets a pkgutil-style `__init__.py` instead.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const NAMESPACE_INIT: &str =
    "__path__ = __import__('pkgutil').extend_path(__path__, __name__)\n";

enum DirKind {
    /// Has an `__init__.py`.
    Standard,
    /// Package-shaped but `__init__.py`-less.
    Namespace,
    /// Not a package at all.
    Plain,
}

/// Finds implicit namespace package directories under `root`, deepest
/// first. `bin/` at the root and the dist-info and `.data` trees never
/// count.
pub fn implicit_namespace_packages(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let entries =
        fs::read_dir(root).with_context(|| format!("Failed to list {}", root.display()))?;
    let mut children: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", root.display()))?;
        if entry.path().is_dir() {
            children.push(entry.path());
        }
    }
    children.sort();

    for child in children {
        let name = child.file_name().map(|n| n.to_string_lossy().into_owned());
        if let Some(name) = name {
            if name == "bin" || name.ends_with(".dist-info") || name.ends_with(".data") {
                continue;
            }
        }
        scan(&child, &mut found)?;
    }
    Ok(found)
}

/// Bottom-up: a directory is a namespace package when it has no
/// `__init__.py` but contains module files or package subdirectories.
fn scan(dir: &Path, found: &mut Vec<PathBuf>) -> Result<DirKind> {
    let mut has_init = false;
    let mut has_module = false;
    let mut has_package_child = false;

    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
    let mut children: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            children.push(path);
        } else {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == "__init__.py" {
                has_init = true;
            }
            if name.ends_with(".py") {
                has_module = true;
            }
        }
    }
    children.sort();

    for child in children {
        match scan(&child, found)? {
            DirKind::Standard | DirKind::Namespace => has_package_child = true,
            DirKind::Plain => {}
        }
    }

    if has_init {
        return Ok(DirKind::Standard);
    }
    if has_module || has_package_child {
        found.push(dir.to_path_buf());
        return Ok(DirKind::Namespace);
    }
    Ok(DirKind::Plain)
}

/// Writes the pkgutil-style init into `dir`. Refuses to clobber an
/// existing `__init__.py`.
pub fn add_namespace_init(dir: &Path) -> Result<()> {
    let init_path = dir.join("__init__.py");
    if init_path.is_file() {
        bail!("{} already contains an __init__.py file", dir.display());
    }
    fs::write(&init_path, NAMESPACE_INIT)
        .with_context(|| format!("Failed to write {}", init_path.display()))?;
    Ok(())
}

/// Detects and converts every implicit namespace package under `root`,
/// returning the converted directories.
pub fn setup_namespace_compatibility(root: &Path) -> Result<Vec<PathBuf>> {
    let namespace_dirs = implicit_namespace_packages(root)?;
    for dir in &namespace_dirs {
        debug!("Adding pkgutil namespace init to {}", dir.display());
        add_namespace_init(dir)?;
    }
    Ok(namespace_dirs)
}

//! Installing wheels into a site-packages style tree.
//!
//! `install_wheel` drives the whole pipeline: extract, spread payload
//! directories, namespace fixup, entry point shims, annotations, the
//! install manifest, and a RECORD rewrite describing the final tree.

pub mod entry_points;
pub mod layout;
pub mod manifest;
pub mod namespace;

pub use entry_points::InstalledEntryPoint;
pub use manifest::{InstallManifest, MANIFEST_FILENAME};

use crate::annotations::Annotation;
use crate::config::DEFAULT_SHIM_SHEBANG;
use crate::naming::{archive_target, library_target, DEFAULT_LABEL_PREFIX};
use crate::record::Record;
use crate::requirement::MarkerEnvironment;
use crate::wheel::Wheel;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Everything that shapes an install besides the wheel itself.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub dest: PathBuf,
    pub extras: BTreeSet<String>,
    pub environment: MarkerEnvironment,
    pub data_exclude: Vec<String>,
    /// Leave native namespace packages alone instead of converting them.
    pub enable_implicit_namespaces: bool,
    pub label_prefix: String,
    pub shim_shebang: String,
    pub annotation: Option<Annotation>,
}

impl InstallOptions {
    pub fn new(dest: &Path) -> Self {
        Self {
            dest: dest.to_path_buf(),
            extras: BTreeSet::new(),
            environment: MarkerEnvironment::default(),
            data_exclude: Vec::new(),
            enable_implicit_namespaces: false,
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
            shim_shebang: DEFAULT_SHIM_SHEBANG.to_string(),
            annotation: None,
        }
    }
}

/// Installs one wheel and returns the manifest describing the result.
pub fn install_wheel(wheel_path: &Path, options: &InstallOptions) -> Result<InstallManifest> {
    let mut wheel = Wheel::open(wheel_path)
        .with_context(|| format!("Failed to open wheel {}", wheel_path.display()))?;
    let dest = options.dest.as_path();
    let dist_info_dir = wheel.dist_info_dir().to_string();

    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create install directory {}", dest.display()))?;
    info!(
        "Installing {} {} into {}",
        wheel.name(),
        wheel.version(),
        dest.display()
    );
    wheel.unzip(dest)?;

    let data_payloads = layout::spread_data_dirs(dest)?;

    let namespace_dirs = if options.enable_implicit_namespaces {
        Vec::new()
    } else {
        namespace::setup_namespace_compatibility(dest)?
    };

    let console_scripts = wheel.entry_points()?.console_scripts();
    let installed_entry_points =
        entry_points::write_shims(dest, &console_scripts, &options.shim_shebang)?;

    let dependencies: Vec<String> = wheel
        .dependencies(&options.extras, &options.environment)?
        .into_iter()
        .collect();
    debug!("Resolved dependencies: {:?}", dependencies);
    let dependency_targets = dependencies
        .iter()
        .map(|dep| library_target(dep, &options.label_prefix))
        .collect();
    let archive_targets = dependencies
        .iter()
        .map(|dep| archive_target(dep, &options.label_prefix))
        .collect();

    let metadata = wheel.metadata()?;
    let name = wheel.name();
    let version = metadata.version.clone();

    let mut data = Vec::new();
    let mut copied_files = Vec::new();
    let mut annotation_data_exclude = Vec::new();
    let mut srcs_exclude = Vec::new();
    let mut additive_content = None;
    if let Some(annotation) = &options.annotation {
        for (src, dest_rel) in &annotation.copy_files {
            copy_annotation_file(src, dest, dest_rel, false)?;
            data.push(dest_rel.clone());
            copied_files.push(dest_rel.clone());
        }
        for (src, dest_rel) in &annotation.copy_executables {
            copy_annotation_file(src, dest, dest_rel, true)?;
            data.push(dest_rel.clone());
            copied_files.push(dest_rel.clone());
        }
        data.extend(annotation.data.iter().cloned());
        annotation_data_exclude = annotation.data_exclude_glob.clone();
        srcs_exclude = annotation.srcs_exclude_glob.clone();
        additive_content = annotation.additive_content.clone();
    }
    data.sort();
    copied_files.sort();

    let mut namespace_packages: Vec<String> = namespace_dirs
        .iter()
        .filter_map(|dir| dir.strip_prefix(dest).ok())
        .map(|dir| dir.to_string_lossy().replace('\\', "/"))
        .collect();
    namespace_packages.sort();

    let manifest = InstallManifest {
        package: name.clone(),
        version: version.clone(),
        library_target: library_target(&name, &options.label_prefix),
        archive_target: archive_target(&name, &options.label_prefix),
        dependencies,
        dependency_targets,
        archive_targets,
        tags: vec![
            format!("pypi_name={}", name),
            format!("pypi_version={}", version),
        ],
        entry_points: installed_entry_points,
        data,
        data_exclude: manifest::merge_data_exclude(&options.data_exclude, &annotation_data_exclude),
        srcs_exclude,
        copied_files,
        data_payloads,
        namespace_packages,
        additive_content,
    };
    manifest.write(dest)?;

    regenerate_record(dest, &dist_info_dir)?;

    Ok(manifest)
}

fn copy_annotation_file(src: &str, root: &Path, dest_rel: &str, executable: bool) -> Result<()> {
    let target = root.join(dest_rel);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::copy(src, &target)
        .with_context(|| format!("Failed to copy {} to {}", src, target.display()))?;

    #[cfg(unix)]
    {
        if executable {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(0o755))
                .with_context(|| format!("Failed to set permissions on {}", target.display()))?;
        }
    }
    #[cfg(not(unix))]
    {
        let _ = executable;
    }

    Ok(())
}

/// The wheel's RECORD described the archive; after spreading, shims and
/// the manifest the tree no longer matches it, so it is rebuilt from what
/// is actually on disk.
fn regenerate_record(root: &Path, dist_info_dir: &str) -> Result<()> {
    let record_rel = format!("{}/RECORD", dist_info_dir);
    let mut record = Record::default();

    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .sort_by_file_path(|a, b| a.cmp(b));
    for entry in builder.build() {
        let entry = entry.context("Failed to walk installed tree")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let relative = match path.strip_prefix(root) {
            Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
            Err(_) => continue,
        };
        if relative == record_rel {
            continue;
        }
        record.add_file(&relative, path)?;
    }

    let record_path = root.join(&record_rel);
    fs::write(&record_path, record.render(&record_rel))
        .with_context(|| format!("Failed to write {}", record_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wheel::filename::WheelFilename;
    use crate::wheel::WheelBuilder;
    use tempfile::TempDir;

    fn write_file(root: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn build_fixture_wheel(dir: &Path) -> PathBuf {
        let init = write_file(dir, "src/example/__init__.py", "VERSION = \"0.1.0\"\n");
        let cli = write_file(dir, "src/example/cli.py", "def main():\n    return 0\n");
        let extra = write_file(dir, "src/extra.py", "EXTRA = True\n");

        let filename = WheelFilename::new("example", "0.1.0", "py3", "none", "any");
        let mut builder = WheelBuilder::new(filename, dir);
        builder.add_input("example/__init__.py", &init);
        builder.add_input("example/cli.py", &cli);
        builder.add_input("example-0.1.0.data/purelib/example/extra.py", &extra);
        builder.metadata_mut().requires = vec!["requests".to_string()];
        builder.set_entry_points_contents(
            "[console_scripts]\nexample = example.cli:main\n".to_string(),
        );
        builder.build().unwrap()
    }

    #[test]
    fn test_install_end_to_end() {
        let dir = TempDir::new().unwrap();
        let wheel_path = build_fixture_wheel(dir.path());
        let dest = dir.path().join("installed");

        let options = InstallOptions::new(&dest);
        let manifest = install_wheel(&wheel_path, &options).unwrap();

        assert!(dest.join("example/__init__.py").is_file());
        assert!(dest.join("example/cli.py").is_file());
        // purelib payload spread into the root
        assert!(dest.join("example/extra.py").is_file());
        assert!(!dest.join("example-0.1.0.data").exists());

        let shim = dest.join("wheelwright_entry_point_example.py");
        let body = fs::read_to_string(&shim).unwrap();
        assert!(body.contains("from example.cli import main"));

        assert_eq!(manifest.package, "example");
        assert_eq!(manifest.version, "0.1.0");
        assert_eq!(manifest.library_target, "pypi__example");
        assert_eq!(manifest.archive_target, "pypi__example__whl");
        assert_eq!(manifest.dependencies, vec!["requests".to_string()]);
        assert_eq!(
            manifest.dependency_targets,
            vec!["pypi__requests".to_string()]
        );
        assert_eq!(
            manifest.tags,
            vec![
                "pypi_name=example".to_string(),
                "pypi_version=0.1.0".to_string(),
            ]
        );
        assert!(dest.join(MANIFEST_FILENAME).is_file());
    }

    #[test]
    fn test_install_rewrites_record_for_installed_tree() {
        let dir = TempDir::new().unwrap();
        let wheel_path = build_fixture_wheel(dir.path());
        let dest = dir.path().join("installed");

        install_wheel(&wheel_path, &InstallOptions::new(&dest)).unwrap();

        let record_path = dest.join("example-0.1.0.dist-info/RECORD");
        let record = Record::from_file(&record_path).unwrap();
        let diff = record.verify(&dest).unwrap();
        assert!(diff.is_clean(), "diff not clean: {:?}", diff);

        let paths: Vec<&str> = record
            .entries
            .iter()
            .map(|entry| entry.path.as_str())
            .collect();
        assert!(paths.contains(&"example/extra.py"));
        assert!(paths.contains(&"install_manifest.json"));
        assert!(paths.contains(&"wheelwright_entry_point_example.py"));
    }

    #[test]
    fn test_install_converts_namespace_packages() {
        let dir = TempDir::new().unwrap();
        let module = write_file(dir.path(), "src/ns/pkg/mod.py", "x = 1\n");

        let filename = WheelFilename::new("nswheel", "1.0", "py3", "none", "any");
        let mut builder = WheelBuilder::new(filename, dir.path());
        builder.add_input("ns/pkg/mod.py", &module);
        let wheel_path = builder.build().unwrap();

        let dest = dir.path().join("installed");
        let manifest = install_wheel(&wheel_path, &InstallOptions::new(&dest)).unwrap();

        let init = fs::read_to_string(dest.join("ns/__init__.py")).unwrap();
        assert!(init.contains("extend_path"));
        assert!(dest.join("ns/pkg/__init__.py").is_file());
        assert_eq!(
            manifest.namespace_packages,
            vec!["ns".to_string(), "ns/pkg".to_string()]
        );
    }

    #[test]
    fn test_install_keeps_namespaces_when_disabled() {
        let dir = TempDir::new().unwrap();
        let module = write_file(dir.path(), "src/ns/pkg/mod.py", "x = 1\n");

        let filename = WheelFilename::new("nswheel", "1.0", "py3", "none", "any");
        let mut builder = WheelBuilder::new(filename, dir.path());
        builder.add_input("ns/pkg/mod.py", &module);
        let wheel_path = builder.build().unwrap();

        let dest = dir.path().join("installed");
        let mut options = InstallOptions::new(&dest);
        options.enable_implicit_namespaces = true;
        install_wheel(&wheel_path, &options).unwrap();

        assert!(!dest.join("ns/__init__.py").exists());
        assert!(!dest.join("ns/pkg/__init__.py").exists());
    }

    #[test]
    fn test_install_applies_annotation() {
        let dir = TempDir::new().unwrap();
        let wheel_path = build_fixture_wheel(dir.path());
        let license = write_file(dir.path(), "assets/LICENSE.txt", "license text\n");
        let dest = dir.path().join("installed");

        let mut annotation = Annotation::default();
        annotation.copy_files.insert(
            license.to_string_lossy().into_owned(),
            "licenses/LICENSE.txt".to_string(),
        );
        annotation
            .data_exclude_glob
            .push("**/docs/**".to_string());
        annotation.additive_content = Some("extra text".to_string());

        let mut options = InstallOptions::new(&dest);
        options.annotation = Some(annotation);
        let manifest = install_wheel(&wheel_path, &options).unwrap();

        assert!(dest.join("licenses/LICENSE.txt").is_file());
        assert_eq!(
            manifest.copied_files,
            vec!["licenses/LICENSE.txt".to_string()]
        );
        assert!(manifest
            .data_exclude
            .contains(&"**/docs/**".to_string()));
        assert_eq!(manifest.additive_content.as_deref(), Some("extra text"));
    }

    #[test]
    fn test_install_extras_extend_dependencies() {
        let dir = TempDir::new().unwrap();
        let init = write_file(dir.path(), "src/example/__init__.py", "");

        let filename = WheelFilename::new("example", "0.1.0", "py3", "none", "any");
        let mut builder = WheelBuilder::new(filename, dir.path());
        builder.add_input("example/__init__.py", &init);
        builder.metadata_mut().requires = vec!["requests".to_string()];
        builder
            .metadata_mut()
            .extra_requires
            .insert("toml".to_string(), vec!["tomli".to_string()]);
        let wheel_path = builder.build().unwrap();

        let dest = dir.path().join("installed");
        let mut options = InstallOptions::new(&dest);
        options.extras.insert("toml".to_string());
        let manifest = install_wheel(&wheel_path, &options).unwrap();

        assert_eq!(
            manifest.dependencies,
            vec!["requests".to_string(), "tomli".to_string()]
        );
    }
}

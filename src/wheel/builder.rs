//! Reproducible wheel assembly.
//!
//! Members are written in a fixed order: payload files sorted by archive
//! path, then WHEEL, METADATA, entry_points.txt when present, and RECORD
//! last. Every entry carries the same timestamp so identical inputs
//! produce identical archives.

use crate::record::Record;
use crate::wheel::filename::WheelFilename;
use crate::wheel::metadata::{render_wheel_file, MetadataSpec};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 1980-01-01T00:00:00Z, the oldest timestamp the zip format can carry.
pub const DEFAULT_ZIP_TIMESTAMP: u64 = 315532800;

/// Splits a `archive_path;real_path` input pair.
pub fn parse_input_pair(pair: &str) -> Result<(String, PathBuf)> {
    match pair.split_once(';') {
        Some((package, real)) if !package.is_empty() && !real.is_empty() => {
            Ok((package.to_string(), PathBuf::from(real)))
        }
        _ => bail!("Invalid input pair '{}': expected 'archive_path;real_path'", pair),
    }
}

fn zip_timestamp(epoch_seconds: u64) -> zip::DateTime {
    use chrono::{Datelike, Timelike};

    chrono::DateTime::from_timestamp(epoch_seconds as i64, 0)
        .and_then(|stamp| {
            let utc = stamp.naive_utc();
            zip::DateTime::from_date_and_time(
                utc.year() as u16,
                utc.month() as u8,
                utc.day() as u8,
                utc.hour() as u8,
                utc.minute() as u8,
                utc.second() as u8,
            )
            .ok()
        })
        .unwrap_or_default()
}

#[cfg(unix)]
fn file_mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o777)
        .unwrap_or(0o644)
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> u32 {
    0o644
}

/// Zip writer that hashes every member into a RECORD ledger as it goes.
struct ArchiveWriter {
    zip: ZipWriter<fs::File>,
    record: Record,
    options: SimpleFileOptions,
    strip_path_prefixes: Vec<String>,
}

impl ArchiveWriter {
    fn new(file: fs::File, strip_path_prefixes: Vec<String>, timestamp: u64) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip_timestamp(timestamp));
        Self {
            zip: ZipWriter::new(file),
            record: Record::default(),
            options,
            strip_path_prefixes,
        }
    }

    /// Archive paths always use forward slashes; the first matching strip
    /// prefix is removed.
    fn arcname_from(&self, name: &str) -> String {
        let normalized = name.replace('\\', "/");
        for prefix in &self.strip_path_prefixes {
            if let Some(stripped) = normalized.strip_prefix(prefix.as_str()) {
                return stripped.to_string();
            }
        }
        normalized
    }

    fn add_file(&mut self, package_filename: &str, real_filename: &Path) -> Result<()> {
        if real_filename.is_dir() {
            let mut children = Vec::new();
            let entries = fs::read_dir(real_filename)
                .with_context(|| format!("Failed to list {}", real_filename.display()))?;
            for entry in entries {
                let entry = entry
                    .with_context(|| format!("Failed to list {}", real_filename.display()))?;
                children.push(entry.file_name().to_string_lossy().into_owned());
            }
            children.sort();

            for child in children {
                self.add_file(
                    &format!("{}/{}", package_filename, child),
                    &real_filename.join(&child),
                )?;
            }
            return Ok(());
        }

        let arcname = self.arcname_from(package_filename);
        let contents = fs::read(real_filename)
            .with_context(|| format!("Failed to read {}", real_filename.display()))?;

        let options = self.options.unix_permissions(file_mode(real_filename));
        self.zip
            .start_file(arcname.as_str(), options)
            .with_context(|| format!("Failed to start archive member {}", arcname))?;
        self.zip
            .write_all(&contents)
            .with_context(|| format!("Failed to write archive member {}", arcname))?;
        self.record.add_contents(&arcname, &contents);
        Ok(())
    }

    fn add_contents(&mut self, filename: &str, contents: &str) -> Result<()> {
        let options = self.options.unix_permissions(0o644);
        self.zip
            .start_file(filename, options)
            .with_context(|| format!("Failed to start archive member {}", filename))?;
        self.zip
            .write_all(contents.as_bytes())
            .with_context(|| format!("Failed to write archive member {}", filename))?;
        self.record.add_contents(filename, contents.as_bytes());
        Ok(())
    }

    /// The RECORD member goes in last and is not hashed into itself.
    fn add_record_file(&mut self, record_path: &str) -> Result<()> {
        let contents = self.record.render(record_path);
        let options = self.options.unix_permissions(0o644);
        self.zip
            .start_file(record_path, options)
            .with_context(|| format!("Failed to start archive member {}", record_path))?;
        self.zip
            .write_all(contents.as_bytes())
            .with_context(|| format!("Failed to write archive member {}", record_path))?;
        Ok(())
    }

    fn finish(self) -> Result<()> {
        self.zip.finish().context("Failed to finalize wheel archive")?;
        Ok(())
    }
}

enum EntryPointsSource {
    File(PathBuf),
    Contents(String),
}

/// Assembles a wheel from payload files and metadata.
pub struct WheelBuilder {
    filename: WheelFilename,
    out_dir: PathBuf,
    outfile: Option<PathBuf>,
    strip_path_prefixes: Vec<String>,
    inputs: BTreeMap<String, PathBuf>,
    metadata: MetadataSpec,
    entry_points: Option<EntryPointsSource>,
    timestamp: u64,
}

impl WheelBuilder {
    pub fn new(filename: WheelFilename, out_dir: &Path) -> Self {
        let metadata = MetadataSpec {
            name: filename.distribution.clone(),
            version: filename.version.clone(),
            ..MetadataSpec::default()
        };
        Self {
            filename,
            out_dir: out_dir.to_path_buf(),
            outfile: None,
            strip_path_prefixes: Vec::new(),
            inputs: BTreeMap::new(),
            metadata,
            entry_points: None,
            timestamp: DEFAULT_ZIP_TIMESTAMP,
        }
    }

    pub fn filename(&self) -> &WheelFilename {
        &self.filename
    }

    /// Overrides where the archive is written. The canonical wheel name is
    /// unaffected.
    pub fn set_outfile(&mut self, path: &Path) {
        self.outfile = Some(path.to_path_buf());
    }

    pub fn set_timestamp(&mut self, epoch_seconds: u64) {
        self.timestamp = epoch_seconds;
    }

    /// Prefixes are evaluated in order; the first match wins.
    pub fn strip_path_prefix(&mut self, prefix: &str) {
        self.strip_path_prefixes.push(prefix.to_string());
    }

    /// Registers a payload file. A later registration for the same archive
    /// path replaces the earlier one.
    pub fn add_input(&mut self, package_path: &str, real_path: &Path) {
        self.inputs
            .insert(package_path.to_string(), real_path.to_path_buf());
    }

    /// Reads an input list file of `archive_path;real_path` lines.
    pub fn add_input_list(&mut self, list_path: &Path) -> Result<()> {
        let contents = fs::read_to_string(list_path)
            .with_context(|| format!("Failed to read input list {}", list_path.display()))?;
        for line in contents.lines() {
            if line.is_empty() {
                continue;
            }
            let (package_path, real_path) = parse_input_pair(line)?;
            self.inputs.insert(package_path, real_path);
        }
        Ok(())
    }

    pub fn metadata_mut(&mut self) -> &mut MetadataSpec {
        &mut self.metadata
    }

    pub fn set_entry_points_file(&mut self, path: &Path) {
        self.entry_points = Some(EntryPointsSource::File(path.to_path_buf()));
    }

    pub fn set_entry_points_contents(&mut self, contents: String) {
        self.entry_points = Some(EntryPointsSource::Contents(contents));
    }

    /// Canonical wheel filename, escaped per the wheel naming rules.
    pub fn wheelname(&self) -> String {
        self.filename.format()
    }

    pub fn output_path(&self) -> PathBuf {
        match &self.outfile {
            Some(path) => path.clone(),
            None => self.out_dir.join(self.wheelname()),
        }
    }

    fn dist_info_path(&self, basename: &str) -> String {
        format!("{}/{}", self.filename.dist_info_dir(), basename)
    }

    /// Writes the archive and returns its path.
    pub fn build(&self) -> Result<PathBuf> {
        let output_path = self.output_path();
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory {}", parent.display())
                })?;
            }
        }
        let file = fs::File::create(&output_path)
            .with_context(|| format!("Failed to create {}", output_path.display()))?;

        let mut writer =
            ArchiveWriter::new(file, self.strip_path_prefixes.clone(), self.timestamp);

        for (package_path, real_path) in &self.inputs {
            writer.add_file(package_path, real_path)?;
        }

        let tags: Vec<String> = self
            .filename
            .expanded_tags()
            .iter()
            .map(ToString::to_string)
            .collect();
        writer.add_contents(
            &self.dist_info_path("WHEEL"),
            &render_wheel_file(self.filename.is_purelib(), &tags),
        )?;

        writer.add_contents(&self.dist_info_path("METADATA"), &self.metadata.render())?;

        match &self.entry_points {
            Some(EntryPointsSource::File(path)) => {
                writer.add_file(&self.dist_info_path("entry_points.txt"), path)?;
            }
            Some(EntryPointsSource::Contents(contents)) => {
                writer.add_contents(&self.dist_info_path("entry_points.txt"), contents)?;
            }
            None => {}
        }

        writer.add_record_file(&self.dist_info_path("RECORD"))?;
        writer.finish()?;

        Ok(output_path)
    }
}

#[derive(Debug, Default, Deserialize)]
struct PyprojectFile {
    project: Option<ProjectTable>,
}

/// The `[project]` table of a pyproject.toml, reduced to the fields that
/// feed wheel metadata.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectTable {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub classifiers: Option<Vec<String>>,
    pub requires_python: Option<String>,
    pub dependencies: Option<Vec<String>>,
    pub optional_dependencies: Option<BTreeMap<String, Vec<String>>>,
    pub scripts: Option<BTreeMap<String, String>>,
}

impl ProjectTable {
    /// Folds the table into a metadata spec. Single-valued fields only fill
    /// gaps; list-valued fields extend what is already there.
    pub fn apply_to(&self, spec: &mut MetadataSpec) {
        if spec.description.is_none() {
            spec.description = self.description.clone();
        }
        if spec.python_requires.is_none() {
            spec.python_requires = self.requires_python.clone();
        }
        if let Some(classifiers) = &self.classifiers {
            spec.classifiers.extend(classifiers.iter().cloned());
        }
        if let Some(dependencies) = &self.dependencies {
            spec.requires.extend(dependencies.iter().cloned());
        }
        if let Some(optional) = &self.optional_dependencies {
            for (option, requirements) in optional {
                spec.extra_requires
                    .entry(option.clone())
                    .or_default()
                    .extend(requirements.iter().cloned());
            }
        }
    }

    /// Renders `[project.scripts]` as a console_scripts entry points
    /// section, or None when the table has no scripts.
    pub fn console_scripts_text(&self) -> Option<String> {
        let scripts = self.scripts.as_ref().filter(|s| !s.is_empty())?;
        let mut out = String::from("[console_scripts]\n");
        for (name, target) in scripts {
            out.push_str(&format!("{} = {}\n", name, target));
        }
        Some(out)
    }
}

/// Parses a pyproject.toml, returning its `[project]` table.
pub fn parse_pyproject(text: &str) -> Result<ProjectTable> {
    let parsed: PyprojectFile = toml::from_str(text).context("Failed to parse pyproject.toml")?;
    Ok(parsed.project.unwrap_or_default())
}

//! Reading wheel archives: dist-info discovery, metadata accessors,
//! dependency resolution and extraction.

use crate::naming::canonicalize;
use crate::record::{digest_reader, Record, RecordDiff, RecordError};
use crate::requirement::MarkerEnvironment;
use crate::wheel::filename::{WheelFilename, WheelNameError};
use crate::wheel::metadata::{EntryPoints, Metadata, MetadataError, WheelInfo};
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

#[derive(Debug, Error)]
pub enum WheelError {
    #[error("Wheel path {0} has no usable file name")]
    InvalidPath(PathBuf),

    #[error("Failed to open wheel {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid wheel archive {path}: {source}")]
    Archive {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error(transparent)]
    Name(#[from] WheelNameError),

    #[error("Wheel {path} has no {member} member")]
    MissingMember { path: PathBuf, member: String },

    #[error("Wheel {path} contains more than one dist-info directory")]
    DuplicateDistInfo { path: PathBuf },

    #[error("Wheel {path} has dist-info directory '{found}', expected '{expected}'")]
    DistInfoMismatch {
        path: PathBuf,
        found: String,
        expected: String,
    },

    #[error("Refusing to extract archive member with unsafe path '{0}'")]
    UnsafeMemberPath(String),

    #[error("Failed to extract {member}: {source}")]
    Extract {
        member: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// An opened wheel archive.
pub struct Wheel {
    path: PathBuf,
    filename: WheelFilename,
    dist_info_dir: String,
    archive: ZipArchive<fs::File>,
}

impl Wheel {
    /// Opens a wheel, validating that the archive carries exactly one
    /// dist-info directory and that it matches the filename.
    pub fn open(path: &Path) -> Result<Self, WheelError> {
        let basename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| WheelError::InvalidPath(path.to_path_buf()))?;
        let filename = WheelFilename::parse(basename)?;

        let file = fs::File::open(path).map_err(|source| WheelError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let archive = ZipArchive::new(file).map_err(|source| WheelError::Archive {
            path: path.to_path_buf(),
            source,
        })?;

        let mut dist_info_dirs = BTreeSet::new();
        for name in archive.file_names() {
            if let Some((first, rest)) = name.split_once('/') {
                if first.ends_with(".dist-info") && rest == "METADATA" {
                    dist_info_dirs.insert(first.to_string());
                }
            }
        }

        let dist_info_dir = match dist_info_dirs.len() {
            0 => {
                return Err(WheelError::MissingMember {
                    path: path.to_path_buf(),
                    member: "METADATA".to_string(),
                })
            }
            1 => dist_info_dirs.into_iter().next().unwrap_or_default(),
            _ => {
                return Err(WheelError::DuplicateDistInfo {
                    path: path.to_path_buf(),
                })
            }
        };

        let expected = filename.dist_info_dir();
        if dist_info_dir != expected {
            return Err(WheelError::DistInfoMismatch {
                path: path.to_path_buf(),
                found: dist_info_dir,
                expected,
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            filename,
            dist_info_dir,
            archive,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filename(&self) -> &WheelFilename {
        &self.filename
    }

    pub fn dist_info_dir(&self) -> &str {
        &self.dist_info_dir
    }

    /// Canonical distribution name, from the filename.
    pub fn name(&self) -> String {
        canonicalize(&self.filename.distribution)
    }

    pub fn version(&self) -> &str {
        &self.filename.version
    }

    /// All archive member names, in archive order.
    pub fn member_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    fn read_member(&mut self, member: &str) -> Result<String, WheelError> {
        let mut file = match self.archive.by_name(member) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(WheelError::MissingMember {
                    path: self.path.clone(),
                    member: member.to_string(),
                })
            }
            Err(source) => {
                return Err(WheelError::Archive {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|source| WheelError::Extract {
                member: member.to_string(),
                source,
            })?;
        Ok(content)
    }

    pub fn metadata(&mut self) -> Result<Metadata, WheelError> {
        let member = format!("{}/METADATA", self.dist_info_dir);
        let content = self.read_member(&member)?;
        Ok(Metadata::parse(&content)?)
    }

    pub fn wheel_info(&mut self) -> Result<WheelInfo, WheelError> {
        let member = format!("{}/WHEEL", self.dist_info_dir);
        let content = self.read_member(&member)?;
        Ok(WheelInfo::parse(&content)?)
    }

    /// Entry points, or an empty set when the wheel ships none.
    pub fn entry_points(&mut self) -> Result<EntryPoints, WheelError> {
        let member = format!("{}/entry_points.txt", self.dist_info_dir);
        match self.read_member(&member) {
            Ok(content) => Ok(EntryPoints::parse(&content)),
            Err(WheelError::MissingMember { .. }) => Ok(EntryPoints::default()),
            Err(err) => Err(err),
        }
    }

    pub fn record(&mut self) -> Result<Record, WheelError> {
        let member = format!("{}/RECORD", self.dist_info_dir);
        let content = self.read_member(&member)?;
        Ok(Record::parse(&content)?)
    }

    /// Checks every archive member against the embedded RECORD.
    ///
    /// Entries without a digest (the RECORD self entry) are checked for
    /// presence only. Directory members are ignored.
    pub fn verify(&mut self) -> Result<RecordDiff, WheelError> {
        let record = self.record()?;
        let members: BTreeSet<String> = self
            .archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect();

        let mut diff = RecordDiff::default();
        let mut recorded = BTreeSet::new();

        for entry in &record.entries {
            recorded.insert(entry.path.clone());

            if !members.contains(&entry.path) {
                diff.missing.push(entry.path.clone());
                continue;
            }
            let (digest, size) = match &entry.digest {
                Some(digest) => (digest, entry.size),
                None => continue,
            };

            let mut member =
                self.archive
                    .by_name(&entry.path)
                    .map_err(|source| WheelError::Archive {
                        path: self.path.clone(),
                        source,
                    })?;
            let (actual_digest, actual_size) =
                digest_reader(&mut member).map_err(|source| WheelError::Extract {
                    member: entry.path.clone(),
                    source,
                })?;

            if &actual_digest != digest || size.is_some_and(|s| s != actual_size) {
                diff.modified.push(entry.path.clone());
            }
        }

        for member in members {
            if !recorded.contains(&member) {
                diff.untracked.push(member);
            }
        }

        Ok(diff)
    }

    /// Canonical names of direct dependencies for the requested extras.
    ///
    /// Requirements whose canonical name equals the wheel's own name are
    /// dropped: packages whose extras depend on the package itself would
    /// otherwise produce a dependency cycle of length one.
    pub fn dependencies(
        &mut self,
        extras: &BTreeSet<String>,
        env: &MarkerEnvironment,
    ) -> Result<BTreeSet<String>, WheelError> {
        let own_name = self.name();
        let metadata = self.metadata()?;
        let mut deps = BTreeSet::new();

        for requirement in &metadata.requires_dist {
            if requirement.canonical_name == own_name {
                debug!(
                    wheel = %own_name,
                    "Dropping self-referential dependency {}", requirement.name
                );
                continue;
            }
            if requirement.evaluate(env, extras) {
                deps.insert(requirement.canonical_name.clone());
            }
        }

        Ok(deps)
    }

    /// Extracts every member under `dest`, preserving unix permission bits.
    ///
    /// Member paths are checked against escapes before anything touches the
    /// filesystem.
    pub fn unzip(&mut self, dest: &Path) -> Result<(), WheelError> {
        for index in 0..self.archive.len() {
            let mut member = self
                .archive
                .by_index(index)
                .map_err(|source| WheelError::Archive {
                    path: self.path.clone(),
                    source,
                })?;
            let raw_name = member.name().to_string();

            if raw_name.contains('\\') {
                return Err(WheelError::UnsafeMemberPath(raw_name));
            }
            let relative = member
                .enclosed_name()
                .ok_or_else(|| WheelError::UnsafeMemberPath(raw_name.clone()))?;
            let out_path = dest.join(relative);

            if member.is_dir() {
                fs::create_dir_all(&out_path).map_err(|source| WheelError::Extract {
                    member: raw_name.clone(),
                    source,
                })?;
                continue;
            }

            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent).map_err(|source| WheelError::Extract {
                    member: raw_name.clone(),
                    source,
                })?;
            }

            let mut out_file =
                fs::File::create(&out_path).map_err(|source| WheelError::Extract {
                    member: raw_name.clone(),
                    source,
                })?;
            std::io::copy(&mut member, &mut out_file).map_err(|source| {
                WheelError::Extract {
                    member: raw_name.clone(),
                    source,
                }
            })?;

            #[cfg(unix)]
            if let Some(mode) = member.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&out_path, fs::Permissions::from_mode(mode)).map_err(
                    |source| WheelError::Extract {
                        member: raw_name.clone(),
                        source,
                    },
                )?;
            }
        }

        Ok(())
    }
}

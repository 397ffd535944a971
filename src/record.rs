//! RECORD manifests: digest encoding, rendering, parsing and verification
//! of an installed tree against its manifest.

use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

const HASH_BLOCK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Invalid RECORD line '{0}': expected 'path,digest,size'")]
    InvalidLine(String),

    #[error("Invalid size field in RECORD line '{0}'")]
    InvalidSize(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Encodes a raw sha256 digest the way RECORD expects it: `sha256=` plus
/// urlsafe base64 with the trailing padding stripped.
pub fn digest_field(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    encode_digest(&digest)
}

fn encode_digest(digest: &[u8]) -> String {
    format!(
        "sha256={}",
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
    )
}

/// Hashes a reader in 1 MiB blocks, returning the digest field and the
/// total byte count.
pub fn digest_reader<R: Read>(reader: &mut R) -> std::io::Result<(String, u64)> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BLOCK_SIZE];
    let mut size = 0u64;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }

    Ok((encode_digest(&hasher.finalize()), size))
}

/// Hex sha256 of a whole file, as package indexes report it.
pub fn sha256_hex_file(path: &Path) -> std::io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BLOCK_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// One RECORD line. The digest and size are absent for the manifest's own
/// self entry (`RECORD,,`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    pub path: String,
    pub digest: Option<String>,
    pub size: Option<u64>,
}

impl RecordEntry {
    pub fn new(path: &str, digest: String, size: u64) -> Self {
        Self {
            path: path.to_string(),
            digest: Some(digest),
            size: Some(size),
        }
    }

    fn render(&self) -> String {
        format!(
            "{},{},{}",
            self.path,
            self.digest.as_deref().unwrap_or(""),
            self.size.map_or(String::new(), |s| s.to_string())
        )
    }
}

/// A parsed or under-construction RECORD manifest.
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub entries: Vec<RecordEntry>,
}

impl Record {
    /// Adds an entry for in-memory contents.
    pub fn add_contents(&mut self, path: &str, data: &[u8]) {
        self.entries
            .push(RecordEntry::new(path, digest_field(data), data.len() as u64));
    }

    /// Adds an entry by hashing a file on disk.
    pub fn add_file(&mut self, path: &str, real_path: &Path) -> Result<(), RecordError> {
        let mut file = fs::File::open(real_path).map_err(|source| RecordError::Io {
            path: real_path.to_path_buf(),
            source,
        })?;
        let (digest, size) = digest_reader(&mut file).map_err(|source| RecordError::Io {
            path: real_path.to_path_buf(),
            source,
        })?;
        self.entries.push(RecordEntry::new(path, digest, size));
        Ok(())
    }

    /// Renders the manifest with its own self entry included; entries are
    /// sorted bytewise by line so output is reproducible.
    pub fn render(&self, record_path: &str) -> String {
        let mut entries = self.entries.clone();
        entries.push(RecordEntry {
            path: record_path.to_string(),
            digest: None,
            size: None,
        });
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        let mut out = String::new();
        for entry in &entries {
            out.push_str(&entry.render());
            out.push('\n');
        }
        out
    }

    /// Parses RECORD text. Fields are split from the right so paths that
    /// contain commas survive.
    pub fn parse(text: &str) -> Result<Self, RecordError> {
        let mut entries = Vec::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }

            let mut fields = line.rsplitn(3, ',');
            let size_field = fields.next().unwrap_or("");
            let digest_field = fields.next();
            let path = match fields.next() {
                Some(path) if digest_field.is_some() => path,
                _ => return Err(RecordError::InvalidLine(line.to_string())),
            };

            let digest = match digest_field {
                Some("") | None => None,
                Some(d) => Some(d.to_string()),
            };
            let size = if size_field.is_empty() {
                None
            } else {
                Some(
                    size_field
                        .parse::<u64>()
                        .map_err(|_| RecordError::InvalidSize(line.to_string()))?,
                )
            };

            entries.push(RecordEntry {
                path: path.to_string(),
                digest,
                size,
            });
        }

        Ok(Self { entries })
    }

    /// Reads and parses a RECORD file.
    pub fn from_file(path: &Path) -> Result<Self, RecordError> {
        let text = fs::read_to_string(path).map_err(|source| RecordError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Checks every recorded file under `root` and reports drift.
    ///
    /// Entries without a digest (the self entry) are checked for existence
    /// only. Untracked detection skips `__pycache__` directories and
    /// compiled `.pyc` files since the interpreter drops those at runtime.
    pub fn verify(&self, root: &Path) -> Result<RecordDiff, RecordError> {
        let mut diff = RecordDiff::default();
        let recorded: BTreeSet<&str> = self.entries.iter().map(|e| e.path.as_str()).collect();

        for entry in &self.entries {
            let on_disk = root.join(&entry.path);
            if !on_disk.is_file() {
                diff.missing.push(entry.path.clone());
                continue;
            }

            let expected_digest = match &entry.digest {
                Some(digest) => digest,
                None => continue,
            };

            let mut file = fs::File::open(&on_disk).map_err(|source| RecordError::Io {
                path: on_disk.clone(),
                source,
            })?;
            let (digest, size) = digest_reader(&mut file).map_err(|source| RecordError::Io {
                path: on_disk.clone(),
                source,
            })?;

            if digest != *expected_digest || entry.size.map_or(false, |s| s != size) {
                diff.modified.push(entry.path.clone());
            }
        }

        let walker = ignore::WalkBuilder::new(root)
            .standard_filters(false)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            if !entry.file_type().map_or(false, |ft| ft.is_file()) {
                continue;
            }

            let relative = match entry.path().strip_prefix(root) {
                Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };

            if relative.ends_with(".pyc") || relative.split('/').any(|c| c == "__pycache__") {
                continue;
            }

            if !recorded.contains(relative.as_str()) {
                diff.untracked.push(relative);
            }
        }

        Ok(diff)
    }
}

/// The result of verifying a tree against its RECORD.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordDiff {
    /// Recorded but not on disk.
    pub missing: Vec<String>,
    /// On disk with a different digest or size.
    pub modified: Vec<String>,
    /// On disk but not recorded.
    pub untracked: Vec<String>,
}

impl RecordDiff {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.modified.is_empty() && self.untracked.is_empty()
    }

    pub fn finding_count(&self) -> usize {
        self.missing.len() + self.modified.len() + self.untracked.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_digest_field_empty_input() {
        assert_eq!(
            digest_field(b""),
            "sha256=47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU"
        );
    }

    #[test]
    fn test_sha256_hex_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"abc").unwrap();

        assert_eq!(
            sha256_hex_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_field_known_value() {
        assert_eq!(
            digest_field(b"hello"),
            "sha256=LPJNul-wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ"
        );
    }

    #[test]
    fn test_digest_reader_matches_digest_field() {
        let data = b"some wheel payload".to_vec();
        let (digest, size) = digest_reader(&mut &data[..]).unwrap();
        assert_eq!(digest, digest_field(&data));
        assert_eq!(size, data.len() as u64);
    }

    #[test]
    fn test_render_sorts_and_appends_self_entry() {
        let mut record = Record::default();
        record.add_contents("pkg/b.py", b"b");
        record.add_contents("pkg/a.py", b"a");

        let rendered = record.render("pkg-1.0.dist-info/RECORD");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("pkg-1.0.dist-info/RECORD,,"));
        assert!(lines[1].starts_with("pkg/a.py,sha256="));
        assert!(lines[2].starts_with("pkg/b.py,sha256="));
    }

    #[test]
    fn test_parse_round_trips_entries() {
        let text = "pkg/a.py,sha256=abc,5\npkg-1.0.dist-info/RECORD,,\n";
        let record = Record::parse(text).unwrap();
        assert_eq!(record.entries.len(), 2);
        assert_eq!(record.entries[0].path, "pkg/a.py");
        assert_eq!(record.entries[0].digest.as_deref(), Some("sha256=abc"));
        assert_eq!(record.entries[0].size, Some(5));
        assert!(record.entries[1].digest.is_none());
        assert!(record.entries[1].size.is_none());
    }

    #[test]
    fn test_parse_path_with_commas() {
        let record = Record::parse("odd,name.py,sha256=abc,3\n").unwrap();
        assert_eq!(record.entries[0].path, "odd,name.py");
        assert_eq!(record.entries[0].size, Some(3));
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(Record::parse("no-fields\n").is_err());
        assert!(Record::parse("path,sha256=abc,notanumber\n").is_err());
    }

    fn write_tree(dir: &TempDir) -> Record {
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/a.py"), "print('a')\n").unwrap();
        fs::write(dir.path().join("pkg/b.py"), "print('b')\n").unwrap();

        let mut record = Record::default();
        record
            .add_file("pkg/a.py", &dir.path().join("pkg/a.py"))
            .unwrap();
        record
            .add_file("pkg/b.py", &dir.path().join("pkg/b.py"))
            .unwrap();

        let rendered = record.render("RECORD");
        fs::write(dir.path().join("RECORD"), &rendered).unwrap();
        Record::parse(&rendered).unwrap()
    }

    #[test]
    fn test_verify_clean_tree() {
        let dir = TempDir::new().unwrap();
        let record = write_tree(&dir);

        let diff = record.verify(dir.path()).unwrap();
        assert!(diff.is_clean(), "unexpected findings: {:?}", diff);
    }

    #[test]
    fn test_verify_detects_modified_file() {
        let dir = TempDir::new().unwrap();
        let record = write_tree(&dir);

        fs::write(dir.path().join("pkg/a.py"), "tampered\n").unwrap();

        let diff = record.verify(dir.path()).unwrap();
        assert_eq!(diff.modified, vec!["pkg/a.py"]);
        assert!(diff.missing.is_empty());
        assert!(diff.untracked.is_empty());
    }

    #[test]
    fn test_verify_detects_missing_file() {
        let dir = TempDir::new().unwrap();
        let record = write_tree(&dir);

        fs::remove_file(dir.path().join("pkg/b.py")).unwrap();

        let diff = record.verify(dir.path()).unwrap();
        assert_eq!(diff.missing, vec!["pkg/b.py"]);
    }

    #[test]
    fn test_verify_detects_untracked_file() {
        let dir = TempDir::new().unwrap();
        let record = write_tree(&dir);

        fs::write(dir.path().join("pkg/extra.py"), "new\n").unwrap();

        let diff = record.verify(dir.path()).unwrap();
        assert_eq!(diff.untracked, vec!["pkg/extra.py"]);
    }

    #[test]
    fn test_verify_ignores_pycache() {
        let dir = TempDir::new().unwrap();
        let record = write_tree(&dir);

        fs::create_dir_all(dir.path().join("pkg/__pycache__")).unwrap();
        fs::write(
            dir.path().join("pkg/__pycache__/a.cpython-311.pyc"),
            "bytecode",
        )
        .unwrap();

        let diff = record.verify(dir.path()).unwrap();
        assert!(diff.is_clean(), "unexpected findings: {:?}", diff);
    }

    #[test]
    fn test_finding_count() {
        let diff = RecordDiff {
            missing: vec!["a".to_string()],
            modified: vec!["b".to_string(), "c".to_string()],
            untracked: vec![],
        };
        assert_eq!(diff.finding_count(), 3);
        assert!(!diff.is_clean());
    }
}

//! Wheel metadata files: core METADATA, the WHEEL file and
//! `entry_points.txt`.
//!
//! Parsing accepts what installers see in the wild; rendering produces the
//! exact bytes the builder ships, so the golden-file tests compare whole
//! members.

use crate::requirement::{Requirement, RequirementError};
use std::collections::BTreeMap;
use thiserror::Error;

/// Generator header value stamped into built wheels.
pub const GENERATOR: &str = "wheelwright 1.0";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("METADATA is missing the Name header")]
    MissingName,

    #[error("METADATA is missing the Version header")]
    MissingVersion,

    #[error("Invalid metadata header line '{0}'")]
    InvalidHeader(String),

    #[error("Invalid WHEEL file line '{0}'")]
    InvalidWheelLine(String),

    #[error(transparent)]
    Requirement(#[from] RequirementError),
}

/// Parsed core metadata (the `METADATA` member).
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub name: String,
    pub version: String,
    pub requires_dist: Vec<Requirement>,
    pub provides_extra: Vec<String>,
    pub requires_python: Option<String>,
    pub classifiers: Vec<String>,
    /// Non-core headers in input order, as `(key, value)`.
    pub extra_headers: Vec<(String, String)>,
    /// Body text after the headers; `UNKNOWN` when absent.
    pub description: String,
}

impl Metadata {
    /// Parses an RFC-822-style metadata document: headers, one blank line,
    /// then the free-form description body.
    pub fn parse(text: &str) -> Result<Self, MetadataError> {
        let mut metadata = Self::default();
        let mut lines = text.lines();
        let mut body = String::new();
        let mut in_body = false;

        for line in lines.by_ref() {
            if line.is_empty() {
                in_body = true;
                break;
            }

            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| MetadataError::InvalidHeader(line.to_string()))?;
            let value = value.trim_start();

            match key.to_ascii_lowercase().as_str() {
                "metadata-version" => {}
                "name" => metadata.name = value.to_string(),
                "version" => metadata.version = value.to_string(),
                "requires-dist" => metadata.requires_dist.push(Requirement::parse(value)?),
                "provides-extra" => metadata.provides_extra.push(value.to_string()),
                "requires-python" => metadata.requires_python = Some(value.to_string()),
                "classifier" => metadata.classifiers.push(value.to_string()),
                _ => metadata
                    .extra_headers
                    .push((key.to_string(), value.to_string())),
            }
        }

        if in_body {
            body = lines.collect::<Vec<_>>().join("\n");
        }
        metadata.description = if body.is_empty() {
            "UNKNOWN".to_string()
        } else {
            body
        };

        if metadata.name.is_empty() {
            return Err(MetadataError::MissingName);
        }
        if metadata.version.is_empty() {
            return Err(MetadataError::MissingVersion);
        }

        Ok(metadata)
    }
}

/// The metadata a built wheel ships, in rendering form.
///
/// Plain requirements and extra-requirement groups stay as raw strings; the
/// option map is ordered so `Provides-Extra` blocks come out sorted.
#[derive(Debug, Clone, Default)]
pub struct MetadataSpec {
    pub name: String,
    pub version: String,
    /// Full `Key: Value` lines appended after Name and Version.
    pub extra_headers: Vec<String>,
    pub classifiers: Vec<String>,
    pub python_requires: Option<String>,
    pub requires: Vec<String>,
    pub extra_requires: BTreeMap<String, Vec<String>>,
    pub description: Option<String>,
}

impl MetadataSpec {
    /// Renders the METADATA member byte-stably.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Metadata-Version: 2.1".to_string());
        lines.push(format!("Name: {}", self.name));
        lines.push(format!("Version: {}", self.version));
        lines.extend(self.extra_headers.iter().cloned());
        for classifier in &self.classifiers {
            lines.push(format!("Classifier: {}", classifier));
        }
        if let Some(requires_python) = &self.python_requires {
            if !requires_python.is_empty() {
                lines.push(format!("Requires-Python: {}", requires_python));
            }
        }
        for requirement in &self.requires {
            lines.push(format!("Requires-Dist: {}", requirement));
        }
        for (option, option_requires) in &self.extra_requires {
            lines.push(format!("Provides-Extra: {}", option));
            for requirement in option_requires {
                lines.push(format!("Requires-Dist: {}; extra == '{}'", requirement, option));
            }
        }

        let mut out = lines.join("\n");
        out.push_str("\n\n");
        out.push_str(self.description.as_deref().unwrap_or("UNKNOWN"));
        out.push('\n');
        out
    }
}

/// Parsed `WHEEL` member.
#[derive(Debug, Clone)]
pub struct WheelInfo {
    pub wheel_version: String,
    pub generator: String,
    pub root_is_purelib: bool,
    pub tags: Vec<String>,
}

impl WheelInfo {
    pub fn parse(text: &str) -> Result<Self, MetadataError> {
        let mut wheel_version = String::new();
        let mut generator = String::new();
        let mut root_is_purelib = false;
        let mut tags = Vec::new();

        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| MetadataError::InvalidWheelLine(line.to_string()))?;
            let value = value.trim();

            match key.to_ascii_lowercase().as_str() {
                "wheel-version" => wheel_version = value.to_string(),
                "generator" => generator = value.to_string(),
                "root-is-purelib" => root_is_purelib = value.eq_ignore_ascii_case("true"),
                "tag" => tags.push(value.to_string()),
                "build" => {}
                _ => {}
            }
        }

        Ok(Self {
            wheel_version,
            generator,
            root_is_purelib,
            tags,
        })
    }
}

/// Renders the WHEEL member for a built wheel.
pub fn render_wheel_file(root_is_purelib: bool, tags: &[String]) -> String {
    let mut out = format!(
        "Wheel-Version: 1.0\nGenerator: {}\nRoot-Is-Purelib: {}\n",
        GENERATOR,
        if root_is_purelib { "true" } else { "false" }
    );
    for tag in tags {
        out.push_str(&format!("Tag: {}\n", tag));
    }
    out
}

/// A console script entry point: `name = module:attribute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleScript {
    pub name: String,
    pub module: String,
    pub attribute: String,
}

/// Parsed `entry_points.txt`, INI-style sections of `key = value` pairs.
#[derive(Debug, Clone, Default)]
pub struct EntryPoints {
    sections: BTreeMap<String, Vec<(String, String)>>,
}

impl EntryPoints {
    pub fn parse(text: &str) -> Self {
        let mut sections: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current = Some(name.trim().to_string());
                sections.entry(name.trim().to_string()).or_default();
                continue;
            }

            if let (Some(section), Some((key, value))) = (&current, line.split_once('=')) {
                if let Some(entries) = sections.get_mut(section) {
                    entries.push((key.trim().to_string(), value.trim().to_string()));
                }
            }
        }

        Self { sections }
    }

    pub fn section(&self, name: &str) -> Option<&[(String, String)]> {
        self.sections.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Console scripts in file order, with any extras suffix on the value
    /// (`module:attr [extra]`) stripped.
    pub fn console_scripts(&self) -> Vec<ConsoleScript> {
        let entries = match self.sections.get("console_scripts") {
            Some(entries) => entries,
            None => return Vec::new(),
        };

        entries
            .iter()
            .filter_map(|(name, value)| {
                let value = match value.find('[') {
                    Some(idx) => value[..idx].trim(),
                    None => value.trim(),
                };
                let (module, attribute) = value.split_once(':')?;
                Some(ConsoleScript {
                    name: name.clone(),
                    module: module.trim().to_string(),
                    attribute: attribute.trim().to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_minimal_metadata() {
        let spec = MetadataSpec {
            name: "example_minimal_package".to_string(),
            version: "0.0.1".to_string(),
            ..Default::default()
        };
        assert_eq!(
            spec.render(),
            "Metadata-Version: 2.1\nName: example_minimal_package\nVersion: 0.0.1\n\nUNKNOWN\n"
        );
    }

    #[test]
    fn test_render_customized_metadata() {
        let spec = MetadataSpec {
            name: "example_customized".to_string(),
            version: "0.0.1".to_string(),
            extra_headers: vec![
                "Author: Example Author".to_string(),
                "Author-email: example@example.com".to_string(),
            ],
            classifiers: vec![
                "License :: OSI Approved :: Apache Software License".to_string(),
                "Intended Audience :: Developers".to_string(),
            ],
            requires: vec!["pytest".to_string()],
            description: Some("This is a sample description of a wheel.".to_string()),
            ..Default::default()
        };

        assert_eq!(
            spec.render(),
            "Metadata-Version: 2.1\n\
             Name: example_customized\n\
             Version: 0.0.1\n\
             Author: Example Author\n\
             Author-email: example@example.com\n\
             Classifier: License :: OSI Approved :: Apache Software License\n\
             Classifier: Intended Audience :: Developers\n\
             Requires-Dist: pytest\n\
             \n\
             This is a sample description of a wheel.\n"
        );
    }

    #[test]
    fn test_render_requires_python() {
        let spec = MetadataSpec {
            name: "pkg".to_string(),
            version: "0.0.1".to_string(),
            python_requires: Some(">=3.8".to_string()),
            ..Default::default()
        };
        assert!(spec
            .render()
            .contains("Version: 0.0.1\nRequires-Python: >=3.8\n\n"));
    }

    #[test]
    fn test_render_extra_requires_sorted_with_markers() {
        let mut extra_requires = BTreeMap::new();
        extra_requires.insert("toml".to_string(), vec!["tomli".to_string()]);
        extra_requires.insert("dev".to_string(), vec!["pytest".to_string()]);

        let spec = MetadataSpec {
            name: "pkg".to_string(),
            version: "1.0".to_string(),
            extra_requires,
            ..Default::default()
        };

        let rendered = spec.render();
        let dev = rendered.find("Provides-Extra: dev").unwrap();
        let toml = rendered.find("Provides-Extra: toml").unwrap();
        assert!(dev < toml);
        assert!(rendered.contains("Requires-Dist: pytest; extra == 'dev'"));
        assert!(rendered.contains("Requires-Dist: tomli; extra == 'toml'"));
    }

    #[test]
    fn test_parse_metadata_round_trip() {
        let spec = MetadataSpec {
            name: "pkg".to_string(),
            version: "1.2.3".to_string(),
            classifiers: vec!["Programming Language :: Python :: 3".to_string()],
            requires: vec!["requests (>=2.8.1)".to_string()],
            description: Some("A package.".to_string()),
            ..Default::default()
        };

        let parsed = Metadata::parse(&spec.render()).unwrap();
        assert_eq!(parsed.name, "pkg");
        assert_eq!(parsed.version, "1.2.3");
        assert_eq!(parsed.classifiers.len(), 1);
        assert_eq!(parsed.requires_dist.len(), 1);
        assert_eq!(parsed.requires_dist[0].name, "requests");
        assert_eq!(parsed.description, "A package.");
    }

    #[test]
    fn test_parse_metadata_defaults_description_to_unknown() {
        let parsed = Metadata::parse("Metadata-Version: 2.1\nName: pkg\nVersion: 1.0\n").unwrap();
        assert_eq!(parsed.description, "UNKNOWN");
    }

    #[test]
    fn test_parse_metadata_collects_markers_and_extras() {
        let text = "Metadata-Version: 2.1\n\
                    Name: coverage\n\
                    Version: 6.4.1\n\
                    Provides-Extra: toml\n\
                    Requires-Dist: tomli; extra == 'toml'\n\
                    \n\
                    Code coverage.\n";
        let parsed = Metadata::parse(text).unwrap();
        assert_eq!(parsed.provides_extra, vec!["toml"]);
        assert_eq!(parsed.requires_dist.len(), 1);
        assert!(parsed.requires_dist[0].marker.is_some());
    }

    #[test]
    fn test_parse_metadata_requires_name_and_version() {
        assert!(matches!(
            Metadata::parse("Metadata-Version: 2.1\nVersion: 1.0\n"),
            Err(MetadataError::MissingName)
        ));
        assert!(matches!(
            Metadata::parse("Metadata-Version: 2.1\nName: pkg\n"),
            Err(MetadataError::MissingVersion)
        ));
    }

    #[test]
    fn test_parse_metadata_keeps_unknown_headers_in_order() {
        let text = "Metadata-Version: 2.1\nName: pkg\nVersion: 1.0\nAuthor: A\nHome-page: example.com\n";
        let parsed = Metadata::parse(text).unwrap();
        assert_eq!(
            parsed.extra_headers,
            vec![
                ("Author".to_string(), "A".to_string()),
                ("Home-page".to_string(), "example.com".to_string()),
            ]
        );
    }

    #[test]
    fn test_render_wheel_file_purelib() {
        assert_eq!(
            render_wheel_file(true, &["py3-none-any".to_string()]),
            "Wheel-Version: 1.0\n\
             Generator: wheelwright 1.0\n\
             Root-Is-Purelib: true\n\
             Tag: py3-none-any\n"
        );
    }

    #[test]
    fn test_render_wheel_file_platform_wheel() {
        let rendered = render_wheel_file(false, &["cp38-abi3-manylinux2014_x86_64".to_string()]);
        assert!(rendered.contains("Root-Is-Purelib: false\n"));
        assert!(rendered.contains("Tag: cp38-abi3-manylinux2014_x86_64\n"));
    }

    #[test]
    fn test_parse_wheel_info() {
        let info = WheelInfo::parse(
            "Wheel-Version: 1.0\nGenerator: bdist_wheel (0.37.1)\nRoot-Is-Purelib: true\nTag: py2-none-any\nTag: py3-none-any\n",
        )
        .unwrap();
        assert_eq!(info.wheel_version, "1.0");
        assert!(info.root_is_purelib);
        assert_eq!(info.tags, vec!["py2-none-any", "py3-none-any"]);
    }

    #[test]
    fn test_entry_points_sections() {
        let text = "[console_scripts]\n\
                    another = foo.bar:baz\n\
                    customized_wheel = examples.wheel.main:main\n\
                    \n\
                    [group2]\n\
                    first = first.main:f\n\
                    second = second.main:s";
        let entry_points = EntryPoints::parse(text);

        let scripts = entry_points.console_scripts();
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0].name, "another");
        assert_eq!(scripts[0].module, "foo.bar");
        assert_eq!(scripts[0].attribute, "baz");
        assert_eq!(scripts[1].name, "customized_wheel");

        let group2 = entry_points.section("group2").unwrap();
        assert_eq!(group2.len(), 2);
        assert_eq!(group2[0], ("first".to_string(), "first.main:f".to_string()));
    }

    #[test]
    fn test_entry_points_strips_extras_suffix() {
        let entry_points = EntryPoints::parse("[console_scripts]\ntool = pkg.cli:main [extra]\n");
        let scripts = entry_points.console_scripts();
        assert_eq!(scripts[0].module, "pkg.cli");
        assert_eq!(scripts[0].attribute, "main");
    }

    #[test]
    fn test_entry_points_ignores_comments_and_blank_lines() {
        let entry_points = EntryPoints::parse("# comment\n\n[console_scripts]\n; another\nx = m:f\n");
        assert_eq!(entry_points.console_scripts().len(), 1);
    }

    #[test]
    fn test_entry_points_empty() {
        assert!(EntryPoints::parse("").is_empty());
        assert!(EntryPoints::parse("").console_scripts().is_empty());
    }
}

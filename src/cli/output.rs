//! Rendering of command results.
//!
//! Every subcommand funnels its result through [`OutputFormatter`], which
//! renders install manifests, verification reports, wheel reports and the
//! effective configuration as JSON, YAML or human-readable text.
//!
//! # Example
//!
//! ```ignore
//! use wheelwright::cli::output::{OutputFormat, OutputFormatter};
//!
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! let output = formatter.format_manifest(&manifest)?;
//! println!("{}", output);
//! ```

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::WheelwrightConfig;
use crate::install::InstallManifest;
use crate::record::RecordDiff;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (human-friendly, version-control friendly)
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Output formatter for command results
pub struct OutputFormatter {
    format: OutputFormat,
}

fn header_bar() -> String {
    "\u{2501}".repeat(42)
}

impl OutputFormatter {
    /// Creates a new output formatter with the specified format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats an install manifest according to the configured format
    pub fn format_manifest(&self, manifest: &InstallManifest) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(manifest)
                .context("Failed to serialize install manifest to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(manifest)
                .context("Failed to serialize install manifest to YAML"),
            OutputFormat::Human => self.format_manifest_human(manifest),
        }
    }

    /// Formats a RECORD verification report
    pub fn format_verify(&self, report: &VerifyReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report)
                .context("Failed to serialize verification report to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(report)
                .context("Failed to serialize verification report to YAML"),
            OutputFormat::Human => self.format_verify_human(report),
        }
    }

    /// Formats a wheel inspection report
    pub fn format_inspect(&self, report: &WheelReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report)
                .context("Failed to serialize wheel report to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(report)
                .context("Failed to serialize wheel report to YAML"),
            OutputFormat::Human => self.format_inspect_human(report),
        }
    }

    /// Formats configuration display
    pub fn format_config(&self, config: &WheelwrightConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let config_map = config.to_display_map();
                serde_json::to_string_pretty(&config_map)
                    .context("Failed to serialize config to JSON")
            }
            OutputFormat::Yaml => {
                let config_map = config.to_display_map();
                serde_yaml::to_string(&config_map).context("Failed to serialize config to YAML")
            }
            OutputFormat::Human => self.format_config_human(config),
        }
    }

    // Human-readable formatting methods

    fn format_manifest_human(&self, manifest: &InstallManifest) -> Result<String> {
        let mut output = String::new();

        output.push_str(&format!(
            "\u{2713} Installed {} {}\n",
            manifest.package, manifest.version
        ));
        output.push_str(&header_bar());
        output.push_str("\n\n");

        output.push_str("Targets:\n");
        output.push_str(&format!(
            "\u{251C}\u{2500} Library:  {}\n",
            manifest.library_target
        ));
        output.push_str(&format!(
            "\u{2514}\u{2500} Archive:  {}\n\n",
            manifest.archive_target
        ));

        if manifest.dependencies.is_empty() {
            output.push_str("Dependencies: (none)\n");
        } else {
            output.push_str("Dependencies:\n");
            for (i, dep) in manifest.dependencies.iter().enumerate() {
                let connector = if i == manifest.dependencies.len() - 1 {
                    "\u{2514}"
                } else {
                    "\u{251C}"
                };
                output.push_str(&format!("{}\u{2500} {}\n", connector, dep));
            }
        }
        output.push('\n');

        if !manifest.entry_points.is_empty() {
            output.push_str("Entry Points:\n");
            for (i, ep) in manifest.entry_points.iter().enumerate() {
                let connector = if i == manifest.entry_points.len() - 1 {
                    "\u{2514}"
                } else {
                    "\u{251C}"
                };
                output.push_str(&format!(
                    "{}\u{2500} {} = {}:{} ({})\n",
                    connector, ep.name, ep.module, ep.attribute, ep.script
                ));
            }
            output.push('\n');
        }

        output.push_str("Files:\n");
        output.push_str(&format!(
            "\u{251C}\u{2500} Data files:          {}\n",
            manifest.data.len()
        ));
        output.push_str(&format!(
            "\u{251C}\u{2500} Copied files:        {}\n",
            manifest.copied_files.len()
        ));
        output.push_str(&format!(
            "\u{2514}\u{2500} Namespace packages:  {}\n",
            manifest.namespace_packages.len()
        ));

        Ok(output)
    }

    fn format_verify_human(&self, report: &VerifyReport) -> Result<String> {
        let mut output = String::new();

        if report.clean {
            output.push_str(&format!(
                "\u{2713} RECORD verification passed: {}\n",
                report.target
            ));
            return Ok(output);
        }

        output.push_str(&format!(
            "\u{2717} RECORD verification failed: {}\n",
            report.target
        ));
        output.push_str(&header_bar());
        output.push_str("\n\n");

        if !report.missing.is_empty() {
            output.push_str("Missing files:\n");
            for path in &report.missing {
                output.push_str(&format!("  - {}\n", path));
            }
        }
        if !report.modified.is_empty() {
            output.push_str("Modified files:\n");
            for path in &report.modified {
                output.push_str(&format!("  - {}\n", path));
            }
        }
        if !report.untracked.is_empty() {
            output.push_str("Untracked files:\n");
            for path in &report.untracked {
                output.push_str(&format!("  - {}\n", path));
            }
        }

        output.push_str(&format!("\n{} finding(s)\n", report.finding_count()));

        Ok(output)
    }

    fn format_inspect_human(&self, report: &WheelReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&format!("Wheel {}\n", report.filename));
        output.push_str(&header_bar());
        output.push_str("\n\n");

        output.push_str(&format!("Name:          {}\n", report.name));
        output.push_str(&format!("Version:       {}\n", report.version));
        if let Some(ref build_tag) = report.build_tag {
            output.push_str(&format!("Build Tag:     {}\n", build_tag));
        }
        output.push_str(&format!(
            "Tag:           {}-{}-{}\n",
            report.python_tag, report.abi_tag, report.platform_tag
        ));
        output.push_str(&format!("Purelib:       {}\n", report.purelib));
        output.push_str(&format!("Generator:     {}\n", report.generator));
        output.push_str(&format!("SHA256:        {}\n", report.sha256));
        if let Some(ref requires_python) = report.requires_python {
            output.push_str(&format!("Requires:      Python {}\n", requires_python));
        }
        output.push('\n');

        if report.requires_dist.is_empty() {
            output.push_str("Dependencies: (none)\n");
        } else {
            output.push_str("Dependencies:\n");
            for (i, req) in report.requires_dist.iter().enumerate() {
                let connector = if i == report.requires_dist.len() - 1 {
                    "\u{2514}"
                } else {
                    "\u{251C}"
                };
                output.push_str(&format!("{}\u{2500} {}\n", connector, req));
            }
        }

        if !report.provides_extra.is_empty() {
            output.push_str(&format!("\nExtras: {}\n", report.provides_extra.join(", ")));
        }

        if !report.console_scripts.is_empty() {
            output.push_str("\nConsole Scripts:\n");
            for (i, script) in report.console_scripts.iter().enumerate() {
                let connector = if i == report.console_scripts.len() - 1 {
                    "\u{2514}"
                } else {
                    "\u{251C}"
                };
                output.push_str(&format!("{}\u{2500} {}\n", connector, script));
            }
        }

        Ok(output)
    }

    fn format_config_human(&self, config: &WheelwrightConfig) -> Result<String> {
        let mut output = String::new();

        output.push_str("wheelwright Configuration\n");
        output.push_str(&header_bar());
        output.push_str("\n\n");

        output.push_str("Index Configuration:\n");
        output.push_str(&format!("  URL: {}\n", config.index_url));
        output.push_str(&format!(
            "  Request Timeout: {}s\n",
            config.request_timeout_secs
        ));

        output.push_str("\nCache Configuration:\n");
        output.push_str(&format!("  Enabled: {}\n", config.cache_enabled));
        if let Some(ref dir) = config.cache_dir {
            output.push_str(&format!("  Directory: {}\n", dir.display()));
        }

        output.push_str("\nInstall Conventions:\n");
        output.push_str(&format!("  Python Version: {}\n", config.python_version));
        output.push_str(&format!("  Label Prefix: {}\n", config.label_prefix));
        output.push_str(&format!("  Shim Shebang: {}\n", config.shim_shebang));

        output.push_str("\nLogging:\n");
        output.push_str(&format!("  Level: {}\n", config.log_level));

        Ok(output)
    }
}

/// Result of verifying a tree or archive against its RECORD
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VerifyReport {
    /// What was verified (wheel path or directory)
    pub target: String,
    /// Whether the RECORD matched exactly
    pub clean: bool,
    /// Recorded but not found
    pub missing: Vec<String>,
    /// Found with a different digest or size
    pub modified: Vec<String>,
    /// Found but not recorded
    pub untracked: Vec<String>,
}

impl VerifyReport {
    pub fn from_diff(target: &Path, diff: &RecordDiff) -> Self {
        Self {
            target: target.display().to_string(),
            clean: diff.is_clean(),
            missing: diff.missing.clone(),
            modified: diff.modified.clone(),
            untracked: diff.untracked.clone(),
        }
    }

    pub fn finding_count(&self) -> usize {
        self.missing.len() + self.modified.len() + self.untracked.len()
    }
}

/// Parsed summary of a wheel archive
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WheelReport {
    /// Wheel file name
    pub filename: String,
    /// Canonical distribution name
    pub name: String,
    /// Distribution version
    pub version: String,
    /// Build tag, if any
    pub build_tag: Option<String>,
    /// Python tag from the file name
    pub python_tag: String,
    /// ABI tag from the file name
    pub abi_tag: String,
    /// Platform tag from the file name
    pub platform_tag: String,
    /// Whether the archive root is purelib
    pub purelib: bool,
    /// Expanded compatibility tags
    pub tags: Vec<String>,
    /// Generator recorded in the WHEEL member
    pub generator: String,
    /// Hex sha256 of the archive file
    pub sha256: String,
    /// Requires-Python specifier, if any
    pub requires_python: Option<String>,
    /// Requires-Dist entries
    pub requires_dist: Vec<String>,
    /// Declared extras
    pub provides_extra: Vec<String>,
    /// Console scripts as `name = module:attribute`
    pub console_scripts: Vec<String>,
}

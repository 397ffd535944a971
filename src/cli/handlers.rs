//! Command handlers behind the CLI dispatch.
//!
//! Each handler turns parsed arguments into library calls and returns a
//! process exit code. Errors are logged and reported as exit code 1, so
//! `main` stays a thin parse-dispatch-exit shell.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::annotations::AnnotationSet;
use crate::config::WheelwrightConfig;
use crate::index::pin::{
    render_pin_table, render_target_list, select_pins, update_managed_file, PinOptions,
};
use crate::index::IndexClient;
use crate::install::{install_wheel, InstallOptions};
use crate::record::{sha256_hex_file, Record};
use crate::stamp::resolve_version_stamp;
use crate::wheel::builder::{parse_input_pair, parse_pyproject};
use crate::wheel::{Wheel, WheelBuilder, WheelFilename};

use super::commands::{BuildArgs, ConfigArgs, InstallArgs, InspectArgs, PinArgs, VerifyArgs};
use super::output::{OutputFormatter, VerifyReport, WheelReport};

pub fn handle_install(args: &InstallArgs, quiet: bool) -> i32 {
    info!("Installing wheel {}", args.wheel.display());

    if !args.wheel.is_file() {
        error!("Wheel does not exist: {}", args.wheel.display());
        return 1;
    }

    let default_config = WheelwrightConfig::default();
    let config = WheelwrightConfig {
        python_version: args
            .python_version
            .clone()
            .unwrap_or(default_config.python_version.clone()),
        ..default_config
    };
    if args.python_version.is_some() {
        debug!("Python version overridden to: {}", config.python_version);
    }

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        eprintln!("\nPlease check your environment variables and command-line arguments.");
        return 1;
    }

    let mut annotation = None;
    if let Some(path) = &args.annotations_file {
        let annotations = match AnnotationSet::from_file(path) {
            Ok(set) => set,
            Err(e) => {
                error!("Failed to load annotations: {}", e);
                return 1;
            }
        };
        debug!("Loaded {} annotation(s)", annotations.len());

        let filename = args
            .wheel
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        match WheelFilename::parse(filename) {
            Ok(parsed) => annotation = annotations.get(&parsed.distribution).cloned(),
            Err(e) => {
                error!("Invalid wheel file name: {}", e);
                return 1;
            }
        }
    }

    let mut options = InstallOptions::new(&args.dest);
    options.extras = args.extras.iter().cloned().collect();
    options.environment = config.marker_environment();
    options.data_exclude = args.data_exclude.clone();
    options.enable_implicit_namespaces = args.enable_implicit_namespaces;
    options.label_prefix = config.label_prefix.clone();
    options.shim_shebang = config.shim_shebang.clone();
    options.annotation = annotation;

    let manifest = match install_wheel(&args.wheel, &options) {
        Ok(manifest) => manifest,
        Err(e) => {
            error!("Install failed: {}", e);
            return 1;
        }
    };

    info!(
        "Installed {} {} into {}",
        manifest.package,
        manifest.version,
        args.dest.display()
    );

    let formatter = OutputFormatter::new(args.format.into());
    let output = match formatter.format_manifest(&manifest) {
        Ok(out) => out,
        Err(e) => {
            error!("Failed to format output: {}", e);
            return 1;
        }
    };
    if !quiet {
        println!("{}", output);
    }

    0
}

pub fn handle_build(args: &BuildArgs, quiet: bool) -> i32 {
    info!("Building wheel for {} {}", args.name, args.version);

    let version = match resolve_version_stamp(
        &args.version,
        args.volatile_status_file.as_deref(),
        args.stable_status_file.as_deref(),
    ) {
        Ok(version) => version,
        Err(e) => {
            error!("Failed to resolve version stamp: {}", e);
            return 1;
        }
    };
    if version != args.version {
        debug!("Stamped version: {}", version);
    }

    let mut filename =
        WheelFilename::new(&args.name, &version, &args.python_tag, &args.abi, &args.platform);
    if let Some(build_tag) = &args.build_tag {
        filename = filename.with_build_tag(build_tag);
    }

    let mut builder = WheelBuilder::new(filename, &args.out_dir);
    if let Some(outfile) = &args.outfile {
        builder.set_outfile(outfile);
    }

    if let Ok(epoch) = env::var("SOURCE_DATE_EPOCH") {
        match epoch.parse::<u64>() {
            Ok(seconds) => {
                debug!("Archive timestamp from SOURCE_DATE_EPOCH: {}", seconds);
                builder.set_timestamp(seconds);
            }
            Err(_) => {
                error!("SOURCE_DATE_EPOCH is not an integer: {}", epoch);
                return 1;
            }
        }
    }

    for prefix in &args.strip_path_prefixes {
        builder.strip_path_prefix(prefix);
    }

    for pair in &args.inputs {
        let (package_path, real_path) = match parse_input_pair(pair) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("Invalid --input-file: {}", e);
                return 1;
            }
        };
        builder.add_input(&package_path, &real_path);
    }
    if let Some(list) = &args.input_file_list {
        if let Err(e) = builder.add_input_list(list) {
            error!("Failed to read input file list: {}", e);
            return 1;
        }
    }

    {
        let metadata = builder.metadata_mut();
        for header in &args.headers {
            match header.split_once(':') {
                Some((key, value)) => metadata
                    .extra_headers
                    .push(format!("{}: {}", key.trim(), value.trim())),
                None => {
                    error!("Invalid --header '{}', expected KEY:VALUE", header);
                    return 1;
                }
            }
        }
        metadata.classifiers.extend(args.classifiers.iter().cloned());
        metadata.python_requires = args.python_requires.clone();
        metadata.requires.extend(args.requires.iter().cloned());
        for pair in &args.extra_requires {
            match pair.rsplit_once(';') {
                Some((requirement, extra)) => metadata
                    .extra_requires
                    .entry(extra.trim().to_string())
                    .or_default()
                    .push(requirement.trim().to_string()),
                None => {
                    error!(
                        "Invalid --extra-requires '{}', expected 'requirement;extra'",
                        pair
                    );
                    return 1;
                }
            }
        }
    }

    if let Some(path) = &args.description_file {
        let description = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to read description {}: {}", path.display(), e);
                return 1;
            }
        };
        builder.metadata_mut().description = Some(description);
    }

    if let Some(path) = &args.entry_points_file {
        builder.set_entry_points_file(path);
    }

    if let Some(path) = &args.pyproject {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                return 1;
            }
        };
        let project = match parse_pyproject(&text) {
            Ok(project) => project,
            Err(e) => {
                error!("Failed to parse {}: {}", path.display(), e);
                return 1;
            }
        };
        project.apply_to(builder.metadata_mut());
        if args.entry_points_file.is_none() {
            if let Some(contents) = project.console_scripts_text() {
                builder.set_entry_points_contents(contents);
            }
        }
    }

    let path = match builder.build() {
        Ok(path) => path,
        Err(e) => {
            error!("Build failed: {}", e);
            return 1;
        }
    };
    info!("Built {}", path.display());

    if let Some(name_file) = &args.name_file {
        if let Err(e) = fs::write(name_file, builder.wheelname()) {
            error!("Failed to write {}: {}", name_file.display(), e);
            return 1;
        }
    }

    if !quiet {
        println!("{}", path.display());
    }

    0
}

pub fn handle_verify(args: &VerifyArgs) -> i32 {
    info!("Verifying {}", args.target.display());

    if !args.target.exists() {
        error!("Target does not exist: {}", args.target.display());
        return 1;
    }

    let diff = if args.target.is_dir() {
        let record_path = match find_record(&args.target) {
            Some(path) => path,
            None => {
                error!(
                    "No dist-info RECORD found under {}",
                    args.target.display()
                );
                return 1;
            }
        };
        debug!("Using RECORD at {}", record_path.display());
        let record = match Record::from_file(&record_path) {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to read {}: {}", record_path.display(), e);
                return 1;
            }
        };
        match record.verify(&args.target) {
            Ok(diff) => diff,
            Err(e) => {
                error!("Verification failed: {}", e);
                return 1;
            }
        }
    } else {
        let mut wheel = match Wheel::open(&args.target) {
            Ok(wheel) => wheel,
            Err(e) => {
                error!("Failed to open wheel: {}", e);
                return 1;
            }
        };
        match wheel.verify() {
            Ok(diff) => diff,
            Err(e) => {
                error!("Verification failed: {}", e);
                return 1;
            }
        }
    };

    let report = VerifyReport::from_diff(&args.target, &diff);
    let formatter = OutputFormatter::new(args.format.into());
    let output = match formatter.format_verify(&report) {
        Ok(out) => out,
        Err(e) => {
            error!("Failed to format output: {}", e);
            return 1;
        }
    };
    println!("{}", output);

    if report.clean {
        0
    } else {
        1
    }
}

/// Looks for `<dist>-<version>.dist-info/RECORD` directly under `root`.
fn find_record(root: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(root).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_dist_info = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(".dist-info"));
        if path.is_dir() && is_dist_info {
            let record = path.join("RECORD");
            if record.is_file() {
                return Some(record);
            }
        }
    }
    None
}

pub fn handle_inspect(args: &InspectArgs) -> i32 {
    debug!("Inspecting {}", args.wheel.display());

    let mut wheel = match Wheel::open(&args.wheel) {
        Ok(wheel) => wheel,
        Err(e) => {
            error!("Failed to open wheel: {}", e);
            return 1;
        }
    };

    let metadata = match wheel.metadata() {
        Ok(metadata) => metadata,
        Err(e) => {
            error!("Failed to read METADATA: {}", e);
            return 1;
        }
    };
    let wheel_info = match wheel.wheel_info() {
        Ok(info) => info,
        Err(e) => {
            error!("Failed to read WHEEL: {}", e);
            return 1;
        }
    };
    let entry_points = match wheel.entry_points() {
        Ok(entry_points) => entry_points,
        Err(e) => {
            error!("Failed to read entry_points.txt: {}", e);
            return 1;
        }
    };
    let sha256 = match sha256_hex_file(&args.wheel) {
        Ok(digest) => digest,
        Err(e) => {
            error!("Failed to hash {}: {}", args.wheel.display(), e);
            return 1;
        }
    };

    let filename = wheel.filename();
    let report = WheelReport {
        filename: filename.to_string(),
        name: wheel.name(),
        version: wheel.version().to_string(),
        build_tag: filename.build_tag.clone(),
        python_tag: filename.python_tag.clone(),
        abi_tag: filename.abi_tag.clone(),
        platform_tag: filename.platform_tag.clone(),
        purelib: wheel_info.root_is_purelib,
        tags: wheel_info.tags.clone(),
        generator: wheel_info.generator.clone(),
        sha256,
        requires_python: metadata.requires_python.clone(),
        requires_dist: metadata
            .requires_dist
            .iter()
            .map(|req| req.to_string())
            .collect(),
        provides_extra: metadata.provides_extra.clone(),
        console_scripts: entry_points
            .console_scripts()
            .iter()
            .map(|script| format!("{} = {}:{}", script.name, script.module, script.attribute))
            .collect(),
    };

    let formatter = OutputFormatter::new(args.format.into());
    let output = match formatter.format_inspect(&report) {
        Ok(out) => out,
        Err(e) => {
            error!("Failed to format output: {}", e);
            return 1;
        }
    };
    println!("{}", output);

    0
}

pub fn handle_pin(args: &PinArgs, quiet: bool) -> i32 {
    info!(
        "Pinning {} {} for {:?}",
        args.name, args.version, args.python_versions
    );

    let config = WheelwrightConfig::default();
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        eprintln!("\nPlease check your environment variables and command-line arguments.");
        return 1;
    }

    let client = match IndexClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initialize index client: {}", e);
            return 1;
        }
    };
    let files = match client.release_files(&args.name, &args.version) {
        Ok(files) => files,
        Err(e) => {
            error!(
                "Failed to fetch release {} {}: {}",
                args.name, args.version, e
            );
            return 1;
        }
    };
    debug!("Index returned {} release file(s)", files.len());

    let options = PinOptions {
        name: args.name.clone(),
        version: args.version.clone(),
        python_versions: args.python_versions.clone(),
        label_prefix: config.label_prefix.clone(),
    };
    let pins = select_pins(&files, &options);
    if pins.is_empty() {
        error!(
            "No pinnable wheels for {} {} with python tags {:?}",
            args.name, args.version, args.python_versions
        );
        return 1;
    }
    info!("Selected {} pin(s)", pins.len());

    let table = render_pin_table(&pins);
    match update_managed_file(&args.pin_file, &table, args.dry_run) {
        Ok(Some(diff)) => print!("{}", diff),
        Ok(None) => {
            if !quiet {
                println!("Updated {}", args.pin_file.display());
            }
        }
        Err(e) => {
            error!("Failed to update {}: {}", args.pin_file.display(), e);
            return 1;
        }
    }

    if let Some(target_file) = &args.target_file {
        let targets = render_target_list(&pins, &config.label_prefix);
        match update_managed_file(target_file, &targets, args.dry_run) {
            Ok(Some(diff)) => print!("{}", diff),
            Ok(None) => {
                if !quiet {
                    println!("Updated {}", target_file.display());
                }
            }
            Err(e) => {
                error!("Failed to update {}: {}", target_file.display(), e);
                return 1;
            }
        }
    }

    0
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    let config = WheelwrightConfig::default();
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return 1;
    }

    let formatter = OutputFormatter::new(args.format.into());
    let output = match formatter.format_config(&config) {
        Ok(out) => out,
        Err(e) => {
            error!("Failed to format output: {}", e);
            return 1;
        }
    };
    println!("{}", output);

    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{CliArgs, Commands};
    use clap::Parser;
    use serial_test::serial;
    use tempfile::TempDir;

    fn parse_build(args: &[&str]) -> BuildArgs {
        match CliArgs::parse_from(args).command {
            Commands::Build(build_args) => build_args,
            _ => panic!("Expected build command"),
        }
    }

    fn parse_verify(args: &[&str]) -> VerifyArgs {
        match CliArgs::parse_from(args).command {
            Commands::Verify(verify_args) => verify_args,
            _ => panic!("Expected verify command"),
        }
    }

    #[test]
    fn test_handle_build_writes_wheel_and_name_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("__init__.py");
        fs::write(&source, "VERSION = \"1.0.0\"\n").unwrap();
        let name_file = dir.path().join("name.txt");

        let args = parse_build(&[
            "wheelwright",
            "build",
            "--name",
            "demo",
            "--version",
            "1.0.0",
            "--out-dir",
            dir.path().to_str().unwrap(),
            "--name-file",
            name_file.to_str().unwrap(),
            "--input-file",
            &format!("demo/__init__.py;{}", source.display()),
        ]);

        assert_eq!(handle_build(&args, true), 0);
        assert!(dir.path().join("demo-1.0.0-py3-none-any.whl").is_file());
        assert_eq!(
            fs::read_to_string(&name_file).unwrap(),
            "demo-1.0.0-py3-none-any.whl"
        );
    }

    #[test]
    fn test_handle_build_rejects_bad_input_pair() {
        let args = parse_build(&[
            "wheelwright",
            "build",
            "--name",
            "demo",
            "--version",
            "1.0.0",
            "--input-file",
            "no-separator-here",
        ]);
        assert_eq!(handle_build(&args, true), 1);
    }

    #[test]
    fn test_handle_verify_missing_target() {
        let args = parse_verify(&["wheelwright", "verify", "/nonexistent/path.whl"]);
        assert_eq!(handle_verify(&args), 1);
    }

    #[test]
    fn test_handle_verify_built_wheel_is_clean() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("__init__.py");
        fs::write(&source, "x = 1\n").unwrap();

        let build_args = parse_build(&[
            "wheelwright",
            "build",
            "--name",
            "demo",
            "--version",
            "1.0.0",
            "--out-dir",
            dir.path().to_str().unwrap(),
            "--input-file",
            &format!("demo/__init__.py;{}", source.display()),
        ]);
        assert_eq!(handle_build(&build_args, true), 0);

        let wheel = dir.path().join("demo-1.0.0-py3-none-any.whl");
        let verify_args =
            parse_verify(&["wheelwright", "verify", wheel.to_str().unwrap()]);
        assert_eq!(handle_verify(&verify_args), 0);
    }

    #[test]
    #[serial]
    fn test_handle_install_then_verify_directory() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("__init__.py");
        fs::write(&source, "x = 1\n").unwrap();

        let build_args = parse_build(&[
            "wheelwright",
            "build",
            "--name",
            "demo",
            "--version",
            "1.0.0",
            "--out-dir",
            dir.path().to_str().unwrap(),
            "--input-file",
            &format!("demo/__init__.py;{}", source.display()),
        ]);
        assert_eq!(handle_build(&build_args, true), 0);

        let wheel = dir.path().join("demo-1.0.0-py3-none-any.whl");
        let dest = dir.path().join("site-packages");
        let install_args = match CliArgs::parse_from([
            "wheelwright",
            "install",
            wheel.to_str().unwrap(),
            "-d",
            dest.to_str().unwrap(),
        ])
        .command
        {
            Commands::Install(install_args) => install_args,
            _ => panic!("Expected install command"),
        };
        assert_eq!(handle_install(&install_args, true), 0);
        assert!(dest.join("demo/__init__.py").is_file());

        let verify_args = parse_verify(&["wheelwright", "verify", dest.to_str().unwrap()]);
        assert_eq!(handle_verify(&verify_args), 0);
    }

    #[test]
    fn test_find_record_locates_dist_info() {
        let dir = TempDir::new().unwrap();
        let dist_info = dir.path().join("pkg-1.0.dist-info");
        fs::create_dir_all(&dist_info).unwrap();
        fs::write(dist_info.join("RECORD"), "").unwrap();

        assert_eq!(find_record(dir.path()), Some(dist_info.join("RECORD")));
        assert_eq!(find_record(&dir.path().join("missing")), None);
    }
}

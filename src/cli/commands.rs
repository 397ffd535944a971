use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Wheel toolkit for build systems
#[derive(Parser, Debug)]
#[command(
    name = "wheelwright",
    about = "Wheel toolkit for build systems: install, build, verify and pin Python wheels",
    version,
    author,
    long_about = "wheelwright builds, installs and verifies Python wheel archives for \
                  hermetic build-system integration. It resolves wheel metadata and \
                  dependencies, generates install manifests and entry point shims, and \
                  pins binary wheels from a package index."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Verbose output (debug logging)")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Unpack a wheel and generate an install manifest",
        long_about = "Unpacks a wheel into a directory, spreads its data directories, \
                      converts namespace packages, writes entry point shims and records \
                      everything in an install manifest.\n\n\
                      Examples:\n  \
                      wheelwright install requests-2.31.0-py3-none-any.whl\n  \
                      wheelwright install requests-2.31.0-py3-none-any.whl -d site-packages\n  \
                      wheelwright install requests-2.31.0-py3-none-any.whl --extra security"
    )]
    Install(InstallArgs),

    #[command(
        about = "Build a wheel from a set of input files",
        long_about = "Assembles input files into a reproducible wheel archive with \
                      generated WHEEL, METADATA and RECORD members.\n\n\
                      Examples:\n  \
                      wheelwright build --name mylib --version 1.0.0 --input-file 'mylib/__init__.py;src/__init__.py'\n  \
                      wheelwright build --name mylib --version 1.0.0 --platform manylinux2014_x86_64 --abi cp39 --python-tag cp39 --input-file-list inputs.txt"
    )]
    Build(BuildArgs),

    #[command(
        about = "Verify a wheel or installed tree against its RECORD",
        long_about = "Hashes every file and compares it to the RECORD manifest, \
                      reporting missing, modified and untracked files.\n\n\
                      Examples:\n  \
                      wheelwright verify requests-2.31.0-py3-none-any.whl\n  \
                      wheelwright verify site-packages/"
    )]
    Verify(VerifyArgs),

    #[command(
        about = "Show metadata, dependencies and entry points of a wheel",
        long_about = "Reads a wheel archive and prints its parsed name, tags, metadata, \
                      dependency requirements and console scripts.\n\n\
                      Examples:\n  \
                      wheelwright inspect requests-2.31.0-py3-none-any.whl\n  \
                      wheelwright inspect requests-2.31.0-py3-none-any.whl --format json"
    )]
    Inspect(InspectArgs),

    #[command(
        about = "Pin binary wheels for a release from the package index",
        long_about = "Queries the package index for a release, selects platform wheels \
                      for the requested Python tags and splices pinned urls and hashes \
                      into the managed block of a file.\n\n\
                      Examples:\n  \
                      wheelwright pin coverage 7.3.2 --python cp310 --python cp311 --pin-file deps.bzl\n  \
                      wheelwright pin coverage 7.3.2 --python cp310 --pin-file deps.bzl --dry-run"
    )]
    Pin(PinArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct InstallArgs {
    #[arg(value_name = "WHEEL", help = "Path to the .whl file to install")]
    pub wheel: PathBuf,

    #[arg(
        short = 'd',
        long,
        value_name = "DIR",
        default_value = ".",
        help = "Directory to unpack into"
    )]
    pub dest: PathBuf,

    #[arg(
        long = "extra",
        value_name = "NAME",
        help = "Extra to enable when resolving dependencies (repeatable)"
    )]
    pub extras: Vec<String>,

    #[arg(
        long = "data-exclude",
        value_name = "GLOB",
        help = "Additional glob excluded from the manifest data list (repeatable)"
    )]
    pub data_exclude: Vec<String>,

    #[arg(
        long,
        help = "Keep native namespace packages instead of generating pkgutil-style __init__.py files"
    )]
    pub enable_implicit_namespaces: bool,

    #[arg(
        long,
        value_name = "FILE",
        help = "JSON file with per-package install annotations"
    )]
    pub annotations_file: Option<PathBuf>,

    #[arg(
        long,
        value_name = "X.Y",
        help = "Python version for environment marker evaluation"
    )]
    pub python_version: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format for the manifest summary"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(long, value_name = "NAME", help = "Distribution name")]
    pub name: String,

    #[arg(
        long,
        value_name = "VERSION",
        help = "Distribution version (may contain {KEY} stamp placeholders)"
    )]
    pub version: String,

    #[arg(long, value_name = "TAG", help = "Optional build tag (must start with a digit)")]
    pub build_tag: Option<String>,

    #[arg(
        long,
        value_name = "TAG",
        default_value = "py3",
        help = "Python tag (e.g. py3, cp39)"
    )]
    pub python_tag: String,

    #[arg(long, value_name = "TAG", default_value = "none", help = "ABI tag")]
    pub abi: String,

    #[arg(long, value_name = "TAG", default_value = "any", help = "Platform tag")]
    pub platform: String,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        default_value = ".",
        help = "Directory to write the wheel into"
    )]
    pub out_dir: PathBuf,

    #[arg(
        long,
        value_name = "FILE",
        help = "Exact output path, overriding the computed file name"
    )]
    pub outfile: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Write the final wheel file name to this file"
    )]
    pub name_file: Option<PathBuf>,

    #[arg(
        long = "strip-path-prefix",
        value_name = "PREFIX",
        help = "Path prefix stripped from input package paths (repeatable, first match wins)"
    )]
    pub strip_path_prefixes: Vec<String>,

    #[arg(
        long = "input-file",
        value_name = "PKG;REAL",
        help = "Input file as 'package_path;real_path' (repeatable)"
    )]
    pub inputs: Vec<String>,

    #[arg(
        long,
        value_name = "FILE",
        help = "File listing one 'package_path;real_path' pair per line"
    )]
    pub input_file_list: Option<PathBuf>,

    #[arg(
        long = "header",
        value_name = "KEY:VALUE",
        help = "Extra METADATA header (repeatable)"
    )]
    pub headers: Vec<String>,

    #[arg(
        long = "classifier",
        value_name = "CLASSIFIER",
        help = "Trove classifier (repeatable)"
    )]
    pub classifiers: Vec<String>,

    #[arg(long, value_name = "SPEC", help = "Requires-Python specifier")]
    pub python_requires: Option<String>,

    #[arg(
        long = "requires",
        value_name = "REQ",
        help = "Requires-Dist entry (repeatable)"
    )]
    pub requires: Vec<String>,

    #[arg(
        long = "extra-requires",
        value_name = "REQ;EXTRA",
        help = "Requirement gated behind an extra, as 'requirement;extra' (repeatable)"
    )]
    pub extra_requires: Vec<String>,

    #[arg(
        long,
        value_name = "FILE",
        help = "File whose contents become the package description"
    )]
    pub description_file: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "entry_points.txt file to embed")]
    pub entry_points_file: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FILE",
        help = "pyproject.toml whose [project] table fills metadata gaps"
    )]
    pub pyproject: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Volatile workspace status file for version stamping"
    )]
    pub volatile_status_file: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Stable workspace status file for version stamping"
    )]
    pub stable_status_file: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct VerifyArgs {
    #[arg(
        value_name = "TARGET",
        help = "Wheel file or installed directory containing a dist-info RECORD"
    )]
    pub target: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    #[arg(value_name = "WHEEL", help = "Path to the .whl file")]
    pub wheel: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct PinArgs {
    #[arg(value_name = "NAME", help = "Package name on the index")]
    pub name: String,

    #[arg(value_name = "VERSION", help = "Release version to pin")]
    pub version: String,

    #[arg(
        long = "python",
        value_name = "TAG",
        required = true,
        help = "Python tag to pin wheels for, e.g. cp310 (repeatable)"
    )]
    pub python_versions: Vec<String>,

    #[arg(
        long,
        value_name = "FILE",
        help = "File whose managed block receives the url/sha256 pin table"
    )]
    pub pin_file: PathBuf,

    #[arg(
        long,
        value_name = "FILE",
        help = "File whose managed block receives the dependency target list"
    )]
    pub target_file: Option<PathBuf>,

    #[arg(long, help = "Print the diff without writing files")]
    pub dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

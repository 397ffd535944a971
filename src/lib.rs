//! wheelwright - Python wheel tooling for hermetic build systems
//!
//! This library builds, installs and verifies Python wheel archives. It parses
//! wheel file names and dist-info metadata, evaluates PEP 508 environment
//! markers, writes reproducible archives with stable RECORD manifests, and
//! pins binary wheels from a package index to exact urls and hashes.
//!
//! # Core Concepts
//!
//! - **Wheel**: a zip archive whose file name encodes distribution, version
//!   and compatibility tags, carrying its metadata in a `.dist-info` directory
//! - **Install**: unpacking a wheel into a site-packages style tree, spreading
//!   data directories, fixing up namespace packages and writing entry point
//!   shims, described by a machine-readable install manifest
//! - **RECORD**: the per-file digest manifest inside every wheel, rewritten
//!   after install and checked by verification
//! - **Pin**: a concrete wheel for one python tag and target triple, spliced
//!   as url and sha256 into a managed block of a checked-in file
//!
//! # Example Usage
//!
//! ```ignore
//! use wheelwright::install::{install_wheel, InstallOptions};
//! use std::path::Path;
//!
//! fn install(wheel: &Path, dest: &Path) -> anyhow::Result<()> {
//!     let options = InstallOptions::new(dest);
//!     let manifest = install_wheel(wheel, &options)?;
//!
//!     println!("Installed {} {}", manifest.package, manifest.version);
//!     for dep in &manifest.dependencies {
//!         println!("Depends on {}", dep);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`wheel`]: file name parsing, metadata, archive reading and building
//! - [`install`]: the install pipeline and its manifest
//! - [`record`]: RECORD parsing, rendering and verification
//! - [`requirement`]: PEP 508 requirements and environment markers
//! - [`index`]: package index client and wheel pinning
//! - [`tags`]: compatibility tag expansion and platform triples

// Public modules
pub mod annotations;
pub mod cli;
pub mod config;
pub mod index;
pub mod install;
pub mod naming;
pub mod record;
pub mod requirement;
pub mod stamp;
pub mod tags;
pub mod util;
pub mod wheel;

// Re-export key types for convenient access
pub use annotations::{Annotation, AnnotationSet};
pub use config::{ConfigError, WheelwrightConfig};
pub use install::{install_wheel, InstallManifest, InstallOptions};
pub use record::{Record, RecordDiff, RecordError};
pub use requirement::{MarkerEnvironment, Requirement, RequirementError};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};
pub use wheel::{Metadata, Wheel, WheelBuilder, WheelError, WheelFilename, WheelNameError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! Wheel archives: naming, metadata, reading and building.

pub mod archive;
pub mod builder;
pub mod filename;
pub mod metadata;

pub use archive::{Wheel, WheelError};
pub use builder::WheelBuilder;
pub use filename::{WheelFilename, WheelNameError};
pub use metadata::{EntryPoints, Metadata, MetadataSpec, WheelInfo};

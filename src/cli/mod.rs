pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{BuildArgs, CliArgs, Commands, InstallArgs, InspectArgs, PinArgs, VerifyArgs};
pub use output::{OutputFormat, OutputFormatter};

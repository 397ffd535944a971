use wheelwright::cli::commands::{CliArgs, Commands};
use wheelwright::cli::handlers::{
    handle_build, handle_config, handle_inspect, handle_install, handle_pin, handle_verify,
};
use wheelwright::util::logging;
use wheelwright::{LoggingConfig, VERSION};

use clap::Parser;
use tracing::debug;

fn main() {
    let args = CliArgs::parse();

    let level = logging::resolve_level(args.log_level.as_deref(), args.verbose, args.quiet);
    logging::init_logging(LoggingConfig::with_level(level));

    debug!("wheelwright v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Install(install_args) => handle_install(install_args, args.quiet),
        Commands::Build(build_args) => handle_build(build_args, args.quiet),
        Commands::Verify(verify_args) => handle_verify(verify_args),
        Commands::Inspect(inspect_args) => handle_inspect(inspect_args),
        Commands::Pin(pin_args) => handle_pin(pin_args, args.quiet),
        Commands::Config(config_args) => handle_config(config_args),
    };

    std::process::exit(exit_code);
}

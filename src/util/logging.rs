//! Logging setup for wheelwright.
//!
//! Built on the `tracing` stack. All log output goes to stderr so that
//! command results on stdout stay machine-readable at any verbosity.
//!
//! The CLI resolves its effective level with [`resolve_level`] and then
//! calls [`init_logging`]; embedding consumers can use [`init_from_env`]
//! or [`init_default`] instead.
//!
//! ```no_run
//! use wheelwright::util::logging;
//!
//! logging::init_from_env();
//!
//! use tracing::debug;
//! debug!(wheel = "requests-2.31.0-py3-none-any.whl", "Reading archive");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Subscriber settings applied by [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level applied to the `wheelwright` target.
    pub level: Level,

    /// Emit JSON lines instead of the pretty console format.
    pub use_json: bool,

    /// Prefix events with their module path.
    pub include_target: bool,

    /// Add file and line number to each event.
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Pretty stderr output at the given level.
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }
}

/// Parses a level name, case-insensitively.
///
/// Unknown names fall back to INFO with a note on stderr rather than
/// aborting the command.
///
/// ```
/// use wheelwright::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("INFO"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Effective level for a CLI invocation.
///
/// Precedence: an explicit `--log-level` value, then `--verbose` (DEBUG),
/// then `--quiet` (ERROR), then `WHEELWRIGHT_LOG_LEVEL`, then INFO.
pub fn resolve_level(flag: Option<&str>, verbose: bool, quiet: bool) -> Level {
    if let Some(name) = flag {
        return parse_level(name);
    }
    if verbose {
        return Level::DEBUG;
    }
    if quiet {
        return Level::ERROR;
    }
    match env::var("WHEELWRIGHT_LOG_LEVEL") {
        Ok(name) => parse_level(&name),
        Err(_) => Level::INFO,
    }
}

/// Installs the global subscriber. Later calls are no-ops, so library and
/// test code may call this unconditionally.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env()
            .add_directive(format!("wheelwright={}", config.level).parse().unwrap());

        // Without RUST_LOG, keep the HTTP stack quiet during DEBUG runs.
        if env::var("RUST_LOG").is_err() {
            filter = filter
                .add_directive("h2=warn".parse().unwrap())
                .add_directive("hyper=warn".parse().unwrap())
                .add_directive("reqwest=warn".parse().unwrap());
        }

        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .init();
        } else {
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    });
}

/// Initializes logging from `WHEELWRIGHT_LOG_LEVEL` and
/// `WHEELWRIGHT_LOG_JSON`, defaulting to INFO pretty output.
pub fn init_from_env() {
    let level = resolve_level(None, false, false);

    let use_json = env::var("WHEELWRIGHT_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    init_logging(LoggingConfig {
        level,
        use_json,
        ..Default::default()
    });
}

/// Initializes logging with the default configuration.
pub fn init_default() {
    init_logging(LoggingConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_case_insensitive() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
    }

    #[test]
    fn test_parse_level_invalid_defaults_to_info() {
        assert_eq!(parse_level("invalid"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_resolve_level_flag_wins() {
        assert_eq!(resolve_level(Some("warn"), true, true), Level::WARN);
    }

    #[test]
    fn test_resolve_level_verbose_beats_quiet() {
        assert_eq!(resolve_level(None, true, true), Level::DEBUG);
        assert_eq!(resolve_level(None, false, true), Level::ERROR);
    }

    #[test]
    #[serial]
    fn test_resolve_level_env_fallback() {
        env::set_var("WHEELWRIGHT_LOG_LEVEL", "trace");
        assert_eq!(resolve_level(None, false, false), Level::TRACE);

        env::remove_var("WHEELWRIGHT_LOG_LEVEL");
        assert_eq!(resolve_level(None, false, false), Level::INFO);
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);
        assert!(config.include_target);
        assert!(!config.include_location);
    }

    #[test]
    fn test_with_level() {
        let config = LoggingConfig::with_level(Level::DEBUG);
        assert_eq!(config.level, Level::DEBUG);
        assert!(!config.use_json);
    }
}

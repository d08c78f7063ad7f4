//! Logging initialization.
//!
//! Logs always go to stderr so command output on stdout stays pipeable.

use sentencify_util::{log, LogConfig, LogLevel};

/// Initialize logging from the `--verbose` flag and the configured level.
pub fn init_logging(verbose: bool, configured: Option<LogLevel>) {
    let level = if verbose {
        LogLevel::Debug
    } else {
        configured.unwrap_or(LogLevel::Warn)
    };

    log::init(&LogConfig {
        print: true,
        level,
        include_location: verbose,
    });
}

//! Logging infrastructure for the formwork library.
//!
//! The library itself logs through the [`log`] facade. This module provides a
//! small stderr backend for that facade with three verbosity levels, used by
//! the CLI and by embedding applications that have no logger of their own.

use std::env;
use std::fmt;

use log::{LevelFilter, Log, Metadata, Record};

/// Environment variable consulted by [`init_logger`].
pub const LOG_MODE_ENV: &str = "FORMWORK_LOG_MODE";

/// Logging level for controlling output verbosity.
///
/// Log levels are ordered from least verbose (Quiet) to most verbose (Verbose).
///
/// # Examples
///
/// ```
/// use formwork::LogLevel;
///
/// assert!(LogLevel::Quiet < LogLevel::Normal);
/// assert!(LogLevel::Normal < LogLevel::Verbose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Suppress all output.
    Quiet,
    /// Errors and warnings.
    Normal,
    /// Errors, warnings, info and debug messages.
    Verbose,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiet => write!(f, "quiet"),
            Self::Normal => write!(f, "normal"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

impl LogLevel {
    /// Parses a log level from a string.
    ///
    /// Recognizes: "quiet", "normal", "verbose" (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use formwork::LogLevel;
    ///
    /// assert_eq!(LogLevel::parse("quiet").unwrap(), LogLevel::Quiet);
    /// assert_eq!(LogLevel::parse("VERBOSE").unwrap(), LogLevel::Verbose);
    /// assert!(LogLevel::parse("invalid").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            _ => Err(format!("invalid log level: {s}")),
        }
    }

    /// The `log` crate filter matching this level.
    #[must_use]
    pub const fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::Off,
            Self::Normal => LevelFilter::Warn,
            Self::Verbose => LevelFilter::Debug,
        }
    }
}

/// A stderr backend for the `log` facade.
///
/// # Examples
///
/// ```
/// use formwork::{Logger, LogLevel};
///
/// let logger = Logger::new(LogLevel::Normal);
/// assert_eq!(logger.level(), LogLevel::Normal);
/// ```
#[derive(Debug)]
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    /// Creates a new logger with the specified log level.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Returns the current log level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Normal)
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level.to_level_filter()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("{}: {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Resolves the log level from CLI flags and the environment.
///
/// The priority order is:
/// 1. CLI flags (verbose/quiet, verbose wins when both are set)
/// 2. `FORMWORK_LOG_MODE` environment variable
/// 3. Default (Normal)
#[must_use]
pub fn resolve_log_level(verbose: bool, quiet: bool) -> LogLevel {
    if verbose {
        return LogLevel::Verbose;
    }
    if quiet {
        return LogLevel::Quiet;
    }

    if let Ok(env_value) = env::var(LOG_MODE_ENV) {
        if let Ok(level) = LogLevel::parse(&env_value) {
            return level;
        }
    }

    LogLevel::Normal
}

/// Installs a [`Logger`] into the `log` facade.
///
/// The level is resolved with [`resolve_log_level`]. Only the first call in a
/// process installs a backend; later calls keep the existing backend, note
/// that at debug level, and only adjust the maximum level.
///
/// # Examples
///
/// ```
/// use formwork::{init_logger, LogLevel};
///
/// let level = init_logger(true, false);
/// assert_eq!(level, LogLevel::Verbose);
/// ```
pub fn init_logger(verbose: bool, quiet: bool) -> LogLevel {
    let level = resolve_log_level(verbose, quiet);
    if try_init_logger(verbose, quiet).is_err() {
        log::set_max_level(level.to_level_filter());
        log::debug!("A logger is already installed; keeping it at level {level}");
    }
    level
}

/// Installs a [`Logger`] into the `log` facade, reporting whether it won.
///
/// # Errors
///
/// Returns [`log::SetLoggerError`] if another logger is already installed.
/// The maximum level is left unchanged in that case.
pub fn try_init_logger(verbose: bool, quiet: bool) -> Result<LogLevel, log::SetLoggerError> {
    let level = resolve_log_level(verbose, quiet);
    log::set_boxed_logger(Box::new(Logger::new(level)))?;
    log::set_max_level(level.to_level_filter());
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Quiet < LogLevel::Normal);
        assert!(LogLevel::Normal < LogLevel::Verbose);
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(format!("{}", LogLevel::Quiet), "quiet");
        assert_eq!(format!("{}", LogLevel::Normal), "normal");
        assert_eq!(format!("{}", LogLevel::Verbose), "verbose");
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("Normal").unwrap(), LogLevel::Normal);
        assert!(LogLevel::parse("").is_err());
    }

    #[test]
    fn test_level_filters() {
        assert_eq!(LogLevel::Quiet.to_level_filter(), LevelFilter::Off);
        assert_eq!(LogLevel::Normal.to_level_filter(), LevelFilter::Warn);
        assert_eq!(LogLevel::Verbose.to_level_filter(), LevelFilter::Debug);
    }

    #[test]
    fn test_logger_enabled_respects_level() {
        let logger = Logger::new(LogLevel::Normal);
        let warn = Metadata::builder().level(log::Level::Warn).build();
        let debug = Metadata::builder().level(log::Level::Debug).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&debug));

        let quiet = Logger::new(LogLevel::Quiet);
        assert!(!quiet.enabled(&warn));
    }

    #[test]
    #[serial]
    fn test_second_install_keeps_existing_logger() {
        let saved_env = env::var(LOG_MODE_ENV).ok();
        env::remove_var(LOG_MODE_ENV);

        // Whichever call installs first, the next one must be refused.
        let _ = try_init_logger(false, false);
        assert!(try_init_logger(true, false).is_err());
        assert_eq!(init_logger(true, false), LogLevel::Verbose);
        assert_eq!(log::max_level(), LevelFilter::Debug);

        if let Some(val) = saved_env {
            env::set_var(LOG_MODE_ENV, val);
        }
    }

    #[test]
    #[serial]
    fn test_resolve_defaults() {
        let saved_env = env::var(LOG_MODE_ENV).ok();
        env::remove_var(LOG_MODE_ENV);

        assert_eq!(resolve_log_level(false, false), LogLevel::Normal);

        if let Some(val) = saved_env {
            env::set_var(LOG_MODE_ENV, val);
        }
    }

    #[test]
    fn test_resolve_flags() {
        assert_eq!(resolve_log_level(true, false), LogLevel::Verbose);
        assert_eq!(resolve_log_level(false, true), LogLevel::Quiet);
        assert_eq!(resolve_log_level(true, true), LogLevel::Verbose);
    }

    #[test]
    #[serial]
    fn test_resolve_from_env() {
        let saved_env = env::var(LOG_MODE_ENV).ok();

        env::set_var(LOG_MODE_ENV, "verbose");
        assert_eq!(resolve_log_level(false, false), LogLevel::Verbose);

        env::set_var(LOG_MODE_ENV, "invalid");
        assert_eq!(resolve_log_level(false, false), LogLevel::Normal);

        env::set_var(LOG_MODE_ENV, "normal");
        assert_eq!(resolve_log_level(false, true), LogLevel::Quiet);

        match saved_env {
            Some(val) => env::set_var(LOG_MODE_ENV, val),
            None => env::remove_var(LOG_MODE_ENV),
        }
    }
}

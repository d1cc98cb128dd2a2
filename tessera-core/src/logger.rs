//! Per-component loggers
//!
//! Each component owns a [`Logger`] carrying its own target and level
//! instead of consulting one process-wide threshold. Records go to the
//! `log` facade, so whichever backend the binary installs (timestamps,
//! colours, `RUST_LOG`) applies on top.

use core::fmt;

pub use log::{Level, LevelFilter};

/// A leveled logger bound to one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logger {
    target: String,
    level: LevelFilter,
}

impl Logger {
    /// Create a logger for `target` passing records at or above `level`
    pub fn new(target: impl Into<String>, level: LevelFilter) -> Self {
        Self {
            target: target.into(),
            level,
        }
    }

    /// Same target, different threshold
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Change the threshold in place
    pub fn set_level(&mut self, level: LevelFilter) {
        self.level = level;
    }

    /// Logger for a sub-component, `parent::suffix`, inheriting the level
    pub fn child(&self, suffix: &str) -> Self {
        Self {
            target: format!("{}::{}", self.target, suffix),
            level: self.level,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Whether a record at `level` would pass this logger
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    /// Emit a record if `level` passes the threshold
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.enabled(level) {
            log::log!(target: self.target.as_str(), level, "{}", args);
        }
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Trace, args);
    }
}

/// Parse a level name (`off`, `error`, `warn`, `info`, `debug`, `trace`)
///
/// Case-insensitive.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    name.trim().parse().ok()
}

/// Capturing backend shared by this crate's tests
#[cfg(test)]
pub(crate) mod capture {
    use std::sync::{Mutex, Once, PoisonError};

    use log::{Log, Metadata, Record};

    static RECORDS: Mutex<Vec<(String, log::Level, String)>> = Mutex::new(Vec::new());
    static INIT: Once = Once::new();

    struct Capture;

    impl Log for Capture {
        fn enabled(&self, _: &Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &Record<'_>) {
            RECORDS
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((
                    record.target().to_string(),
                    record.level(),
                    record.args().to_string(),
                ));
        }

        fn flush(&self) {}
    }

    static LOGGER: Capture = Capture;

    pub fn install() {
        INIT.call_once(|| {
            log::set_logger(&LOGGER).expect("logger already set");
            log::set_max_level(log::LevelFilter::Trace);
        });
    }

    /// Records emitted so far for `target` (tests use unique targets)
    pub fn records(target: &str) -> Vec<(log::Level, String)> {
        RECORDS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(t, _, _)| t == target)
            .map(|(_, level, msg)| (*level, msg.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_filters_records() {
        capture::install();
        let logger = Logger::new("test.threshold", LevelFilter::Info);

        logger.debug(format_args!("hidden"));
        logger.info(format_args!("shown {}", 1));
        logger.error(format_args!("also shown"));

        assert_eq!(
            capture::records("test.threshold"),
            vec![
                (Level::Info, "shown 1".to_string()),
                (Level::Error, "also shown".to_string()),
            ]
        );
    }

    #[test]
    fn test_instances_are_independent() {
        capture::install();
        let quiet = Logger::new("test.quiet", LevelFilter::Error);
        let chatty = Logger::new("test.chatty", LevelFilter::Trace);

        quiet.warn(format_args!("dropped"));
        chatty.trace(format_args!("kept"));

        assert!(capture::records("test.quiet").is_empty());
        assert_eq!(capture::records("test.chatty").len(), 1);
    }

    #[test]
    fn test_off_silences_everything() {
        capture::install();
        let logger = Logger::new("test.off", LevelFilter::Off);
        logger.error(format_args!("nothing"));
        assert!(!logger.enabled(Level::Error));
        assert!(capture::records("test.off").is_empty());
    }

    #[test]
    fn test_child_target_and_level() {
        let parent = Logger::new("tessera", LevelFilter::Debug);
        let child = parent.child("uart");
        assert_eq!(child.target(), "tessera::uart");
        assert_eq!(child.level(), LevelFilter::Debug);

        let quiet = child.with_level(LevelFilter::Warn);
        assert!(quiet.enabled(Level::Warn));
        assert!(!quiet.enabled(Level::Info));
    }

    #[test]
    fn test_parse_level_names() {
        assert_eq!(parse_level("info"), Some(LevelFilter::Info));
        assert_eq!(parse_level("TRACE"), Some(LevelFilter::Trace));
        assert_eq!(parse_level(" off "), Some(LevelFilter::Off));
        assert_eq!(parse_level("loud"), None);
    }
}

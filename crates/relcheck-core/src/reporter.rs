use std::fmt::Display;

use log::Level;

pub const LOG_TARGET: &str = "relcheck";

/// Leveled log sink that stays silent unless verbose output was requested.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    verbose: bool,
}

impl Reporter {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn log(self, level: Level, message: impl Display) {
        if self.verbose {
            log::log!(target: LOG_TARGET, level, "{message}");
        }
    }

    pub fn log_with_cause(
        self,
        level: Level,
        message: impl Display,
        cause: &dyn std::error::Error,
    ) {
        if self.verbose {
            log::log!(target: LOG_TARGET, level, "{message}: {cause}");
        }
    }

    pub fn info(self, message: impl Display) {
        self.log(Level::Info, message);
    }

    pub fn warn(self, message: impl Display) {
        self.log(Level::Warn, message);
    }

    pub fn error(self, message: impl Display) {
        self.log(Level::Error, message);
    }
}

#[cfg(test)]
pub(crate) mod capture {
    use std::sync::{Mutex, Once};

    use log::{Level, Log, Metadata, Record};

    static RECORDS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());
    static INSTALL: Once = Once::new();

    struct CaptureLogger;

    impl Log for CaptureLogger {
        fn enabled(&self, _: &Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &Record<'_>) {
            if record.target() == super::LOG_TARGET {
                RECORDS
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;

    pub(crate) fn install() {
        INSTALL.call_once(|| {
            let _ = log::set_logger(&LOGGER);
            log::set_max_level(log::LevelFilter::Trace);
        });
    }

    /// Captured messages containing `needle`.
    pub(crate) fn matching(needle: &str) -> Vec<(Level, String)> {
        RECORDS
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|(_, message)| message.contains(needle))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::{Reporter, capture};

    #[test]
    fn quiet_reporter_emits_nothing() {
        capture::install();
        Reporter::new(false).warn("quiet-reporter-marker");

        assert!(capture::matching("quiet-reporter-marker").is_empty());
    }

    #[test]
    fn verbose_reporter_forwards_level_and_cause() {
        capture::install();
        let reporter = Reporter::new(true);
        reporter.info("verbose-reporter-marker info");
        let cause = std::io::Error::other("disk full");
        reporter.log_with_cause(Level::Error, "verbose-reporter-marker failed", &cause);

        let records = capture::matching("verbose-reporter-marker");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, Level::Info);
        assert_eq!(
            records[1],
            (
                Level::Error,
                "verbose-reporter-marker failed: disk full".to_string()
            )
        );
    }
}

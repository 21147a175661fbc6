struct StdoutLogger {
    level: log::LevelFilter,
}

impl log::Log for StdoutLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            println!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Intercepts `log` messages and prints them to stdout. `verbose` turns on
/// info-level progress chatter; warnings always come through.
pub fn setup_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    if log::set_boxed_logger(Box::new(StdoutLogger { level })).is_ok() {
        log::set_max_level(level);
    }
}

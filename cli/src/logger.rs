// stderr logger for the `log` facade
//
// Level comes from TABSHELL_LOG:
//   0 or unset: off
//   1: errors
//   2: warnings
//   3: info
//   4: debug and trace

use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record};

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = writeln!(
            std::io::stderr().lock(),
            "tabshell [{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger;

pub fn level_from_env(value: Option<&str>) -> LevelFilter {
    match value.map(str::trim).and_then(|v| v.parse::<u8>().ok()) {
        Some(1) => LevelFilter::Error,
        Some(2) => LevelFilter::Warn,
        Some(3) => LevelFilter::Info,
        Some(n) if n >= 4 => LevelFilter::Trace,
        _ => LevelFilter::Off,
    }
}

pub fn init() {
    let level = level_from_env(std::env::var("TABSHELL_LOG").ok().as_deref());
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

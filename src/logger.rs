use chrono::Local;
use clap::ValueEnum;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn setup_logger(log_level: LogLevel) {
    let level_filter = match log_level {
        LogLevel::Off => LevelFilter::Off,
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level_filter)
        .format(|buf, record| {
            let now = Local::now();
            let timestamp = now.format("%Y-%m-%d %H:%M:%S%.6f");
            writeln!(buf, "{} [{:>5}] {}", timestamp, record.level(), record.args())
        })
        .init();
}

/// Append-only report file, mirrored to stdout unless `quiet`.
///
/// The file is opened and closed per line, no handle is held across the run.
pub struct ReportLog {
    path: String,
    quiet: bool,
}

impl ReportLog {
    pub fn new(path: &str, quiet: bool) -> Self {
        ReportLog {
            path: path.to_string(),
            quiet,
        }
    }

    pub fn line(&self, msg: &str) {
        let stamped = format!("[{}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), msg);
        if !self.quiet {
            println!("{stamped}");
        }
        if let Err(e) = self.append(&stamped) {
            eprintln!("Failed to write to {}: {e}", self.path);
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")
    }
}

#[macro_export]
macro_rules! report {
    ($log:expr, $($arg:tt)+) => {{
        // Format the message only once
        let msg = format!($($arg)+);
        $log.line(&msg);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_appended_with_timestamp_prefix() {
        let path = std::env::temp_dir().join("bybit-balances-logger-test.log");
        let path = path.to_str().unwrap().to_string();
        let _ = std::fs::remove_file(&path);

        let log = ReportLog::new(&path, true);
        log.line("first");
        log.line("second");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] first"));
        assert!(lines[1].ends_with("] second"));
        // "[YYYY-MM-DD HH:MM:SS]" puts the bracket at index 20
        assert_eq!(lines[0].find(']').unwrap(), 20);

        let _ = std::fs::remove_file(&path);
    }
}

// eof

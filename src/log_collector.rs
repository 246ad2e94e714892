//! Decoupled logging pipeline for build runs.
//!
//! # Architecture
//!
//! ```text
//! log::info!/warn!/error!
//!     |
//! [LogCollector] (implements log::Log, non-blocking)
//!     | (crossbeam unbounded channel)
//!     v
//! [writer thread] ---> logs/<YYYYmmdd_HHMMSS>_build.log
//!                 \--> stderr (operator console)
//! ```
//!
//! The writer thread owns the file handle. `flush_blocking` sends a marker
//! down the same channel and waits for it, so every line logged before the
//! call is on disk when it returns.

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Internal log line or special marker
enum LogMessage {
    Line(LogLine),
    /// Flush marker with channel sender to signal completion
    Flush(std::sync::mpsc::Sender<()>),
}

/// A log line with metadata
#[derive(Clone, Debug)]
pub struct LogLine {
    pub message: String,
    pub level: Level,
    /// Wall-clock time the line was created (`HH:MM:SS.mmm`)
    pub timestamp: String,
}

impl LogLine {
    pub fn new(level: Level, message: String) -> Self {
        LogLine {
            message,
            level,
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
        }
    }

    fn render(&self) -> String {
        format!("[{}] [{}] {}", self.timestamp, self.level, self.message)
    }
}

/// Logger that persists every line to a per-run file and echoes it to stderr.
#[derive(Clone)]
pub struct LogCollector {
    tx: Sender<LogMessage>,
    log_path: PathBuf,
    max_level: LevelFilter,
}

impl LogCollector {
    /// Create the log directory and run file, and start the writer thread.
    pub fn new(log_dir: &Path, max_level: LevelFilter, echo: bool) -> Result<Self, String> {
        std::fs::create_dir_all(log_dir)
            .map_err(|e| format!("Failed to create log dir {}: {}", log_dir.display(), e))?;

        let log_path = log_dir.join(format!("{}_build.log", Local::now().format("%Y%m%d_%H%M%S")));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| format!("Failed to open log file {}: {}", log_path.display(), e))?;

        let (tx, rx) = unbounded::<LogMessage>();

        std::thread::spawn(move || {
            let mut file: File = file;
            while let Ok(msg) = rx.recv() {
                match msg {
                    LogMessage::Line(line) => {
                        let rendered = line.render();
                        let _ = writeln!(file, "{}", rendered);
                        if echo {
                            eprintln!("{}", rendered);
                        }
                    }
                    LogMessage::Flush(done) => {
                        let _ = file.flush();
                        let _ = file.sync_data();
                        let _ = done.send(());
                    }
                }
            }
        });

        Ok(LogCollector {
            tx,
            log_path,
            max_level,
        })
    }

    /// Register as the global logger for the `log` facade.
    pub fn install(self) -> Result<(), String> {
        let max_level = self.max_level;
        log::set_boxed_logger(Box::new(self))
            .map(|()| log::set_max_level(max_level))
            .map_err(|e| format!("Failed to set global logger: {}", e))
    }

    /// Path of this run's log file.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Send a log line (non-blocking)
    pub fn log_line(&self, line: LogLine) {
        let _ = self.tx.send(LogMessage::Line(line));
    }

    /// Send a simple string log at info level
    pub fn log_str(&self, message: impl Into<String>) {
        self.log_line(LogLine::new(Level::Info, message.into()));
    }

    /// Block until every line sent before this call has been written.
    pub fn flush_blocking(&self) -> Result<(), String> {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        self.tx
            .send(LogMessage::Flush(tx))
            .map_err(|e| format!("Failed to send flush marker: {}", e))?;
        rx.recv()
            .map_err(|e| format!("Flush signal interrupted: {}", e))
    }
}

/// Wires all log::info!(), log::warn!(), log::error!() calls into LogCollector
impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.log_line(LogLine::new(record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {
        let _ = self.flush_blocking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_log_collector_creates_run_file() {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let log_dir = temp.path().join("logs");

        let collector = LogCollector::new(&log_dir, LevelFilter::Info, false).unwrap();

        assert!(log_dir.is_dir());
        assert!(collector.log_path().starts_with(&log_dir));
        assert!(collector.log_path().is_file());
    }

    #[test]
    fn test_flush_blocking_persists_lines() {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let collector = LogCollector::new(temp.path(), LevelFilter::Info, false).unwrap();

        for i in 0..500 {
            collector.log_str(format!("Log message {}", i));
        }
        collector.flush_blocking().unwrap();

        let content = fs::read_to_string(collector.log_path()).unwrap();
        assert_eq!(content.lines().count(), 500);
        assert!(content.contains("[INFO] Log message 0"));
        assert!(content.contains("[INFO] Log message 499"));
    }

    #[test]
    fn test_level_filter() {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let collector = LogCollector::new(temp.path(), LevelFilter::Info, false).unwrap();

        let debug = Metadata::builder().level(Level::Debug).build();
        let warn = Metadata::builder().level(Level::Warn).build();
        assert!(!collector.enabled(&debug));
        assert!(collector.enabled(&warn));
    }
}

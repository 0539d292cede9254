//! Leveled record stream for measurements and lifecycle events.

use core::fmt;
use core::str::FromStr;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

/// Severity of a record. `Data` sits between `Info` and `Warning`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Data,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Data => "DATA",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        })
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "data" => Ok(Level::Data),
            "warning" | "warn" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            other => Err(format!("unknown level '{}'", other)),
        }
    }
}

/// Destination for leveled records, one record per call.
pub trait LogSink {
    fn log(&mut self, level: Level, message: &str);
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn log(&mut self, level: Level, message: &str) {
        (**self).log(level, message)
    }
}

/// Writes records to `<dir>/<start time>-<name>.log` and mirrors them to stderr.
///
/// Each line reads `2024-05-01T12:00:00,DATA,415`. Records below the minimum
/// level are dropped.
pub struct FileSink {
    file: File,
    path: PathBuf,
    min_level: Level,
}

impl FileSink {
    /// Creates the log directory if needed and opens a fresh log file named
    /// after the current local time.
    pub fn create(dir: &Path, name: &str, min_level: Level) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let started = Local::now().format("%Y%m%d-%H%M%S");
        let path = dir.join(format!("{}-{}.log", started, name));
        let file = File::options().create(true).append(true).open(&path)?;

        log::debug!("Writing records to {}", path.display());
        Ok(Self {
            file,
            path,
            min_level,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn log(&mut self, level: Level, message: &str) {
        if level < self.min_level {
            return;
        }
        let line = format_record(&Local::now().format("%Y-%m-%dT%H:%M:%S"), level, message);

        if let Err(e) = writeln!(self.file, "{}", line) {
            log::error!("Failed to write record to {}: {}", self.path.display(), e);
        }
        eprintln!("{}", line);
    }
}

fn format_record(timestamp: &dyn fmt::Display, level: Level, message: &str) -> String {
    format!("{},{},{}", timestamp, level, message)
}

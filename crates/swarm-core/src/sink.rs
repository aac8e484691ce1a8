//! Output sinks for processed ranging data
//!
//! A sink receives the raw text of forwarded frames (appended, flushed once
//! per tick) and, separately, the formatted distance line.

use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Destination for raw frames and the distance display
pub trait RangingSink {
    /// Append one raw frame
    fn write_raw(&mut self, item: &str) -> io::Result<()>;

    /// Show the formatted distance line
    fn display(&mut self, line: &str) -> io::Result<()>;

    /// Flush everything written since the last flush
    fn flush(&mut self) -> io::Result<()>;
}

impl<S: RangingSink + ?Sized> RangingSink for &mut S {
    fn write_raw(&mut self, item: &str) -> io::Result<()> {
        (**self).write_raw(item)
    }

    fn display(&mut self, line: &str) -> io::Result<()> {
        (**self).display(line)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Raw frames to a log file, display line to the console
///
/// When a current-distance file is configured, it is rewritten on every
/// display with a timestamped copy of the line so other tools can poll it.
pub struct FileSink {
    raw: BufWriter<File>,
    raw_path: PathBuf,
    current_path: Option<PathBuf>,
    echo: bool,
}

impl FileSink {
    /// Create (truncate) the raw log at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let raw_path = path.as_ref().to_path_buf();
        if let Some(parent) = raw_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&raw_path)?;
        Ok(Self {
            raw: BufWriter::new(file),
            raw_path,
            current_path: None,
            echo: true,
        })
    }

    /// Also keep the latest display line in `path`
    pub fn with_current_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.current_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Print the display line to stdout (on by default)
    pub fn with_console(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Path of the raw frame log
    pub fn raw_path(&self) -> &Path {
        &self.raw_path
    }
}

impl RangingSink for FileSink {
    fn write_raw(&mut self, item: &str) -> io::Result<()> {
        self.raw.write_all(item.as_bytes())
    }

    fn display(&mut self, line: &str) -> io::Result<()> {
        if self.echo {
            // Carriage return keeps the distance on a single console line
            let mut out = io::stdout().lock();
            write!(out, "{}\r", line)?;
            out.flush()?;
        }
        if let Some(path) = &self.current_path {
            fs::write(path, format!("{} {}\n", Local::now().to_rfc3339(), line))?;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.raw.flush()
    }
}

/// Everything to stdout
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl RangingSink for ConsoleSink {
    fn write_raw(&mut self, item: &str) -> io::Result<()> {
        io::stdout().lock().write_all(item.as_bytes())
    }

    fn display(&mut self, line: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{}", line)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

/// Keeps everything in memory; used by tests and embedding callers
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    /// Raw frames, in write order
    pub raw: Vec<String>,
    /// Distance lines
    pub displayed: Vec<String>,
    /// Number of flush calls
    pub flushes: usize,
}

impl RangingSink for MemorySink {
    fn write_raw(&mut self, item: &str) -> io::Result<()> {
        self.raw.push(item.to_string());
        Ok(())
    }

    fn display(&mut self, line: &str) -> io::Result<()> {
        self.displayed.push(line.to_string());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

//! Hourly, day-partitioned log files
//!
//! A `LogSession` owns at most one open file at a time:
//! `<root>/YYYY-MM-DD/HH.log`. The first write after the wall clock crosses an
//! hour boundary opens the next window's file (and the next day's directory
//! when the date changes). Files are always opened in append mode, so a
//! closed session can be written to again without losing earlier lines.

use chrono::{DateTime, Local, Timelike};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::fmt::MakeWriter;

/// Time source for window selection
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// Identifies one hour window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    date: chrono::NaiveDate,
    hour: u32,
}

impl Window {
    fn at(now: DateTime<Local>) -> Self {
        Self {
            date: now.date_naive(),
            hour: now.hour(),
        }
    }

    fn path(&self, root: &Path) -> PathBuf {
        root.join(self.date.format("%Y-%m-%d").to_string())
            .join(format!("{:02}.log", self.hour))
    }
}

struct SessionState {
    root: PathBuf,
    clock: Clock,
    current: Option<(Window, File)>,
}

impl SessionState {
    /// Returns the file for the current window, rotating or reopening as needed
    fn file(&mut self) -> io::Result<&mut File> {
        let window = Window::at((self.clock)());

        let stale = !matches!(&self.current, Some((open, _)) if *open == window);
        if stale {
            let path = window.path(&self.root);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            self.current = Some((window, file));
        }

        match &mut self.current {
            Some((_, file)) => Ok(file),
            None => Err(io::Error::new(io::ErrorKind::Other, "log file not open")),
        }
    }
}

/// Rotating log sink shared between the crawl and the tracing subscriber
#[derive(Clone)]
pub struct LogSession {
    inner: Arc<Mutex<SessionState>>,
}

impl std::fmt::Debug for LogSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSession").finish_non_exhaustive()
    }
}

impl LogSession {
    /// Creates a session rooted at `root` using the local wall clock
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_clock(root, Arc::new(Local::now))
    }

    pub fn with_clock(root: impl Into<PathBuf>, clock: Clock) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                root: root.into(),
                clock,
                current: None,
            })),
        }
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, SessionState>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log session lock poisoned"))
    }

    /// Appends `bytes` to the current window's file
    pub fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.lock()?;
        state.file()?.write_all(bytes)
    }

    /// Appends one line to the current window's file
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut state = self.lock()?;
        let file = state.file()?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")
    }

    pub fn flush(&self) -> io::Result<()> {
        let mut state = self.lock()?;
        match &mut state.current {
            Some((_, file)) => file.flush(),
            None => Ok(()),
        }
    }

    /// Flushes and releases the open file; the next write reopens it
    pub fn close(&self) -> io::Result<()> {
        let mut state = self.lock()?;
        if let Some((_, mut file)) = state.current.take() {
            file.flush()?;
        }
        Ok(())
    }

    /// Path of the currently open file, if any
    pub fn current_path(&self) -> Option<PathBuf> {
        let state = self.lock().ok()?;
        state
            .current
            .as_ref()
            .map(|(window, _)| window.path(&state.root))
    }
}

/// `io::Write` handle handed out to the tracing subscriber
pub struct LogSessionWriter {
    session: LogSession,
}

impl Write for LogSessionWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.session.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.session.flush()
    }
}

impl<'a> MakeWriter<'a> for LogSession {
    type Writer = LogSessionWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogSessionWriter {
            session: self.clone(),
        }
    }
}

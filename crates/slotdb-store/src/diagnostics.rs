//! Diagnostic instrumentation for container operations.
//!
//! A container reports lookups, inserts, erases and clears to a
//! [`DiagnosticSink`]. The default sink discards everything. Emission is
//! compiled in only with the `diagnostics` cargo feature; without it the
//! container never builds an event.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

/// One container operation, as reported to a sink.
///
/// Values are rendered with their `Debug` representation when the event is
/// built, so sinks never see the container's types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// Lookup by id. `dump` is the found value.
    Lookup { id: u64, dump: Option<String> },
    /// Insert attempt. `id` is the id the object was built with. On failure
    /// `holder` is the object owning the first colliding key and `conflicts`
    /// lists every index that already held one of the rejected value's keys.
    Emplace {
        id: u64,
        holder: Option<u64>,
        inserted: bool,
        dump: String,
        conflicts: Vec<String>,
    },
    /// Erase of a live object.
    Erase { id: u64, dump: String },
    /// Every object dropped.
    Clear { dropped: usize },
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lookup { id, dump: Some(dump) } => write!(f, "find {id}: {dump}"),
            Self::Lookup { id, dump: None } => write!(f, "find {id}: not found"),
            Self::Emplace { id, inserted: true, dump, .. } => {
                write!(f, "emplace {id}: {dump}")
            }
            Self::Emplace { id, holder, dump, conflicts, .. } => {
                write!(f, "emplace {id} rejected")?;
                if let Some(holder) = holder {
                    write!(f, ", key held by {holder}")?;
                }
                write!(f, ": {dump}")?;
                for conflict in conflicts {
                    write!(f, "\n  conflicting index {conflict}")?;
                }
                Ok(())
            }
            Self::Erase { id, dump } => write!(f, "erase {id}: {dump}"),
            Self::Clear { dropped } => write!(f, "clear: dropped {dropped} objects"),
        }
    }
}

/// Destination for diagnostic events.
pub trait DiagnosticSink: Send + Sync {
    /// Whether events should be built at all. Lets the container skip
    /// rendering values for a sink that drops them.
    fn enabled(&self) -> bool {
        true
    }

    /// Record one event.
    fn record(&self, event: &DiagnosticEvent);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn enabled(&self) -> bool {
        false
    }

    fn record(&self, _event: &DiagnosticEvent) {}
}

/// Emits every event through `tracing` at DEBUG.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: &DiagnosticEvent) {
        debug!(target: "slotdb::diagnostics", "{event}");
    }
}

/// Appends one line per event to a file.
///
/// If the file cannot be opened, events go to stdout instead.
pub struct FileSink {
    path: Option<PathBuf>,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl FileSink {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Self {
                path: Some(path.to_path_buf()),
                writer: Mutex::new(Box::new(BufWriter::new(file))),
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot open diagnostics file; using stdout");
                Self::stdout()
            }
        }
    }

    /// Write to stdout.
    pub fn stdout() -> Self {
        Self {
            path: None,
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// The file being written, or `None` for stdout.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn write_event(&self, event: &DiagnosticEvent) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{event}")?;
        writer.flush()
    }
}

impl DiagnosticSink for FileSink {
    fn record(&self, event: &DiagnosticEvent) {
        if let Err(e) = self.write_event(event) {
            warn!(error = %e, "failed to write diagnostic event");
        }
    }
}

impl fmt::Debug for FileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSink").field("path", &self.path).finish()
    }
}

/// Keeps rendered events in a shared buffer. Clones share the buffer, so a
/// test can hand one clone to a container and read through another.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<DiagnosticEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event recorded so far.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every event recorded so far, rendered one per entry.
    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, event: &DiagnosticEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

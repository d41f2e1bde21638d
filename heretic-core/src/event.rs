//! Progress events streamed out of a purge run.
//!
//! The engine pushes every event to an [`EventSink`] as soon as it happens.
//! Sinks are implemented for closures, for `mpsc::Sender` (to hand events to
//! another thread) and for `Vec` (to collect a full log).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use crate::format_bytes;

/// Kind of a purge event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Info,
    Found,
    Deleted,
    Skipped,
    Error,
    Summary,
}

/// One occurrence during a purge run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeEvent {
    pub kind: EventKind,
    pub message: String,
    pub path: Option<PathBuf>,
    pub bytes: Option<u64>,
    /// 1-based position of the root, set on the event that opens each root
    #[serde(default)]
    pub root_index: Option<usize>,
}

impl PurgeEvent {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
            bytes: None,
            root_index: None,
        }
    }

    /// Marks the start of work on the `index`-th of `total` roots
    pub fn root_started(index: usize, total: usize, root: &Path) -> Self {
        let mut event = Self::info(format!("Project {}/{}: {}", index, total, root.display()))
            .with_path(root);
        event.root_index = Some(index);
        event
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(EventKind::Info, message)
    }

    pub fn found(message: impl Into<String>) -> Self {
        Self::new(EventKind::Found, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventKind::Error, message)
    }

    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_bytes(mut self, bytes: u64) -> Self {
        self.bytes = Some(bytes);
        self
    }

    /// A folder removed from disk
    pub fn deleted(path: &Path, root: &Path, bytes: u64) -> Self {
        Self::new(
            EventKind::Deleted,
            format!(
                "Deleted: {} ({})",
                relative_display(path, root),
                format_bytes(bytes)
            ),
        )
        .with_path(path)
        .with_bytes(bytes)
    }

    /// A folder that was matched but left in place (dry run)
    pub fn skipped(path: &Path, root: &Path, bytes: u64) -> Self {
        Self::new(
            EventKind::Skipped,
            format!(
                "Would delete: {} ({})",
                relative_display(path, root),
                format_bytes(bytes)
            ),
        )
        .with_path(path)
        .with_bytes(bytes)
    }

    pub fn is_error(&self) -> bool {
        self.kind == EventKind::Error
    }

    pub fn is_root_header(&self) -> bool {
        self.root_index.is_some()
    }
}

/// Receives events from a purge run in real time
pub trait EventSink {
    fn emit(&mut self, event: PurgeEvent);
}

impl<F> EventSink for F
where
    F: FnMut(PurgeEvent),
{
    fn emit(&mut self, event: PurgeEvent) {
        self(event)
    }
}

impl EventSink for mpsc::Sender<PurgeEvent> {
    fn emit(&mut self, event: PurgeEvent) {
        // The receiver may have hung up; the run still has to finish
        let _ = self.send(event);
    }
}

impl EventSink for Vec<PurgeEvent> {
    fn emit(&mut self, event: PurgeEvent) {
        self.push(event);
    }
}

/// Show `path` relative to `root` when it lies beneath it
pub fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .ok()
        .filter(|relative| !relative.as_os_str().is_empty())
        .unwrap_or(path)
        .display()
        .to_string()
}

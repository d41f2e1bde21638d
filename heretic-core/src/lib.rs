use serde::{Deserialize, Serialize};

pub mod engine;
pub mod error;
pub mod event;
pub mod preview;
pub mod roots;
pub mod scanner;
pub mod size;

pub use engine::{
    CancelToken, EngineState, FolderRemover, FsRemover, PurgeConfig, PurgeEngine, PurgeHandle,
    spawn_purge,
};
pub use error::PurgeError;
pub use event::{EventKind, EventSink, PurgeEvent};
pub use preview::{PurgePreview, TargetCount, preview};
pub use roots::{JsonPathStore, PathStore, RootList, path_exists};
pub use scanner::{FolderScanner, ScanConfig, TargetSet};
pub use size::directory_size;

/// How a purge run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Completed,
    Aborted,
}

/// Final totals of a purge run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeResult {
    pub folders_deleted: usize,
    pub errors: usize,
    /// Approximate: sizes are measured before deletion on a best-effort basis.
    pub bytes_freed: u64,
    /// Matches left in place because the run was a dry run
    pub folders_skipped: usize,
    pub bytes_reclaimable: u64,
    pub dry_run: bool,
    pub status: RunStatus,
    pub duration_ms: u64,
}

impl PurgeResult {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn format_size(&self) -> String {
        format_bytes(self.bytes_freed)
    }

    /// One-line status text, used for the final summary event
    pub fn completion_message(&self) -> String {
        if self.dry_run {
            let reclaimable = format_bytes(self.bytes_reclaimable);
            return match self.status {
                RunStatus::Completed => format!(
                    "Dry run complete! Would delete {} folders ({}), {} errors",
                    self.folders_skipped, reclaimable, self.errors
                ),
                RunStatus::Aborted => format!(
                    "Dry run cancelled: would delete {} folders ({}) before stopping, {} errors",
                    self.folders_skipped, reclaimable, self.errors
                ),
            };
        }

        match self.status {
            RunStatus::Completed => format!(
                "Purge complete! Deleted {} folders ({} freed), {} errors",
                self.folders_deleted,
                self.format_size(),
                self.errors
            ),
            RunStatus::Aborted => format!(
                "Purge cancelled: deleted {} folders ({} freed) before stopping, {} errors",
                self.folders_deleted,
                self.format_size(),
                self.errors
            ),
        }
    }
}

/// Format a byte count with 1024-based units, e.g. `1.5 KB`
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        return format!("{} {}", bytes, UNITS[unit_index]);
    }

    let formatted = format!("{size:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit_index])
}

use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::PurgeError;
use crate::event::{EventKind, EventSink, PurgeEvent, relative_display};
use crate::scanner::{FolderScanner, ScanConfig, TargetSet};
use crate::size::directory_size;
use crate::{PurgeResult, RunStatus};

/// Purge engine configuration
#[derive(Debug, Clone, Default)]
pub struct PurgeConfig {
    /// Folder names to purge, processed in set order for every root
    pub targets: TargetSet,
    /// Report matches and their sizes without deleting anything
    pub dry_run: bool,
    pub scan: ScanConfig,
}

/// Lifecycle of a [`PurgeEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Completed,
    Aborted,
}

/// Shared cancellation flag, checked before every scan and every deletion
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Removes a matched folder together with its whole subtree
pub trait FolderRemover {
    fn remove(&mut self, path: &Path) -> io::Result<()>;
}

/// Deletes folders from the file system
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRemover;

impl FolderRemover for FsRemover {
    fn remove(&mut self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }
}

impl<F> FolderRemover for F
where
    F: FnMut(&Path) -> io::Result<()>,
{
    fn remove(&mut self, path: &Path) -> io::Result<()> {
        self(path)
    }
}

/// Counters owned by a single run, published into [`PurgeResult`] at the end
#[derive(Debug, Default)]
struct RunTotals {
    folders_deleted: usize,
    errors: usize,
    bytes_freed: u64,
    folders_skipped: usize,
    bytes_reclaimable: u64,
}

impl RunTotals {
    fn record_deleted(&mut self, bytes: u64) {
        self.folders_deleted += 1;
        self.bytes_freed = self.bytes_freed.saturating_add(bytes);
    }

    fn record_skipped(&mut self, bytes: u64) {
        self.folders_skipped += 1;
        self.bytes_reclaimable = self.bytes_reclaimable.saturating_add(bytes);
    }

    fn record_error(&mut self) {
        self.errors += 1;
    }
}

/// Scans project roots for target folders and deletes them, one at a time.
///
/// A failure on one folder or one root is reported and counted, never
/// allowed to stop the rest of the run.
pub struct PurgeEngine<R = FsRemover> {
    config: PurgeConfig,
    scanner: FolderScanner,
    remover: R,
    state: EngineState,
}

impl PurgeEngine<FsRemover> {
    pub fn new(config: PurgeConfig) -> Self {
        Self::with_remover(config, FsRemover)
    }
}

impl Default for PurgeEngine<FsRemover> {
    fn default() -> Self {
        Self::new(PurgeConfig::default())
    }
}

impl<R: FolderRemover> PurgeEngine<R> {
    pub fn with_remover(config: PurgeConfig, remover: R) -> Self {
        let scanner = FolderScanner::new(config.scan.clone());
        Self {
            config,
            scanner,
            remover,
            state: EngineState::Idle,
        }
    }

    pub fn config(&self) -> &PurgeConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Purge every target folder beneath `roots`, in the order given.
    ///
    /// Returns [`PurgeError::Configuration`] without touching the disk when
    /// there is nothing to do. Otherwise always returns a result: per-folder
    /// and per-root failures are only counted and reported through `sink`.
    /// A cancelled run ends [`RunStatus::Aborted`] with the partial totals.
    pub fn run<P, S>(
        &mut self,
        roots: &[P],
        sink: &mut S,
        cancel: &CancelToken,
    ) -> Result<PurgeResult, PurgeError>
    where
        P: AsRef<Path>,
        S: EventSink + ?Sized,
    {
        if roots.is_empty() {
            self.state = EngineState::Aborted;
            return Err(PurgeError::configuration("no project roots to purge"));
        }
        if self.config.targets.is_empty() {
            self.state = EngineState::Aborted;
            return Err(PurgeError::configuration("no target folder names selected"));
        }

        self.state = EngineState::Running;
        let start_time = Instant::now();
        let mut totals = RunTotals::default();

        info!(
            "Starting purge of {} root(s) for {:?}{}",
            roots.len(),
            self.config.targets.names(),
            if self.config.dry_run { " (dry run)" } else { "" }
        );

        let flow = self.purge_roots(roots, sink, cancel, &mut totals);

        let status = match flow {
            ControlFlow::Continue(()) => RunStatus::Completed,
            ControlFlow::Break(()) => {
                warn!("Purge cancelled");
                RunStatus::Aborted
            }
        };
        self.state = match status {
            RunStatus::Completed => EngineState::Completed,
            RunStatus::Aborted => EngineState::Aborted,
        };

        let result = PurgeResult {
            folders_deleted: totals.folders_deleted,
            errors: totals.errors,
            bytes_freed: totals.bytes_freed,
            folders_skipped: totals.folders_skipped,
            bytes_reclaimable: totals.bytes_reclaimable,
            dry_run: self.config.dry_run,
            status,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            "Purge finished: {} deleted, {} errors, {} freed, {}ms",
            result.folders_deleted,
            result.errors,
            result.format_size(),
            result.duration_ms
        );
        sink.emit(
            PurgeEvent::new(EventKind::Summary, result.completion_message())
                .with_bytes(result.bytes_freed),
        );

        Ok(result)
    }

    fn purge_roots<P, S>(
        &mut self,
        roots: &[P],
        sink: &mut S,
        cancel: &CancelToken,
        totals: &mut RunTotals,
    ) -> ControlFlow<()>
    where
        P: AsRef<Path>,
        S: EventSink + ?Sized,
    {
        let targets = self.config.targets.clone();

        for (index, root) in roots.iter().enumerate() {
            let root = root.as_ref();
            sink.emit(PurgeEvent::root_started(index + 1, roots.len(), root));

            for name in targets.iter() {
                self.purge_target(root, name, sink, cancel, totals)?;
            }
        }

        ControlFlow::Continue(())
    }

    fn purge_target<S>(
        &mut self,
        root: &Path,
        name: &str,
        sink: &mut S,
        cancel: &CancelToken,
        totals: &mut RunTotals,
    ) -> ControlFlow<()>
    where
        S: EventSink + ?Sized,
    {
        if cancel.is_cancelled() {
            return ControlFlow::Break(());
        }

        sink.emit(PurgeEvent::found(format!("Scanning for '{name}' folders")).with_path(root));

        let folders = match self.scanner.find_matching_directories(root, name) {
            Ok(folders) => folders,
            Err(e) => {
                error!("{}", e);
                totals.record_error();
                sink.emit(
                    PurgeEvent::error(format!("Error scanning '{name}': {e}")).with_path(root),
                );
                return ControlFlow::Continue(());
            }
        };

        if folders.is_empty() {
            sink.emit(PurgeEvent::info(format!("No '{name}' folders found")).with_path(root));
            return ControlFlow::Continue(());
        }

        sink.emit(
            PurgeEvent::found(format!("Found {} '{}' folder(s)", folders.len(), name))
                .with_path(root),
        );

        for folder in &folders {
            if cancel.is_cancelled() {
                return ControlFlow::Break(());
            }
            self.purge_folder(root, folder, sink, totals);
        }

        ControlFlow::Continue(())
    }

    fn purge_folder<S>(&mut self, root: &Path, folder: &Path, sink: &mut S, totals: &mut RunTotals)
    where
        S: EventSink + ?Sized,
    {
        let size = directory_size(folder);

        if self.config.dry_run {
            debug!("Dry run, keeping {:?}", folder);
            totals.record_skipped(size);
            sink.emit(PurgeEvent::skipped(folder, root, size));
            return;
        }

        match self.remover.remove(folder) {
            Ok(()) => {
                debug!("Deleted {:?} ({} bytes)", folder, size);
                totals.record_deleted(size);
                sink.emit(PurgeEvent::deleted(folder, root, size));
            }
            Err(source) => {
                let reason = source.to_string();
                let err = PurgeError::Deletion {
                    path: folder.to_path_buf(),
                    source,
                };
                error!("{}", err);
                totals.record_error();

                sink.emit(
                    PurgeEvent::error(format!(
                        "Failed: {} - {}",
                        relative_display(folder, root),
                        reason
                    ))
                    .with_path(folder),
                );
            }
        }
    }
}

/// A purge running on a worker thread
pub struct PurgeHandle {
    events: mpsc::Receiver<PurgeEvent>,
    cancel: CancelToken,
    worker: thread::JoinHandle<Result<PurgeResult, PurgeError>>,
}

impl PurgeHandle {
    /// Events in the order the engine produced them. The channel closes
    /// once the run has finished and emitted its summary.
    pub fn events(&self) -> &mpsc::Receiver<PurgeEvent> {
        &self.events
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Forward every event to `sink` until the run ends, then return its result
    pub fn wait<S>(self, sink: &mut S) -> Result<PurgeResult, PurgeError>
    where
        S: EventSink + ?Sized,
    {
        for event in self.events.iter() {
            sink.emit(event);
        }
        self.join()
    }

    /// Wait for the worker, discarding events not yet received
    pub fn join(self) -> Result<PurgeResult, PurgeError> {
        match self.worker.join() {
            Ok(result) => result,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
}

/// Run `engine` on a dedicated thread, streaming its events through a channel
pub fn spawn_purge<R>(
    mut engine: PurgeEngine<R>,
    roots: Vec<PathBuf>,
    cancel: CancelToken,
) -> PurgeHandle
where
    R: FolderRemover + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    let worker_cancel = cancel.clone();

    let worker = thread::spawn(move || {
        let mut sender = sender;
        engine.run(&roots, &mut sender, &worker_cancel)
    });

    PurgeHandle {
        events: receiver,
        cancel,
        worker,
    }
}

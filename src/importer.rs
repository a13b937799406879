//! The import job scheduler.
//!
//! [`Importer::import`] runs the whole pipeline for one [`Job`]: collect the
//! source files, partition them into fixed-size batches, dispatch the batches
//! across a bounded pool of worker threads, and aggregate per-task outcomes
//! into an [`ImportStatus`]. Progress and results are reported through the
//! shared [`ImportEvents`] bundle; there is no synchronous per-file result.
//!
//! Cancellation is cooperative: [`Importer::cancel`] (or
//! [`JobState::request_cancel`] from an event handler) sets a shared flag
//! that workers check before starting each file. A relocation already in
//! flight always completes.

use crate::collector;
use crate::events::{FilesDiscovered, ImportEvents};
use crate::metadata::MetadataResolver;
use crate::planner::RelocationPlan;
use crate::relocator;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Default number of worker threads, sized for the latency of the external
/// metadata tool rather than CPU count.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Default number of files per dispatched batch.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// One import request, immutable once submitted.
#[derive(Debug, Clone)]
pub struct Job {
    /// Directory the files are collected from.
    pub source_root: PathBuf,
    /// Root under which the `<type>/<date>` tree is built.
    pub destination_root: PathBuf,
    /// Walk the source tree instead of only its direct children.
    pub recursive: bool,
    /// Replace destination files whose names collide.
    pub overwrite: bool,
}

/// Final outcome of an import, mapped to process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    /// Every task was processed (some may have been skipped by cancellation).
    Completed,
    /// At least one task failed with a structural or fatal move error.
    MoveError,
    /// The collector found nothing to import; no workers were started.
    EmptyInput,
}

impl ImportStatus {
    /// The process exit code for this outcome (0, 1 or 2).
    pub fn exit_code(self) -> i32 {
        match self {
            ImportStatus::Completed => 0,
            ImportStatus::MoveError => 1,
            ImportStatus::EmptyInput => 2,
        }
    }
}

/// Shared per-job state: the cancellation flag and progress counters.
///
/// The only state mutated by multiple workers. Counters are atomic;
/// `files_completed` never exceeds `files_total`, and the cancellation flag
/// is never cleared while a job is running.
#[derive(Debug, Default)]
pub struct JobState {
    cancel_requested: AtomicBool,
    files_total: AtomicUsize,
    files_completed: AtomicUsize,
    tasks_failed: AtomicUsize,
}

impl JobState {
    /// Asks the running job to stop. Advisory: tasks already started finish,
    /// everything not yet started is skipped at the next check point.
    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested for the current job.
    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// Number of files discovered for the current job.
    pub fn files_total(&self) -> usize {
        self.files_total.load(Ordering::SeqCst)
    }

    /// Number of tasks a worker has finished (successfully or not).
    pub fn files_completed(&self) -> usize {
        self.files_completed.load(Ordering::SeqCst)
    }

    /// Number of tasks that ended in a move error.
    pub fn tasks_failed(&self) -> usize {
        self.tasks_failed.load(Ordering::SeqCst)
    }

    fn reset(&self, total: usize) {
        self.cancel_requested.store(false, Ordering::SeqCst);
        self.files_total.store(total, Ordering::SeqCst);
        self.files_completed.store(0, Ordering::SeqCst);
        self.tasks_failed.store(0, Ordering::SeqCst);
    }
}

/// Runs import jobs.
///
/// One `Importer` serves one job at a time; the caller runs [`import`] off
/// its own thread if it must stay responsive, and joins it before discarding
/// the job.
///
/// [`import`]: Importer::import
pub struct Importer {
    events: Arc<ImportEvents>,
    state: Arc<JobState>,
    resolver: MetadataResolver,
    pool_size: usize,
    batch_size: usize,
}

impl Importer {
    /// Creates an importer with the default pool and batch sizes.
    pub fn new(events: Arc<ImportEvents>, resolver: MetadataResolver) -> Self {
        Importer {
            events,
            state: Arc::new(JobState::default()),
            resolver,
            pool_size: DEFAULT_POOL_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Sets the worker pool size (clamped to at least 1).
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    /// Sets the batch size (clamped to at least 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// The event bundle this importer publishes through.
    pub fn events(&self) -> &Arc<ImportEvents> {
        &self.events
    }

    /// The shared job state, for progress polling and cancellation from
    /// other threads or event handlers.
    pub fn state(&self) -> Arc<JobState> {
        Arc::clone(&self.state)
    }

    /// Requests cooperative cancellation of the running job.
    pub fn cancel(&self) {
        self.state.request_cancel();
    }

    /// Runs `job` to completion and returns its aggregate outcome.
    ///
    /// Emits, in order: a starting message, the Discovered lifecycle event,
    /// then (concurrently) the per-file lifecycle events, and finally a
    /// finished message followed by exactly one Completed event. An empty
    /// file list short-circuits with [`ImportStatus::EmptyInput`] after a
    /// single Error-level message.
    pub fn import(&self, job: Job) -> ImportStatus {
        self.events.messages.info("Starting import");
        self.state.reset(0);

        let files = collector::collect(&job.source_root, job.recursive, &self.events);
        self.events.discovered.emit(&FilesDiscovered {
            files: files.clone(),
        });

        if files.is_empty() {
            self.events.messages.error("No files selected for import");
            return ImportStatus::EmptyInput;
        }

        self.state.reset(files.len());
        self.dispatch(files, &job);

        self.events.messages.info("Finished");
        self.events.completed.emit(&());

        if self.state.tasks_failed() > 0 {
            ImportStatus::MoveError
        } else {
            ImportStatus::Completed
        }
    }

    /// Splits `files` into batches, runs the worker pool over them, and
    /// joins every worker (the completion barrier).
    fn dispatch(&self, files: Vec<PathBuf>, job: &Job) {
        let batches: VecDeque<Vec<PathBuf>> = files
            .chunks(self.batch_size)
            .map(|batch| batch.to_vec())
            .collect();
        let workers = self.pool_size.min(batches.len());
        let queue = Mutex::new(batches);

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| self.run_worker(&queue, job));
            }
        });
    }

    /// One pool slot: drains batches from the shared queue until the queue
    /// is empty or cancellation is requested.
    fn run_worker(&self, queue: &Mutex<VecDeque<Vec<PathBuf>>>, job: &Job) {
        loop {
            if self.state.cancel_requested() {
                return;
            }
            let batch = {
                let mut queue = queue
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                queue.pop_front()
            };
            let Some(batch) = batch else {
                return;
            };
            for file in &batch {
                // Checked between files, so a batch stops early on
                // cancellation while the in-flight file finishes.
                if self.state.cancel_requested() {
                    return;
                }
                self.process_file(file, job);
                self.state.files_completed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Plans and relocates a single file, recording the outcome.
    fn process_file(&self, file: &Path, job: &Job) {
        let plan = RelocationPlan::new(file, &job.destination_root, &self.resolver);
        if let Err(e) = relocator::relocate(&plan, job.overwrite, &self.events) {
            // The relocator already published the lifecycle event; a fatal
            // retry failure additionally surfaces its own error here.
            if matches!(e, relocator::MoveError::RetryFailed { .. }) {
                self.events.messages.error(e.to_string());
            }
            self.state.tasks_failed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

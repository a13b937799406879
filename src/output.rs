//! Console output for import events.
//!
//! The console sink is the minimum conforming listener: it subscribes a
//! colored printer to all three message levels and drives an `indicatif`
//! progress bar from the lifecycle signals, so every warning, error and
//! per-file outcome stays observable without a GUI attached.

use crate::events::{EventError, FilesDiscovered, ImportEvents, MoveFailed, MoveStarted};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};

/// Subscribes colored printing and a progress bar to an event bundle.
pub struct ConsoleSink;

impl ConsoleSink {
    /// Attaches the sink to `events`.
    ///
    /// Handlers stay registered for the lifetime of the bundle.
    pub fn attach(events: &ImportEvents) -> Result<(), EventError> {
        events.messages.subscribe(1, |message: &String| {
            println!("{}", message.cyan());
        })?;
        events.messages.subscribe(2, |message: &String| {
            println!("{} {}", "⚠".yellow(), message);
        })?;
        events.messages.subscribe(3, |message: &String| {
            eprintln!("{} {}", "✗".red(), message);
        })?;

        // One bar per job, created when the file list is known. The handlers
        // run on worker threads, so the slot is shared behind a mutex.
        let bar: Arc<Mutex<Option<ProgressBar>>> = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&bar);
        events.discovered.subscribe(move |event: &FilesDiscovered| {
            if event.files.is_empty() {
                return;
            }
            let progress = ProgressBar::new(event.files.len() as u64);
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .expect("progress bar template is valid")
                    .progress_chars("█▓░"),
            );
            *lock(&slot) = Some(progress);
        });

        let slot = Arc::clone(&bar);
        events.move_started.subscribe(move |event: &MoveStarted| {
            if let Some(progress) = lock(&slot).as_ref() {
                if let Some(name) = event.source.file_name() {
                    progress.set_message(name.to_string_lossy().into_owned());
                }
            }
        });

        let slot = Arc::clone(&bar);
        events.move_succeeded.subscribe(move |_| {
            if let Some(progress) = lock(&slot).as_ref() {
                progress.inc(1);
            }
        });

        let slot = Arc::clone(&bar);
        events.move_failed.subscribe(move |event: &MoveFailed| {
            if let Some(progress) = lock(&slot).as_ref() {
                progress.inc(1);
                progress.println(format!(
                    "{} {}: {}",
                    "✗".red(),
                    event.destination.display(),
                    event.reason
                ));
            }
        });

        let slot = Arc::clone(&bar);
        events.completed.subscribe(move |_| {
            if let Some(progress) = lock(&slot).take() {
                progress.finish_with_message("done");
            }
        });

        Ok(())
    }
}

fn lock(
    slot: &Arc<Mutex<Option<ProgressBar>>>,
) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

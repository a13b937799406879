//! Moves a planned file into place.
//!
//! The relocator owns the retry policy: a structural "not a directory"
//! conflict aborts the task immediately, while a missing destination tree is
//! created and the move retried exactly once. A second failure is fatal to
//! the task and reported to the caller.

use crate::events::{ImportEvents, MoveFailed, MoveStarted, MoveSucceeded};
use crate::planner::RelocationPlan;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Errors that end a relocation task.
#[derive(Debug)]
pub enum MoveError {
    /// A destination path component exists but is not a directory.
    NotADirectory {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// The target file already exists and overwriting was not requested.
    DestinationExists { destination: PathBuf },
    /// The move failed again after the destination tree was created.
    RetryFailed {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// The source path has no final file name component.
    InvalidSource { path: PathBuf },
}

impl std::fmt::Display for MoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveError::NotADirectory {
                source,
                destination,
                source_error,
            } => write!(
                f,
                "cannot move {} to {}: {}",
                source.display(),
                destination.display(),
                source_error
            ),
            MoveError::DestinationExists { destination } => {
                write!(f, "{} already exists", destination.display())
            }
            MoveError::RetryFailed {
                source,
                destination,
                source_error,
            } => write!(
                f,
                "moving {} to {} failed after creating the directory: {}",
                source.display(),
                destination.display(),
                source_error
            ),
            MoveError::InvalidSource { path } => {
                write!(f, "{} has no file name component", path.display())
            }
        }
    }
}

impl std::error::Error for MoveError {}

/// Result type for relocation.
pub type MoveResult<T> = Result<T, MoveError>;

/// Moves the planned file to `<destination_dir>/<source basename>`.
///
/// Emits MoveStarted before the attempt, then exactly one of MoveSucceeded or
/// MoveFailed per task. With `overwrite` off, an existing target file fails
/// the task and leaves the source untouched; with it on, the target is
/// replaced.
///
/// Returns the final path of the file on success.
pub fn relocate(plan: &RelocationPlan, overwrite: bool, events: &ImportEvents) -> MoveResult<PathBuf> {
    let file_name = plan
        .source_path
        .file_name()
        .ok_or_else(|| MoveError::InvalidSource {
            path: plan.source_path.clone(),
        })?;
    let target = plan.destination_dir.join(file_name);

    events.move_started.emit(&MoveStarted {
        source: plan.source_path.clone(),
        destination: target.clone(),
    });

    if !overwrite && target.exists() {
        events.messages.warning(format!(
            "\"{}\" already exists, skipping (re-run with overwrite to replace it)",
            target.display()
        ));
        events.move_failed.emit(&MoveFailed {
            destination: target.clone(),
            reason: "destination exists".to_string(),
        });
        return Err(MoveError::DestinationExists { destination: target });
    }

    match move_file(&plan.source_path, &target) {
        Ok(()) => {
            events.move_succeeded.emit(&MoveSucceeded {
                source: plan.source_path.clone(),
                destination: target.clone(),
            });
            Ok(target)
        }
        Err(e) if e.kind() == ErrorKind::NotADirectory => {
            events.messages.error(format!(
                "cannot move {} to {}: {}",
                plan.source_path.display(),
                target.display(),
                e
            ));
            events.move_failed.emit(&MoveFailed {
                destination: plan.destination_dir.clone(),
                reason: e.to_string(),
            });
            Err(MoveError::NotADirectory {
                source: plan.source_path.clone(),
                destination: target,
                source_error: e,
            })
        }
        Err(first) => {
            events.messages.error(first.to_string());
            events.messages.error(format!(
                "\"{}\" directory not found, creating a directory by the same name",
                plan.destination_dir.display()
            ));
            events.move_failed.emit(&MoveFailed {
                destination: plan.destination_dir.clone(),
                reason: "directory not found".to_string(),
            });

            // Idempotent: concurrent workers may race to create the same
            // type/date directory.
            fs::create_dir_all(&plan.destination_dir).map_err(|e| MoveError::RetryFailed {
                source: plan.source_path.clone(),
                destination: target.clone(),
                source_error: e,
            })?;

            match move_file(&plan.source_path, &target) {
                Ok(()) => Ok(target),
                Err(second) => {
                    Err(MoveError::RetryFailed {
                        source: plan.source_path.clone(),
                        destination: target,
                        source_error: second,
                    })
                }
            }
        }
    }
}

/// Renames `src` to `dst`, falling back to copy+delete for cross-filesystem
/// moves.
fn move_file(src: &Path, dst: &Path) -> std::io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            fs::copy(src, dst)?;
            fs::remove_file(src)
        }
        Err(e) => Err(e),
    }
}

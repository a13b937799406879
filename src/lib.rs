//! snapsort - metadata-driven media import
//!
//! This library moves the files of a source directory into a
//! `<destination>/<type>/<date>/` tree: each file is classified by the
//! external exiftool binary (with extension and current-date fallbacks),
//! then relocated by a bounded pool of worker threads. All progress is
//! reported through a leveled message bus and typed lifecycle signals, and a
//! running job can be cancelled cooperatively.

pub mod cli;
pub mod collector;
pub mod config;
pub mod events;
pub mod importer;
pub mod metadata;
pub mod output;
pub mod planner;
pub mod relocator;

pub use config::{ConfigError, ImportConfig};
pub use events::{EventError, ImportEvents, Level, Signal};
pub use importer::{Importer, ImportStatus, Job, JobState};
pub use metadata::{ExifTool, MetadataResolver, MetadataSource};
pub use planner::RelocationPlan;
pub use relocator::MoveError;

pub use cli::{Cli, run_cli};

//! Command-line surface.
//!
//! Wires the parsed arguments and configuration into an [`Importer`] with
//! the console sink attached, and maps the job outcome to a process exit
//! code: 0 for success, 1 if any move failed, 2 for an empty source
//! directory (or unusable configuration).

use crate::config::ImportConfig;
use crate::events::ImportEvents;
use crate::importer::{Importer, Job};
use crate::metadata::{ExifTool, MetadataResolver};
use crate::output::ConsoleSink;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

/// Imports files into `<dst>/<type>/<date>/` directories based on their
/// embedded metadata.
#[derive(Parser, Debug)]
#[command(name = "snapsort", version, about)]
pub struct Cli {
    /// The directory where the files to import are located.
    #[arg(short = 's', long = "src", value_name = "DIR")]
    pub source: PathBuf,

    /// The directory the files are to be placed under.
    #[arg(short = 'd', long = "dst", value_name = "DIR")]
    pub destination: PathBuf,

    /// Search the source directory recursively.
    #[arg(short = 'r', long = "recursive")]
    pub recursive: bool,

    /// Overwrite files in the destination when names collide.
    #[arg(short = 'f', long = "force")]
    pub overwrite: bool,

    /// Path to a TOML configuration file.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The job described by these arguments.
    pub fn job(&self) -> Job {
        Job {
            source_root: self.source.clone(),
            destination_root: self.destination.clone(),
            recursive: self.recursive,
            overwrite: self.overwrite,
        }
    }
}

/// Runs one import for the parsed arguments and returns the exit code.
pub fn run_cli(cli: &Cli) -> i32 {
    let config = match ImportConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 2;
        }
    };

    let events = Arc::new(ImportEvents::new());
    ConsoleSink::attach(&events).expect("console sink subscribes only valid levels");

    let resolver = MetadataResolver::new(Arc::new(ExifTool::new(config.import.exiftool.clone())));
    let importer = Importer::new(events, resolver)
        .with_pool_size(config.import.pool_size)
        .with_batch_size(config.import.batch_size);

    importer.import(cli.job()).exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_and_flag_arguments() {
        let cli = Cli::parse_from(["snapsort", "-s", "/in", "-d", "/out", "-r", "-f"]);
        assert_eq!(cli.source, PathBuf::from("/in"));
        assert_eq!(cli.destination, PathBuf::from("/out"));
        assert!(cli.recursive);
        assert!(cli.overwrite);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_flags_default_to_off() {
        let cli = Cli::parse_from(["snapsort", "--src", "/in", "--dst", "/out"]);
        assert!(!cli.recursive);
        assert!(!cli.overwrite);
        let job = cli.job();
        assert!(!job.recursive);
        assert!(!job.overwrite);
    }

    #[test]
    fn test_missing_required_arguments_fail_parsing() {
        assert!(Cli::try_parse_from(["snapsort", "-s", "/in"]).is_err());
        assert!(Cli::try_parse_from(["snapsort"]).is_err());
    }
}

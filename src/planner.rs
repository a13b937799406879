//! Destination planning for a single file.

use crate::metadata::MetadataResolver;
use std::path::{Path, PathBuf};

/// Where one file is going and why.
///
/// Produced and consumed within a single task; the final file name is
/// appended by the relocator, not here.
#[derive(Debug, Clone)]
pub struct RelocationPlan {
    /// The file to move.
    pub source_path: PathBuf,
    /// `<destination_root>/<type_tag>/<date_tag>`.
    pub destination_dir: PathBuf,
    /// Lower-cased file classification (first destination subdirectory).
    pub type_tag: String,
    /// `YYYY.MM.DD` creation date (second destination subdirectory).
    pub date_tag: String,
}

impl RelocationPlan {
    /// Plans the destination directory for `source` under `destination_root`.
    ///
    /// All I/O happens inside the resolver; the combination itself is pure.
    pub fn new(source: &Path, destination_root: &Path, resolver: &MetadataResolver) -> Self {
        let (type_tag, date_tag) = resolver.resolve(source);
        let destination_dir = destination_root.join(&type_tag).join(&date_tag);
        RelocationPlan {
            source_path: source.to_path_buf(),
            destination_dir,
            type_tag,
            date_tag,
        }
    }
}

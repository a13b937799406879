//! Source directory scanning.

use crate::events::ImportEvents;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collects the files to import from `root`.
///
/// Non-recursive mode returns the regular files directly inside `root`;
/// recursive mode walks the whole tree and returns every regular file at any
/// depth, in walk order. Unreadable entries are reported at Warning level and
/// skipped.
pub fn collect(root: &Path, recursive: bool, events: &ImportEvents) -> Vec<PathBuf> {
    let files = if recursive {
        events.messages.info("Getting files recursively");
        collect_recursively(root, events)
    } else {
        events.messages.info("Getting files non recursively");
        collect_flat(root, events)
    };
    events.messages.info(format!(
        "Searching for files has finished. Found {} files.",
        files.len()
    ));
    files
}

fn collect_flat(root: &Path, events: &ImportEvents) -> Vec<PathBuf> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            events
                .messages
                .warning(format!("cannot read {}: {}", root.display(), e));
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                events
                    .messages
                    .warning(format!("skipping unreadable entry: {}", e));
                None
            }
        })
        .filter(|path| path.is_file())
        .collect()
}

fn collect_recursively(root: &Path, events: &ImportEvents) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                events
                    .messages
                    .warning(format!("skipping unreadable entry: {}", e));
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"x").expect("write file");
    }

    fn names(files: &[PathBuf]) -> HashSet<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_flat_collection_skips_directories_and_nested_files() {
        let temp = TempDir::new().expect("temp dir");
        touch(&temp.path().join("a.jpg"));
        touch(&temp.path().join("b.png"));
        fs::create_dir(temp.path().join("nested")).expect("create dir");
        touch(&temp.path().join("nested").join("deep.jpg"));

        let events = ImportEvents::new();
        let files = collect(temp.path(), false, &events);

        assert_eq!(
            names(&files),
            HashSet::from(["a.jpg".to_string(), "b.png".to_string()])
        );
    }

    #[test]
    fn test_recursive_collection_reaches_every_depth() {
        let temp = TempDir::new().expect("temp dir");
        touch(&temp.path().join("a.jpg"));
        let deep = temp.path().join("one").join("two");
        fs::create_dir_all(&deep).expect("create dirs");
        touch(&deep.join("c.raw"));
        touch(&temp.path().join("one").join("b.png"));

        let events = ImportEvents::new();
        let files = collect(temp.path(), true, &events);

        assert_eq!(
            names(&files),
            HashSet::from([
                "a.jpg".to_string(),
                "b.png".to_string(),
                "c.raw".to_string()
            ])
        );
    }

    #[test]
    fn test_empty_directory_yields_empty_list() {
        let temp = TempDir::new().expect("temp dir");
        let events = ImportEvents::new();
        assert!(collect(temp.path(), false, &events).is_empty());
        assert!(collect(temp.path(), true, &events).is_empty());
    }

    #[test]
    fn test_missing_root_warns_and_returns_empty() {
        let events = ImportEvents::new();
        let files = collect(Path::new("/no/such/snapsort/dir"), false, &events);
        assert!(files.is_empty());
    }
}

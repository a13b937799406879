//! File type and creation date resolution.
//!
//! Classification is delegated to an external metadata tool (exiftool) behind
//! the [`MetadataSource`] trait, so tests and alternative backends can swap in
//! their own implementation. Extraction failures are never fatal: the
//! resolver falls back to the file extension (or `"misc"`) for the type and
//! to today's date for the date tag.

use chrono::Local;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

/// Tag read for the file's original creation time.
pub const TAG_DATE_TIME_ORIGINAL: &str = "DateTimeOriginal";
/// Alternate creation-time tag requested from the tool alongside
/// [`TAG_DATE_TIME_ORIGINAL`].
pub const TAG_CREATE_DATE: &str = "CreateDate";

/// Type tag used when neither the tool nor the extension yields a usable
/// classification.
pub const FALLBACK_TYPE_TAG: &str = "misc";

/// Extensions this long or longer are not trusted as a type tag.
const MAX_EXTENSION_LEN: usize = 6;

/// Errors from the external metadata tool.
#[derive(Debug)]
pub enum MetadataError {
    /// The tool binary could not be launched.
    Launch(std::io::Error),
    /// The tool ran but exited unsuccessfully.
    ToolFailed { stderr: String },
    /// The tool produced output that could not be interpreted.
    InvalidOutput(String),
    /// The requested field was not present in the tool output.
    FieldMissing(String),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Launch(e) => write!(f, "failed to launch metadata tool: {}", e),
            MetadataError::ToolFailed { stderr } => {
                write!(f, "metadata tool exited with an error: {}", stderr.trim())
            }
            MetadataError::InvalidOutput(reason) => {
                write!(f, "unreadable metadata tool output: {}", reason)
            }
            MetadataError::FieldMissing(field) => write!(f, "{} was not found", field),
        }
    }
}

impl std::error::Error for MetadataError {}

/// Result type for metadata extraction.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// The external metadata-extraction capability.
///
/// Implementations are invoked once per imported file, so the per-call cost
/// (typically a subprocess) dominates pipeline throughput.
pub trait MetadataSource: Send + Sync {
    /// Returns the tool's registered file type for `path` (e.g. `"JPEG"`).
    fn file_type(&self, path: &Path) -> MetadataResult<String>;

    /// Returns the values of the requested tags that are present on `path`.
    ///
    /// Absent tags are simply missing from the map; only tool-level failures
    /// are errors.
    fn tags(&self, path: &Path, tag_names: &[&str]) -> MetadataResult<HashMap<String, String>>;
}

/// [`MetadataSource`] backed by the `exiftool` binary, queried in JSON mode.
pub struct ExifTool {
    binary: String,
}

impl ExifTool {
    /// Uses `binary` (a name resolved via `PATH`, or a full path) as the
    /// exiftool executable.
    pub fn new(binary: impl Into<String>) -> Self {
        ExifTool {
            binary: binary.into(),
        }
    }

    /// Runs the tool with `-j` plus the given tag selectors and returns the
    /// JSON object describing `path`.
    fn query(&self, path: &Path, selectors: &[String]) -> MetadataResult<Value> {
        let output = Command::new(&self.binary)
            .arg("-j")
            .args(selectors)
            .arg(path)
            .output()
            .map_err(MetadataError::Launch)?;

        if !output.status.success() {
            return Err(MetadataError::ToolFailed {
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let parsed: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| MetadataError::InvalidOutput(e.to_string()))?;

        // exiftool -j prints one object per input file, wrapped in an array.
        parsed
            .as_array()
            .and_then(|files| files.first())
            .cloned()
            .ok_or_else(|| MetadataError::InvalidOutput("expected a one-element array".to_string()))
    }
}

impl Default for ExifTool {
    fn default() -> Self {
        ExifTool::new("exiftool")
    }
}

impl MetadataSource for ExifTool {
    fn file_type(&self, path: &Path) -> MetadataResult<String> {
        let object = self.query(path, &["-FileType".to_string()])?;
        object
            .get("FileType")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| MetadataError::FieldMissing("FileType".to_string()))
    }

    fn tags(&self, path: &Path, tag_names: &[&str]) -> MetadataResult<HashMap<String, String>> {
        let selectors: Vec<String> = tag_names.iter().map(|tag| format!("-{}", tag)).collect();
        let object = self.query(path, &selectors)?;

        let mut values = HashMap::new();
        for tag in tag_names {
            if let Some(value) = object.get(*tag).and_then(Value::as_str) {
                values.insert((*tag).to_string(), value.to_string());
            }
        }
        Ok(values)
    }
}

/// Resolves the `(type_tag, date_tag)` pair that determines a file's
/// destination subdirectories.
#[derive(Clone)]
pub struct MetadataResolver {
    source: Arc<dyn MetadataSource>,
}

impl MetadataResolver {
    /// Wraps a metadata source.
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        MetadataResolver { source }
    }

    /// Returns the type tag and `YYYY.MM.DD` date tag for `path`.
    ///
    /// Never fails; extraction problems degrade to the documented fallbacks.
    pub fn resolve(&self, path: &Path) -> (String, String) {
        (self.type_tag(path), self.date_tag(path))
    }

    /// The lower-cased file type reported by the tool, or the extension
    /// fallback when the tool cannot classify the file.
    pub fn type_tag(&self, path: &Path) -> String {
        match self.source.file_type(path) {
            Ok(kind) => kind.to_lowercase(),
            Err(_) => extension_type_tag(path),
        }
    }

    /// The file's creation date as `YYYY.MM.DD`, read from the
    /// `DateTimeOriginal` tag, or today's date when extraction fails.
    pub fn date_tag(&self, path: &Path) -> String {
        let tags = match self
            .source
            .tags(path, &[TAG_DATE_TIME_ORIGINAL, TAG_CREATE_DATE])
        {
            Ok(tags) => tags,
            Err(_) => return today(),
        };
        match tags.get(TAG_DATE_TIME_ORIGINAL) {
            Some(stamp) => date_tag_from_stamp(stamp).unwrap_or_else(today),
            None => today(),
        }
    }
}

/// Lower-cased extension when it is short enough to be a plausible type name,
/// otherwise [`FALLBACK_TYPE_TAG`].
fn extension_type_tag(path: &Path) -> String {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() && ext.len() < MAX_EXTENSION_LEN => ext.to_lowercase(),
        _ => FALLBACK_TYPE_TAG.to_string(),
    }
}

/// Converts an exif timestamp (`YYYY:MM:DD HH:MM:SS`) into `YYYY.MM.DD`.
fn date_tag_from_stamp(stamp: &str) -> Option<String> {
    let date: String = stamp.chars().take(10).collect();
    if date.chars().count() < 10 {
        return None;
    }
    Some(date.replace(':', "."))
}

/// Today's local date formatted `YYYY.MM.DD`.
fn today() -> String {
    Local::now().format("%Y.%m.%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// A controllable stand-in for the external tool.
    struct StubSource {
        pub file_type: MetadataResult<String>,
        pub tags: MetadataResult<HashMap<String, String>>,
    }

    impl StubSource {
        fn failing() -> Self {
            StubSource {
                file_type: Err(MetadataError::ToolFailed {
                    stderr: "boom".to_string(),
                }),
                tags: Err(MetadataError::ToolFailed {
                    stderr: "boom".to_string(),
                }),
            }
        }
    }

    impl MetadataSource for StubSource {
        fn file_type(&self, _path: &Path) -> MetadataResult<String> {
            match &self.file_type {
                Ok(kind) => Ok(kind.clone()),
                Err(_) => Err(MetadataError::FieldMissing("FileType".to_string())),
            }
        }

        fn tags(&self, _path: &Path, _tags: &[&str]) -> MetadataResult<HashMap<String, String>> {
            match &self.tags {
                Ok(tags) => Ok(tags.clone()),
                Err(_) => Err(MetadataError::ToolFailed {
                    stderr: "boom".to_string(),
                }),
            }
        }
    }

    fn resolver(stub: StubSource) -> MetadataResolver {
        MetadataResolver::new(Arc::new(stub))
    }

    #[test]
    fn test_type_tag_lowercases_tool_output() {
        let resolver = resolver(StubSource {
            file_type: Ok("JPEG".to_string()),
            tags: Err(MetadataError::FieldMissing("unused".to_string())),
        });
        assert_eq!(resolver.type_tag(Path::new("photo.jpg")), "jpeg");
    }

    #[test]
    fn test_type_tag_falls_back_to_short_extension() {
        let resolver = resolver(StubSource::failing());
        assert_eq!(resolver.type_tag(Path::new("photo.JPG")), "jpg");
        assert_eq!(resolver.type_tag(Path::new("clip.webm")), "webm");
    }

    #[test]
    fn test_type_tag_falls_back_to_misc() {
        let resolver = resolver(StubSource::failing());
        // Six or more characters is not a plausible type name.
        assert_eq!(resolver.type_tag(Path::new("dump.backup")), "misc");
        assert_eq!(resolver.type_tag(Path::new("noextension")), "misc");
    }

    #[test]
    fn test_date_tag_formats_original_timestamp() {
        let mut tags = HashMap::new();
        tags.insert(
            TAG_DATE_TIME_ORIGINAL.to_string(),
            "2021:03:05 17:22:10".to_string(),
        );
        let resolver = resolver(StubSource {
            file_type: Ok("JPEG".to_string()),
            tags: Ok(tags),
        });
        assert_eq!(resolver.date_tag(Path::new("photo.jpg")), "2021.03.05");
    }

    #[test]
    fn test_date_tag_falls_back_to_today_when_tag_absent() {
        // CreateDate alone is not read; only DateTimeOriginal counts.
        let mut tags = HashMap::new();
        tags.insert(TAG_CREATE_DATE.to_string(), "2019:01:01 00:00:00".to_string());
        let resolver = resolver(StubSource {
            file_type: Ok("JPEG".to_string()),
            tags: Ok(tags),
        });
        assert_eq!(resolver.date_tag(Path::new("photo.jpg")), today());
    }

    #[test]
    fn test_date_tag_falls_back_to_today_on_tool_failure() {
        let resolver = resolver(StubSource::failing());
        assert_eq!(resolver.date_tag(Path::new("photo.jpg")), today());
    }

    #[test]
    fn test_missing_binary_degrades_to_fallbacks() {
        let tool = ExifTool::new("snapsort-test-no-such-binary");
        let resolver = MetadataResolver::new(Arc::new(tool));
        let (type_tag, date_tag) = resolver.resolve(&PathBuf::from("a.jpg"));
        assert_eq!(type_tag, "jpg");
        assert_eq!(date_tag, today());
    }

    #[test]
    fn test_stamp_shorter_than_a_date_is_rejected() {
        assert_eq!(date_tag_from_stamp("2021:03"), None);
        assert_eq!(
            date_tag_from_stamp("2021:03:05 17:22:10"),
            Some("2021.03.05".to_string())
        );
    }
}

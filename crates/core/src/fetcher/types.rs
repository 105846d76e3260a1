//! Types for the fetch stage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Keys that may carry the downloaded file name, in order of preference.
const FILENAME_KEYS: &[&str] = &["_filename", "filename"];

/// Metadata record printed by the fetch tool before the download starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FetchMetadata(Map<String, Value>);

impl FetchMetadata {
    /// Parses one line of tool output. Only JSON objects are accepted.
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim()).map(Self)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Name of the file the tool is writing, if it reported a non-empty one.
    pub fn filename(&self) -> Option<&str> {
        FILENAME_KEYS
            .iter()
            .filter_map(|key| self.0.get(*key).and_then(Value::as_str))
            .find(|name| !name.is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for FetchMetadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A completed fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedMedia {
    pub metadata: FetchMetadata,
    /// Local file written by the tool; `None` when it reported no filename.
    pub path: Option<PathBuf>,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

impl FetchedMedia {
    /// Resolves the reported filename against the tool's working directory.
    pub fn new(metadata: FetchMetadata, download_dir: &Path, attempts: u32) -> Self {
        let path = metadata.filename().map(|name| download_dir.join(name));
        Self {
            metadata,
            path,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_prefers_underscore_key() {
        let meta = FetchMetadata::from_json_line(
            r#"{"_filename": "a.mp4", "filename": "b.mp4", "title": "A"}"#,
        )
        .unwrap();
        assert_eq!(meta.filename(), Some("a.mp4"));
        assert_eq!(meta.title(), Some("A"));
    }

    #[test]
    fn test_empty_filename_counts_as_missing() {
        let meta = FetchMetadata::from_json_line(r#"{"_filename": "", "id": "x"}"#).unwrap();
        assert_eq!(meta.filename(), None);
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(FetchMetadata::from_json_line("[1, 2]").is_err());
        assert!(FetchMetadata::from_json_line("not json").is_err());
    }

    #[test]
    fn test_fetched_media_resolves_relative_path() {
        let meta = FetchMetadata::from_json_line(r#"{"_filename": "v.mp4"}"#).unwrap();
        let fetched = FetchedMedia::new(meta, Path::new("/downloads"), 1);
        assert_eq!(fetched.path, Some(PathBuf::from("/downloads/v.mp4")));

        let meta = FetchMetadata::from_json_line(r#"{"_filename": "/abs/v.mp4"}"#).unwrap();
        let fetched = FetchedMedia::new(meta, Path::new("/downloads"), 1);
        assert_eq!(fetched.path, Some(PathBuf::from("/abs/v.mp4")));
    }

    #[test]
    fn test_fetched_media_without_filename() {
        let fetched = FetchedMedia::new(FetchMetadata::default(), Path::new("."), 2);
        assert!(fetched.path.is_none());
        assert_eq!(fetched.attempts, 2);
    }
}

//! The `Gist` and `File` entities.
//!
//! Both types have two lives: they are constructed from dynamic JSON when a
//! response is decoded (via [`FromJson`]), and they round-trip through
//! serde when the offline cache persists a fetched page. Wire decoding
//! never goes through the serde impls, so the remote service renaming or
//! dropping optional fields cannot break cached snapshots.

use serde::{Deserialize, Serialize};

use crate::json::FromJson;

/// A single file inside a gist.
///
/// Files are constructed along two distinct paths:
///
/// - decoded from a listing response, which carries `filename` and
///   `raw_url` but never inlines `content`;
/// - authored locally for gist creation, which carries `filename` and
///   `content` but has no `raw_url` yet.
///
/// A file submitted for creation must have both a filename and content;
/// entries missing either are dropped by the client before serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// The file's name, e.g. `"hello.rb"`.
    pub filename: Option<String>,
    /// URL of the raw file content on the remote service.
    pub raw_url: Option<String>,
    /// Inline content, only present for locally authored files.
    pub content: Option<String>,
}

impl File {
    /// Creates a locally authored file for gist creation.
    ///
    /// # Examples
    ///
    /// ```
    /// use gisto_protocol::File;
    ///
    /// let file = File::authored("hello.rb", "puts 'Hello'");
    /// assert_eq!(file.filename.as_deref(), Some("hello.rb"));
    /// assert!(file.raw_url.is_none());
    /// ```
    #[must_use]
    pub fn authored(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            raw_url: None,
            content: Some(content.into()),
        }
    }

    /// Returns `true` if this file carries everything a create request needs.
    #[must_use]
    pub fn is_creatable(&self) -> bool {
        self.filename.is_some() && self.content.is_some()
    }
}

impl FromJson for File {
    fn from_json(value: &serde_json::Value) -> Option<Self> {
        // Both fields are optional on the wire; display code checks filename.
        Some(Self {
            filename: value
                .get("filename")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            raw_url: value
                .get("raw_url")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            content: None,
        })
    }
}

/// A hosted multi-file text snippet with metadata.
///
/// Identity is the `id` field; every other field is optional on the wire
/// and tolerated when absent. A gist is immutable once decoded and is only
/// ever replaced wholesale by a refresh or a cache load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gist {
    /// Unique identifier assigned by the remote service.
    pub id: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Login of the owning user, if present.
    pub owner_login: Option<String>,
    /// Avatar URL of the owning user, if present.
    pub owner_avatar_url: Option<String>,
    /// The gist's files, ordered by filename.
    pub files: Vec<File>,
    /// Whether the gist is publicly visible.
    pub public: bool,
}

impl FromJson for Gist {
    fn from_json(value: &serde_json::Value) -> Option<Self> {
        // `id` is the only required field; everything else degrades to None.
        let id = value.get("id")?.as_str()?.to_string();

        let mut files: Vec<File> = value
            .get("files")
            .and_then(|v| v.as_object())
            .map(|map| map.values().filter_map(File::from_json).collect())
            .unwrap_or_default();
        // JSON object order is parser-dependent; sort for a stable sequence.
        files.sort_by(|a, b| a.filename.cmp(&b.filename));

        Some(Self {
            id,
            description: value
                .get("description")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            owner_login: value
                .pointer("/owner/login")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            owner_avatar_url: value
                .pointer("/owner/avatar_url")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            files,
            public: value.get("public").and_then(|v| v.as_bool()).unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_gist_json() -> serde_json::Value {
        serde_json::json!({
            "id": "aa5a315d61ae9438b18d",
            "description": "Hello World Examples",
            "public": true,
            "owner": {
                "login": "octocat",
                "avatar_url": "https://example.com/octocat.png"
            },
            "files": {
                "hello.rb": {
                    "filename": "hello.rb",
                    "raw_url": "https://example.com/raw/hello.rb"
                },
                "goodbye.rb": {
                    "filename": "goodbye.rb",
                    "raw_url": "https://example.com/raw/goodbye.rb"
                }
            }
        })
    }

    #[test]
    fn gist_from_json_reads_all_fields() {
        let gist = Gist::from_json(&sample_gist_json()).expect("valid gist");

        assert_eq!(gist.id, "aa5a315d61ae9438b18d");
        assert_eq!(gist.description.as_deref(), Some("Hello World Examples"));
        assert_eq!(gist.owner_login.as_deref(), Some("octocat"));
        assert_eq!(
            gist.owner_avatar_url.as_deref(),
            Some("https://example.com/octocat.png")
        );
        assert!(gist.public);
    }

    #[test]
    fn gist_files_are_ordered_by_filename() {
        let gist = Gist::from_json(&sample_gist_json()).expect("valid gist");

        let names: Vec<_> = gist
            .files
            .iter()
            .map(|f| f.filename.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["goodbye.rb", "hello.rb"]);
    }

    #[test]
    fn gist_without_id_fails_to_construct() {
        let value = serde_json::json!({ "description": "no id here" });
        assert!(Gist::from_json(&value).is_none());
    }

    #[test]
    fn gist_tolerates_missing_optional_fields() {
        let value = serde_json::json!({ "id": "abc123" });
        let gist = Gist::from_json(&value).expect("id alone is enough");

        assert_eq!(gist.id, "abc123");
        assert!(gist.description.is_none());
        assert!(gist.owner_login.is_none());
        assert!(gist.files.is_empty());
        assert!(!gist.public);
    }

    #[test]
    fn gist_tolerates_null_description() {
        let value = serde_json::json!({ "id": "abc123", "description": null });
        let gist = Gist::from_json(&value).expect("valid gist");
        assert!(gist.description.is_none());
    }

    #[test]
    fn file_from_json_never_carries_content() {
        let value = serde_json::json!({
            "filename": "hello.rb",
            "raw_url": "https://example.com/raw",
            "content": "should be ignored on this path"
        });
        let file = File::from_json(&value).expect("valid file");

        assert_eq!(file.filename.as_deref(), Some("hello.rb"));
        assert_eq!(file.raw_url.as_deref(), Some("https://example.com/raw"));
        assert!(file.content.is_none());
    }

    #[test]
    fn authored_file_is_creatable() {
        assert!(File::authored("a.txt", "content").is_creatable());
        assert!(!File::default().is_creatable());
        assert!(
            !File {
                filename: Some("a.txt".into()),
                ..File::default()
            }
            .is_creatable()
        );
    }

    #[test]
    fn gist_serde_roundtrip_preserves_fields() {
        let gist = Gist::from_json(&sample_gist_json()).expect("valid gist");
        let encoded = serde_json::to_string(&gist).expect("serialize");
        let decoded: Gist = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded, gist);
    }
}

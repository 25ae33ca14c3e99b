use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

// ─── Files ────────────────────────────────────────────────────────

/// One file's text and whether it is shown in navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FileEntryRepr")]
pub struct FileEntry {
    pub content: String,
    pub hidden: bool,
}

impl FileEntry {
    pub fn visible(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            hidden: false,
        }
    }

    pub fn hidden(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            hidden: true,
        }
    }
}

/// Accepted on-disk shapes. Older collections stored either the bare source
/// text or a `{ code, hidden }` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum FileEntryRepr {
    Text(String),
    Full {
        #[serde(alias = "code")]
        content: String,
        #[serde(default)]
        hidden: bool,
    },
}

impl From<FileEntryRepr> for FileEntry {
    fn from(repr: FileEntryRepr) -> Self {
        match repr {
            FileEntryRepr::Text(content) => Self::visible(content),
            FileEntryRepr::Full { content, hidden } => Self { content, hidden },
        }
    }
}

/// Absolute path → file. Iteration order is lexicographic by path; callers
/// must not attach meaning to it.
pub type FileMap = BTreeMap<String, FileEntry>;

// ─── Projects ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    /// Opaque, immutable after creation.
    pub id: String,
    pub name: String,
    pub files: FileMap,
    /// Set at each successful commit; never moves backwards.
    pub updated_at: DateTime<Utc>,
}

impl ProjectRecord {
    pub fn visible_file_count(&self) -> usize {
        self.files.values().filter(|f| !f.hidden).count()
    }
}

/// Every persisted project keyed by id, in insertion order.
///
/// Serialized as a JSON object `{ id: record }`. Order is kept so that
/// recency ties resolve by creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectCollection {
    records: Vec<ProjectRecord>,
}

impl ProjectCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ProjectRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Replace the record with the same id in place, or append it.
    pub fn upsert(&mut self, record: ProjectRecord) {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => *slot = record,
            None => self.records.push(record),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<ProjectRecord> {
        let idx = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProjectRecord> {
        self.records.iter()
    }

    /// Snapshot sorted by `updated_at` descending. The sort is stable, so
    /// equal timestamps keep insertion order.
    pub fn by_recency(&self) -> Vec<ProjectRecord> {
        let mut sorted = self.records.clone();
        sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sorted
    }
}

impl Serialize for ProjectCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&record.id, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ProjectCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CollectionVisitor;

        impl<'de> Visitor<'de> for CollectionVisitor {
            type Value = ProjectCollection;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of project id to project record")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut collection = ProjectCollection::new();
                while let Some((key, mut record)) = access.next_entry::<String, ProjectRecord>()? {
                    // The map key is what lookups go through.
                    record.id = key;
                    collection.upsert(record);
                }
                Ok(collection)
            }
        }

        deserializer.deserialize_map(CollectionVisitor)
    }
}

// ─── Theme ────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(ValidationError::UnknownTheme(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .expect("valid RFC3339")
            .with_timezone(&Utc)
    }

    fn record(id: &str, updated_at: &str) -> ProjectRecord {
        ProjectRecord {
            id: id.to_string(),
            name: format!("project {id}"),
            files: FileMap::from([("/App.js".to_string(), FileEntry::visible("x"))]),
            updated_at: ts(updated_at),
        }
    }

    #[test]
    fn file_entry_accepts_legacy_shapes() {
        let bare: FileEntry = serde_json::from_str(r#""console.log(1)""#).expect("bare");
        assert_eq!(bare, FileEntry::visible("console.log(1)"));

        let code: FileEntry =
            serde_json::from_str(r#"{"code":"a","hidden":true}"#).expect("code");
        assert_eq!(code, FileEntry::hidden("a"));

        let content: FileEntry = serde_json::from_str(r#"{"content":"b"}"#).expect("content");
        assert_eq!(content, FileEntry::visible("b"));
    }

    #[test]
    fn file_entry_serializes_canonical_shape() {
        let json = serde_json::to_value(FileEntry::hidden("a")).expect("serialize");
        assert_eq!(json, serde_json::json!({ "content": "a", "hidden": true }));
    }

    #[test]
    fn record_uses_camel_case_timestamp() {
        let json = serde_json::to_value(record("p1", "2026-02-25T12:00:00Z")).expect("ser");
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("updated_at").is_none());
    }

    #[test]
    fn collection_round_trip_keeps_insertion_order() {
        let mut c = ProjectCollection::new();
        c.upsert(record("zeta", "2026-02-25T12:00:00Z"));
        c.upsert(record("alpha", "2026-02-25T12:00:00Z"));

        let json = serde_json::to_string(&c).expect("ser");
        let back: ProjectCollection = serde_json::from_str(&json).expect("de");
        let ids: Vec<&str> = back.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
    }

    #[test]
    fn collection_key_wins_over_embedded_id() {
        let json = serde_json::json!({
            "real": {
                "id": "stale",
                "name": "n",
                "files": { "/a.js": "x" },
                "updatedAt": "2026-02-25T12:00:00Z"
            }
        });
        let c: ProjectCollection = serde_json::from_value(json).expect("de");
        assert!(c.contains("real"));
        assert!(!c.contains("stale"));
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut c = ProjectCollection::new();
        c.upsert(record("a", "2026-02-25T12:00:00Z"));
        c.upsert(record("b", "2026-02-25T12:00:00Z"));
        let mut changed = record("a", "2026-02-25T13:00:00Z");
        changed.name = "renamed".to_string();
        c.upsert(changed);

        assert_eq!(c.len(), 2);
        assert_eq!(c.iter().next().map(|r| r.name.as_str()), Some("renamed"));
    }

    #[test]
    fn by_recency_sorts_descending_with_stable_ties() {
        let mut c = ProjectCollection::new();
        c.upsert(record("old", "2026-02-25T10:00:00Z"));
        c.upsert(record("tie-first", "2026-02-25T12:00:00Z"));
        c.upsert(record("tie-second", "2026-02-25T12:00:00Z"));
        c.upsert(record("new", "2026-02-25T14:00:00Z"));

        let ids: Vec<String> = c.by_recency().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["new", "tie-first", "tie-second", "old"]);
    }

    #[test]
    fn theme_parse_and_toggle() {
        assert_eq!("Dark".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!(" light ".parse::<Theme>(), Ok(Theme::Light));
        assert!("blue".parse::<Theme>().is_err());
        assert_eq!(Theme::Light.toggle(), Theme::Dark);
        assert_eq!(Theme::default(), Theme::Dark);
        assert_eq!(
            serde_json::to_value(Theme::Light).expect("ser"),
            serde_json::json!("light")
        );
    }
}

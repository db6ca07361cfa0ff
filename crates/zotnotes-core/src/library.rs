//! Typed view of a Better-BibTeX JSON library export.
//!
//! Only the fields the pipeline inspects are modeled explicitly; everything
//! else the exporter emits is preserved in a flattened map so template
//! substitution can reach arbitrary `{{field}}` placeholders.

use chrono::{DateTime, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The whole export: `{ "items": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub items: Vec<ReferenceEntry>,
}

impl Library {
    /// Find an entry by citation key.
    pub fn entry(&self, citation_key: &str) -> Option<&ReferenceEntry> {
        self.items
            .iter()
            .find(|e| e.citation_key == citation_key)
    }
}

/// One bibliographic item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceEntry {
    pub citation_key: String,
    #[serde(rename = "itemID")]
    pub item_id: Option<i64>,
    pub item_key: String,
    pub item_type: String,
    pub title: String,
    pub date: String,
    pub date_modified: String,
    pub publication_title: String,
    #[serde(deserialize_with = "stringly")]
    pub volume: String,
    #[serde(deserialize_with = "stringly")]
    pub issue: String,
    #[serde(deserialize_with = "stringly")]
    pub pages: String,
    /// `zotero://select/...` link into the local library
    pub select: String,
    pub creators: Vec<crate::models::Creator>,
    pub notes: Vec<NoteExport>,
    pub attachments: Vec<Attachment>,
    pub tags: Vec<ItemTag>,
    /// Every other exported field, kept verbatim for template substitution
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One exported note blob attached to an entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteExport {
    pub note: String,
    pub date_modified: String,
}

/// One attachment (PDF, snapshot, ...) of an entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Attachment {
    pub item_type: String,
    pub title: String,
    pub path: String,
}

/// One library tag of an entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemTag {
    pub tag: String,
}

lazy_static! {
    static ref YEAR: Regex = Regex::new(r"\d{4}").unwrap();
}

impl ReferenceEntry {
    /// Publication year extracted from the free-form date field.
    pub fn year(&self) -> String {
        YEAR.find(&self.date)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    /// Most recent modification across the entry and all of its notes.
    /// Entries whose timestamps cannot be parsed report `None` and are
    /// treated as always-modified by the batch update.
    pub fn latest_modification(&self) -> Option<DateTime<Utc>> {
        std::iter::once(self.date_modified.as_str())
            .chain(self.notes.iter().map(|n| n.date_modified.as_str()))
            .filter_map(parse_export_timestamp)
            .max()
    }

    /// All scalar fields of the entry as `(name, value)` pairs, typed fields
    /// first, then everything preserved in `extra`. Array- and object-valued
    /// extras are skipped; they have dedicated placeholders.
    pub fn scalar_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("citationKey".to_string(), self.citation_key.clone()),
            ("itemKey".to_string(), self.item_key.clone()),
            ("itemType".to_string(), self.item_type.clone()),
            ("title".to_string(), self.title.clone()),
            ("date".to_string(), self.date.clone()),
            ("publicationTitle".to_string(), self.publication_title.clone()),
            ("volume".to_string(), self.volume.clone()),
            ("issue".to_string(), self.issue.clone()),
            ("pages".to_string(), self.pages.clone()),
            ("select".to_string(), self.select.clone()),
        ];
        if let Some(id) = self.item_id {
            fields.push(("itemID".to_string(), id.to_string()));
        }
        for (key, value) in &self.extra {
            match value {
                Value::Array(_) | Value::Object(_) => continue,
                _ => fields.push((key.clone(), scalar_to_string(value))),
            }
        }
        fields
    }
}

/// Parse the timestamps Better BibTeX writes: RFC 3339 or the legacy
/// `YYYY-MM-DD HH:MM:SS` form.
pub fn parse_export_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Render a JSON scalar the way it should appear in a note.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Accept strings and numbers for fields different Zotero versions export
/// with different types.
fn stringly<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(&value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"{
        "items": [{
            "citationKey": "smith2020",
            "itemID": 42,
            "itemType": "journalArticle",
            "title": "On Things",
            "date": "March 2020",
            "dateModified": "2021-09-09T08:12:42Z",
            "publicationTitle": "Journal of Things",
            "volume": 7,
            "issue": "2",
            "pages": "11-28",
            "DOI": "10.1000/thing",
            "creators": [
                {"creatorType": "author", "firstName": "Ada", "lastName": "Smith"}
            ],
            "notes": [{"note": "<p>text</p>", "dateModified": "2022-01-01 10:00:00"}],
            "attachments": [{"itemType": "attachment", "title": "PDF", "path": "/z/Zotero/storage/K/p.pdf"}],
            "tags": [{"tag": "ontology"}]
        }]
    }"#;

    #[test]
    fn test_parse_export() {
        let library: Library = serde_json::from_str(EXPORT).unwrap();
        let entry = library.entry("smith2020").unwrap();
        assert_eq!(entry.item_id, Some(42));
        assert_eq!(entry.volume, "7");
        assert_eq!(entry.year(), "2020");
        assert_eq!(entry.tags[0].tag, "ontology");
        // unknown fields land in the flattened map
        assert_eq!(
            entry.extra.get("DOI").and_then(|v| v.as_str()),
            Some("10.1000/thing")
        );
    }

    #[test]
    fn test_latest_modification_prefers_note() {
        let library: Library = serde_json::from_str(EXPORT).unwrap();
        let entry = library.entry("smith2020").unwrap();
        let latest = entry.latest_modification().unwrap();
        assert_eq!(latest, parse_export_timestamp("2022-01-01 10:00:00").unwrap());
    }

    #[test]
    fn test_scalar_fields_include_extras() {
        let library: Library = serde_json::from_str(EXPORT).unwrap();
        let entry = library.entry("smith2020").unwrap();
        let fields = entry.scalar_fields();
        assert!(fields.iter().any(|(k, v)| k == "DOI" && v == "10.1000/thing"));
        assert!(fields.iter().any(|(k, v)| k == "volume" && v == "7"));
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_export_timestamp("2021-09-09T08:12:42Z").is_some());
        assert!(parse_export_timestamp("2021-09-09 08:12:42").is_some());
        assert!(parse_export_timestamp("last tuesday").is_none());
    }
}

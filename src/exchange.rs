//! JSON export/import of the assessment state.
//!
//! The current format is `{comments, sources, version: "2.0", exportDate}`. Files
//! written before sources existed hold only the bare comment map; those still
//! import, with an empty source list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::model::{CommentMap, MAX_RATING, Source, source_id};

pub const FORMAT_VERSION: &str = "2.0";

#[derive(Serialize)]
struct ExportFile<'a> {
    comments: &'a CommentMap,
    sources: &'a [Source],
    version: &'static str,
    #[serde(rename = "exportDate")]
    export_date: DateTime<Utc>,
}

#[derive(Deserialize)]
struct VersionedFile {
    #[serde(default)]
    comments: CommentMap,
    #[serde(default)]
    sources: Vec<Source>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Imported {
    pub comments: CommentMap,
    pub sources: Vec<Source>,
    /// True when the input was a bare comment map.
    pub legacy: bool,
}

pub fn export_json(comments: &CommentMap, sources: &[Source], export_date: DateTime<Utc>) -> Result<String, Error> {
    let file = ExportFile {
        comments,
        sources,
        version: FORMAT_VERSION,
        export_date,
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

pub fn import_json(text: &str) -> Result<Imported, Error> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| Error::InvalidImport(format!("not JSON: {e}")))?;
    let Value::Object(object) = &value else {
        return Err(Error::InvalidImport("top level must be an object".into()));
    };

    let version = object.get("version").cloned();
    let keys = object.len();

    let imported = match version {
        None => {
            log::debug!("Importing legacy comment map ({keys} keys)");
            let comments: CommentMap = serde_json::from_value(value)
                .map_err(|e| Error::InvalidImport(format!("legacy comment map: {e}")))?;
            Imported {
                comments,
                sources: Vec::new(),
                legacy: true,
            }
        }
        Some(Value::String(v)) if v == FORMAT_VERSION => {
            let file: VersionedFile = serde_json::from_value(value)
                .map_err(|e| Error::InvalidImport(e.to_string()))?;
            Imported {
                comments: file.comments,
                sources: file.sources,
                legacy: false,
            }
        }
        Some(other) => {
            return Err(Error::InvalidImport(format!("unsupported version {other}")));
        }
    };

    if let Some((key, rating)) = imported
        .comments
        .iter()
        .find_map(|(k, c)| c.rating.filter(|&r| r > MAX_RATING).map(|r| (k, r)))
    {
        return Err(Error::InvalidImport(format!("rating {rating} at {key} is outside 0..=5")));
    }
    for (i, source) in imported.sources.iter().enumerate() {
        if source.id != source_id(i + 1) {
            return Err(Error::InvalidImport(format!(
                "source ids must run 004.1..004.{}, found {} at position {}",
                imported.sources.len(),
                source.id,
                i + 1
            )));
        }
    }
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_objects_and_unknown_versions() {
        assert!(matches!(import_json("[1,2]"), Err(Error::InvalidImport(_))));
        assert!(matches!(import_json("nope"), Err(Error::InvalidImport(_))));
        assert!(matches!(
            import_json(r#"{"version":"3.0","comments":{}}"#),
            Err(Error::InvalidImport(_))
        ));
        assert!(matches!(
            import_json(r#"{"version":2,"comments":{}}"#),
            Err(Error::InvalidImport(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_ratings() {
        let text = r#"{"L1-001.1":{"title":"","content":"","images":[],"rating":9}}"#;
        assert!(matches!(import_json(text), Err(Error::InvalidImport(_))));
    }

    #[test]
    fn rejects_gapped_source_ids() {
        let text = r#"{"version":"2.0","comments":{},"sources":[
            {"id":"004.2","title":"a","createdAt":"2024-01-01T00:00:00Z"}]}"#;
        assert!(matches!(import_json(text), Err(Error::InvalidImport(_))));
    }

    #[test]
    fn legacy_comment_fields_may_be_missing() {
        let imported = import_json(r#"{"L2-003.1":{"content":"x"}}"#).unwrap();
        assert!(imported.legacy);
        assert_eq!(imported.comments["L2-003.1"].content, "x");
        assert!(imported.comments["L2-003.1"].rating.is_none());
    }
}

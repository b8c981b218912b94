use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Primary element id under which user-defined sources are numbered.
pub const SOURCE_PRIMARY_ID: &str = "004";
/// Fixed sub-cells every source contributes.
pub const SOURCE_SUB_CELLS: usize = 4;
pub const MAX_RATING: u8 = 5;

/// Sparse map from cell identifier to its comment.
pub type CommentMap = BTreeMap<String, Comment>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    /// Base64 payload, optionally prefixed with a `data:image/...;base64,` header.
    pub data: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub title: String,
    pub content: String,
    pub images: Vec<ImageAttachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl Comment {
    /// True when the cell holds anything worth rendering. The layer renderer
    /// and the comment renderer both gate on this.
    pub fn has_content(&self) -> bool {
        !self.title.trim().is_empty()
            || !self.content.trim().is_empty()
            || !self.images.is_empty()
            || self.rating.is_some()
    }
}

/// Convenience for call sites holding an optional map lookup.
pub fn has_content(comment: Option<&Comment>) -> bool {
    comment.is_some_and(Comment::has_content)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub title: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

pub fn cell_id(layer_id: &str, primary_id: &str, secondary_index: usize) -> String {
    format!("{layer_id}-{primary_id}.{secondary_index}")
}

pub fn source_id(ordinal: usize) -> String {
    format!("{SOURCE_PRIMARY_ID}.{ordinal}")
}

pub fn source_cell_id(source_id: &str, sub_index: usize) -> String {
    format!("{source_id}.{sub_index}")
}

/// Ordinal `N` of a `004.N` source id.
pub fn source_ordinal(id: &str) -> Option<usize> {
    let rest = id.strip_prefix(SOURCE_PRIMARY_ID)?.strip_prefix('.')?;
    rest.parse().ok().filter(|&n| n > 0)
}

/// Splits a `004.N.S` comment key into `(N, S)`.
pub fn parse_source_cell(key: &str) -> Option<(usize, usize)> {
    let rest = key.strip_prefix(SOURCE_PRIMARY_ID)?.strip_prefix('.')?;
    let (ordinal, sub) = rest.split_once('.')?;
    let ordinal: usize = ordinal.parse().ok()?;
    let sub: usize = sub.parse().ok()?;
    (ordinal > 0 && (1..=SOURCE_SUB_CELLS).contains(&sub)).then_some((ordinal, sub))
}

/// Everything one report generation reads. Built once per invocation and never
/// written back.
#[derive(Clone, Debug)]
pub struct ReportContext {
    pub title: Option<String>,
    pub author: Option<String>,
    pub language: String,
    pub comments: CommentMap,
    pub sources: Vec<Source>,
    pub generated_at: DateTime<Local>,
}

impl ReportContext {
    pub fn new(comments: CommentMap, sources: Vec<Source>) -> Self {
        Self {
            title: None,
            author: None,
            language: "pl".to_string(),
            comments,
            sources,
            generated_at: Local::now(),
        }
    }

    pub(crate) fn title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub(crate) fn author(&self) -> Option<&str> {
        self.author.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub(crate) fn comment_count(&self) -> usize {
        self.comments.values().filter(|c| c.has_content()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_content_requires_some_field() {
        assert!(!Comment::default().has_content());
        assert!(
            !Comment {
                title: "   ".into(),
                ..Default::default()
            }
            .has_content()
        );
        assert!(
            Comment {
                rating: Some(0),
                ..Default::default()
            }
            .has_content()
        );
        assert!(
            Comment {
                images: vec![ImageAttachment {
                    data: String::new(),
                    name: "a.png".into()
                }],
                ..Default::default()
            }
            .has_content()
        );
        assert!(!has_content(None));
    }

    #[test]
    fn source_keys_parse() {
        assert_eq!(source_ordinal("004.3"), Some(3));
        assert_eq!(source_ordinal("004.0"), None);
        assert_eq!(source_ordinal("003.1"), None);
        assert_eq!(parse_source_cell("004.2.4"), Some((2, 4)));
        assert_eq!(parse_source_cell("004.2.5"), None);
        assert_eq!(parse_source_cell("L1-001.1"), None);
        assert_eq!(cell_id("L1", "001", 6), "L1-001.6");
        assert_eq!(source_cell_id(&source_id(2), 1), "004.2.1");
    }
}

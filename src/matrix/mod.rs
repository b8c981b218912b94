mod ratings;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::i18n::Language;
use crate::model::{CommentMap, SOURCE_PRIMARY_ID};

pub use ratings::rating_description;

/// Static layers → primary elements → secondary elements tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatrixDefinition {
    pub layers: Vec<LayerDef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerDef {
    pub id: String,
    pub primaries: Vec<PrimaryDef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrimaryDef {
    pub id: String,
    /// Ordered secondary element ids (`"001.1"`, `"001.2"`, ...). Empty for the
    /// source primary element, whose cells come from the source list.
    #[serde(default)]
    pub secondaries: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerVariant {
    /// Radar charts for fully rated primaries, then per-cell content.
    RadarCharts,
    Plain,
    Sources,
}

/// Renderer variant for a layer id; `None` for ids the renderer does not know.
pub fn layer_variant(layer_id: &str) -> Option<LayerVariant> {
    match layer_id {
        "L1" => Some(LayerVariant::RadarCharts),
        "L2" => Some(LayerVariant::Plain),
        "L3" => Some(LayerVariant::Sources),
        _ => None,
    }
}

impl LayerDef {
    /// Comment key of a secondary element within this layer.
    pub fn cell_key(&self, secondary_id: &str) -> String {
        format!("{}-{}", self.id, secondary_id)
    }
}

impl PrimaryDef {
    fn new(id: &str, count: usize) -> Self {
        Self {
            id: id.to_string(),
            secondaries: (1..=count).map(|i| format!("{id}.{i}")).collect(),
        }
    }
}

impl Default for MatrixDefinition {
    fn default() -> Self {
        Self {
            layers: vec![
                LayerDef {
                    id: "L1".into(),
                    primaries: vec![PrimaryDef::new("001", 6), PrimaryDef::new("002", 4)],
                },
                LayerDef {
                    id: "L2".into(),
                    primaries: vec![PrimaryDef::new("003", 5)],
                },
                LayerDef {
                    id: "L3".into(),
                    primaries: vec![PrimaryDef::new(SOURCE_PRIMARY_ID, 0)],
                },
            ],
        }
    }
}

impl MatrixDefinition {
    /// Built-in definition, or the JSON file named by `CREDIBILITY_MATRIX`.
    pub fn from_env() -> Result<Self, Error> {
        match std::env::var("CREDIBILITY_MATRIX") {
            Ok(path) if !path.trim().is_empty() => {
                log::info!("Loading matrix definition from {path}");
                Self::load(Path::new(path.trim()))
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        let def: MatrixDefinition = serde_json::from_str(&text)?;
        if def.layers.is_empty() {
            return Err(Error::Pdf(format!(
                "matrix definition {} has no layers",
                path.display()
            )));
        }
        Ok(def)
    }

    pub fn primary(&self, primary_id: &str) -> Option<(&LayerDef, &PrimaryDef)> {
        self.layers.iter().find_map(|layer| {
            layer
                .primaries
                .iter()
                .find(|p| p.id == primary_id)
                .map(|p| (layer, p))
        })
    }

    /// Whether `key` names a fixed secondary-element cell (`L1-001.1`).
    pub fn has_cell(&self, key: &str) -> bool {
        self.layers.iter().any(|layer| {
            layer
                .primaries
                .iter()
                .flat_map(|p| &p.secondaries)
                .any(|sid| layer.cell_key(sid) == key)
        })
    }
}

/// Ratings of every secondary element of `primary`, in order, or `None` when any
/// of them is unrated.
pub fn complete_ratings(layer: &LayerDef, primary: &PrimaryDef, comments: &CommentMap) -> Option<Vec<u8>> {
    if primary.secondaries.is_empty() {
        return None;
    }
    primary
        .secondaries
        .iter()
        .map(|sid| comments.get(&layer.cell_key(sid)).and_then(|c| c.rating))
        .collect()
}

pub fn chart_eligible(layer: &LayerDef, primary: &PrimaryDef, comments: &CommentMap) -> bool {
    complete_ratings(layer, primary, comments).is_some()
}

// (id, polish, english)
const NAMES: &[(&str, &str, &str)] = &[
    ("L1", "Warstwa I: Informacja", "Layer I: Information"),
    ("L2", "Warstwa II: Kontekst rozpowszechniania", "Layer II: Dissemination context"),
    ("L3", "Warstwa III: Źródła", "Layer III: Sources"),
    ("001", "Ocena treści", "Content assessment"),
    ("001.1", "Spójność wewnętrzna", "Internal consistency"),
    ("001.2", "Precyzja i szczegółowość", "Precision and detail"),
    ("001.3", "Weryfikowalność", "Verifiability"),
    ("001.4", "Aktualność", "Timeliness"),
    ("001.5", "Neutralność języka", "Neutrality of language"),
    ("001.6", "Kompletność", "Completeness"),
    ("002", "Ocena kontekstu", "Context assessment"),
    ("002.1", "Cel publikacji", "Purpose of publication"),
    ("002.2", "Okoliczności publikacji", "Circumstances of publication"),
    ("002.3", "Potwierdzenie w innych źródłach", "Corroboration by other sources"),
    ("002.4", "Prawdopodobieństwo", "Plausibility"),
    ("003", "Kanał dystrybucji", "Distribution channel"),
    ("003.1", "Rodzaj kanału", "Channel type"),
    ("003.2", "Zasięg", "Reach"),
    ("003.3", "Reakcje odbiorców", "Audience reactions"),
    ("003.4", "Wzorce wzmacniania", "Amplification patterns"),
    ("003.5", "Powiązania kanału", "Channel affiliations"),
    ("004", "Ocena źródeł", "Source assessment"),
    ("source.1", "Wiarygodność źródła", "Source reliability"),
    ("source.2", "Dostęp do informacji", "Access to information"),
    ("source.3", "Motywacja źródła", "Source motivation"),
    ("source.4", "Dotychczasowa historia", "Track record"),
];

/// Display name of a layer, primary or secondary element. Unknown ids display
/// as themselves.
pub fn element_name(lang: Language, id: &str) -> &str {
    NAMES
        .iter()
        .find(|(k, _, _)| *k == id)
        .map(|&(_, pl, en)| match lang {
            Language::Pl => pl,
            Language::En => en,
        })
        .unwrap_or(id)
}

/// Display name of the `sub_index`-th cell every source carries.
pub fn source_cell_name(lang: Language, sub_index: usize) -> &'static str {
    let key = format!("source.{sub_index}");
    NAMES
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|&(_, pl, en)| match lang {
            Language::Pl => pl,
            Language::En => en,
        })
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Comment;

    fn rated(keys: &[&str]) -> CommentMap {
        keys.iter()
            .map(|k| {
                (
                    k.to_string(),
                    Comment {
                        rating: Some(3),
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn default_shape() {
        let def = MatrixDefinition::default();
        let ids: Vec<&str> = def.layers.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["L1", "L2", "L3"]);
        assert_eq!(def.primary("001").unwrap().1.secondaries.len(), 6);
        assert_eq!(def.primary("002").unwrap().1.secondaries.len(), 4);
        assert_eq!(layer_variant("L4"), None);
    }

    #[test]
    fn eligibility_needs_every_rating() {
        let def = MatrixDefinition::default();
        let (layer, p001) = def.primary("001").unwrap();
        let keys = ["L1-001.1", "L1-001.2", "L1-001.3", "L1-001.4", "L1-001.5", "L1-001.6"];
        let mut comments = rated(&keys);
        assert!(chart_eligible(layer, p001, &comments));
        assert_eq!(complete_ratings(layer, p001, &comments), Some(vec![3; 6]));

        for key in keys {
            let mut partial = comments.clone();
            partial.get_mut(key).unwrap().rating = None;
            assert!(!chart_eligible(layer, p001, &partial), "{key} removed");
        }

        comments.remove("L1-001.6");
        assert!(!chart_eligible(layer, p001, &comments));
    }

    #[test]
    fn names_fall_back_to_id() {
        assert_eq!(element_name(Language::En, "001.3"), "Verifiability");
        assert_eq!(element_name(Language::Pl, "999"), "999");
        assert_eq!(source_cell_name(Language::En, 4), "Track record");
        assert_eq!(source_cell_name(Language::En, 7), "");
    }
}

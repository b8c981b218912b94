use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Pl,
    En,
}

impl Language {
    /// Map a free-form language tag onto a supported language. Anything that is
    /// not recognisably English falls back to Polish.
    pub fn normalize(tag: &str) -> Language {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Language::En,
            _ => Language::Pl,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Language::Pl => "pl",
            Language::En => "en",
        }
    }
}

// (key, polish, english)
const STRINGS: &[(&str, &str, &str)] = &[
    (
        "report.defaultTitle",
        "Matryca oceny wiarygodności informacji - raport",
        "Information credibility assessment matrix - report",
    ),
    ("report.generatedAt", "Wygenerowano", "Generated"),
    ("report.author", "Autor", "Author"),
    ("report.reportTitle", "Tytuł raportu", "Report title"),
    ("report.commentCount", "Liczba komentarzy", "Number of comments"),
    ("report.sourceCount", "Liczba źródeł", "Number of sources"),
    ("report.page", "Strona", "Page"),
    ("report.primaryElement", "Element pierwszorzędny", "Primary element"),
    ("report.secondaryElement", "Element drugorzędny", "Secondary element"),
    ("report.rating", "Ocena", "Rating"),
    ("report.title", "Tytuł", "Title"),
    ("report.content", "Treść", "Content"),
    ("report.imageError", "Nie udało się osadzić obrazu", "Could not embed image"),
    ("report.source", "Źródło", "Source"),
    ("report.untitledSource", "(bez tytułu)", "(untitled)"),
    ("report.chartCaption", "Profil ocen", "Rating profile"),
];

/// Localized display text for `key`; unknown keys are returned unchanged.
pub fn t(lang: Language, key: &str) -> &str {
    STRINGS
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|&(_, pl, en)| match lang {
            Language::Pl => pl,
            Language::En => en,
        })
        .unwrap_or(key)
}

use crate::i18n::Language;
use crate::model::MAX_RATING;

type Scale = [&'static str; 6];

// (element id, polish scale, english scale), indexed by rating 0..=5
const SCALES: &[(&str, Scale, Scale)] = &[
    (
        "001.1",
        ["Nie do oceny", "Sprzeczna w całości", "Poważne sprzeczności", "Częściowe niespójności", "Drobne niespójności", "W pełni spójna"],
        ["Not assessable", "Contradictory throughout", "Major contradictions", "Some inconsistencies", "Minor inconsistencies", "Fully consistent"],
    ),
    (
        "001.2",
        ["Nie do oceny", "Ogólnikowa", "Nieliczne konkrety", "Częściowo konkretna", "Przeważnie konkretna", "Precyzyjna i szczegółowa"],
        ["Not assessable", "Vague and general", "Few concrete details", "Partly specific", "Mostly specific", "Precise and detailed"],
    ),
    (
        "001.3",
        ["Nie do oceny", "Niemożliwa do weryfikacji", "Trudna do weryfikacji", "Częściowo weryfikowalna", "Przeważnie weryfikowalna", "W pełni weryfikowalna"],
        ["Not assessable", "Cannot be verified", "Hard to verify", "Partly verifiable", "Mostly verifiable", "Fully verifiable"],
    ),
    (
        "001.4",
        ["Nie do oceny", "Nieaktualna", "W dużej mierze nieaktualna", "Częściowo aktualna", "Przeważnie aktualna", "W pełni aktualna"],
        ["Not assessable", "Outdated", "Largely outdated", "Partly current", "Mostly current", "Fully current"],
    ),
    (
        "001.5",
        ["Nie do oceny", "Manipulacyjny", "Silnie emocjonalny", "Wyraźnie stronniczy", "Przeważnie neutralny", "Neutralny"],
        ["Not assessable", "Manipulative", "Strongly emotional", "Noticeably biased", "Mostly neutral", "Neutral"],
    ),
    (
        "001.6",
        ["Nie do oceny", "Fragmentaryczna", "Brak kluczowych elementów", "Częściowo kompletna", "Przeważnie kompletna", "Kompletna"],
        ["Not assessable", "Fragmentary", "Key elements missing", "Partly complete", "Mostly complete", "Complete"],
    ),
    (
        "002.1",
        ["Nie do oceny", "Celowa dezinformacja", "Propaganda lub manipulacja", "Perswazja", "Komentarz", "Informowanie"],
        ["Not assessable", "Deliberate disinformation", "Propaganda or manipulation", "Persuasion", "Commentary", "Informing"],
    ),
    (
        "002.2",
        ["Nie do oceny", "Wysoce podejrzane", "Podejrzane", "Niejasne", "Przeważnie przejrzyste", "Przejrzyste"],
        ["Not assessable", "Highly suspicious", "Suspicious", "Unclear", "Mostly transparent", "Transparent"],
    ),
    (
        "002.3",
        ["Nie do oceny", "Zaprzeczona przez inne źródła", "Brak potwierdzenia", "Słabe potwierdzenie", "Potwierdzona przez jedno źródło", "Potwierdzona przez kilka niezależnych źródeł"],
        ["Not assessable", "Contradicted by other sources", "No corroboration", "Weak corroboration", "Corroborated by one source", "Corroborated by several independent sources"],
    ),
    (
        "002.4",
        ["Nie do oceny", "Niemożliwa", "Mało prawdopodobna", "Wątpliwa", "Prawdopodobna", "Wysoce prawdopodobna"],
        ["Not assessable", "Impossible", "Improbable", "Doubtful", "Probable", "Highly probable"],
    ),
];

/// Description of `rating` for `element_id`, or an empty string when the element
/// has no rating scale.
pub fn rating_description(lang: Language, element_id: &str, rating: u8) -> &'static str {
    if rating > MAX_RATING {
        return "";
    }
    SCALES
        .iter()
        .find(|(id, _, _)| *id == element_id)
        .map(|(_, pl, en)| match lang {
            Language::Pl => pl[rating as usize],
            Language::En => en[rating as usize],
        })
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptions_follow_the_scale() {
        assert_eq!(rating_description(Language::En, "001.1", 5), "Fully consistent");
        assert_eq!(rating_description(Language::Pl, "002.4", 0), "Nie do oceny");
        assert_eq!(rating_description(Language::En, "003.1", 3), "");
        assert_eq!(rating_description(Language::En, "001.1", 9), "");
    }
}

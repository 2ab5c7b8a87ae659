//! Keyword classification into the category and event-type taxonomies.
//!
//! Each table is an ordered list of rules; the first rule with a matching
//! keyword wins. Keywords are folded (lowercase, no diacritics) and match on
//! whole words, except entries ending in `*` which match any word starting
//! with the stem. Italian and English variants sit side by side.

use crate::models::{Category, EventType};
use crate::normalize;

pub struct KeywordRule<T: 'static> {
    pub value: T,
    pub keywords: &'static [&'static str],
}

/// Declaration order of [`Category`], which is also the tie-break priority.
pub static CATEGORY_RULES: &[KeywordRule<Category>] = &[
    KeywordRule {
        value: Category::Environment,
        keywords: &[
            "clima*", "climat*", "ambient*", "environment*", "ecolog*", "fridays for future",
            "extinction rebellion", "ultima generazione", "sostenibil*", "sustainab*",
            "inquinament*", "pollution", "fossil*", "biodiversit*", "green",
        ],
    },
    KeywordRule {
        value: Category::Lgbtq,
        keywords: &[
            "lgbt*", "pride", "queer", "omofob*", "transfob*", "homophob*", "transphob*",
            "gay", "lesbic*", "lesbian*", "arcigay",
        ],
    },
    KeywordRule {
        value: Category::Labor,
        keywords: &[
            "sindacat*", "lavorator*", "lavoro", "union", "unions", "worker*", "labor",
            "labour", "salari*", "wage*", "cgil", "cobas", "precari*", "licenziament*",
            "sciopero generale", "general strike",
        ],
    },
    KeywordRule {
        value: Category::CivilHumanRights,
        keywords: &[
            "diritti umani", "human rights", "diritti civili", "civil rights", "migrant*",
            "rifugiat*", "refugee*", "accoglienza", "asylum", "carcer*", "prison*",
            "cittadinanza", "citizenship", "liberta di", "freedom of",
        ],
    },
    KeywordRule {
        value: Category::PeaceAntiWar,
        keywords: &[
            "pace", "peace", "guerra", "guerre", "war", "wars", "antimilitar*", "disarm*",
            "palestin*", "gaza", "ucraina", "ukraine", "nato", "armi", "weapons",
            "cessate il fuoco", "ceasefire",
        ],
    },
    KeywordRule {
        value: Category::WomensRights,
        keywords: &[
            "donne", "donna", "women", "femminis*", "feminis*", "non una di meno",
            "violenza di genere", "gender violence", "8 marzo", "aborto", "abortion",
            "parita di genere", "patriarca*",
        ],
    },
    KeywordRule {
        value: Category::RacialSocialJustice,
        keywords: &[
            "razzis*", "racis*", "antirazzis*", "antifascis*", "black lives matter",
            "discriminaz*", "discriminat*", "giustizia sociale", "social justice", "poverta",
            "poverty", "sfratt*", "eviction*", "housing", "diritto all'abitare",
        ],
    },
    KeywordRule {
        value: Category::HealthcareEducation,
        keywords: &[
            "sanita", "sanitari*", "health*", "ospedal*", "hospital*", "scuola", "scuole",
            "school*", "universit*", "student*", "istruzione", "education",
        ],
    },
    KeywordRule {
        value: Category::TransparencyAntiCorruption,
        keywords: &[
            "corruzion*", "corruption", "trasparenz*", "transparency", "mafia", "mafie",
            "antimafia", "legalita", "accountability", "lobby", "evasione fiscale",
            "tax evasion",
        ],
    },
];

/// Specificity order: workshops, then assemblies, then talks, then protests.
pub static EVENT_TYPE_RULES: &[KeywordRule<EventType>] = &[
    KeywordRule {
        value: EventType::Workshop,
        keywords: &["workshop*", "laborator*", "hands-on"],
    },
    KeywordRule {
        value: EventType::Assembly,
        keywords: &["assemblea", "assemblee", "assembly", "assemblies"],
    },
    KeywordRule {
        value: EventType::Talk,
        keywords: &[
            "incontro", "incontri", "conferenz*", "dibattit*", "talk", "talks",
            "presentazion*", "seminari*", "convegn*", "tavola rotonda", "panel",
            "lecture", "debate",
        ],
    },
    KeywordRule {
        value: EventType::Protest,
        keywords: &[
            "manifestazion*", "protest*", "corteo", "cortei", "presidio", "presidi",
            "sciopero", "scioperi", "strike", "march", "marcia", "rally", "flash mob",
            "mobilitazion*", "sit-in", "demonstration*",
        ],
    },
];

pub fn classify_category(title: &str, description: &str) -> Category {
    first_match(CATEGORY_RULES, &haystack(title, description)).unwrap_or(Category::Other)
}

pub fn classify_event_type(title: &str, description: &str) -> EventType {
    first_match(EVENT_TYPE_RULES, &haystack(title, description)).unwrap_or(EventType::Other)
}

pub fn first_match<T: Copy>(rules: &[KeywordRule<T>], folded: &str) -> Option<T> {
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| keyword_matches(folded, kw)))
        .map(|rule| rule.value)
}

fn keyword_matches(folded: &str, keyword: &str) -> bool {
    match keyword.strip_suffix('*') {
        Some(stem) => normalize::contains_word_prefix(folded, stem),
        None => normalize::contains_word(folded, keyword),
    }
}

fn haystack(title: &str, description: &str) -> String {
    normalize::collapse_whitespace(&normalize::fold(&format!("{title} {description}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_italian_and_english() {
        assert_eq!(
            classify_category("Sciopero per il clima", "manifestazione ambientale"),
            Category::Environment
        );
        assert_eq!(classify_category("Pride march", ""), Category::Lgbtq);
        assert_eq!(
            classify_category("Presidio", "per i diritti dei lavoratori della logistica"),
            Category::Labor
        );
        assert_eq!(classify_category("Corteo per Gaza", ""), Category::PeaceAntiWar);
        assert_eq!(
            classify_category("Assemblea", "verso lo sciopero di Non Una Di Meno"),
            Category::WomensRights
        );
        assert_eq!(
            classify_category("Presidio sotto il tribunale", "contro la mafia"),
            Category::TransparencyAntiCorruption
        );
    }

    #[test]
    fn earlier_category_wins_when_several_match() {
        assert_eq!(
            classify_category("Pride per il clima", "giustizia climatica e queer"),
            Category::Environment
        );
        assert_eq!(
            classify_category("Studenti contro la guerra", ""),
            Category::PeaceAntiWar
        );
    }

    #[test]
    fn words_inside_other_words_do_not_match() {
        assert_eq!(classify_category("Una persona capace", "warm welcome"), Category::Other);
    }

    #[test]
    fn event_type_follows_specificity_order() {
        assert_eq!(
            classify_event_type("Workshop durante il corteo", "assemblea finale"),
            EventType::Workshop
        );
        assert_eq!(
            classify_event_type("Assemblea pubblica", "verso il presidio e un incontro"),
            EventType::Assembly
        );
        assert_eq!(
            classify_event_type("Incontro sul presidio", ""),
            EventType::Talk
        );
        assert_eq!(
            classify_event_type("Sciopero per il clima", "manifestazione ambientale"),
            EventType::Protest
        );
    }

    #[test]
    fn unmatched_text_is_other() {
        assert_eq!(classify_category("", ""), Category::Other);
        assert_eq!(classify_event_type("Cena sociale", "pizza"), EventType::Other);
    }

    #[test]
    fn every_rule_targets_a_distinct_value() {
        for (i, rule) in CATEGORY_RULES.iter().enumerate() {
            assert_eq!(rule.value, Category::ALL[i]);
            assert!(!rule.keywords.is_empty());
        }
    }
}

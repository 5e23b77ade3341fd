use crate::models::{Intent, SoilType};

/// One row of the classification table. Lower priority wins when several rows match.
#[derive(Debug, Clone, Copy)]
pub struct IntentRule {
    pub intent: Intent,
    pub priority: u8,
    pub keywords: &'static [&'static str],
}

pub const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        intent: Intent::RotationPlanning,
        priority: 1,
        keywords: &[
            "rotation",
            "rotate",
            "season plan",
            "crop cycle",
            "next season",
            "after harvest",
            "follow with",
            "succession",
            "intercrop",
        ],
    },
    IntentRule {
        intent: Intent::LandHealth,
        priority: 2,
        keywords: &[
            "ndvi",
            "land health",
            "soil health",
            "crop health",
            "vegetation",
            "greenness",
            "satellite",
            "moisture",
            "drought",
            "waterlog",
        ],
    },
    IntentRule {
        intent: Intent::PricePrediction,
        priority: 3,
        keywords: &[
            "price", "pricing", "market", "mandi", "rate", "sell", "profit", "msp", "cost",
            "trend",
        ],
    },
    IntentRule {
        intent: Intent::CropRecommendation,
        priority: 4,
        keywords: &[
            "crop",
            "grow",
            "plant",
            "sow",
            "cultivat",
            "recommend",
            "suggest",
            "best",
            "which",
            "farm",
        ],
    },
];

/// Canonical crop names the pipeline knows about.
pub const KNOWN_CROPS: &[&str] = &[
    "rice",
    "wheat",
    "maize",
    "barley",
    "millet",
    "sorghum",
    "potato",
    "onion",
    "tomato",
    "mustard",
    "chickpea",
    "lentil",
    "pea",
    "mungbean",
    "cowpea",
    "pigeonpeas",
    "soybean",
    "groundnut",
    "sugarcane",
    "cotton",
    "jute",
    "banana",
    "mango",
];

const CROP_ALIASES: &[(&str, &str)] = &[
    ("paddy", "rice"),
    ("corn", "maize"),
    ("bajra", "millet"),
    ("jowar", "sorghum"),
    ("aloo", "potato"),
    ("sarson", "mustard"),
    ("gram", "chickpea"),
    ("chana", "chickpea"),
    ("masoor", "lentil"),
    ("moong", "mungbean"),
    ("arhar", "pigeonpeas"),
    ("tur", "pigeonpeas"),
    ("soya", "soybean"),
    ("peanut", "groundnut"),
];

/// Prepositions that introduce a place in a query ("in Agra", "for Mathura").
pub const LOCATIVE_PREPOSITIONS: &[&str] =
    &["in", "for", "near", "at", "around", "of", "between"];

/// Words that never name a place.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "what", "which", "how", "show", "give", "tell", "me", "my",
    "our", "please", "and", "for", "in", "near", "at", "around", "of", "between", "from", "to",
    "this", "that", "these", "today", "now", "current", "currently", "season", "seasons", "year",
    "month", "week", "region", "area", "field", "fields", "farm", "land", "soil", "soils", "wet",
    "dry", "weather", "data", "analysis", "complete", "report", "plan", "should", "can", "could",
    "would", "do", "does", "i", "we", "best", "good", "top", "next", "last", "coming", "upcoming",
    "time", "rain", "rainfall", "temperature", "condition", "conditions", "type", "types",
    "state", "district", "city", "town", "village", "country", "days", "weeks", "months", "years",
];

/// Cropping seasons, weather seasons and months.
const CALENDAR_WORDS: &[&str] = &[
    "kharif", "rabi", "zaid", "monsoon", "winter", "summer", "spring", "autumn", "january",
    "february", "march", "april", "may", "june", "july", "august", "september", "october",
    "november", "december", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct",
    "nov", "dec",
];

/// Endings a single-word keyword may carry and still count as that keyword.
const INFLECTIONS: &[&str] = &[
    "", "s", "es", "e", "d", "ed", "ged", "ing", "ging", "ion", "ions", "ation", "ations", "er",
    "ers", "able", "ment", "ments",
];

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// `Mandi` and `Greater`, but not `NDVI` or `agra`.
fn is_title_case(word: &str) -> bool {
    let mut chars = word.chars();
    chars.next().is_some_and(char::is_uppercase) && chars.any(char::is_lowercase)
}

/// Whole-word keyword match allowing a simple inflection: `prices`, `cultivation`.
fn is_keyword_form(word: &str, keyword: &str) -> bool {
    word.strip_prefix(keyword)
        .is_some_and(|rest| INFLECTIONS.contains(&rest))
}

fn is_bare_keyword(word: &str) -> bool {
    INTENT_RULES
        .iter()
        .flat_map(|r| r.keywords.iter())
        .any(|k| *k == word)
}

fn rule_matches(rule: &IntentRule, words: &[String]) -> bool {
    let stream = format!(" {}", words.join(" "));
    rule.keywords.iter().any(|keyword| {
        if keyword.contains(' ') {
            stream.contains(&format!(" {}", keyword))
        } else {
            words.iter().any(|w| is_keyword_form(w, keyword))
        }
    })
}

/// Lowercased words, with title-case runs after a locative preposition removed.
/// "Best crop for Mandi" keeps `best crop for`: Mandi is a place there, not the
/// price keyword.
fn words_outside_place_names(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut after_preposition = false;
    for word in tokens(text) {
        if after_preposition && is_title_case(word) {
            continue;
        }
        let lower = word.to_lowercase();
        after_preposition = LOCATIVE_PREPOSITIONS.contains(&lower.as_str());
        words.push(lower);
    }
    words
}

/// Keyword-table intent classifier. Pure and total.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl IntentClassifier {
    pub fn new() -> Self {
        let mut rules = INTENT_RULES.to_vec();
        rules.sort_by_key(|r| r.priority);
        Self { rules }
    }

    /// Keywords outside place names decide first; only when none match are
    /// place-like words consulted too.
    pub fn classify(&self, text: &str) -> Intent {
        let outside = words_outside_place_names(text);
        let all: Vec<String> = tokens(text).map(str::to_lowercase).collect();
        self.first_match(&outside)
            .or_else(|| self.first_match(&all))
            .unwrap_or(Intent::General)
    }

    fn first_match(&self, words: &[String]) -> Option<Intent> {
        self.rules
            .iter()
            .find(|rule| rule_matches(rule, words))
            .map(|rule| rule.intent)
    }

    pub fn list_rules(&self) -> Vec<(Intent, u8)> {
        self.rules.iter().map(|r| (r.intent, r.priority)).collect()
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical crop for a single word, accepting aliases and simple plurals.
pub fn canonical_crop(word: &str) -> Option<&'static str> {
    let word = word.trim().to_lowercase();
    let candidates = [
        Some(word.as_str()),
        word.strip_suffix("es"),
        word.strip_suffix('s'),
    ];

    let found = candidates.into_iter().flatten().find_map(|w| {
        KNOWN_CROPS
            .iter()
            .find(|c| **c == w)
            .copied()
            .or_else(|| {
                CROP_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == w)
                    .map(|(_, crop)| *crop)
            })
    });
    found
}

/// Numbers, stop words, calendar words, crops and soils.
fn is_filler(lower: &str) -> bool {
    lower.is_empty()
        || lower.chars().all(|c| c.is_ascii_digit())
        || STOP_WORDS.contains(&lower)
        || CALENDAR_WORDS.contains(&lower)
        || canonical_crop(lower).is_some()
        || SoilType::from_str(lower).is_some()
}

/// True for words that belong to the farming vocabulary of a query rather
/// than to a place name.
pub fn is_query_vocabulary(word: &str) -> bool {
    let lower = word.to_lowercase();
    is_filler(&lower)
        || INTENT_RULES
            .iter()
            .flat_map(|r| r.keywords.iter())
            .filter(|k| !k.contains(' '))
            .any(|k| is_keyword_form(&lower, k))
}

/// Vocabulary test for a word following a locative preposition. There a
/// title-case word spelled exactly like a keyword reads as a name (`Mandi`).
pub fn is_place_phrase_vocabulary(word: &str) -> bool {
    if is_title_case(word) && is_bare_keyword(&word.to_lowercase()) {
        return is_filler(&word.to_lowercase());
    }
    is_query_vocabulary(word)
}

/// Crop and soil words named in a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryMentions {
    pub crop: Option<String>,
    pub soil: Option<SoilType>,
}

impl QueryMentions {
    pub fn extract(text: &str) -> Self {
        let crop = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .find_map(canonical_crop)
            .map(str::to_string);

        Self {
            crop,
            soil: SoilType::find_in(text),
        }
    }
}

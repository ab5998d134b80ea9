/// Ordered keyword-rule table. Rule order matters: the first category
/// whose keyword list matches the text wins, so "business" beats
/// "sports" when a title mentions both a market and a match.
const RULES: &[(&str, &[&str])] = &[
    (
        "business",
        &["market", "stock", "economy", "trade", "invest", "revenue"],
    ),
    (
        "sports",
        &["soccer", "tennis", "cricket", "nba", "fifa", "goal", "match"],
    ),
    (
        "technology",
        &[
            "ai",
            "artificial intelligence",
            "machine learning",
            "software",
            "hardware",
            "tech",
        ],
    ),
    (
        "entertainment",
        &[
            "celebrity", "movie", "tv", "drama", "actor", "actress", "film", "music",
        ],
    ),
    (
        "politics",
        &[
            "election",
            "president",
            "vote",
            "government",
            "campaign",
            "parliament",
        ],
    ),
    (
        "health",
        &[
            "covid",
            "vaccine",
            "hospital",
            "healthcare",
            "mental health",
            "disease",
        ],
    ),
    (
        "science",
        &[
            "space",
            "nasa",
            "astronomy",
            "research",
            "quantum",
            "physics",
            "scientist",
        ],
    ),
];

pub const DEFAULT_CATEGORY: &str = "general";

/// Classify free text into one of the fixed category labels by
/// case-insensitive substring matching, falling back to "general".
pub fn classify(text: &str) -> &'static str {
    let text = text.to_lowercase();

    for (category, keywords) in RULES {
        if keywords.iter().any(|kw| text.contains(kw)) {
            return category;
        }
    }

    DEFAULT_CATEGORY
}

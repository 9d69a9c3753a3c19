// src/services/purpose.rs

/// Purpose name (lowercase) to the words that make a question relevant to it.
const PURPOSE_KEYWORDS: [(&str, &[&str]); 4] = [
    (
        "business",
        &[
            "meeting",
            "office",
            "report",
            "professional",
            "company",
            "client",
            "market",
            "manager",
            "work",
        ],
    ),
    (
        "exam preparation",
        &[
            "research",
            "university",
            "scientific",
            "study",
            "exam",
            "professor",
            "theory",
            "evidence",
        ],
    ),
    (
        "travel",
        &[
            "airport",
            "hotel",
            "tourist",
            "ticket",
            "restaurant",
            "city",
            "flight",
            "booking",
            "travel",
        ],
    ),
    (
        "hobby",
        &[
            "movie",
            "game",
            "hobby",
            "music",
            "sport",
            "fun",
            "friend",
            "book",
            "entertainment",
        ],
    ),
];

/// Keywords for a learning purpose. Unknown, empty or missing purposes get none.
pub fn keywords_for(purpose: Option<&str>) -> &'static [&'static str] {
    let Some(purpose) = purpose.map(str::trim).filter(|p| !p.is_empty()) else {
        return &[];
    };

    PURPOSE_KEYWORDS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(purpose))
        .map(|(_, words)| *words)
        .unwrap_or(&[])
}

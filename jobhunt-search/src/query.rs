//! Query normalisation: acronym expansion and term matching.
//!
//! Pure and stateless. Sources that filter client-side use
//! [`NormalizedQuery::matches`] against the listing text and
//! [`location_matches`] against the listing location.

use serde::Serialize;

/// Whole-word acronyms expanded before matching.
const ACRONYMS: &[(&str, &str)] = &[
    ("ml", "machine learning"),
    ("ai", "artificial intelligence"),
    ("nlp", "natural language processing"),
    ("sre", "site reliability engineer"),
    ("qa", "quality assurance"),
];

/// Location markers that mean "open to applicants anywhere".
const ANYWHERE_MARKERS: &[&str] = &["worldwide", "anywhere", "remote"];

/// Characters stripped from the ends of query terms.
const TERM_PUNCTUATION: &[char] = &[',', ';', ':', '(', ')', '"', '\'', '!', '?', '/'];

/// A query reduced to the forms used for matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedQuery {
    /// The text as the caller wrote it.
    pub original: String,
    /// Lowercased, whitespace-collapsed text.
    pub lowered: String,
    /// `lowered` with acronyms replaced by their expansion.
    pub expanded: String,
    /// Distinct terms of `expanded`, in first-seen order.
    pub terms: Vec<String>,
    /// Distinct terms of `lowered`, in first-seen order.
    original_terms: Vec<String>,
}

/// Normalise free text into matchable forms.
pub fn normalize_query(text: &str) -> NormalizedQuery {
    let lowered = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let expanded = expand_acronyms(&lowered);
    NormalizedQuery {
        original: text.to_string(),
        terms: split_terms(&expanded),
        original_terms: split_terms(&lowered),
        lowered,
        expanded,
    }
}

/// Replace whole-word acronyms in already-lowercased text.
///
/// Only whole words are replaced, so `"html"` keeps its `ml`.
pub fn expand_acronyms(lowered: &str) -> String {
    lowered
        .split_whitespace()
        .map(|word| {
            let bare = word.trim_matches(TERM_PUNCTUATION);
            ACRONYMS
                .iter()
                .find(|(short, _)| *short == bare)
                .map_or_else(|| word.to_string(), |(_, long)| (*long).to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn split_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for raw in text.split_whitespace() {
        let term = raw.trim_matches(TERM_PUNCTUATION);
        if term.is_empty() || terms.iter().any(|t| t == term) {
            continue;
        }
        terms.push(term.to_string());
    }
    terms
}

/// Short queries need every term; longer ones are conjunctions of optional
/// qualifiers and pass with a third of their terms.
fn enough_terms(present: usize, total: usize) -> bool {
    if total <= 2 {
        present == total
    } else {
        present * 3 >= total
    }
}

fn expansion_of(term: &str) -> Option<&'static str> {
    ACRONYMS
        .iter()
        .find(|(short, _)| *short == term)
        .map(|(_, long)| *long)
}

impl NormalizedQuery {
    /// Whether this query has no terms (matches everything).
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether `text` satisfies this query.
    ///
    /// Each word of the query counts once. A plain word must occur in the
    /// text. An acronym is satisfied by every word of its expansion, or by
    /// the acronym itself as a whole word, so `ml` finds "Machine Learning"
    /// and "ML platform" but not "HTML".
    pub fn matches(&self, text: &str) -> bool {
        if self.original_terms.is_empty() {
            return true;
        }
        let haystack = text.to_lowercase();
        let words: Vec<&str> = haystack
            .split_whitespace()
            .map(|w| w.trim_matches(TERM_PUNCTUATION))
            .collect();
        let present = self
            .original_terms
            .iter()
            .filter(|term| match expansion_of(term) {
                Some(long) => {
                    long.split_whitespace().all(|w| haystack.contains(w))
                        || words.contains(&term.as_str())
                }
                None => haystack.contains(term.as_str()),
            })
            .count();
        enough_terms(present, self.original_terms.len())
    }
}

/// Whether a listing located at `job_location` passes the `filter`.
///
/// - an empty filter accepts everything
/// - `"remote"` accepts everything (remote-first feeds)
/// - otherwise the location must contain the filter, or be marked
///   worldwide / anywhere / remote
///
/// A listing with no location is treated as remote.
pub fn location_matches(filter: &str, job_location: &str) -> bool {
    let wanted = filter.trim().to_lowercase();
    if wanted.is_empty() || wanted == "remote" {
        return true;
    }
    let mut location = job_location.trim().to_lowercase();
    if location.is_empty() {
        location = "remote".into();
    }
    location.contains(&wanted) || ANYWHERE_MARKERS.iter().any(|m| location.contains(m))
}

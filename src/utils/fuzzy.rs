//! Bounded edit-distance word matching.
//!
//! A fuzzy term matches any word in the content within its Levenshtein
//! distance (a transposition counts as one edit). Matching is done with a
//! precompiled Levenshtein automaton per query term.

use crate::utils::tokenizer::byte_words;
use levenshtein_automata::{Distance, LevenshteinAutomatonBuilder};
use std::ops::Range;
use std::sync::OnceLock;

/// Largest distance the query language allows
pub const MAX_FUZZY_DISTANCE: u8 = 2;

static DISTANCE_ONE: OnceLock<LevenshteinAutomatonBuilder> = OnceLock::new();
static DISTANCE_TWO: OnceLock<LevenshteinAutomatonBuilder> = OnceLock::new();

/// Shared automaton builders; building one is far more expensive than a DFA
fn builder(distance: u8) -> &'static LevenshteinAutomatonBuilder {
    match distance.clamp(1, MAX_FUZZY_DISTANCE) {
        1 => DISTANCE_ONE.get_or_init(|| LevenshteinAutomatonBuilder::new(1, true)),
        _ => DISTANCE_TWO.get_or_init(|| LevenshteinAutomatonBuilder::new(2, true)),
    }
}

/// Byte ranges of words within `distance` edits of `term`
pub fn find_fuzzy(
    content: &[u8],
    term: &str,
    distance: u8,
    case_sensitive: bool,
) -> Vec<Range<usize>> {
    if term.is_empty() {
        return Vec::new();
    }

    let term = if case_sensitive {
        term.to_string()
    } else {
        term.to_lowercase()
    };
    let max = usize::from(distance.clamp(1, MAX_FUZZY_DISTANCE));
    let term_len = term.chars().count();
    let dfa = builder(distance).build_dfa(&term);

    byte_words(content)
        .filter(|(_, word)| {
            // Cheap length bound before running the automaton
            let len = word.chars().count();
            if len.abs_diff(term_len) > max {
                return false;
            }
            let distance = if case_sensitive {
                dfa.eval(word)
            } else {
                dfa.eval(word.to_lowercase())
            };
            matches!(distance, Distance::Exact(_))
        })
        .map(|(range, _)| range)
        .collect()
}

/// Whether any word is within `distance` edits of `term`
pub fn contains_fuzzy(content: &[u8], term: &str, distance: u8, case_sensitive: bool) -> bool {
    !find_fuzzy(content, term, distance, case_sensitive).is_empty()
}

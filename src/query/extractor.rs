//! Term extraction for highlighting and complexity limits.

use crate::query::ast::Node;
use rustc_hash::FxHashSet;

/// Literal values worth highlighting in results.
///
/// Collects keyword, phrase, regex and fuzzy values outside any `NOT`
/// subtree, deduplicated in first-seen order. Filter values are never
/// collected since they describe metadata, not content.
pub fn extract_terms(node: Option<&Node>) -> Vec<String> {
    let mut terms = Vec::new();
    if let Some(node) = node {
        collect_terms(node, false, &mut terms);
    }
    dedup_in_order(terms)
}

fn collect_terms(node: &Node, negated: bool, out: &mut Vec<String>) {
    match node {
        Node::And(left, right) | Node::Or(left, right) => {
            collect_terms(left, negated, out);
            collect_terms(right, negated, out);
        }
        Node::Not(inner) => collect_terms(inner, true, out),
        Node::Keyword(value)
        | Node::Phrase(value)
        | Node::Regex(value)
        | Node::Fuzzy { value, .. } => {
            if !negated {
                out.push(value.clone());
            }
        }
        Node::Filter(_) => {}
    }
}

/// Number of distinct terms in the query, used for complexity limits.
///
/// Unlike [`extract_terms`] this ignores negation and also counts filter
/// values, so a query can never highlight more terms than it counts.
pub fn count_all_terms(node: Option<&Node>) -> usize {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    if let Some(node) = node {
        count_into(node, &mut seen);
    }
    seen.len()
}

fn count_into<'a>(node: &'a Node, seen: &mut FxHashSet<&'a str>) {
    match node {
        Node::And(left, right) | Node::Or(left, right) => {
            count_into(left, seen);
            count_into(right, seen);
        }
        Node::Not(inner) => count_into(inner, seen),
        Node::Keyword(value)
        | Node::Phrase(value)
        | Node::Regex(value)
        | Node::Fuzzy { value, .. } => {
            seen.insert(value);
        }
        Node::Filter(filter) => {
            for value in filter.value.as_slice() {
                if !value.is_empty() {
                    seen.insert(value);
                }
            }
        }
    }
}

fn dedup_in_order(terms: Vec<String>) -> Vec<String> {
    let mut seen = FxHashSet::default();
    terms
        .into_iter()
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

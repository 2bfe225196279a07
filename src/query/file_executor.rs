//! Per-file evaluation with a deferred metadata pass.
//!
//! A single file is evaluated in two stages. [`evaluate_file`] runs while
//! only the content, filename and location are known: content filters and
//! `file`/`ext`/`path` filters are resolved, while `lang` and `complexity`
//! are left pending. Once language and complexity are known,
//! [`FileEvaluation::with_metadata`] resolves what is still pending.
//!
//! [`post_eval_metadata_filters`] is the standalone form of the second stage:
//! it re-walks the whole tree with every non-metadata leaf taken as true.

use crate::query::ast::Node;
use crate::query::filters::{FilterContext, matches_content_time, matches_corpus};
use crate::utils::fuzzy::find_fuzzy;
use crate::utils::matcher::{compile_regex, find_all, find_all_ignore_case, find_regex};
use std::collections::HashMap;
use std::ops::Range;
use tracing::debug;

/// Byte ranges keyed by the literal that produced them
pub type MatchLocations = HashMap<String, Vec<Range<usize>>>;

/// Outcome of evaluating one file at content time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileEvaluation {
    /// False only when no choice of language and complexity can match
    pub matched: bool,
    pub locations: MatchLocations,
    /// The part of the tree that still depends on `lang`/`complexity`
    pending: Option<Node>,
}

impl FileEvaluation {
    /// Resolve pending `lang`/`complexity` filters against known metadata
    pub fn with_metadata(mut self, language: &str, complexity: u32) -> Self {
        if let Some(pending) = self.pending.take()
            && self.matched
            && !post_eval_metadata_filters(Some(&pending), language, complexity)
        {
            self.matched = false;
            self.locations.clear();
        }
        self
    }

    /// Whether the verdict still waits on metadata
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Content-time result of one subtree
#[derive(Debug)]
enum Verdict {
    Decided(bool),
    /// Depends only on metadata; holds the residual subtree to resolve later
    Pending(Node),
}

impl Verdict {
    fn is_false(&self) -> bool {
        matches!(self, Verdict::Decided(false))
    }
}

struct FileMatcher<'a> {
    content: &'a [u8],
    context: FilterContext<'a>,
    case_sensitive: bool,
}

impl FileMatcher<'_> {
    /// Evaluate `node`, adding locations of contributing leaves to `locations`
    fn eval(&self, node: &Node, locations: &mut MatchLocations) -> Verdict {
        match node {
            Node::And(left, right) => {
                let mut scratch = MatchLocations::new();
                let left = self.eval(left, &mut scratch);
                if left.is_false() {
                    return left;
                }
                let right = self.eval(right, &mut scratch);
                let verdict = match (left, right) {
                    (_, Verdict::Decided(false)) => return Verdict::Decided(false),
                    (Verdict::Decided(_), right) => right,
                    (left, Verdict::Decided(_)) => left,
                    (Verdict::Pending(l), Verdict::Pending(r)) => Verdict::Pending(Node::and(l, r)),
                };
                merge_locations(locations, scratch);
                verdict
            }
            Node::Or(left, right) => {
                let mut left_locations = MatchLocations::new();
                let mut right_locations = MatchLocations::new();
                let left = self.eval(left, &mut left_locations);
                let right = self.eval(right, &mut right_locations);
                if !left.is_false() {
                    merge_locations(locations, left_locations);
                }
                if !right.is_false() {
                    merge_locations(locations, right_locations);
                }
                match (left, right) {
                    (Verdict::Decided(true), _) | (_, Verdict::Decided(true)) => {
                        Verdict::Decided(true)
                    }
                    (Verdict::Decided(false), other) | (other, Verdict::Decided(false)) => other,
                    (Verdict::Pending(l), Verdict::Pending(r)) => Verdict::Pending(Node::or(l, r)),
                }
            }
            // Matches under a NOT are never highlighted
            Node::Not(inner) => match self.eval(inner, &mut MatchLocations::new()) {
                Verdict::Decided(matched) => Verdict::Decided(!matched),
                Verdict::Pending(residual) => Verdict::Pending(Node::not(residual)),
            },
            Node::Keyword(value) | Node::Phrase(value) => {
                let ranges = if self.case_sensitive {
                    find_all(self.content, value.as_bytes())
                } else {
                    find_all_ignore_case(self.content, value)
                };
                record(locations, value, ranges)
            }
            Node::Regex(pattern) => match compile_regex(pattern, self.case_sensitive) {
                Some(regex) => record(locations, pattern, find_regex(self.content, &regex)),
                None => {
                    debug!(pattern = %pattern, "invalid regex matches nothing");
                    Verdict::Decided(false)
                }
            },
            Node::Fuzzy { value, distance } => {
                let ranges = find_fuzzy(self.content, value, *distance, self.case_sensitive);
                record(locations, value, ranges)
            }
            Node::Filter(filter) if filter.is_metadata() => Verdict::Pending(node.clone()),
            Node::Filter(filter) => Verdict::Decided(matches_content_time(filter, &self.context)),
        }
    }
}

fn record(locations: &mut MatchLocations, key: &str, ranges: Vec<Range<usize>>) -> Verdict {
    if ranges.is_empty() {
        return Verdict::Decided(false);
    }
    locations.entry(key.to_string()).or_default().extend(ranges);
    Verdict::Decided(true)
}

fn merge_locations(into: &mut MatchLocations, from: MatchLocations) {
    for (key, ranges) in from {
        let entry = into.entry(key).or_default();
        entry.extend(ranges);
        entry.sort_by_key(|r| (r.start, r.end));
        entry.dedup();
    }
}

/// Evaluate a planned tree against one file's content.
///
/// Ranges are byte offsets into `content`. `lang` and `complexity` filters
/// are left pending; resolve them with [`FileEvaluation::with_metadata`].
pub fn evaluate_file(
    node: Option<&Node>,
    content: &[u8],
    filename: &str,
    location: &str,
    case_sensitive: bool,
) -> FileEvaluation {
    let Some(node) = node else {
        return FileEvaluation {
            matched: true,
            ..FileEvaluation::default()
        };
    };

    let matcher = FileMatcher {
        content,
        context: FilterContext::content_time(filename, location),
        case_sensitive,
    };
    let mut locations = MatchLocations::new();
    let (matched, pending) = match matcher.eval(node, &mut locations) {
        Verdict::Decided(matched) => (matched, None),
        Verdict::Pending(residual) => (true, Some(residual)),
    };
    if !matched {
        locations.clear();
    }
    FileEvaluation {
        matched,
        locations,
        pending,
    }
}

/// Resolve the `lang`/`complexity` filters of a whole tree.
///
/// Everything else passes through as true. A `NOT` is only re-applied when
/// its operand contains a metadata filter; otherwise its answer was already
/// part of the content-time result.
pub fn post_eval_metadata_filters(node: Option<&Node>, language: &str, complexity: u32) -> bool {
    let Some(node) = node else {
        return true;
    };
    let context = FilterContext::metadata(language, complexity);
    eval_metadata(node, &context)
}

fn eval_metadata(node: &Node, context: &FilterContext) -> bool {
    match node {
        Node::And(left, right) => eval_metadata(left, context) && eval_metadata(right, context),
        Node::Or(left, right) => eval_metadata(left, context) || eval_metadata(right, context),
        Node::Not(inner) => {
            if inner.has_metadata_filter() {
                !eval_metadata(inner, context)
            } else {
                true
            }
        }
        Node::Filter(filter) if filter.is_metadata() => matches_corpus(filter, context),
        Node::Filter(_)
        | Node::Keyword(_)
        | Node::Phrase(_)
        | Node::Regex(_)
        | Node::Fuzzy { .. } => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::parse_query;
    use crate::query::planner::plan_ast;
    use crate::query::transformer::transform;

    fn ast(query: &str) -> Option<Node> {
        let parsed = parse_query(query).unwrap();
        let mut notices = parsed.notices;
        plan_ast(parsed.ast.map(|node| transform(node, &mut notices)))
    }

    const CONTENT: &[u8] = b"the cat sat on the mat with another cat";

    #[test]
    fn test_keyword_with_extension_filter() {
        let node = ast("cat ext=go");
        let result = evaluate_file(node.as_ref(), CONTENT, "x.go", "src/x.go", false);
        assert!(result.matched);
        assert_eq!(result.locations["cat"], vec![4..7, 36..39]);

        let result = evaluate_file(node.as_ref(), CONTENT, "x.py", "src/x.py", false);
        assert!(!result.matched);
        assert!(result.locations.is_empty());
    }

    #[test]
    fn test_or_records_only_matching_branches() {
        let node = ast("cat OR dog OR mat");
        let result = evaluate_file(node.as_ref(), CONTENT, "a.txt", "a.txt", false);
        assert!(result.matched);
        assert!(result.locations.contains_key("cat"));
        assert!(result.locations.contains_key("mat"));
        assert!(!result.locations.contains_key("dog"));
    }

    #[test]
    fn test_not_discards_inner_locations() {
        let node = ast("cat NOT dog");
        let result = evaluate_file(node.as_ref(), CONTENT, "a.txt", "a.txt", false);
        assert!(result.matched);
        assert_eq!(result.locations.len(), 1);

        let node = ast("NOT cat");
        let result = evaluate_file(node.as_ref(), CONTENT, "a.txt", "a.txt", false);
        assert!(!result.matched);
    }

    #[test]
    fn test_failed_and_contributes_nothing() {
        let node = ast("(cat AND dog) OR mat");
        let result = evaluate_file(node.as_ref(), CONTENT, "a.txt", "a.txt", false);
        assert!(result.matched);
        assert_eq!(result.locations.keys().collect::<Vec<_>>(), vec!["mat"]);
    }

    #[test]
    fn test_content_time_filters() {
        let node = ast("cat file=test path=cmd");
        assert!(evaluate_file(node.as_ref(), CONTENT, "main_test.go", "cmd/main_test.go", false).matched);
        assert!(!evaluate_file(node.as_ref(), CONTENT, "main.go", "cmd/main.go", false).matched);
    }

    #[test]
    fn test_metadata_filters_deferred() {
        let node = ast("cat lang=go complexity=high");
        let result = evaluate_file(node.as_ref(), CONTENT, "a.txt", "a.txt", false);
        assert!(result.matched);
        assert!(post_eval_metadata_filters(node.as_ref(), "go", 9));
        assert!(!post_eval_metadata_filters(node.as_ref(), "go", 3));
        assert!(!post_eval_metadata_filters(node.as_ref(), "rust", 9));
    }

    #[test]
    fn test_post_eval_passes_non_metadata() {
        for query in ["cat", "NOT cat", "NOT ext=go", "NOT NOT file=x", "path=a OR NOT /re/"] {
            let node = ast(query);
            assert!(post_eval_metadata_filters(node.as_ref(), "rust", 0), "{query}");
        }
        assert!(post_eval_metadata_filters(None, "rust", 0));
    }

    #[test]
    fn test_negated_metadata_deferred_at_content_time() {
        let node = ast("cat NOT lang=go");
        let result = evaluate_file(node.as_ref(), CONTENT, "a.go", "a.go", false);
        assert!(result.matched);
        assert!(result.is_pending());
        assert!(!result.with_metadata("go", 0).matched);
    }

    #[test]
    fn test_negated_mixed_operand_decided_by_content() {
        let node = ast("NOT (dog AND lang=go)");
        // No "dog", so the operand is false whatever the language
        let result = evaluate_file(node.as_ref(), CONTENT, "a.go", "a.go", false);
        assert!(result.matched);
        assert!(!result.is_pending());
        assert!(result.with_metadata("go", 0).matched);

        let node = ast("NOT (cat AND lang=go)");
        let result = evaluate_file(node.as_ref(), CONTENT, "a.go", "a.go", false);
        assert!(result.is_pending());
        assert!(!result.clone().with_metadata("go", 0).matched);
        assert!(result.with_metadata("rust", 0).matched);
    }

    #[test]
    fn test_metadata_or_content_short_circuits() {
        let node = ast("cat OR lang=go");
        let result = evaluate_file(node.as_ref(), CONTENT, "a.py", "a.py", false);
        assert!(!result.is_pending());
        assert!(result.with_metadata("python", 0).matched);

        let node = ast("dog OR lang=go");
        let result = evaluate_file(node.as_ref(), CONTENT, "a.py", "a.py", false);
        assert!(result.is_pending());
        assert!(!result.with_metadata("python", 0).matched);
    }

    #[test]
    fn test_post_eval_negated_metadata() {
        let node = ast("cat NOT lang=go");
        assert!(!post_eval_metadata_filters(node.as_ref(), "go", 0));
        assert!(post_eval_metadata_filters(node.as_ref(), "rust", 0));
    }

    #[test]
    fn test_with_metadata_combines_verdicts() {
        let node = ast("cat lang=go");
        let result = evaluate_file(node.as_ref(), CONTENT, "a.go", "a.go", false)
            .with_metadata("python", 0);
        assert!(!result.matched);
        assert!(result.locations.is_empty());
    }

    #[test]
    fn test_regex_and_fuzzy_locations() {
        let node = ast("/c.t/ mta~1");
        let result = evaluate_file(node.as_ref(), CONTENT, "a.txt", "a.txt", false);
        assert!(result.matched);
        assert_eq!(result.locations["c.t"], vec![4..7, 36..39]);
        assert_eq!(result.locations["mta"], vec![19..22]);
    }

    #[test]
    fn test_invalid_utf8_offsets_index_raw_content() {
        let content = b"\xff\xfe cat";
        for case_sensitive in [false, true] {
            let node = ast("cat");
            let result = evaluate_file(node.as_ref(), content, "a.txt", "a.txt", case_sensitive);
            assert_eq!(result.locations["cat"], vec![3..6]);
        }

        let node = ast("cot~1");
        let result = evaluate_file(node.as_ref(), content, "a.txt", "a.txt", true);
        assert_eq!(result.locations["cot"], vec![3..6]);
        assert_eq!(&content[3..6], b"cat");
    }

    #[test]
    fn test_unicode_case_insensitive_offsets() {
        let content = "Ünïcode ÜNÏCODE".as_bytes();
        let node = ast("ünïcode");
        let result = evaluate_file(node.as_ref(), content, "a.txt", "a.txt", false);
        assert_eq!(result.locations["ünïcode"], vec![0..9, 10..19]);
    }
}

use crate::corpus::Document;
use crate::query::ast::Node;
use crate::query::filters::{FilterContext, corpus_predicate};
use crate::utils::fuzzy::contains_fuzzy;
use crate::utils::matcher::{compile_regex, contains_regex, literal_regex};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

/// Corpus-mode query executor
#[derive(Debug, Clone, Copy)]
pub struct QueryExecutor {
    case_sensitive: bool,
    parallel: bool,
}

impl QueryExecutor {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            parallel: true,
        }
    }

    /// Evaluate leaf predicates across documents with rayon
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Evaluate a planned tree over `documents`, preserving their order.
    ///
    /// An absent tree matches everything.
    pub fn evaluate<'a>(&self, node: Option<&Node>, documents: &[&'a Document]) -> Vec<&'a Document> {
        match node {
            Some(node) => self.eval_node(node, documents),
            None => documents.to_vec(),
        }
    }

    fn eval_node<'a>(&self, node: &Node, docs: &[&'a Document]) -> Vec<&'a Document> {
        let result = match node {
            // Right side only sees what survived the left side
            Node::And(left, right) => {
                let narrowed = self.eval_node(left, docs);
                if narrowed.is_empty() {
                    return narrowed;
                }
                self.eval_node(right, &narrowed)
            }
            Node::Or(left, right) => {
                let left = self.eval_node(left, docs);
                let right = self.eval_node(right, docs);
                union_by_path(left, right)
            }
            Node::Not(inner) => {
                let excluded: FxHashSet<&str> = self
                    .eval_node(inner, docs)
                    .into_iter()
                    .map(|doc| doc.path.as_str())
                    .collect();
                docs.iter()
                    .copied()
                    .filter(|doc| !excluded.contains(doc.path.as_str()))
                    .collect()
            }
            Node::Keyword(value) | Node::Phrase(value) => {
                match literal_regex(value, self.case_sensitive) {
                    Some(literal) => self.retain(docs, |doc| contains_regex(&doc.content, &literal)),
                    None => Vec::new(),
                }
            }
            Node::Regex(pattern) => match compile_regex(pattern, self.case_sensitive) {
                Some(regex) => self.retain(docs, |doc| contains_regex(&doc.content, &regex)),
                None => {
                    debug!(pattern = %pattern, "invalid regex matches nothing");
                    Vec::new()
                }
            },
            Node::Fuzzy { value, distance } => self.retain(docs, |doc| {
                contains_fuzzy(&doc.content, value, *distance, self.case_sensitive)
            }),
            Node::Filter(filter) => match corpus_predicate(&filter.field) {
                Some(predicate) => self.retain(docs, |doc| {
                    predicate(filter, &FilterContext::from_document(doc))
                }),
                None => {
                    debug!(field = %filter.field, "unknown filter field matches nothing");
                    Vec::new()
                }
            },
        };

        trace!(node = %node, candidates = docs.len(), matched = result.len(), "evaluated");
        result
    }

    fn retain<'a, F>(&self, docs: &[&'a Document], predicate: F) -> Vec<&'a Document>
    where
        F: Fn(&Document) -> bool + Sync,
    {
        if self.parallel {
            docs.par_iter()
                .copied()
                .filter(|doc| predicate(doc))
                .collect()
        } else {
            docs.iter().copied().filter(|doc| predicate(doc)).collect()
        }
    }
}

/// Left-first union, de-duplicated by path
fn union_by_path<'a>(left: Vec<&'a Document>, right: Vec<&'a Document>) -> Vec<&'a Document> {
    let mut seen: FxHashSet<&str> = left.iter().map(|doc| doc.path.as_str()).collect();
    let mut merged = left;
    for doc in right {
        if seen.insert(doc.path.as_str()) {
            merged.push(doc);
        }
    }
    merged
}

/// Evaluate a planned tree over a document slice
pub fn evaluate<'a>(
    node: Option<&Node>,
    documents: &'a [Document],
    case_sensitive: bool,
) -> Vec<&'a Document> {
    let docs: Vec<&Document> = documents.iter().collect();
    QueryExecutor::new(case_sensitive).evaluate(node, &docs)
}

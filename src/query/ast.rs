//! Query abstract syntax tree.
//!
//! Every tree walk (planner, extractor, both executors) matches on [`Node`]
//! exhaustively, so adding a node kind is a compile-time change everywhere.

use std::fmt;

/// Filter fields understood by the parser's `field:value` form
pub const KNOWN_FIELDS: &[&str] = &[
    "file",
    "filename",
    "ext",
    "extension",
    "lang",
    "language",
    "complexity",
    "path",
    "filepath",
];

/// Fields that are only resolvable once language and complexity are known
pub const METADATA_FIELDS: &[&str] = &["lang", "language", "complexity"];

pub fn is_known_field(field: &str) -> bool {
    KNOWN_FIELDS.iter().any(|f| field.eq_ignore_ascii_case(f))
}

pub fn is_metadata_field(field: &str) -> bool {
    METADATA_FIELDS.iter().any(|f| field.eq_ignore_ascii_case(f))
}

/// Comparison operator of a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    NotEq,
    Gte,
    Lte,
}

impl FilterOp {
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "=" => Some(Self::Eq),
            "!=" => Some(Self::NotEq),
            ">=" => Some(Self::Gte),
            "<=" => Some(Self::Lte),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }
}

/// Filter value: a single scalar or an ordered list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Scalar(String),
    List(Vec<String>),
}

impl FilterValue {
    /// Build from collected values, collapsing a single value to a scalar
    pub fn from_values(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            Self::Scalar(values.remove(0))
        } else {
            Self::List(values)
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::List(_) => None,
        }
    }

    /// All values in order; a scalar is a one-element slice
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::Scalar(value) => std::slice::from_ref(value),
            Self::List(values) => values,
        }
    }
}

/// A `field op value` predicate on document metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn scalar(field: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self::new(field, op, FilterValue::Scalar(value.into()))
    }

    pub fn is_metadata(&self) -> bool {
        is_metadata_field(&self.field)
    }
}

/// A parsed query expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Not(Box<Node>),
    /// Bare word or number
    Keyword(String),
    /// Quoted phrase
    Phrase(String),
    /// Regex pattern (compiled at evaluation time)
    Regex(String),
    Filter(Filter),
    /// Word matched within a bounded edit distance (1 or 2)
    Fuzzy { value: String, distance: u8 },
}

impl Node {
    pub fn and(left: Node, right: Node) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Node, right: Node) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn not(inner: Node) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn keyword(value: impl Into<String>) -> Self {
        Self::Keyword(value.into())
    }

    /// Non-boolean nodes in left-to-right order
    pub fn leaves(&self) -> Vec<&Node> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Node>) {
        match self {
            Self::And(left, right) | Self::Or(left, right) => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            }
            Self::Not(inner) => inner.collect_leaves(out),
            _ => out.push(self),
        }
    }

    /// Whether any `lang`/`complexity` filter appears in this subtree
    pub fn has_metadata_filter(&self) -> bool {
        match self {
            Self::And(left, right) | Self::Or(left, right) => {
                left.has_metadata_filter() || right.has_metadata_filter()
            }
            Self::Not(inner) => inner.has_metadata_filter(),
            Self::Filter(filter) => filter.is_metadata(),
            Self::Keyword(_) | Self::Phrase(_) | Self::Regex(_) | Self::Fuzzy { .. } => false,
        }
    }
}

/// Whether a filter value survives a round trip through the lexer unquoted
fn is_bare_value(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '+' | '#' | '*'))
        && !["and", "or", "not"]
            .iter()
            .any(|w| value.eq_ignore_ascii_case(w))
        && !value.ends_with("~1")
        && !value.ends_with("~2")
}

fn fmt_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    if is_bare_value(value) {
        write!(f, "{value}")
    } else {
        write!(f, "\"{value}\"")
    }
}

/// Canonical query text: binary operators are fully parenthesized so that
/// re-parsing reproduces the same tree without healing notices.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(left, right) => write!(f, "({left} AND {right})"),
            Self::Or(left, right) => write!(f, "({left} OR {right})"),
            Self::Not(inner) => write!(f, "NOT {inner}"),
            Self::Keyword(value) => write!(f, "{value}"),
            Self::Phrase(value) => write!(f, "\"{value}\""),
            Self::Regex(pattern) => write!(f, "/{pattern}/"),
            Self::Fuzzy { value, distance } => write!(f, "{value}~{distance}"),
            Self::Filter(filter) => {
                write!(f, "{}{}", filter.field, filter.op.as_str())?;
                for (i, value) in filter.value.as_slice().iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    // Embedded empties stay bare so the list shape round-trips
                    if value.is_empty() && filter.value.as_slice().len() > 1 {
                        continue;
                    }
                    fmt_value(f, value)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_value_collapses_single() {
        assert_eq!(
            FilterValue::from_values(vec!["go".into()]),
            FilterValue::Scalar("go".into())
        );
        assert_eq!(
            FilterValue::from_values(vec!["go".into(), "py".into()]),
            FilterValue::List(vec!["go".into(), "py".into()])
        );
    }

    #[test]
    fn test_as_slice() {
        let scalar = FilterValue::Scalar("go".into());
        assert_eq!(scalar.as_slice(), &["go".to_string()]);
    }

    #[test]
    fn test_field_sets() {
        assert!(is_known_field("FILE"));
        assert!(is_known_field("filepath"));
        assert!(!is_known_field("std"));
        assert!(is_metadata_field("Lang"));
        assert!(!is_metadata_field("ext"));
    }

    #[test]
    fn test_display_canonical_form() {
        let node = Node::and(
            Node::keyword("cat"),
            Node::or(
                Node::Phrase("big dog".into()),
                Node::not(Node::Regex("fo+".into())),
            ),
        );
        assert_eq!(node.to_string(), "(cat AND (\"big dog\" OR NOT /fo+/))");
    }

    #[test]
    fn test_display_filters() {
        let filter = Node::Filter(Filter::new(
            "lang",
            FilterOp::Eq,
            FilterValue::List(vec!["go".into(), "".into(), "python".into()]),
        ));
        assert_eq!(filter.to_string(), "lang=go,,python");

        let quoted = Node::Filter(Filter::scalar("file", FilterOp::NotEq, "my file.go"));
        assert_eq!(quoted.to_string(), "file!=\"my file.go\"");

        let keyword_like = Node::Filter(Filter::scalar("lang", FilterOp::Eq, "and"));
        assert_eq!(keyword_like.to_string(), "lang=\"and\"");
    }

    #[test]
    fn test_leaves_and_metadata() {
        let node = Node::and(
            Node::not(Node::Filter(Filter::scalar("lang", FilterOp::Eq, "go"))),
            Node::Fuzzy {
                value: "cat".into(),
                distance: 1,
            },
        );
        assert_eq!(node.leaves().len(), 2);
        assert!(node.has_metadata_filter());
        assert!(!Node::keyword("x").has_metadata_filter());
    }
}

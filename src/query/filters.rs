//! Filter predicate registries.
//!
//! Field names map to predicate functions. Corpus mode has complete document
//! metadata; content time (per-file mode) only knows the filename and
//! location, so `lang` and `complexity` are placeholders there and get
//! resolved later by the metadata pass.

use crate::corpus::Document;
use crate::query::ast::{Filter, FilterOp};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::LazyLock;

/// Metadata a filter predicate can look at
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterContext<'a> {
    pub path: &'a str,
    pub filename: &'a str,
    pub language: &'a str,
    pub extension: &'a str,
    pub complexity: u32,
}

impl<'a> FilterContext<'a> {
    pub fn from_document(doc: &'a Document) -> Self {
        Self {
            path: &doc.path,
            filename: &doc.filename,
            language: &doc.language,
            extension: &doc.extension,
            complexity: doc.complexity,
        }
    }

    /// Context known before content analysis: filename and location only
    pub fn content_time(filename: &'a str, location: &'a str) -> Self {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self {
            path: location,
            filename,
            extension,
            ..Self::default()
        }
    }

    /// Context for the deferred metadata pass
    pub fn metadata(language: &'a str, complexity: u32) -> Self {
        Self {
            language,
            complexity,
            ..Self::default()
        }
    }
}

pub type FilterPredicate = fn(&Filter, &FilterContext) -> bool;

/// Predicates with full document metadata available
static CORPUS_FILTERS: LazyLock<FxHashMap<&'static str, FilterPredicate>> = LazyLock::new(|| {
    let mut filters: FxHashMap<&'static str, FilterPredicate> = FxHashMap::default();
    filters.insert("complexity", complexity);
    filters.insert("lang", language);
    filters.insert("language", language);
    filters.insert("ext", extension);
    filters.insert("extension", extension);
    filters.insert("file", filename_exact);
    filters.insert("filename", filename_exact);
    filters.insert("path", path_contains);
    filters.insert("filepath", path_contains);
    filters
});

/// Predicates resolvable from filename and location alone
static CONTENT_TIME_FILTERS: LazyLock<FxHashMap<&'static str, FilterPredicate>> =
    LazyLock::new(|| {
        let mut filters: FxHashMap<&'static str, FilterPredicate> = FxHashMap::default();
        filters.insert("file", filename_contains);
        filters.insert("filename", filename_contains);
        filters.insert("ext", extension);
        filters.insert("extension", extension);
        filters.insert("path", path_contains);
        filters.insert("filepath", path_contains);
        filters.insert("lang", deferred);
        filters.insert("language", deferred);
        filters.insert("complexity", deferred);
        filters
    });

fn lookup(
    registry: &FxHashMap<&'static str, FilterPredicate>,
    field: &str,
) -> Option<FilterPredicate> {
    registry.get(field.to_ascii_lowercase().as_str()).copied()
}

pub fn corpus_predicate(field: &str) -> Option<FilterPredicate> {
    lookup(&CORPUS_FILTERS, field)
}

pub fn content_time_predicate(field: &str) -> Option<FilterPredicate> {
    lookup(&CONTENT_TIME_FILTERS, field)
}

/// Evaluate a filter with full metadata; unknown fields match nothing
pub fn matches_corpus(filter: &Filter, ctx: &FilterContext) -> bool {
    corpus_predicate(&filter.field).is_some_and(|predicate| predicate(filter, ctx))
}

/// Evaluate a filter at content time; unknown fields match nothing
pub fn matches_content_time(filter: &Filter, ctx: &FilterContext) -> bool {
    content_time_predicate(&filter.field).is_some_and(|predicate| predicate(filter, ctx))
}

/// Apply `=`/`!=` to a per-value test; ordering operators never match strings
fn membership(filter: &Filter, test: impl Fn(&str) -> bool) -> bool {
    let any = || filter.value.as_slice().iter().any(|v| test(v));
    match filter.op {
        FilterOp::Eq => any(),
        FilterOp::NotEq => !any(),
        FilterOp::Gte | FilterOp::Lte => false,
    }
}

fn complexity(filter: &Filter, ctx: &FilterContext) -> bool {
    let Some(target) = filter
        .value
        .as_scalar()
        .and_then(|v| v.trim().parse::<i64>().ok())
    else {
        return false;
    };
    let actual = i64::from(ctx.complexity);
    match filter.op {
        FilterOp::Eq => actual == target,
        FilterOp::NotEq => actual != target,
        FilterOp::Gte => actual >= target,
        FilterOp::Lte => actual <= target,
    }
}

fn language(filter: &Filter, ctx: &FilterContext) -> bool {
    membership(filter, |v| v.eq_ignore_ascii_case(ctx.language))
}

fn extension(filter: &Filter, ctx: &FilterContext) -> bool {
    membership(filter, |v| {
        v.strip_prefix('.')
            .unwrap_or(v)
            .eq_ignore_ascii_case(ctx.extension)
    })
}

fn filename_exact(filter: &Filter, ctx: &FilterContext) -> bool {
    membership(filter, |v| v.to_lowercase() == ctx.filename.to_lowercase())
}

fn filename_contains(filter: &Filter, ctx: &FilterContext) -> bool {
    membership(filter, |v| contains_ignore_case(ctx.filename, v))
}

fn path_contains(filter: &Filter, ctx: &FilterContext) -> bool {
    membership(filter, |v| contains_ignore_case(ctx.path, v))
}

/// Placeholder for fields resolved by the metadata pass
fn deferred(_filter: &Filter, _ctx: &FilterContext) -> bool {
    true
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack.to_lowercase().contains(&needle.to_lowercase())
}

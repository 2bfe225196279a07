//! Query pipeline entry points.
//!
//! text → parse → transform → plan → evaluate. Compiling and evaluating are
//! separate so a planned tree can be shared across many per-file
//! evaluations.

use crate::config::SearchConfig;
use crate::corpus::Document;
use crate::query::ast::Node;
use crate::query::error::QueryError;
use crate::query::executor::QueryExecutor;
use crate::query::extractor::{count_all_terms, extract_terms};
use crate::query::parser::parse_query;
use crate::query::planner::plan_ast;
use crate::query::transformer::transform;
use serde::Serialize;
use tracing::debug;

/// A parsed, rewritten and planned query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub ast: Option<Node>,
    pub notices: Vec<String>,
    pub highlight_terms: Vec<String>,
    pub term_count: usize,
}

impl CompiledQuery {
    /// Compile query text; `max_terms` of 0 disables the term limit
    pub fn new(query: &str, max_terms: usize) -> Result<Self, QueryError> {
        let parsed = parse_query(query)?;
        let mut notices = parsed.notices;
        let ast = parsed.ast.map(|node| transform(node, &mut notices));

        let term_count = count_all_terms(ast.as_ref());
        if max_terms > 0 && term_count > max_terms {
            return Err(QueryError::TooComplex {
                terms: term_count,
                limit: max_terms,
            });
        }

        let ast = plan_ast(ast);
        let highlight_terms = extract_terms(ast.as_ref());

        if let Some(ast) = &ast {
            debug!(query, plan = %ast, "compiled query");
        }
        for notice in &notices {
            debug!(notice = %notice, "query healed");
        }

        Ok(Self {
            ast,
            notices,
            highlight_terms,
            term_count,
        })
    }
}

/// Documents matched by a query, with notices and highlight terms
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult<'a> {
    pub documents: Vec<&'a Document>,
    pub notices: Vec<String>,
    pub highlight_terms: Vec<String>,
}

/// Searches a loaded corpus
pub struct SearchEngine {
    documents: Vec<Document>,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(documents: Vec<Document>, config: SearchConfig) -> Self {
        Self { documents, config }
    }

    /// Compile without evaluating
    pub fn compile(&self, query: &str) -> Result<CompiledQuery, QueryError> {
        CompiledQuery::new(query, self.config.max_query_terms)
    }

    /// Compile and evaluate a query against the corpus
    pub fn search(&self, query: &str) -> Result<SearchResult<'_>, QueryError> {
        let compiled = self.compile(query)?;
        Ok(self.execute(compiled))
    }

    /// Evaluate an already compiled query against the corpus
    pub fn execute(&self, compiled: CompiledQuery) -> SearchResult<'_> {
        let candidates: Vec<&Document> = self.documents.iter().collect();
        let executor =
            QueryExecutor::new(self.config.case_sensitive).with_parallel(self.config.parallel);
        let documents = executor.evaluate(compiled.ast.as_ref(), &candidates);

        debug!(
            candidates = candidates.len(),
            matched = documents.len(),
            "search complete"
        );

        SearchResult {
            documents,
            notices: compiled.notices,
            highlight_terms: compiled.highlight_terms,
        }
    }
}

/// Run a query over a document slice with default limits
pub fn search<'a>(
    query: &str,
    documents: &'a [Document],
    case_sensitive: bool,
) -> Result<SearchResult<'a>, QueryError> {
    let compiled = CompiledQuery::new(query, 0)?;
    let candidates: Vec<&Document> = documents.iter().collect();
    let documents = QueryExecutor::new(case_sensitive).evaluate(compiled.ast.as_ref(), &candidates);
    Ok(SearchResult {
        documents,
        notices: compiled.notices,
        highlight_terms: compiled.highlight_terms,
    })
}

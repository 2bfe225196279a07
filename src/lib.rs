//! # codequery - Boolean and filter queries over source code
//!
//! codequery compiles a small query language (`brown AND cat`,
//! `lang=go,python NOT /unsafe\s*\{/`, `complexity=high`) into a planned
//! expression tree and evaluates it against a loaded corpus or one file at a
//! time. Imperfect queries are healed where possible and the repairs are
//! reported as notices.
//!
//! ## Architecture
//!
//! - [`query`] - Lexer, parser, alias rewriting, planner, term extraction
//!   and the two evaluators (corpus and per-file)
//! - [`corpus`] - Document model and directory loading
//! - [`search`] - The end-to-end pipeline ([`SearchEngine`])
//! - [`config`] - User configuration
//! - [`output`] - Terminal result formatting
//! - [`utils`] - Substring, regex and fuzzy matching primitives
//!
//! ## Quick Start
//!
//! ```
//! use codequery::corpus::Document;
//! use codequery::search;
//!
//! let docs = vec![
//!     Document::from_path("house.go", "A brown cat is in the house.", 2),
//!     Document::from_path("yard.py", "A brown dog is in the yard.", 2),
//! ];
//!
//! let result = search("brown AND cat", &docs, false).unwrap();
//! assert_eq!(result.documents.len(), 1);
//! assert_eq!(result.documents[0].path, "house.go");
//! ```
//!
//! ## Per-file evaluation
//!
//! When metadata arrives late, evaluate content first and resolve
//! `lang`/`complexity` filters afterwards:
//!
//! ```
//! use codequery::query::{evaluate_file, post_eval_metadata_filters};
//! use codequery::SearchEngine;
//!
//! let engine = SearchEngine::new(Vec::new(), Default::default());
//! let compiled = engine.compile("cat lang=go").unwrap();
//! let ast = compiled.ast.as_ref();
//!
//! let hit = evaluate_file(ast, b"one cat", "a.go", "src/a.go", false);
//! assert!(hit.matched && post_eval_metadata_filters(ast, "go", 3));
//! assert!(!hit.with_metadata("rust", 3).matched);
//! ```

pub mod config;
pub mod corpus;
pub mod output;
pub mod query;
pub mod search;
pub mod utils;

pub use config::SearchConfig;
pub use query::QueryError;
pub use search::{CompiledQuery, SearchEngine, SearchResult, search};

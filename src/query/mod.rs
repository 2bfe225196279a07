pub mod ast;
pub mod error;
pub mod executor;
pub mod extractor;
pub mod file_executor;
pub mod filters;
pub mod lexer;
pub mod parser;
pub mod planner;
pub mod transformer;

pub use ast::{Filter, FilterOp, FilterValue, Node};
pub use error::QueryError;
pub use executor::{QueryExecutor, evaluate};
pub use extractor::{count_all_terms, extract_terms};
pub use file_executor::{FileEvaluation, MatchLocations, evaluate_file, post_eval_metadata_filters};
pub use parser::{ParsedQuery, parse_query};
pub use planner::plan_ast;
pub use transformer::transform;

//! Matching primitives shared by both evaluation modes.
//!
//! ## Modules
//!
//! - [`matcher`] - Exact and Unicode-aware case-insensitive substring search
//! - [`fuzzy`] - Bounded edit-distance word matching
//! - [`tokenizer`] - Word extraction and branch counting
//!
//! ## Key Functions
//!
//! ```
//! use codequery::utils::{find_all, find_all_ignore_case};
//!
//! assert_eq!(find_all(b"cat cat", b"cat"), vec![0..3, 4..7]);
//! assert_eq!(find_all_ignore_case("École".as_bytes(), "école"), vec![0..6]);
//! ```

pub mod fuzzy;
pub mod matcher;
pub mod tokenizer;

pub use fuzzy::{contains_fuzzy, find_fuzzy};
pub use matcher::{find_all, find_all_ignore_case};
pub use tokenizer::{byte_words, count_branches, words};

//! Document model and directory loading.

pub mod loader;
pub mod types;

pub use loader::{estimate_complexity, is_binary, load_directory};
pub use types::{Document, language_for_extension};

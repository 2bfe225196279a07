use rustc_hash::FxHashMap;
use serde::Serialize;
use std::path::Path;
use std::sync::LazyLock;

/// Language reported for unrecognized extensions
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// `lang=` names and the file extensions that imply them
const LANGUAGES: &[(&str, &[&str])] = &[
    ("c", &["c", "h"]),
    ("clojure", &["clj", "cljs", "cljc", "edn"]),
    ("cpp", &["cpp", "cc", "cxx", "hpp", "hxx", "hh"]),
    ("csharp", &["cs"]),
    ("css", &["css", "scss", "sass", "less"]),
    ("elixir", &["ex", "exs"]),
    ("go", &["go"]),
    ("haskell", &["hs", "lhs"]),
    ("html", &["html", "htm"]),
    ("java", &["java"]),
    ("javascript", &["js", "mjs", "cjs", "jsx"]),
    ("json", &["json"]),
    ("kotlin", &["kt", "kts"]),
    ("lua", &["lua"]),
    ("markdown", &["md", "markdown"]),
    ("ocaml", &["ml", "mli"]),
    ("perl", &["pl", "pm"]),
    ("php", &["php"]),
    ("python", &["py", "pyi", "pyw"]),
    ("ruby", &["rb", "rake"]),
    ("rust", &["rs"]),
    ("scala", &["scala", "sc"]),
    ("shell", &["sh", "bash", "zsh", "fish"]),
    ("sql", &["sql"]),
    ("swift", &["swift"]),
    ("toml", &["toml"]),
    ("typescript", &["ts", "mts", "cts", "tsx"]),
    ("yaml", &["yaml", "yml"]),
    ("zig", &["zig"]),
];

static BY_EXTENSION: LazyLock<FxHashMap<&'static str, &'static str>> = LazyLock::new(|| {
    LANGUAGES
        .iter()
        .flat_map(|&(name, extensions)| extensions.iter().map(move |&ext| (ext, name)))
        .collect()
});

/// Language name for a file extension, ignoring case and a leading `.`
pub fn language_for_extension(extension: &str) -> &'static str {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    BY_EXTENSION
        .get(extension.as_str())
        .copied()
        .unwrap_or(UNKNOWN_LANGUAGE)
}

/// A searchable document with its metadata.
///
/// Read-only to the query engine; identity for set operations is `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub path: String,
    pub filename: String,
    pub language: String,
    pub extension: String,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub complexity: u32,
}

impl Document {
    /// Build a document, deriving filename, extension and language from the path
    pub fn from_path(path: impl Into<String>, content: impl Into<Vec<u8>>, complexity: u32) -> Self {
        let path = path.into();
        let file_path = Path::new(&path);
        let filename = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let extension = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        let language = language_for_extension(&extension).to_string();

        Self {
            path,
            filename,
            language,
            extension,
            content: content.into(),
            complexity,
        }
    }

    /// Override the detected language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

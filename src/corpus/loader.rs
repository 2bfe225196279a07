use crate::config::SearchConfig;
use crate::corpus::types::Document;
use crate::utils::tokenizer::count_branches;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Bytes inspected when sniffing for binary content
const BINARY_SNIFF_LEN: usize = 8192;

/// Highest complexity score a document can get
pub const MAX_COMPLEXITY: u32 = 10;

/// Check if content looks binary: a NUL byte near the start
pub fn is_binary(content: &[u8]) -> bool {
    let sample = &content[..content.len().min(BINARY_SNIFF_LEN)];
    memchr::memchr(0, sample).is_some()
}

/// Approximate complexity score in `0..=10` from branch density.
///
/// One branch every five lines scores the maximum.
pub fn estimate_complexity(content: &str) -> u32 {
    let lines = content.lines().filter(|l| !l.trim().is_empty()).count();
    if lines == 0 {
        return 0;
    }
    let branches = count_branches(content);
    let score = (branches * 50).div_ceil(lines);
    (score as u32).min(MAX_COMPLEXITY)
}

/// Load every text file under `root` as a document.
///
/// Honors `.gitignore`, skips hidden files, common build directories,
/// binaries and files over `config.max_file_size`. Paths are relative to
/// `root` with `/` separators and the result is sorted by path.
pub fn load_directory(root: &Path, config: &SearchConfig) -> Result<Vec<Document>> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", root.display()))?;

    let walker = WalkBuilder::new(&root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !matches!(
                name.as_ref(),
                ".git" | "node_modules" | "target" | "__pycache__" | ".venv" | "venv"
            )
        })
        .build();

    let entries: Vec<(PathBuf, String)> = walker
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let path = entry.path().to_path_buf();
            let rel = relative_path(&root, &path)?;
            Some((path, rel))
        })
        .collect();

    debug!(root = %root.display(), files = entries.len(), "walked directory");

    let max_file_size = config.max_file_size;
    let mut documents: Vec<Document> = entries
        .into_par_iter()
        .filter_map(|(path, rel)| load_file(&path, rel, max_file_size))
        .collect();

    documents.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(documents)
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(parts.join("/"))
}

fn load_file(path: &Path, rel: String, max_file_size: u64) -> Option<Document> {
    let size = match path.metadata() {
        Ok(meta) => meta.len(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot stat file");
            return None;
        }
    };
    if size > max_file_size {
        debug!(path = %rel, size, "skipping oversized file");
        return None;
    }

    let content = match fs::read(path) {
        Ok(content) => content,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot read file");
            return None;
        }
    };
    if is_binary(&content) {
        debug!(path = %rel, "skipping binary file");
        return None;
    }

    let complexity = estimate_complexity(&String::from_utf8_lossy(&content));
    Some(Document::from_path(rel, content, complexity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_binary() {
        assert!(is_binary(b"abc\0def"));
        assert!(!is_binary(b"plain text\n"));
        let mut late_nul = vec![b'a'; BINARY_SNIFF_LEN];
        late_nul.push(0);
        assert!(!is_binary(&late_nul));
    }

    #[test]
    fn test_estimate_complexity_bounds() {
        assert_eq!(estimate_complexity(""), 0);
        assert_eq!(estimate_complexity("let x = 1;\nlet y = 2;\n"), 0);
        let dense = "if a { } else if b { }\n".repeat(20);
        assert_eq!(estimate_complexity(&dense), MAX_COMPLEXITY);
    }

    #[test]
    fn test_estimate_complexity_scales_with_density() {
        let sparse = format!("if a {{}}\n{}", "let x = 1;\n".repeat(49));
        let denser = format!("if a {{}}\n{}", "let x = 1;\n".repeat(9));
        assert!(estimate_complexity(&sparse) < estimate_complexity(&denser));
        assert_eq!(estimate_complexity(&sparse), 1);
    }
}

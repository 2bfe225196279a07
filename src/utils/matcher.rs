//! Substring search primitives.
//!
//! All functions return ordered, non-overlapping `[start, end)` byte ranges
//! into the raw haystack they were given. Content is never decoded first, so
//! invalid UTF-8 cannot shift offsets; it simply never matches a needle.

use memchr::memmem;
use regex::bytes::{Regex, RegexBuilder};
use std::ops::Range;

/// Exact, case-sensitive matches
pub fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<Range<usize>> {
    if needle.is_empty() {
        return Vec::new();
    }
    memmem::find_iter(haystack, needle)
        .map(|start| start..start + needle.len())
        .collect()
}

/// Unicode-aware case-insensitive matches.
///
/// Folding is Unicode simple case folding, so a fold that would change a
/// character's length (`ß` to `ss`, `İ` to `i̇`) never matches.
pub fn find_all_ignore_case(haystack: &[u8], needle: &str) -> Vec<Range<usize>> {
    match literal_regex(needle, false) {
        Some(regex) => find_regex(haystack, &regex),
        None => Vec::new(),
    }
}

/// Compile a literal for matching over raw bytes; `None` for an empty needle
pub fn literal_regex(needle: &str, case_sensitive: bool) -> Option<Regex> {
    if needle.is_empty() {
        return None;
    }
    compile_regex(&regex::escape(needle), case_sensitive)
}

/// Compile a query regex over raw bytes; `None` when the pattern is invalid
pub fn compile_regex(pattern: &str, case_sensitive: bool) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .ok()
}

/// Regex matches in raw content
pub fn find_regex(content: &[u8], regex: &Regex) -> Vec<Range<usize>> {
    regex
        .find_iter(content)
        .filter(|m| !m.is_empty())
        .map(|m| m.range())
        .collect()
}

/// Whether the regex has a non-empty match; empty matches highlight nothing
pub fn contains_regex(content: &[u8], regex: &Regex) -> bool {
    regex.find_iter(content).any(|m| !m.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_regex() {
        let re = compile_regex("fo+", false).unwrap();
        assert_eq!(find_regex(b"FOO bar fo", &re), vec![0..3, 8..10]);
        let re = compile_regex("fo+", true).unwrap();
        assert_eq!(find_regex(b"FOO bar fo", &re), vec![8..10]);
        assert!(compile_regex("(unclosed", false).is_none());
    }

    #[test]
    fn test_empty_regex_matches_nothing() {
        let re = compile_regex("x*", false).unwrap();
        assert!(!contains_regex(b"abc", &re));
        assert!(contains_regex(b"axxc", &re));
    }

    #[test]
    fn test_find_all_exact() {
        assert_eq!(find_all(b"cat cat", b"cat"), vec![0..3, 4..7]);
        assert_eq!(find_all(b"Cat", b"cat"), Vec::<Range<usize>>::new());
    }

    #[test]
    fn test_find_all_non_overlapping() {
        assert_eq!(find_all(b"aaaa", b"aa"), vec![0..2, 2..4]);
    }

    #[test]
    fn test_empty_needle_matches_nothing() {
        assert!(find_all(b"abc", b"").is_empty());
        assert!(find_all_ignore_case(b"abc", "").is_empty());
        assert!(literal_regex("", true).is_none());
    }

    #[test]
    fn test_ignore_case_ascii() {
        assert_eq!(find_all_ignore_case(b"A Brown CAT", "cat"), vec![8..11]);
    }

    #[test]
    fn test_ignore_case_unicode_offsets() {
        // 'É' is two bytes in UTF-8
        let hay = "ÉCOLE école".as_bytes();
        assert_eq!(find_all_ignore_case(hay, "école"), vec![0..6, 7..13]);
    }

    #[test]
    fn test_ignore_case_length_changing_fold() {
        let hay = "İx ix".as_bytes();
        assert_eq!(find_all_ignore_case(hay, "ix"), vec![4..6]);
        assert!(find_all_ignore_case("naïve Straße".as_bytes(), "STRASSE").is_empty());
        assert_eq!(find_all_ignore_case("naïve Straße".as_bytes(), "NAÏVE"), vec![0..6]);
    }

    #[test]
    fn test_ignore_case_offsets_in_invalid_utf8() {
        let content = b"\xff\xfe cat \xc3 CAT";
        let ranges = find_all_ignore_case(content, "cat");
        assert_eq!(ranges, vec![3..6, 9..12]);
        for range in ranges {
            assert!(content[range].eq_ignore_ascii_case(b"cat"));
        }
    }

    #[test]
    fn test_literal_regex_escapes_metacharacters() {
        let re = literal_regex("a.b(", true).unwrap();
        assert!(contains_regex(b"x a.b( y", &re));
        assert!(!contains_regex(b"axb(", &re));
        let re = literal_regex("BROWN", false).unwrap();
        assert!(contains_regex(b"A brown cat", &re));
        let re = literal_regex("BROWN", true).unwrap();
        assert!(!contains_regex(b"A brown cat", &re));
    }
}

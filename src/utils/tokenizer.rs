//! Word extraction from source code content.
//!
//! A word is a maximal run of alphanumeric characters and underscores, so
//! `get_user_by_id` and `getUserById` are single words. Offsets are byte
//! offsets into the original text; for raw content, invalid UTF-8 sequences
//! separate words.

use std::ops::Range;

/// Words longer than this are likely base64, hex dumps or minified blobs
const MAX_WORD_LENGTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq)]
enum CharType {
    Word,
    Other,
}

fn classify_char(ch: char) -> CharType {
    if ch.is_alphanumeric() || ch == '_' {
        CharType::Word
    } else {
        CharType::Other
    }
}

/// Iterate over words and their byte ranges
pub fn words(content: &str) -> impl Iterator<Item = (Range<usize>, &str)> {
    let mut start: Option<usize> = None;
    let mut chars = content.char_indices();

    std::iter::from_fn(move || {
        loop {
            match chars.next() {
                Some((pos, ch)) => match (classify_char(ch), start) {
                    (CharType::Word, None) => start = Some(pos),
                    (CharType::Word, Some(_)) => {}
                    (CharType::Other, Some(begin)) => {
                        start = None;
                        if pos - begin <= MAX_WORD_LENGTH {
                            return Some((begin..pos, &content[begin..pos]));
                        }
                    }
                    (CharType::Other, None) => {}
                },
                None => {
                    let begin = start.take()?;
                    if content.len() - begin <= MAX_WORD_LENGTH {
                        return Some((begin..content.len(), &content[begin..]));
                    }
                    return None;
                }
            }
        }
    })
}

/// Iterate over words of raw content, with byte ranges into `content`
pub fn byte_words(content: &[u8]) -> impl Iterator<Item = (Range<usize>, &str)> {
    content
        .utf8_chunks()
        .scan(0, |offset, chunk| {
            let base = *offset;
            *offset += chunk.valid().len() + chunk.invalid().len();
            Some((base, chunk.valid()))
        })
        .flat_map(|(base, valid)| {
            words(valid).map(move |(range, word)| (range.start + base..range.end + base, word))
        })
}

/// Keywords that open a branch in most C-family and scripting languages
const BRANCH_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "for", "foreach", "while", "match", "case", "when", "catch", "except",
    "rescue", "switch",
];

/// Count branching constructs: branch keywords plus `&&`, `||` and `?`
pub fn count_branches(content: &str) -> usize {
    let keywords = words(content)
        .filter(|(_, word)| BRANCH_KEYWORDS.contains(word))
        .count();
    let bytes = content.as_bytes();
    let operators = memchr::memmem::find_iter(bytes, b"&&").count()
        + memchr::memmem::find_iter(bytes, b"||").count()
        + memchr::memchr_iter(b'?', bytes).count();
    keywords + operators
}

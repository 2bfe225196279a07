//! Query tokenizer.
//!
//! Produces one token per call. Whitespace is tokenized rather than dropped so
//! that callers can reconstruct the original spacing; the parser skips it.

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input
    Eof,
    /// A lone `!`, `>` or `<` that did not complete an operator
    Illegal,
    Whitespace,
    /// `"..."`, literal holds the text between the quotes
    Phrase,
    /// `/.../`, literal holds the pattern between the slashes
    Regex,
    /// One of `=`, `!=`, `>=`, `<=`
    Operator,
    LParen,
    RParen,
    And,
    Or,
    Not,
    Identifier,
    Number,
    /// `high`, `medium` or `low`
    Alias,
    Comma,
    /// `term~1` or `term~2`, literal holds `term`
    Fuzzy { distance: u8 },
}

/// A single lexed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>) -> Self {
        Self {
            kind,
            literal: literal.into(),
        }
    }

    pub fn eof() -> Self {
        Self::new(TokenKind::Eof, "")
    }
}

/// Characters that always start or terminate a special token
fn is_special(ch: char) -> bool {
    matches!(ch, '(' | ')' | '"' | ',' | '=' | '!' | '>' | '<' | '/')
}

/// Streaming lexer over a query string
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Read the next token, returning `Eof` forever once input is exhausted
    pub fn next_token(&mut self) -> Token {
        let Some(ch) = self.peek_char() else {
            return Token::eof();
        };

        match ch {
            c if c.is_whitespace() => self.read_whitespace(),
            '(' => self.read_single(TokenKind::LParen),
            ')' => self.read_single(TokenKind::RParen),
            ',' => self.read_single(TokenKind::Comma),
            '"' => self.read_delimited('"', TokenKind::Phrase),
            '/' => self.read_delimited('/', TokenKind::Regex),
            '=' | '!' | '>' | '<' => self.read_operator(),
            _ => self.read_identifier(),
        }
    }

    fn read_single(&mut self, kind: TokenKind) -> Token {
        let start = self.pos;
        self.advance();
        Token::new(kind, &self.input[start..self.pos])
    }

    fn read_whitespace(&mut self) -> Token {
        let start = self.pos;
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
        Token::new(TokenKind::Whitespace, &self.input[start..self.pos])
    }

    /// Scan to the closing delimiter; an unterminated literal runs to end of input
    fn read_delimited(&mut self, delimiter: char, kind: TokenKind) -> Token {
        self.advance();
        let start = self.pos;

        while let Some(ch) = self.peek_char() {
            if ch == delimiter {
                break;
            }
            self.advance();
        }

        let token = Token::new(kind, &self.input[start..self.pos]);
        if self.peek_char() == Some(delimiter) {
            self.advance();
        }
        token
    }

    fn read_operator(&mut self) -> Token {
        let start = self.pos;
        let first = self.peek_char().unwrap_or('=');
        self.advance();

        // The second character is left in place unless it completes an operator
        if matches!(first, '!' | '>' | '<') {
            if self.peek_char() == Some('=') {
                self.advance();
                return Token::new(TokenKind::Operator, &self.input[start..self.pos]);
            }
            return Token::new(TokenKind::Illegal, &self.input[start..self.pos]);
        }

        Token::new(TokenKind::Operator, &self.input[start..self.pos])
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.pos;
        let mut prev: Option<char> = None;

        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                break;
            }
            // `->` stays inside identifiers so that `a->b` is searchable
            if is_special(ch) && !(ch == '>' && prev == Some('-')) {
                break;
            }
            prev = Some(ch);
            self.advance();
        }

        classify(&self.input[start..self.pos])
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }
}

/// Reclassify a plain word run into keywords, aliases, numbers and fuzzy terms
fn classify(word: &str) -> Token {
    if word.eq_ignore_ascii_case("and") {
        return Token::new(TokenKind::And, word);
    }
    if word.eq_ignore_ascii_case("or") {
        return Token::new(TokenKind::Or, word);
    }
    if word.eq_ignore_ascii_case("not") {
        return Token::new(TokenKind::Not, word);
    }
    if ["high", "medium", "low"]
        .iter()
        .any(|alias| word.eq_ignore_ascii_case(alias))
    {
        return Token::new(TokenKind::Alias, word);
    }
    if !word.is_empty() && word.bytes().all(|b| b.is_ascii_digit()) {
        return Token::new(TokenKind::Number, word);
    }
    if let Some((prefix, distance)) = fuzzy_suffix(word) {
        return Token::new(TokenKind::Fuzzy { distance }, prefix);
    }
    Token::new(TokenKind::Identifier, word)
}

/// Split `term~1` / `term~2` into the term and its distance
fn fuzzy_suffix(word: &str) -> Option<(&str, u8)> {
    let (prefix, distance) = word
        .strip_suffix("~1")
        .map(|p| (p, 1))
        .or_else(|| word.strip_suffix("~2").map(|p| (p, 2)))?;

    if prefix.is_empty() {
        None
    } else {
        Some((prefix, distance))
    }
}

/// Tokenize a whole query, whitespace included, without the trailing `Eof`
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        if token.kind == TokenKind::Eof {
            break;
        }
        tokens.push(token);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .into_iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_whitespace_is_tokenized() {
        let tokens = tokenize("cat  dog");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].kind, TokenKind::Whitespace);
        assert_eq!(tokens[1].literal, "  ");
    }

    #[test]
    fn test_boolean_operators_case_insensitive() {
        assert_eq!(
            kinds("a and b Or NOT c"),
            vec![
                TokenKind::Identifier,
                TokenKind::And,
                TokenKind::Identifier,
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn test_phrase_and_regex() {
        let tokens = tokenize("\"hello world\" /fo+/");
        assert_eq!(tokens[0], Token::new(TokenKind::Phrase, "hello world"));
        assert_eq!(tokens[2], Token::new(TokenKind::Regex, "fo+"));
    }

    #[test]
    fn test_unterminated_literals_run_to_end() {
        let tokens = tokenize("\"hello world");
        assert_eq!(tokens, vec![Token::new(TokenKind::Phrase, "hello world")]);

        let tokens = tokenize("/abc def");
        assert_eq!(tokens, vec![Token::new(TokenKind::Regex, "abc def")]);
    }

    #[test]
    fn test_operators() {
        let tokens = tokenize("complexity>=8");
        assert_eq!(tokens[0], Token::new(TokenKind::Identifier, "complexity"));
        assert_eq!(tokens[1], Token::new(TokenKind::Operator, ">="));
        assert_eq!(tokens[2], Token::new(TokenKind::Number, "8"));

        assert_eq!(tokenize("!=")[0], Token::new(TokenKind::Operator, "!="));
        assert_eq!(tokenize("<=")[0], Token::new(TokenKind::Operator, "<="));
        assert_eq!(tokenize("=")[0], Token::new(TokenKind::Operator, "="));
    }

    #[test]
    fn test_incomplete_operator_unreads_second_char() {
        let tokens = tokenize(">a");
        assert_eq!(tokens[0], Token::new(TokenKind::Illegal, ">"));
        assert_eq!(tokens[1], Token::new(TokenKind::Identifier, "a"));
    }

    #[test]
    fn test_doubled_equals_yields_two_operators() {
        assert_eq!(
            kinds("lang==go"),
            vec![
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::Operator,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn test_aliases_and_numbers() {
        assert_eq!(kinds("HIGH medium low"), vec![TokenKind::Alias; 3]);
        assert_eq!(kinds("42"), vec![TokenKind::Number]);
        assert_eq!(kinds("42a"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn test_fuzzy_suffix() {
        assert_eq!(
            tokenize("cat~1")[0],
            Token::new(TokenKind::Fuzzy { distance: 1 }, "cat")
        );
        assert_eq!(
            tokenize("kitten~2")[0],
            Token::new(TokenKind::Fuzzy { distance: 2 }, "kitten")
        );
        assert_eq!(kinds("cat~3"), vec![TokenKind::Identifier]);
        assert_eq!(kinds("~1"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn test_code_like_identifiers() {
        for word in ["field:value", "#define", "std::cout", "a->b", "foo.bar"] {
            let tokens = tokenize(word);
            assert_eq!(tokens, vec![Token::new(TokenKind::Identifier, word)], "{word}");
        }
    }

    #[test]
    fn test_specials_terminate_identifiers() {
        assert_eq!(
            kinds("(a,b)"),
            vec![
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::Comma,
                TokenKind::Identifier,
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut lexer = Lexer::new("a");
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }
}

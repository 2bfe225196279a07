//! Precedence-climbing query parser with syntax healing.
//!
//! Recoverable mistakes (a dangling `AND`/`OR`, stray or missing parentheses)
//! are repaired and reported as notices. Anything the parser cannot make sense
//! of fails the whole query with [`QueryError::InvalidQuery`].

use crate::query::ast::{Filter, FilterOp, FilterValue, Node, is_known_field};
use crate::query::error::QueryError;
use crate::query::lexer::{Lexer, Token, TokenKind};
use thiserror::Error;
use tracing::debug;

/// Deepest nesting of groups and `NOT` operands a query may use
pub const MAX_NESTING: usize = 256;

/// Most leaves and filters a single query may hold
pub const MAX_TERMS: usize = 1024;

/// Result of a successful parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// `None` when the query holds nothing to evaluate, e.g. `""` or `()`
    pub ast: Option<Node>,
    pub notices: Vec<String>,
}

/// Unrecoverable syntax, folded into [`QueryError::InvalidQuery`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
enum ParseFailure {
    #[error("'{0}' has no expression to combine")]
    BareOperator(String),
    #[error("'NOT' is missing its operand")]
    DanglingNot,
    #[error("filter '{0}' has no value")]
    MissingFilterValue(String),
    #[error("filter '{field}' has a doubled operator '{first}{second}'")]
    DoubledOperator {
        field: String,
        first: String,
        second: String,
    },
    #[error("operator '{0}' has no field")]
    OperatorWithoutField(String),
    #[error("query nests deeper than {MAX_NESTING} levels")]
    TooDeep,
    #[error("query has more than {MAX_TERMS} terms")]
    TooManyTerms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,
    And,
    /// A term appearing where an infix operator was expected
    Implicit,
    /// Operand of `NOT`
    Prefix,
}

/// Parse a query string into an AST plus healing notices
pub fn parse_query(input: &str) -> Result<ParsedQuery, QueryError> {
    let mut parser = Parser::new(input);
    match parser.parse() {
        Ok(ast) => {
            debug!(query = input, ast = ?ast, notices = ?parser.notices, "parsed query");
            Ok(ParsedQuery {
                ast,
                notices: parser.notices,
            })
        }
        Err(failure) => {
            debug!(query = input, %failure, "rejected query");
            Err(QueryError::invalid(input, failure.to_string()))
        }
    }
}

/// Per-parse state; nothing here outlives a single call to [`parse_query`]
struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peek: Token,
    /// Open parentheses
    depth: usize,
    /// Open groups plus `NOT` operands being parsed
    nesting: usize,
    terms: usize,
    notices: Vec<String>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        let mut parser = Self {
            lexer: Lexer::new(input),
            current: Token::eof(),
            peek: Token::eof(),
            depth: 0,
            nesting: 0,
            terms: 0,
            notices: Vec::new(),
        };
        parser.advance();
        parser.advance();
        parser
    }

    fn parse(&mut self) -> Result<Option<Node>, ParseFailure> {
        self.parse_sequence()
    }

    /// Parse expressions until end of input (or the `)` closing the current
    /// group), joining consecutive ones with AND.
    fn parse_sequence(&mut self) -> Result<Option<Node>, ParseFailure> {
        let mut root: Option<Node> = None;

        loop {
            match self.current.kind {
                TokenKind::Eof => break,
                TokenKind::RParen if self.depth > 0 => break,
                TokenKind::RParen => {
                    self.notice("Unmatched ')' was ignored");
                    self.advance();
                    continue;
                }
                TokenKind::And | TokenKind::Or if root.is_some() && self.is_dangling() => {
                    let op = self.current.literal.to_uppercase();
                    self.notice(format!("Trailing '{op}' was ignored"));
                    self.advance();
                    continue;
                }
                // Resumed after a skipped `)`: the operator keeps its left operand
                TokenKind::And | TokenKind::Or => {
                    if let Some(left) = root.take() {
                        root = Some(self.parse_infix(left)?);
                        continue;
                    }
                }
                _ => {}
            }

            if let Some(node) = self.parse_expression(Precedence::Lowest)? {
                root = Some(match root {
                    Some(prev) => Node::and(prev, node),
                    None => node,
                });
            }
        }

        Ok(root)
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Result<Option<Node>, ParseFailure> {
        let Some(mut left) = self.parse_prefix()? else {
            return Ok(None);
        };

        while self.current_precedence() > precedence {
            match self.current.kind {
                TokenKind::And | TokenKind::Or => {
                    // Left for parse_sequence to report
                    if self.is_dangling() {
                        break;
                    }
                    left = self.parse_infix(left)?;
                }
                _ => {
                    if let Some(right) = self.parse_expression(Precedence::Implicit)? {
                        left = Node::and(left, right);
                    }
                }
            }
        }

        Ok(Some(left))
    }

    /// Consume the AND/OR at `current` and its right operand
    fn parse_infix(&mut self, left: Node) -> Result<Node, ParseFailure> {
        let is_and = self.current.kind == TokenKind::And;
        let op_precedence = self.current_precedence();
        self.advance();

        // `cat AND )` drops the operator without a notice
        Ok(match self.parse_expression(op_precedence)? {
            Some(right) if is_and => Node::and(left, right),
            Some(right) => Node::or(left, right),
            None => left,
        })
    }

    fn parse_prefix(&mut self) -> Result<Option<Node>, ParseFailure> {
        loop {
            match self.current.kind {
                TokenKind::Eof => return Ok(None),
                TokenKind::RParen if self.depth > 0 => return Ok(None),
                TokenKind::RParen => {
                    self.notice("Unmatched ')' was ignored");
                    self.advance();
                }
                TokenKind::LParen => return self.parse_group(),
                TokenKind::Not => return self.parse_not().map(Some),
                TokenKind::And | TokenKind::Or => {
                    return Err(ParseFailure::BareOperator(
                        self.current.literal.to_uppercase(),
                    ));
                }
                TokenKind::Operator => {
                    return Err(ParseFailure::OperatorWithoutField(
                        self.current.literal.clone(),
                    ));
                }
                TokenKind::Identifier | TokenKind::Number | TokenKind::Alias => {
                    self.count_term()?;
                    return self.parse_word().map(Some);
                }
                TokenKind::Phrase => {
                    self.count_term()?;
                    return Ok(Some(Node::Phrase(self.take_literal())));
                }
                TokenKind::Regex => {
                    self.count_term()?;
                    return Ok(Some(Node::Regex(self.take_literal())));
                }
                TokenKind::Fuzzy { distance } => {
                    self.count_term()?;
                    let value = self.take_literal();
                    return Ok(Some(Node::Fuzzy { value, distance }));
                }
                // Stray punctuation is searched for literally
                TokenKind::Illegal | TokenKind::Comma | TokenKind::Whitespace => {
                    self.count_term()?;
                    return Ok(Some(Node::Keyword(self.take_literal())));
                }
            }
        }
    }

    fn parse_group(&mut self) -> Result<Option<Node>, ParseFailure> {
        self.enter()?;
        self.advance();
        self.depth += 1;
        let inner = self.parse_sequence()?;

        if self.current.kind == TokenKind::RParen {
            self.advance();
        } else {
            self.notice("Missing closing ')' was added");
        }
        self.depth -= 1;
        self.nesting -= 1;

        Ok(inner)
    }

    fn parse_not(&mut self) -> Result<Node, ParseFailure> {
        self.enter()?;
        self.advance();
        if matches!(self.current.kind, TokenKind::Eof | TokenKind::RParen) {
            return Err(ParseFailure::DanglingNot);
        }
        let operand = self.parse_expression(Precedence::Prefix)?;
        self.nesting -= 1;
        match operand {
            Some(operand) => Ok(Node::not(operand)),
            None => Err(ParseFailure::DanglingNot),
        }
    }

    /// Recursion guard for groups and `NOT` operands
    fn enter(&mut self) -> Result<(), ParseFailure> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return Err(ParseFailure::TooDeep);
        }
        Ok(())
    }

    fn count_term(&mut self) -> Result<(), ParseFailure> {
        self.terms += 1;
        if self.terms > MAX_TERMS {
            return Err(ParseFailure::TooManyTerms);
        }
        Ok(())
    }

    /// Identifier, number or alias: a filter when an operator follows or the
    /// word has a recognized `field:` prefix, otherwise a keyword.
    fn parse_word(&mut self) -> Result<Node, ParseFailure> {
        let literal = self.current.literal.clone();

        if let Some((field, value)) = literal.split_once(':')
            && is_known_field(field)
        {
            if !value.is_empty() {
                self.advance();
                let mut values = vec![value.to_string()];
                self.collect_list_tail(&mut values);
                return Ok(Node::Filter(Filter::new(
                    field,
                    FilterOp::Eq,
                    FilterValue::from_values(values),
                )));
            }
            if self.peek.kind == TokenKind::Operator {
                self.advance();
                return self.parse_filter(field.to_string());
            }
        }

        if self.peek.kind == TokenKind::Operator {
            self.advance();
            return self.parse_filter(literal);
        }

        self.advance();
        Ok(Node::Keyword(literal))
    }

    /// Parse `op value[,value...]` for an already consumed field
    fn parse_filter(&mut self, field: String) -> Result<Node, ParseFailure> {
        let op_literal = self.current.literal.clone();
        let Some(op) = FilterOp::parse(&op_literal) else {
            return Err(ParseFailure::OperatorWithoutField(op_literal));
        };
        self.advance();

        if self.current.kind == TokenKind::Operator {
            return Err(ParseFailure::DoubledOperator {
                field,
                first: op_literal,
                second: self.current.literal.clone(),
            });
        }

        let mut values = Vec::new();
        if Self::is_value(&self.current) {
            values.push(self.take_literal());
            self.collect_list_tail(&mut values);
        }

        if values.is_empty() {
            return Err(ParseFailure::MissingFilterValue(field));
        }

        Ok(Node::Filter(Filter::new(
            field,
            op,
            FilterValue::from_values(values),
        )))
    }

    /// Greedily consume `,value` continuations. Empty slots between commas are
    /// kept; trailing commas are dropped.
    fn collect_list_tail(&mut self, values: &mut Vec<String>) {
        while self.current.kind == TokenKind::Comma {
            let mut commas = 0;
            while self.current.kind == TokenKind::Comma {
                commas += 1;
                self.advance();
            }

            if !Self::is_value(&self.current) {
                break;
            }
            values.extend(std::iter::repeat_n(String::new(), commas - 1));
            values.push(self.take_literal());
        }
    }

    fn is_value(token: &Token) -> bool {
        matches!(
            token.kind,
            TokenKind::Number | TokenKind::Identifier | TokenKind::Alias | TokenKind::Phrase
        )
    }

    fn current_precedence(&self) -> Precedence {
        match self.current.kind {
            TokenKind::Or => Precedence::Or,
            TokenKind::And => Precedence::And,
            TokenKind::Identifier
            | TokenKind::Number
            | TokenKind::Alias
            | TokenKind::Phrase
            | TokenKind::Regex
            | TokenKind::Fuzzy { .. }
            | TokenKind::LParen
            | TokenKind::Not => Precedence::Implicit,
            _ => Precedence::Lowest,
        }
    }

    /// An AND/OR with nothing after it: end of input, or the `)` closing an
    /// open group.
    fn is_dangling(&self) -> bool {
        match self.peek.kind {
            TokenKind::Eof => true,
            TokenKind::RParen => self.depth > 0,
            _ => false,
        }
    }

    fn take_literal(&mut self) -> String {
        let literal = std::mem::take(&mut self.current.literal);
        self.advance();
        literal
    }

    fn notice(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(notice = %message, "healed query");
        self.notices.push(message);
    }

    /// Shift the lookahead window, skipping whitespace
    fn advance(&mut self) {
        let mut next = self.lexer.next_token();
        while next.kind == TokenKind::Whitespace {
            next = self.lexer.next_token();
        }
        self.current = std::mem::replace(&mut self.peek, next);
    }
}

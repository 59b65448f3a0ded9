//! Tokenizer implementation
//!
//! Main lexer structure and token generation logic. The lexer is a lazy,
//! single-pass iterator: every character is visited once and no state is
//! ever rewound.

use super::literals::{is_digit, is_identifier_char, is_identifier_start, scan_escape, scan_number};
use super::tokens::*;
use crate::util::span::{Position, Span};
use std::iter::{FusedIterator, Peekable};
use std::str::Chars;

/// Main lexer structure
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    offset: usize,
    line: usize,
    column: usize,
    start: Position,
    /// Open interpolation regions; each entry counts the `{` nested inside
    /// the interpolated expression so the matching `}` can be found.
    interpolation: Vec<usize>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            offset: 0,
            line: 1,
            column: 1,
            start: Position::with_offset(1, 1, 0),
            interpolation: Vec::new(),
            finished: false,
        }
    }

    /// Get current position
    pub fn current_position(&self) -> Position {
        Position::with_offset(self.line, self.column, self.offset)
    }

    /// Get span of current token
    pub fn span(&self) -> Span {
        Span::new(self.start, self.current_position())
    }

    /// Advance to next character
    pub fn advance(&mut self) -> Option<char> {
        match self.chars.next() {
            Some('\n') => {
                self.offset += 1;
                self.line += 1;
                self.column = 1;
                Some('\n')
            }
            Some(c) => {
                self.offset += c.len_utf8();
                self.column += 1;
                Some(c)
            }
            None => None,
        }
    }

    /// Peek at next character
    pub fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Peek at character after next
    pub fn peek_next(&self) -> Option<char> {
        self.chars.clone().nth(1)
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                '/' if self.peek_next() == Some('*') => {
                    let open = self.current_position();
                    self.advance();
                    self.advance();
                    let mut depth = 1;
                    while depth > 0 {
                        match self.advance() {
                            Some('/') if self.peek() == Some('*') => {
                                self.advance();
                                depth += 1;
                            }
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                depth -= 1;
                            }
                            Some(_) => {}
                            None => {
                                return Err(LexError::UnterminatedComment {
                                    span: Span::new(open, self.current_position()),
                                })
                            }
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Generate next token; `Ok(None)` once `Eof` has been produced
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        if self.finished {
            return Ok(None);
        }
        self.skip_whitespace_and_comments()?;
        self.start = self.current_position();

        let c = match self.advance() {
            Some(c) => c,
            None => {
                if !self.interpolation.is_empty() {
                    return Err(LexError::UnterminatedString { span: self.span() });
                }
                self.finished = true;
                return Ok(Some(self.make_token(TokenKind::Eof)));
            }
        };

        let kind = match c {
            'b' if self.peek() == Some('"') => {
                self.advance();
                return self.scan_bytes().map(Some);
            }
            '_' if !self.peek().is_some_and(is_identifier_char) => TokenKind::Underscore,
            c if is_identifier_start(c) => return Ok(Some(self.scan_identifier(c))),
            c if is_digit(c) => return scan_number(self, c).map(Some),
            '"' => return self.scan_string_body(true).map(Some),
            '{' => {
                if let Some(depth) = self.interpolation.last_mut() {
                    *depth += 1;
                }
                TokenKind::LBrace
            }
            '}' => match self.interpolation.last_mut() {
                Some(0) => {
                    self.interpolation.pop();
                    return self.scan_string_body(false).map(Some);
                }
                Some(depth) => {
                    *depth -= 1;
                    TokenKind::RBrace
                }
                None => TokenKind::RBrace,
            },
            '+' => self.with_eq(TokenKind::Plus, TokenKind::PlusEq),
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    self.with_eq(TokenKind::Minus, TokenKind::MinusEq)
                }
            }
            '*' => self.with_eq(TokenKind::Star, TokenKind::StarEq),
            '/' => self.with_eq(TokenKind::Slash, TokenKind::SlashEq),
            '%' => TokenKind::Percent,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '.' => TokenKind::Dot,
            '?' => TokenKind::Question,
            '=' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::FatArrow
                } else {
                    self.with_eq(TokenKind::Eq, TokenKind::EqEq)
                }
            }
            '!' => self.with_eq(TokenKind::Not, TokenKind::Neq),
            '<' => self.with_eq(TokenKind::Lt, TokenKind::Le),
            '>' => self.with_eq(TokenKind::Gt, TokenKind::Ge),
            '&' if self.peek() == Some('&') => {
                self.advance();
                TokenKind::And
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                TokenKind::Or
            }
            ':' => {
                if self.peek() == Some(':') {
                    self.advance();
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                }
            }
            c => return Err(LexError::UnexpectedChar { ch: c, span: self.span() }),
        };
        Ok(Some(self.make_token(kind)))
    }

    /// `plain`, or `with_eq` when the next character is `=`
    fn with_eq(
        &mut self,
        plain: TokenKind,
        with_eq: TokenKind,
    ) -> TokenKind {
        if self.peek() == Some('=') {
            self.advance();
            with_eq
        } else {
            plain
        }
    }

    /// Scan identifier token
    fn scan_identifier(
        &mut self,
        first_char: char,
    ) -> Token {
        let mut value = String::new();
        value.push(first_char);

        while let Some(c) = self.peek() {
            if !is_identifier_char(c) {
                break;
            }
            value.push(c);
            self.advance();
        }

        let kind = keyword_from_str(&value).unwrap_or(TokenKind::Identifier(value));
        self.make_token(kind)
    }

    /// Scan string text up to the closing quote or the next interpolation
    /// opener. `fresh` is true right after an opening `"` and false when
    /// resuming after an interpolated expression.
    fn scan_string_body(
        &mut self,
        fresh: bool,
    ) -> Result<Token, LexError> {
        let mut text = String::new();
        loop {
            match self.advance() {
                Some('"') => {
                    let kind = if fresh {
                        TokenKind::StringLiteral(text)
                    } else {
                        TokenKind::StringEnd(text)
                    };
                    return Ok(self.make_token(kind));
                }
                Some('{') => {
                    self.interpolation.push(0);
                    let kind = if fresh {
                        TokenKind::StringStart(text)
                    } else {
                        TokenKind::StringMiddle(text)
                    };
                    return Ok(self.make_token(kind));
                }
                Some('\\') => text.push(scan_escape(self)?),
                Some(c) => text.push(c),
                None => return Err(LexError::UnterminatedString { span: self.span() }),
            }
        }
    }

    /// Scan a `b"..."` literal; braces are plain bytes here
    fn scan_bytes(&mut self) -> Result<Token, LexError> {
        let mut bytes = Vec::new();
        loop {
            match self.advance() {
                Some('"') => return Ok(self.make_token(TokenKind::BytesLiteral(bytes))),
                Some('\\') => {
                    let c = scan_escape(self)?;
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
                Some(c) => {
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
                None => return Err(LexError::UnterminatedString { span: self.span() }),
            }
        }
    }

    /// Create token with current span
    pub fn make_token(
        &self,
        kind: TokenKind,
    ) -> Token {
        Token::new(kind, self.span())
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for Lexer<'_> {}

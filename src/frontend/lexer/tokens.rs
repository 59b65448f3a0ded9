//! Token types

use crate::util::span::Span;
use std::fmt;

/// Lexer error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },
    #[error("unterminated block comment")]
    UnterminatedComment { span: Span },
    #[error("invalid escape sequence '\\{ch}'")]
    InvalidEscape { ch: char, span: Span },
    #[error("invalid number literal '{text}'")]
    InvalidNumber { text: String, span: Span },
    #[error("unexpected character '{ch}'")]
    UnexpectedChar { ch: char, span: Span },
}

impl LexError {
    /// Location of the error
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedString { span }
            | LexError::UnterminatedComment { span }
            | LexError::InvalidEscape { span, .. }
            | LexError::InvalidNumber { span, .. }
            | LexError::UnexpectedChar { span, .. } => *span,
        }
    }

    /// What the lexer wanted to see
    pub fn expectation(&self) -> &'static str {
        match self {
            LexError::UnterminatedString { .. } => "a closing '\"' before the end of input",
            LexError::UnterminatedComment { .. } => "a closing '*/' before the end of input",
            LexError::InvalidEscape { .. } => "one of \\n \\t \\r \\0 \\\\ \\\" \\{ \\}",
            LexError::InvalidNumber { .. } => "a well-formed integer or float literal",
            LexError::UnexpectedChar { .. } => "an operator, delimiter, literal or identifier",
        }
    }
}

/// Token kind
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    KwFn,
    KwAsync,
    KwAwait,
    KwExtern,
    KwExport,
    KwLet,
    KwConst,
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwIn,
    KwBreak,
    KwContinue,
    KwReturn,
    KwStruct,
    KwEnum,
    KwMatch,
    KwAs,

    // Identifiers
    Identifier(String),
    Underscore,

    // Literals
    IntLiteral(i128),
    FloatLiteral(f64),
    BoolLiteral(bool),
    StringLiteral(String),
    BytesLiteral(Vec<u8>),
    /// Text before the first `{` of an interpolated string
    StringStart(String),
    /// Text between two interpolated expressions
    StringMiddle(String),
    /// Text after the last interpolated expression
    StringEnd(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    EqEq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    ColonColon,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Arrow,
    FatArrow,
    Question,

    // Special
    Eof,
}

impl TokenKind {
    /// Short human readable description, used in parse errors
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("identifier '{}'", name),
            TokenKind::IntLiteral(n) => format!("integer {}", n),
            TokenKind::FloatLiteral(f) => format!("float {}", f),
            TokenKind::BoolLiteral(b) => format!("'{}'", b),
            TokenKind::StringLiteral(_) => "string literal".to_string(),
            TokenKind::BytesLiteral(_) => "byte string literal".to_string(),
            TokenKind::StringStart(_) | TokenKind::StringMiddle(_) | TokenKind::StringEnd(_) => {
                "interpolated string".to_string()
            }
            TokenKind::Eof => "end of input".to_string(),
            other => format!("'{}'", other),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let text = match self {
            TokenKind::KwFn => "fn",
            TokenKind::KwAsync => "async",
            TokenKind::KwAwait => "await",
            TokenKind::KwExtern => "extern",
            TokenKind::KwExport => "export",
            TokenKind::KwLet => "let",
            TokenKind::KwConst => "const",
            TokenKind::KwIf => "if",
            TokenKind::KwElse => "else",
            TokenKind::KwWhile => "while",
            TokenKind::KwFor => "for",
            TokenKind::KwIn => "in",
            TokenKind::KwBreak => "break",
            TokenKind::KwContinue => "continue",
            TokenKind::KwReturn => "return",
            TokenKind::KwStruct => "struct",
            TokenKind::KwEnum => "enum",
            TokenKind::KwMatch => "match",
            TokenKind::KwAs => "as",
            TokenKind::Identifier(name) => return write!(f, "{}", name),
            TokenKind::Underscore => "_",
            TokenKind::IntLiteral(n) => return write!(f, "{}", n),
            TokenKind::FloatLiteral(n) => return write!(f, "{}", n),
            TokenKind::BoolLiteral(b) => return write!(f, "{}", b),
            TokenKind::StringLiteral(s) => return write!(f, "{:?}", s),
            TokenKind::BytesLiteral(b) => return write!(f, "b{:?}", String::from_utf8_lossy(b)),
            TokenKind::StringStart(s) => return write!(f, "\"{}{{", s),
            TokenKind::StringMiddle(s) => return write!(f, "}}{}{{", s),
            TokenKind::StringEnd(s) => return write!(f, "}}{}\"", s),
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Eq => "=",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::EqEq => "==",
            TokenKind::Neq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Not => "!",
            TokenKind::ColonColon => "::",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Dot => ".",
            TokenKind::Arrow => "->",
            TokenKind::FatArrow => "=>",
            TokenKind::Question => "?",
            TokenKind::Eof => "<eof>",
        };
        f.write_str(text)
    }
}

/// Token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        span: Span,
    ) -> Self {
        Self { kind, span }
    }
}

impl From<TokenKind> for Token {
    fn from(kind: TokenKind) -> Self {
        Token {
            kind,
            span: Span::dummy(),
        }
    }
}

/// Map an identifier to its keyword token, if it is one
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "fn" => Some(TokenKind::KwFn),
        "async" => Some(TokenKind::KwAsync),
        "await" => Some(TokenKind::KwAwait),
        "extern" => Some(TokenKind::KwExtern),
        "export" => Some(TokenKind::KwExport),
        "let" => Some(TokenKind::KwLet),
        "const" => Some(TokenKind::KwConst),
        "if" => Some(TokenKind::KwIf),
        "else" => Some(TokenKind::KwElse),
        "while" => Some(TokenKind::KwWhile),
        "for" => Some(TokenKind::KwFor),
        "in" => Some(TokenKind::KwIn),
        "break" => Some(TokenKind::KwBreak),
        "continue" => Some(TokenKind::KwContinue),
        "return" => Some(TokenKind::KwReturn),
        "struct" => Some(TokenKind::KwStruct),
        "enum" => Some(TokenKind::KwEnum),
        "match" => Some(TokenKind::KwMatch),
        "as" => Some(TokenKind::KwAs),
        "true" => Some(TokenKind::BoolLiteral(true)),
        "false" => Some(TokenKind::BoolLiteral(false)),
        _ => None,
    }
}

//! Literal scanning helpers

use super::tokenizer::Lexer;
use super::tokens::{LexError, Token, TokenKind};

pub fn is_identifier_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

pub fn is_identifier_char(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Scan the character following a backslash
pub fn scan_escape(lexer: &mut Lexer<'_>) -> Result<char, LexError> {
    let at = lexer.current_position();
    match lexer.advance() {
        Some('n') => Ok('\n'),
        Some('t') => Ok('\t'),
        Some('r') => Ok('\r'),
        Some('0') => Ok('\0'),
        Some('\\') => Ok('\\'),
        Some('"') => Ok('"'),
        Some('{') => Ok('{'),
        Some('}') => Ok('}'),
        Some(ch) => Err(LexError::InvalidEscape {
            ch,
            span: crate::util::span::Span::new(at, lexer.current_position()),
        }),
        None => Err(LexError::UnterminatedString { span: lexer.span() }),
    }
}

/// Scan a number literal whose first digit has already been consumed.
///
/// Accepts decimal, `0x` hexadecimal and `0b` binary integers with `_`
/// separators, and decimal floats with an optional exponent.
pub fn scan_number(
    lexer: &mut Lexer<'_>,
    first: char,
) -> Result<Token, LexError> {
    let mut text = String::new();
    text.push(first);

    if first == '0' {
        let radix = match lexer.peek() {
            Some('x') | Some('X') => Some(16),
            Some('b') | Some('B') => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            if let Some(marker) = lexer.advance() {
                text.push(marker);
            }
            let mut digits = String::new();
            while let Some(c) = lexer.peek() {
                if c == '_' {
                    text.push(c);
                    lexer.advance();
                } else if c.is_ascii_alphanumeric() {
                    text.push(c);
                    digits.push(c);
                    lexer.advance();
                } else {
                    break;
                }
            }
            return match i128::from_str_radix(&digits, radix) {
                Ok(value) => Ok(lexer.make_token(TokenKind::IntLiteral(value))),
                Err(_) => Err(LexError::InvalidNumber {
                    text,
                    span: lexer.span(),
                }),
            };
        }
    }

    let mut is_float = false;
    eat_digits(lexer, &mut text);

    if lexer.peek() == Some('.') && lexer.peek_next().is_some_and(is_digit) {
        is_float = true;
        text.push('.');
        lexer.advance();
        eat_digits(lexer, &mut text);
    }

    if matches!(lexer.peek(), Some('e') | Some('E')) {
        is_float = true;
        if let Some(e) = lexer.advance() {
            text.push(e);
        }
        if let Some(sign @ ('+' | '-')) = lexer.peek() {
            text.push(sign);
            lexer.advance();
        }
        if !lexer.peek().is_some_and(is_digit) {
            return Err(LexError::InvalidNumber {
                text,
                span: lexer.span(),
            });
        }
        eat_digits(lexer, &mut text);
    }

    // Trailing identifier characters make the literal malformed (`12abc`)
    if lexer.peek().is_some_and(is_identifier_char) {
        while let Some(c) = lexer.peek().filter(|c| is_identifier_char(*c)) {
            text.push(c);
            lexer.advance();
        }
        return Err(LexError::InvalidNumber {
            text,
            span: lexer.span(),
        });
    }

    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let kind = if is_float {
        cleaned.parse::<f64>().ok().map(TokenKind::FloatLiteral)
    } else {
        cleaned.parse::<i128>().ok().map(TokenKind::IntLiteral)
    };
    match kind {
        Some(kind) => Ok(lexer.make_token(kind)),
        None => Err(LexError::InvalidNumber {
            text,
            span: lexer.span(),
        }),
    }
}

fn eat_digits(
    lexer: &mut Lexer<'_>,
    text: &mut String,
) {
    while let Some(c) = lexer.peek() {
        if is_digit(c) || c == '_' {
            text.push(c);
            lexer.advance();
        } else {
            break;
        }
    }
}

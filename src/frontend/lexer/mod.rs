//! Lexer module
//!
//! Turns source text into tokens. [`Lexer`] is the lazy form; [`tokenize`]
//! collects it.

pub mod literals;
pub mod tokenizer;
pub mod tokens;

pub use tokenizer::Lexer;
pub use tokens::{LexError, Token, TokenKind};

use tracing::debug;

/// Tokenize source code; the last token is always `Eof`
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let tokens = Lexer::new(source).collect::<Result<Vec<_>, _>>()?;
    debug!("lexed {} tokens", tokens.len());
    Ok(tokens)
}

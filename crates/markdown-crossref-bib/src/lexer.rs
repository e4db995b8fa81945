//! # Lexer - Tokenizing Bibliography Source
//!
//! Breaks `.bib` text into tokens using the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! Like the markdown lexer this crate grew out of, the lexer is **lossless**:
//! every byte of the input lands in exactly one token, whitespace included.
//! The parser decides what is trivia. That matters here because field values
//! are taken back out of the source as raw slices (via [`Token::span`]) and
//! only interpreted later, when a caller asks for rich text or names.
//!
//! The same token set serves two grammars:
//!
//! - the entry grammar in [`crate::parser`] (`@type{key, field = value}`)
//! - the LaTeX-ish text grammar in [`crate::latex`] (`\emph{...}`, `\"a`)
//!
//! ```
//! use markdown_crossref_bib::lexer::{lex, TokenKind};
//!
//! let tokens = lex("@book{knuth,");
//! let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(
//!     kinds,
//!     [TokenKind::At, TokenKind::Word, TokenKind::LBrace, TokenKind::Word, TokenKind::Comma]
//! );
//! ```

use std::ops::Range;

use logos::Logos;

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Any run of whitespace, newlines included
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    /// `@` introducing an entry
    #[token("@")]
    At,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("=")]
    Eq,

    #[token(",")]
    Comma,

    /// `#` concatenation operator
    #[token("#")]
    Hash,

    #[token("\"")]
    Quote,

    /// Control word such as `\emph` or `\LaTeX`
    #[regex(r"\\[A-Za-z]+")]
    Command,

    /// Control symbol such as `\&`, `\{` or the accent in `\"a`
    #[regex(r"\\[^A-Za-z \t\r\n\f]")]
    Escape,

    /// A backslash followed by whitespace or end of input
    #[token("\\")]
    Backslash,

    /// Everything else, grouped into runs
    #[regex(r#"[^ \t\r\n\f@{}()=,#"\\]+"#)]
    Word,

    /// Input the lexer could not classify
    Error,
}

/// A token with its kind, source text and byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Range<usize>,
}

/// Tokenize `input`, keeping every byte.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    let mut lexer = TokenKind::lexer(input);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        tokens.push(Token {
            kind: result.unwrap_or(TokenKind::Error),
            text: lexer.slice(),
            span: lexer.span(),
        });
    }
    tokens
}

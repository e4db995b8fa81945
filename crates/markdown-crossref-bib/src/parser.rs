//! # Parser - Entries from Tokens
//!
//! A small recursive-descent parser over the lexer's token slice. It reads
//! `@type{key, name = value, ...}` entries and returns them with **raw** field
//! values: the exact source text between the delimiters. Interpretation of
//! that text (marks, accents, names) happens lazily in [`crate::latex`] and
//! [`crate::names`].
//!
//! ## What is understood
//!
//! - Anything outside an entry is a comment and skipped.
//! - `@comment` and `@preamble` bodies are skipped as balanced groups.
//! - `@string{name = value}` defines a macro usable in later values.
//! - Entries may be delimited by `{}` or `()`.
//! - Values are `{braced}`, `"quoted"`, numbers or macro names, joined by `#`.
//! - Month macros (`jan` .. `dec`) are predefined.
//!
//! Structural mistakes (a missing `=`, an unterminated value) are errors;
//! the parser does not try to recover, since a broken bibliography should
//! fail loudly at configuration time.

use std::collections::HashMap;

use thiserror::Error;

use crate::lexer::{Token, TokenKind, lex};

/// Error produced for malformed bibliography source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: expected {expected}, found {found}")]
    Unexpected {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {line}: unterminated {what}")]
    Unterminated { line: usize, what: &'static str },
}

/// An entry as written, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Lowercased entry type, e.g. `book`
    pub entry_type: String,
    pub key: String,
    /// Field names lowercased, values raw, in source order
    pub fields: Vec<(String, String)>,
}

/// Parse a complete bibliography source.
pub fn parse(source: &str) -> Result<Vec<RawEntry>, ParseError> {
    let tokens = lex(source);
    Parser::new(source, &tokens).entries()
}

const MONTHS: [(&str, &str); 12] = [
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// The parser state: source, token stream, position and `@string` macros.
pub struct Parser<'t, 'input> {
    source: &'input str,
    tokens: &'t [Token<'input>],
    pos: usize,
    strings: HashMap<String, String>,
}

impl<'t, 'input> Parser<'t, 'input> {
    pub fn new(source: &'input str, tokens: &'t [Token<'input>]) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            strings: HashMap::new(),
        }
    }

    /// Current token kind, or `None` at end of input.
    fn current(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn current_text(&self) -> &'input str {
        self.tokens.get(self.pos).map(|t| t.text).unwrap_or("")
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current() == Some(kind)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn bump(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self) {
        while self.at(TokenKind::Whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Byte offset of the current token (end of input when exhausted).
    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.span.start)
            .unwrap_or(self.source.len())
    }

    fn line(&self) -> usize {
        self.source[..self.offset()].matches('\n').count() + 1
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        let found = if self.at_end() {
            "end of input".to_string()
        } else {
            format!("{:?}", self.current_text())
        };
        ParseError::Unexpected {
            line: self.line(),
            expected,
            found,
        }
    }

    /// Parse every entry in the source.
    pub fn entries(mut self) -> Result<Vec<RawEntry>, ParseError> {
        let mut entries = Vec::new();
        while !self.at_end() {
            if !self.eat(TokenKind::At) {
                self.bump();
                continue;
            }
            if let Some(entry) = self.entry()? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Parse after the `@`. Returns `None` for non-entry blocks.
    fn entry(&mut self) -> Result<Option<RawEntry>, ParseError> {
        self.skip_trivia();
        if !self.at(TokenKind::Word) {
            return Err(self.unexpected("entry type"));
        }
        let entry_type = self.current_text().to_ascii_lowercase();
        self.bump();
        self.skip_trivia();

        let close = if self.eat(TokenKind::LBrace) {
            TokenKind::RBrace
        } else if self.eat(TokenKind::LParen) {
            TokenKind::RParen
        } else {
            return Err(self.unexpected("`{` or `(`"));
        };

        match entry_type.as_str() {
            "comment" | "preamble" => {
                self.skip_balanced(close)?;
                Ok(None)
            }
            "string" => {
                self.skip_trivia();
                let (name, value) = self.field()?;
                self.skip_trivia();
                self.expect(close, "end of @string")?;
                self.strings.insert(name, value);
                Ok(None)
            }
            _ => self.entry_body(entry_type, close).map(Some),
        }
    }

    fn entry_body(&mut self, entry_type: String, close: TokenKind) -> Result<RawEntry, ParseError> {
        self.skip_trivia();
        let mut key = String::new();
        while let Some(kind) = self.current() {
            match kind {
                TokenKind::Comma => break,
                k if k == close => break,
                TokenKind::Whitespace => {}
                _ => key.push_str(self.current_text()),
            }
            self.bump();
        }
        if key.is_empty() {
            return Err(self.unexpected("citation key"));
        }

        let mut fields = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(close) {
                break;
            }
            self.expect(TokenKind::Comma, "`,` between fields")?;
            self.skip_trivia();
            // trailing comma
            if self.eat(close) {
                break;
            }
            fields.push(self.field()?);
        }

        Ok(RawEntry {
            entry_type,
            key,
            fields,
        })
    }

    /// `name = value`
    fn field(&mut self) -> Result<(String, String), ParseError> {
        if !self.at(TokenKind::Word) {
            return Err(self.unexpected("field name"));
        }
        let name = self.current_text().to_ascii_lowercase();
        self.bump();
        self.skip_trivia();
        self.expect(TokenKind::Eq, "`=`")?;
        self.skip_trivia();
        let value = self.value()?;
        Ok((name, value))
    }

    /// One or more pieces joined by `#`.
    fn value(&mut self) -> Result<String, ParseError> {
        let mut value = self.piece()?;
        loop {
            let save = self.pos;
            self.skip_trivia();
            if !self.eat(TokenKind::Hash) {
                self.pos = save;
                return Ok(value);
            }
            self.skip_trivia();
            value.push_str(&self.piece()?);
        }
    }

    fn piece(&mut self) -> Result<String, ParseError> {
        match self.current() {
            Some(TokenKind::LBrace) => self.delimited(TokenKind::RBrace, "braced value"),
            Some(TokenKind::Quote) => self.delimited(TokenKind::Quote, "quoted value"),
            Some(TokenKind::Word) => {
                let word = self.current_text();
                self.bump();
                if word.bytes().all(|b| b.is_ascii_digit()) {
                    return Ok(word.to_string());
                }
                Ok(self.expand_macro(word))
            }
            _ => Err(self.unexpected("field value")),
        }
    }

    fn expand_macro(&self, name: &str) -> String {
        let lower = name.to_ascii_lowercase();
        if let Some(value) = self.strings.get(&lower) {
            return value.clone();
        }
        if let Some((_, month)) = MONTHS.iter().find(|(abbr, _)| *abbr == lower) {
            return (*month).to_string();
        }
        log::warn!("undefined string macro `{name}` on line {}", self.line());
        name.to_string()
    }

    /// Raw text up to the matching `close`, with braces balanced inside.
    fn delimited(&mut self, close: TokenKind, what: &'static str) -> Result<String, ParseError> {
        let line = self.line();
        let start = self.tokens[self.pos].span.end;
        self.bump();

        let mut depth = 0usize;
        while let Some(kind) = self.current() {
            if depth == 0 && kind == close {
                let end = self.offset();
                self.bump();
                return Ok(self.source[start..end].to_string());
            }
            match kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace if depth > 0 => depth -= 1,
                _ => {}
            }
            self.bump();
        }
        Err(ParseError::Unterminated { line, what })
    }

    fn skip_balanced(&mut self, close: TokenKind) -> Result<(), ParseError> {
        let line = self.line();
        let mut depth = 0usize;
        while let Some(kind) = self.current() {
            self.bump();
            if depth == 0 && kind == close {
                return Ok(());
            }
            match kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace if depth > 0 => depth -= 1,
                _ => {}
            }
        }
        Err(ParseError::Unterminated { line, what: "block" })
    }
}

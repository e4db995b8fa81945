use thiserror::Error;

use super::{Nesting, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("token {index} ({kind:?}) is at level {found}, expected {expected}")]
    Level {
        index: usize,
        kind: TokenKind,
        expected: usize,
        found: usize,
    },
    #[error("close token {index} ({kind:?}) does not match an open token")]
    Unmatched { index: usize, kind: TokenKind },
    #[error("{count} token(s) left open")]
    Unclosed { count: usize },
}

/// Check the level and pairing rules over a whole stream.
///
/// An open token and its close share a level, everything between them is
/// one deeper, and inline children start one below their container.
pub fn check(tokens: &[Token]) -> Result<(), InvariantViolation> {
    let base = tokens.first().map(|t| t.level).unwrap_or(0);
    check_at(tokens, base)
}

fn check_at(tokens: &[Token], base: usize) -> Result<(), InvariantViolation> {
    let mut open: Vec<(TokenKind, &str)> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        if token.nesting == Nesting::Close {
            match open.pop() {
                Some((kind, tag)) if kind == token.kind && tag == token.tag => {}
                _ => {
                    return Err(InvariantViolation::Unmatched {
                        index,
                        kind: token.kind,
                    });
                }
            }
        }

        let expected = base + open.len();
        if token.level != expected {
            return Err(InvariantViolation::Level {
                index,
                kind: token.kind,
                expected,
                found: token.level,
            });
        }

        if token.kind == TokenKind::Inline {
            check_at(&token.children, token.level + 1)?;
        }
        if token.nesting == Nesting::Open {
            open.push((token.kind, token.tag.as_str()));
        }
    }

    if open.is_empty() {
        Ok(())
    } else {
        Err(InvariantViolation::Unclosed { count: open.len() })
    }
}

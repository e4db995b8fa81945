use super::{Nesting, Token, TokenKind};

/// Builds a run of tokens, assigning each its level from the nesting seen so far.
///
/// Rewriters assemble a complete replacement run here before splicing it
/// into the stream in one step, so the stream is never seen half-rewritten.
#[derive(Debug)]
pub struct TokenBuilder {
    tokens: Vec<Token>,
    level: usize,
}

impl TokenBuilder {
    /// Start a run whose first token sits at `level`.
    pub fn new(level: usize) -> Self {
        Self {
            tokens: Vec::new(),
            level,
        }
    }

    pub fn push(&mut self, mut token: Token) -> &mut Self {
        if token.nesting == Nesting::Close {
            self.level = self.level.saturating_sub(1);
        }
        token.level = self.level;
        if token.kind == TokenKind::Inline {
            relevel(&mut token.children, self.level + 1);
        }
        if token.nesting == Nesting::Open {
            self.level += 1;
        }
        self.tokens.push(token);
        self
    }

    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        for token in tokens {
            self.push(token);
        }
        self
    }

    /// Level the next pushed token would get.
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn finish(self) -> Vec<Token> {
        self.tokens
    }
}

/// Recompute levels of `tokens` in place, the first one at `start`.
pub fn relevel(tokens: &mut [Token], start: usize) {
    let mut level = start;
    for token in tokens {
        if token.nesting == Nesting::Close {
            level = level.saturating_sub(1);
        }
        token.level = level;
        if token.kind == TokenKind::Inline {
            relevel(&mut token.children, level + 1);
        }
        if token.nesting == Nesting::Open {
            level += 1;
        }
    }
}

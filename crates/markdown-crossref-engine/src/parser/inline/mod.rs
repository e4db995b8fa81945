//! The `inline` core rule.
//!
//! pulldown-cmark has already split inline markup into children. What is
//! left for inline rules is plain text: each text child outside links is
//! scanned with a [`Cursor`], trying the registered rules at every position.
//! Text no rule claims accumulates as pending text and is flushed as a
//! single text token whenever a rule emits one of its own.

mod cursor;

pub use cursor::Cursor;

use super::{CoreRule, CoreState, InlineRule, Markdown};
use crate::env::RenderEnv;
use crate::token::{Nesting, Token, TokenKind, relevel};

/// State of an inline scan over one text node.
pub struct InlineState<'s, 'e> {
    pub cursor: Cursor<'s>,
    pub tokens: Vec<Token>,
    pending: String,
    pub env: &'e mut RenderEnv,
    pub md: &'e Markdown,
}

impl<'s, 'e> InlineState<'s, 'e> {
    pub fn new(src: &'s str, md: &'e Markdown, env: &'e mut RenderEnv) -> Self {
        Self {
            cursor: Cursor::new(src),
            tokens: Vec::new(),
            pending: String::new(),
            env,
            md,
        }
    }

    /// Flush pending text as a text token.
    pub fn push_pending(&mut self) {
        if !self.pending.is_empty() {
            let text = std::mem::take(&mut self.pending);
            self.tokens.push(Token::text(text));
        }
    }

    /// Emit a token after any pending text.
    pub fn push(&mut self, token: Token) {
        self.push_pending();
        self.tokens.push(token);
    }

    fn finish(mut self) -> Vec<Token> {
        self.push_pending();
        self.tokens
    }
}

/// Run the active inline rules over `text`.
pub fn tokenize(md: &Markdown, text: &str, env: &mut RenderEnv) -> Vec<Token> {
    let rules: Vec<&dyn InlineRule> = md.inline.active().map(|(_, rule)| rule).collect();
    let mut state = InlineState::new(text, md, env);

    'scan: while !state.cursor.eof() {
        for rule in &rules {
            let start = state.cursor.pos();
            if rule.parse(&mut state) && state.cursor.pos() > start {
                continue 'scan;
            }
            state.cursor.reset(start);
        }
        if let Some(c) = state.cursor.bump_char() {
            state.pending.push(c);
        }
    }
    state.finish()
}

/// Replace text children outside links with the output of the inline rules.
fn expand(md: &Markdown, children: Vec<Token>, env: &mut RenderEnv) -> Vec<Token> {
    let mut out = Vec::with_capacity(children.len());
    let mut link_depth = 0usize;
    for child in children {
        match (child.kind, child.nesting) {
            (TokenKind::Link, Nesting::Open) => link_depth += 1,
            (TokenKind::Link, Nesting::Close) => link_depth = link_depth.saturating_sub(1),
            (TokenKind::Text, _) if link_depth == 0 => {
                out.extend(tokenize(md, &child.content, env));
                continue;
            }
            _ => {}
        }
        out.push(child);
    }
    out
}

pub(crate) struct InlineCoreRule;

impl CoreRule for InlineCoreRule {
    fn run(&self, state: &mut CoreState<'_>) {
        if state.md.inline.active().next().is_none() {
            return;
        }
        let md = state.md;
        for token in state.tokens.iter_mut().filter(|t| t.kind == TokenKind::Inline) {
            let children = std::mem::take(&mut token.children);
            token.children = expand(md, children, state.env);
            relevel(&mut token.children, token.level + 1);
        }
    }
}

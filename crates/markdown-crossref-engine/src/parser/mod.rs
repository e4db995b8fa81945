//! # Pipeline
//!
//! A [`Markdown`] instance owns two [`Ruler`]s and a [`Renderer`]:
//!
//! ```text
//! source ─▶ core rules ─────────────────────────────────────▶ tokens ─▶ renderer ─▶ HTML
//!           block    (pulldown-cmark events → tokens)
//!           inline   (inline rules over text children)
//!           ...      (structural and summary rules from extensions)
//! ```
//!
//! Core rules receive a [`CoreState`] holding the token stream and the
//! per-render [`RenderEnv`]. Extensions add rules by name relative to the
//! built-in `block` and `inline` rules.
//!
//! The configured pipeline is immutable while rendering, so one instance can
//! be shared between threads and render any number of documents; every
//! render gets a fresh [`RenderEnv`].

pub mod block;
pub mod inline;
pub mod ruler;

pub use inline::{Cursor, InlineState};
pub use ruler::Ruler;

use crate::env::RenderEnv;
use crate::render::Renderer;
use crate::token::{Token, TokenKind};

/// State handed to each core rule.
pub struct CoreState<'a> {
    pub src: &'a str,
    pub tokens: Vec<Token>,
    pub env: &'a mut RenderEnv,
    pub md: &'a Markdown,
    /// Set while re-parsing a caption or list entry. Structural and summary
    /// rules do nothing in this mode.
    pub inline_mode: bool,
}

/// A whole-stream transformation.
pub trait CoreRule: Send + Sync {
    fn run(&self, state: &mut CoreState<'_>);
}

impl<F> CoreRule for F
where
    F: Fn(&mut CoreState<'_>) + Send + Sync,
{
    fn run(&self, state: &mut CoreState<'_>) {
        self(state)
    }
}

/// A rule tried at each position of a text child.
///
/// Returns `true` after consuming input and pushing tokens; on `false` the
/// cursor is restored by the caller.
pub trait InlineRule: Send + Sync {
    fn parse(&self, state: &mut InlineState<'_, '_>) -> bool;
}

impl<F> InlineRule for F
where
    F: Fn(&mut InlineState<'_, '_>) -> bool + Send + Sync,
{
    fn parse(&self, state: &mut InlineState<'_, '_>) -> bool {
        self(state)
    }
}

/// A configured markdown pipeline.
pub struct Markdown {
    pub core: Ruler<dyn CoreRule>,
    pub inline: Ruler<dyn InlineRule>,
    pub renderer: Renderer,
}

impl Default for Markdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Markdown {
    /// A pipeline with only the `block` and `inline` core rules.
    pub fn new() -> Self {
        let mut core: Ruler<dyn CoreRule> = Ruler::new();
        core.push("block", Box::new(block::BlockRule));
        core.push("inline", Box::new(inline::InlineCoreRule));
        Self {
            core,
            inline: Ruler::new(),
            renderer: Renderer::new(),
        }
    }

    fn process(&self, src: &str, env: &mut RenderEnv, inline_mode: bool) -> Vec<Token> {
        let mut state = CoreState {
            src,
            tokens: Vec::new(),
            env,
            md: self,
            inline_mode,
        };
        for (name, rule) in self.core.active() {
            log::trace!("running core rule `{name}`");
            rule.run(&mut state);
        }
        state.tokens
    }

    /// Parse a document into tokens, recording entities in `env`.
    pub fn parse(&self, src: &str, env: &mut RenderEnv) -> Vec<Token> {
        self.process(src, env, false)
    }

    /// Parse a fragment of inline markdown and return its inline tokens.
    ///
    /// Citations found here still register in `env`; structural and summary
    /// rules are skipped.
    pub fn parse_inline(&self, src: &str, env: &mut RenderEnv) -> Vec<Token> {
        self.process(src, env, true)
            .into_iter()
            .filter(|t| t.kind == TokenKind::Inline)
            .flat_map(|t| t.children)
            .collect()
    }

    /// Render a document to HTML with a fresh [`RenderEnv`].
    pub fn render(&self, src: &str) -> String {
        let mut env = RenderEnv::new();
        let tokens = self.parse(src, &mut env);
        self.renderer.render(&tokens, &env)
    }
}

//! Numbered figures from titled images.
//!
//! An image alone in its paragraph with a title becomes a figure:
//!
//! ```markdown
//! ![Stormtroopocat](cat.jpg "The Stormtroopocat")
//! ```
//!
//! Other text refers to it with `<<fig:the-stormtroopocat>>`.

use super::matchers;
use super::options::FigureOptions;
use super::reference::{ReferenceRenderer, ReferenceRule};
use super::rewrite;
use super::summary::SummaryRule;
use crate::env::EntityKind;
use crate::error::Result;
use crate::parser::{CoreRule, CoreState, Markdown};
use crate::token::TokenKind;

pub fn add(md: &mut Markdown, options: FigureOptions) -> Result<()> {
    md.inline
        .push("figure_reference", Box::new(ReferenceRule::new(EntityKind::Figure)));
    md.core.push(
        "figure_list",
        Box::new(SummaryRule::captions(
            EntityKind::Figure,
            options.label.text.clone(),
            options.list.clone(),
        )),
    );
    md.renderer.set_rule(
        TokenKind::Reference(EntityKind::Figure),
        Box::new(ReferenceRenderer::new(
            EntityKind::Figure,
            options.label.text.clone(),
        )),
    );
    md.core
        .after("inline", "figure", Box::new(FigureRule { options }))
}

struct FigureRule {
    options: FigureOptions,
}

impl CoreRule for FigureRule {
    fn run(&self, state: &mut CoreState<'_>) {
        if state.inline_mode {
            return;
        }
        let mut i = 0;
        while i < state.tokens.len() {
            match matchers::image_figure(&state.tokens, i) {
                Some(title) => i += rewrite::image_figure(state, i, &title, &self.options),
                None => i += 1,
            }
        }
    }
}

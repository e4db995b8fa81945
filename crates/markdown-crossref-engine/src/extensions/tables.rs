//! Numbered tables.
//!
//! A table directly followed by a paragraph starting with `.` gets that
//! paragraph as its caption. Raw HTML `<table>` blocks work the same way.
//!
//! ```markdown
//! | Name  | Client |
//! |-------|--------|
//! | Alice | Mobile |
//!
//! .Client overview#clients
//! ```

use super::matchers;
use super::options::TableOptions;
use super::reference::{ReferenceRenderer, ReferenceRule};
use super::rewrite;
use super::summary::SummaryRule;
use crate::env::EntityKind;
use crate::error::Result;
use crate::parser::{CoreRule, CoreState, Markdown};
use crate::token::TokenKind;

pub fn add(md: &mut Markdown, options: TableOptions) -> Result<()> {
    md.inline
        .push("table_reference", Box::new(ReferenceRule::new(EntityKind::Table)));
    md.core.push(
        "table_list",
        Box::new(SummaryRule::captions(
            EntityKind::Table,
            options.label.text.clone(),
            options.list.clone(),
        )),
    );
    md.renderer.set_rule(
        TokenKind::Reference(EntityKind::Table),
        Box::new(ReferenceRenderer::new(
            EntityKind::Table,
            options.label.text.clone(),
        )),
    );
    md.core
        .after("inline", "table_figure", Box::new(TableRule { options }))
}

struct TableRule {
    options: TableOptions,
}

impl CoreRule for TableRule {
    fn run(&self, state: &mut CoreState<'_>) {
        if state.inline_mode {
            return;
        }
        let mut i = 0;
        while i < state.tokens.len() {
            if let Some(found) = matchers::table_figure(&state.tokens, i) {
                i += rewrite::table_figure(state, i, &found, &self.options);
            } else if let Some(caption) = matchers::html_table_figure(&state.tokens, i) {
                i += rewrite::html_table_figure(state, i, &caption, &self.options);
            } else {
                i += 1;
            }
        }
    }
}

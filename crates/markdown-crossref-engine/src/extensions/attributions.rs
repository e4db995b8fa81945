//! Numbered passages credited to configured sources.
//!
//! A blockquote ending in a `[@key]` paragraph becomes a numbered passage
//! when `key` names one of the sources, and every credited source is listed
//! once in a "List of Attributions".
//!
//! ```markdown
//! > Markdown is a lightweight markup language.
//! >
//! > [@wiki:markdown]
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::matchers;
use super::options::{AnchorOptions, Attributed, AttributionOptions, AttributionSource};
use super::rewrite;
use super::summary::SummaryRule;
use crate::error::Result;
use crate::parser::{CoreRule, CoreState, Markdown};
use crate::token::{Token, TokenKind};

pub fn add(md: &mut Markdown, options: AttributionOptions) -> Result<()> {
    let sources: Arc<[AttributionSource]> = options.sources.into();
    log::debug!("{} attribution sources", sources.len());
    md.core.push(
        "attribution_list",
        Box::new(SummaryRule::attributions(Arc::clone(&sources), options.list)),
    );
    md.core.after(
        "inline",
        "attribution",
        Box::new(AttributionRule {
            sources,
            anchor: options.anchor,
        }),
    )
}

struct AttributionRule {
    sources: Arc<[AttributionSource]>,
    anchor: AnchorOptions,
}

impl CoreRule for AttributionRule {
    fn run(&self, state: &mut CoreState<'_>) {
        if state.inline_mode {
            return;
        }
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        let mut i = 0;
        while i < state.tokens.len() {
            let Some(found) = matchers::attribution(&state.tokens, i) else {
                i += 1;
                continue;
            };
            let Some(source) = find(&self.sources, &found.key) else {
                log::debug!("no attribution source `{}`", found.key);
                i += 1;
                continue;
            };
            let occurrence = occurrences.entry(found.key.clone()).or_default();
            *occurrence += 1;
            i += rewrite::attribution(
                state,
                i,
                &found,
                &source_title(source),
                *occurrence,
                &self.anchor,
            );
        }
    }
}

pub(crate) fn find<'a>(sources: &'a [AttributionSource], key: &str) -> Option<&'a AttributionSource> {
    sources.iter().find(|source| source.key == key)
}

fn source_title(source: &AttributionSource) -> String {
    source
        .title
        .as_ref()
        .map_or(source.key.as_str(), Attributed::text)
        .to_string()
}

/// `text`, linked with `class` when the source gives a URL.
fn attributed(value: &Attributed, class: &str) -> Vec<Token> {
    match value.url() {
        Some(url) => vec![
            Token::open(TokenKind::Link, "a")
                .with_attr("href", url)
                .with_attr("class", class),
            Token::text(value.text()),
            Token::close(TokenKind::Link, "a"),
        ],
        None => vec![Token::text(value.text())],
    }
}

/// Item content of the list of attributions: title, then author and
/// license in parentheses.
pub(crate) fn source_children(key: &str, source: Option<&AttributionSource>) -> Vec<Token> {
    let Some(source) = source else {
        return vec![Token::text(key)];
    };
    let mut out = match &source.title {
        Some(title) => attributed(title, "title"),
        None => vec![Token::text(key)],
    };

    let mut parts: Vec<Vec<Token>> = Vec::new();
    if let Some(author) = &source.author {
        let mut part = vec![Token::text("By: ")];
        part.extend(attributed(author, "author"));
        parts.push(part);
    }
    if let Some(license) = &source.license {
        parts.push(attributed(license, "license"));
    }
    if parts.is_empty() {
        return out;
    }

    out.push(Token::text(" ("));
    for (n, part) in parts.into_iter().enumerate() {
        if n > 0 {
            out.push(Token::text(", "));
        }
        out.extend(part);
    }
    out.push(Token::text(")"));
    out
}

//! `@key` citations and the bibliography.
//!
//! Unlike figure references, citations are numbered as soon as they are
//! seen: every key is known up front from the loaded bibliography.

use std::sync::Arc;

use markdown_crossref_bib::{BibEntry, Bibliography, Mark, Name, TextRun};

use super::options::CitationOptions;
use super::summary::SummaryRule;
use crate::env::{EntityKind, RenderEnv};
use crate::error::Result;
use crate::parser::{InlineRule, InlineState, Markdown};
use crate::render::{Renderer, escape_html};
use crate::token::{Token, TokenKind};

/// Load the configured sources and install citation support.
pub fn add(md: &mut Markdown, options: CitationOptions) -> Result<()> {
    let bibliography = Bibliography::load(&options.sources)?;
    log::debug!("loaded {} bibliography entries", bibliography.len());
    add_with_bibliography(md, options, Arc::new(bibliography))
}

/// Install citation support over an already loaded bibliography.
pub fn add_with_bibliography(
    md: &mut Markdown,
    options: CitationOptions,
    bibliography: Arc<Bibliography>,
) -> Result<()> {
    md.inline.push(
        "citation",
        Box::new(CitationRule {
            bibliography: Arc::clone(&bibliography),
        }),
    );
    md.core.push(
        "bibliography",
        Box::new(SummaryRule::bibliography(bibliography, options.list)),
    );
    md.renderer.set_rule(TokenKind::Citation, Box::new(render_citation));
    Ok(())
}

struct CitationRule {
    bibliography: Arc<Bibliography>,
}

impl InlineRule for CitationRule {
    fn parse(&self, state: &mut InlineState<'_, '_>) -> bool {
        if state.cursor.peek() != Some(b'@') {
            return false;
        }
        // Not inside a word, e.g. an email address.
        if state.cursor.prev_char().is_some_and(char::is_alphanumeric) {
            return false;
        }
        let rest = &state.cursor.rest()[1..];
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let Some(key) = self.bibliography.longest_prefix_key(&rest[..end]) else {
            return false;
        };
        if key.is_empty() {
            return false;
        }

        let position = state.env.registry_mut(EntityKind::Citation).register(key, key);
        state.push(
            Token::leaf(TokenKind::Citation, "a")
                .with_attr("href", format!("#citation-{position}"))
                .with_attr("class", EntityKind::Citation.reference_class())
                .with_content(position.to_string())
                .with_meta(key),
        );
        state.cursor.bump_n(1 + key.len());
        true
    }
}

fn render_citation(tokens: &[Token], idx: usize, _env: &RenderEnv, renderer: &Renderer) -> String {
    let token = &tokens[idx];
    format!(
        "<a{}>{}</a>",
        renderer.render_attrs(token),
        escape_html(&token.content)
    )
}

fn mark_tag(mark: Mark) -> (&'static str, Option<&'static str>) {
    match mark {
        Mark::Emphasis => ("em", None),
        Mark::Strong => ("strong", None),
        Mark::Superscript => ("sup", None),
        Mark::Subscript => ("sub", None),
        Mark::SmallCaps => ("span", Some("smallcaps")),
        Mark::Underline => ("u", None),
        Mark::Monospace => ("code", None),
    }
}

fn push_runs(out: &mut Vec<Token>, runs: &[TextRun]) {
    for run in runs {
        for &mark in &run.marks {
            let (tag, class) = mark_tag(mark);
            let mut open = Token::open(TokenKind::Mark, tag);
            if let Some(class) = class {
                open.set_attr("class", class);
            }
            out.push(open);
        }
        out.push(Token::text(run.text.as_str()));
        for &mark in run.marks.iter().rev() {
            out.push(Token::close(TokenKind::Mark, mark_tag(mark).0));
        }
    }
}

/// Wrap `inner` in a link when `href` is present.
fn linked(href: Option<String>, inner: Vec<Token>) -> Vec<Token> {
    match href {
        Some(href) => {
            let mut out = Vec::with_capacity(inner.len() + 2);
            out.push(Token::open(TokenKind::Link, "a").with_attr("href", href));
            out.extend(inner);
            out.push(Token::close(TokenKind::Link, "a"));
            out
        }
        None => inner,
    }
}

fn url(entry: &BibEntry, name: &str) -> Option<String> {
    entry
        .field(name)
        .map(|value| value.raw().trim().to_string())
        .filter(|url| !url.is_empty())
}

fn rich(entry: &BibEntry, name: &str) -> Option<Vec<TextRun>> {
    entry
        .field(name)
        .map(|value| value.rich_text())
        .filter(|runs| !runs.is_empty())
}

fn authors(names: &[Name]) -> Vec<Token> {
    let mut out = Vec::new();
    for (index, name) in names.iter().enumerate() {
        if index > 0 {
            out.push(Token::text(", "));
        }
        push_runs(&mut out, &name.given);
        if !name.given.is_empty() && !name.family.is_empty() {
            out.push(Token::text(" "));
        }
        push_runs(&mut out, &name.family);
    }
    out
}

/// Inline children of a bibliography item.
///
/// `[N]: Title (Author One, Author Two, ISBN: …, DOI: …, note - License)`,
/// where the parenthesis is left out when there is nothing to put in it.
pub(crate) fn entry_children(key: &str, entry: Option<&BibEntry>, position: usize) -> Vec<Token> {
    let mut out = vec![Token::text(format!("[{position}]: "))];
    let Some(entry) = entry else {
        out.push(Token::text(key));
        return out;
    };

    if let Some(title) = rich(entry, "title") {
        let mut inner = Vec::new();
        push_runs(&mut inner, &title);
        let href = url(entry, "titleurl").or_else(|| url(entry, "url"));
        out.extend(linked(href, inner));
    }

    let mut parts: Vec<Vec<Token>> = Vec::new();
    let names = entry.field("author").map(|v| v.names()).unwrap_or_default();
    if !names.is_empty() {
        parts.push(linked(url(entry, "authorurl"), authors(&names)));
    }
    if let Some(isbn) = entry.field("isbn") {
        parts.push(vec![Token::text(format!("ISBN: {}", isbn.plain_text()))]);
    }
    if let Some(doi) = entry.field("doi") {
        let doi = doi.plain_text();
        let mut tokens = vec![Token::text("DOI: ")];
        tokens.extend(linked(
            Some(format!("https://doi.org/{doi}")),
            vec![Token::text(doi)],
        ));
        parts.push(tokens);
    }
    if let Some(note) = rich(entry, "note") {
        let mut tokens = Vec::new();
        push_runs(&mut tokens, &note);
        parts.push(tokens);
    }
    let license = rich(entry, "license").map(|runs| {
        let mut inner = Vec::new();
        push_runs(&mut inner, &runs);
        linked(url(entry, "licenseurl"), inner)
    });

    if parts.is_empty() && license.is_none() {
        return out;
    }
    out.push(Token::text(" ("));
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            out.push(Token::text(", "));
        }
        out.extend(part.iter().cloned());
    }
    if let Some(license) = license {
        if !parts.is_empty() {
            out.push(Token::text(" - "));
        }
        out.extend(license);
    }
    out.push(Token::text(")"));
    out
}

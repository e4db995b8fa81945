//! Rewriting of matched figures, tables and attributed passages.
//!
//! Each rewriter registers the entity, builds the complete replacement run
//! with a [`TokenBuilder`] starting at the level of the first replaced
//! token, and splices it into the stream in one step. The return value is
//! the length of the inserted run, so the caller resumes scanning after it.

use super::matchers::{AttributionMatch, TableMatch};
use super::options::{AnchorOptions, FigureOptions};
use crate::env::EntityKind;
use crate::parser::CoreState;
use crate::slug::{key_id, split_title};
use crate::token::{Token, TokenBuilder, TokenKind};

/// A registered entity about to be rendered with a caption.
struct Captioned {
    id: String,
    caption: String,
    position: usize,
}

fn register(state: &mut CoreState<'_>, kind: EntityKind, title: &str) -> Captioned {
    let (id, caption) = split_title(title);
    let position = state.env.registry_mut(kind).register(&id, &caption);
    Captioned {
        id,
        caption,
        position,
    }
}

/// Text content of inline tokens with markup removed.
fn plain_text(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|t| matches!(t.kind, TokenKind::Text | TokenKind::CodeInline))
        .map(|t| t.content.as_str())
        .collect()
}

/// Children of a caption: anchor, label, separator, then the caption itself.
fn caption_children(
    state: &CoreState<'_>,
    kind: EntityKind,
    options: &FigureOptions,
    entity: &Captioned,
    caption: Vec<Token>,
) -> Vec<Token> {
    let mut children = Vec::with_capacity(caption.len() + 8);

    if options.anchor.enable {
        children.push(
            Token::open(TokenKind::Link, "a")
                .with_attr("href", format!("#{}", entity.id))
                .with_attr("class", "anchor"),
        );
        children.push(Token::text(options.anchor.symbol.as_str()));
        children.push(Token::close(TokenKind::Link, "a"));
        children.push(Token::text(" "));
    }

    let hidden = !options.label.enable;
    let label = state.env.label(kind, options.label.text.as_deref());
    children.push(
        Token::open(TokenKind::Label, "span")
            .with_attr("class", "label")
            .with_hidden(hidden),
    );
    children.push(Token::text(format!("{label} {}", entity.position)).with_hidden(hidden));
    children.push(Token::close(TokenKind::Label, "span").with_hidden(hidden));
    children.push(Token::text(": ").with_hidden(hidden));

    children.extend(caption);
    children
}

/// Caption container: `<figcaption>` inside a figure, `<caption>` inside
/// an unwrapped table.
fn push_caption(builder: &mut TokenBuilder, kind: TokenKind, tag: &str, children: Vec<Token>, source: &str) {
    builder
        .push(Token::open(kind, tag).as_block())
        .push(Token::inline(children, source))
        .push(Token::close(kind, tag).as_block());
}

/// Rewrite the image paragraph at `i`.
pub fn image_figure(
    state: &mut CoreState<'_>,
    i: usize,
    title: &str,
    options: &FigureOptions,
) -> usize {
    let entity = register(state, EntityKind::Figure, title);
    let caption = state.md.parse_inline(&entity.caption, state.env);
    let caption_text = plain_text(&caption);

    if !options.wrap {
        if let Some(image) = state.tokens[i + 1].children.first_mut() {
            image.set_attr("id", entity.id.as_str());
            image.set_attr("title", caption_text);
        }
        return 3;
    }

    let inline = &state.tokens[i + 1];
    let image_source = inline.content.clone();
    let mut image = inline.children.clone();
    for token in &mut image {
        token.set_attr("title", caption_text.as_str());
    }
    let children = caption_children(state, EntityKind::Figure, options, &entity, caption);

    let mut b = TokenBuilder::new(state.tokens[i].level);
    b.push(
        Token::open(TokenKind::Figure, "figure")
            .with_attr("id", entity.id.as_str())
            .as_block(),
    )
    .push(Token::inline(image, image_source));
    push_caption(&mut b, TokenKind::FigureCaption, "figcaption", children, &entity.caption);
    b.push(Token::close(TokenKind::Figure, "figure").as_block());

    let run = b.finish();
    let len = run.len();
    state.tokens.splice(i..i + 3, run);
    len
}

/// Rewrite the markdown table at `i` and the caption paragraph after it.
pub fn table_figure(
    state: &mut CoreState<'_>,
    i: usize,
    found: &TableMatch,
    options: &FigureOptions,
) -> usize {
    let entity = register(state, EntityKind::Table, &found.caption);
    let caption = state.md.parse_inline(&entity.caption, state.env);
    let children = caption_children(state, EntityKind::Table, options, &entity, caption);

    let table = state.tokens[i..=found.end].to_vec();
    let mut b = TokenBuilder::new(state.tokens[i].level);
    if options.wrap {
        b.push(
            Token::open(TokenKind::Figure, "figure")
                .with_attr("id", entity.id.as_str())
                .as_block(),
        )
        .extend(table);
        push_caption(&mut b, TokenKind::FigureCaption, "figcaption", children, &entity.caption);
        b.push(Token::close(TokenKind::Figure, "figure").as_block());
    } else {
        let mut table = table.into_iter();
        if let Some(open) = table.next() {
            b.push(open.with_attr("id", entity.id.as_str()));
        }
        push_caption(&mut b, TokenKind::Caption, "caption", children, &entity.caption);
        b.extend(table);
    }

    let run = b.finish();
    let len = run.len();
    state.tokens.splice(i..found.end + 4, run);
    len
}

/// Rewrite the raw HTML table at `i` and the caption paragraph after it.
pub fn html_table_figure(
    state: &mut CoreState<'_>,
    i: usize,
    caption_source: &str,
    options: &FigureOptions,
) -> usize {
    let entity = register(state, EntityKind::Table, caption_source);
    let caption = state.md.parse_inline(&entity.caption, state.env);
    let children = caption_children(state, EntityKind::Table, options, &entity, caption);

    let html = state.tokens[i].content.clone();
    let mut b = TokenBuilder::new(state.tokens[i].level);
    if options.wrap {
        b.push(
            Token::open(TokenKind::Figure, "figure")
                .with_attr("id", entity.id.as_str())
                .as_block(),
        )
        .push(Token::leaf(TokenKind::HtmlBlock, "").with_content(html).as_block());
        push_caption(&mut b, TokenKind::FigureCaption, "figcaption", children, &entity.caption);
        b.push(Token::close(TokenKind::Figure, "figure").as_block());
    } else {
        let body = html.strip_prefix("<table>").unwrap_or(html.as_str());
        let opening = format!(
            "<table id=\"{}\">\n",
            crate::render::escape_html(&entity.id)
        );
        b.push(Token::leaf(TokenKind::HtmlBlock, "").with_content(opening).as_block());
        push_caption(&mut b, TokenKind::Caption, "caption", children, &entity.caption);
        b.push(
            Token::leaf(TokenKind::HtmlBlock, "")
                .with_content(body.trim_start_matches('\n'))
                .as_block(),
        );
    }

    let run = b.finish();
    let len = run.len();
    state.tokens.splice(i..i + 4, run);
    len
}

/// Rewrite the credited blockquote at `i` into a numbered passage.
///
/// `occurrence` counts passages credited to the same source, so each gets
/// its own anchor.
pub fn attribution(
    state: &mut CoreState<'_>,
    i: usize,
    found: &AttributionMatch,
    title: &str,
    occurrence: usize,
    anchor: &AnchorOptions,
) -> usize {
    let position = state
        .env
        .registry_mut(EntityKind::Attribution)
        .register(&found.key, title);
    let source_id = key_id(&found.key);
    let id = format!("{source_id}__{occurrence}");

    let mut children = Vec::with_capacity(9);
    if anchor.enable {
        children.push(
            Token::open(TokenKind::Link, "a")
                .with_attr("href", format!("#{id}"))
                .with_attr("class", "anchor"),
        );
        children.push(Token::text(anchor.symbol.as_str()));
        children.push(Token::close(TokenKind::Link, "a"));
    }
    children.push(Token::text("["));
    children.push(
        Token::open(TokenKind::Link, "a")
            .with_attr("href", format!("#{source_id}"))
            .with_attr("class", EntityKind::Attribution.reference_class()),
    );
    children.push(Token::text(position.to_string()));
    children.push(Token::close(TokenKind::Link, "a"));
    children.push(Token::text("]"));

    let marker = found.end - 3;
    let marker_source = state.tokens[marker + 1].content.clone();
    let passage = state.tokens[i + 1..marker].to_vec();

    let mut b = TokenBuilder::new(state.tokens[i].level);
    b.push(
        Token::open(TokenKind::Attribution, "div")
            .with_attr("id", id.as_str())
            .with_attr("class", "parent")
            .as_block(),
    )
    .push(
        Token::open(TokenKind::AttributionBody, "div")
            .with_attr("class", "child")
            .as_block(),
    )
    .extend(passage)
    .push(Token::close(TokenKind::AttributionBody, "div").as_block())
    .push(Token::open(TokenKind::Paragraph, "p").as_block())
    .push(Token::inline(children, marker_source))
    .push(Token::close(TokenKind::Paragraph, "p").as_block())
    .push(Token::close(TokenKind::Attribution, "div").as_block());

    let run = b.finish();
    let len = run.len();
    state.tokens.splice(i..=found.end, run);
    len
}

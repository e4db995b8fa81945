//! The `block` core rule: pulldown-cmark events to tokens.
//!
//! pulldown-cmark does the markdown grammar. This module reshapes its event
//! stream into open/close block tokens with inline containers, the shape
//! every later rule works on:
//!
//! - text of a paragraph, heading or table cell is collected into the
//!   `children` of one [`TokenKind::Inline`] token, whose `content` is the
//!   source text of that inline run
//! - text directly inside a tight list item gets a hidden paragraph around it
//! - table heads get an explicit row, table bodies are opened lazily
//! - consecutive HTML block lines become a single token
//! - a metadata block becomes the document's frontmatter
//!
//! An autolink written inside a second pair of angle brackets, as in
//! `<<fig:key>>`, stays literal text so inline rules can see the marker.

use std::ops::Range;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, LinkType, MetadataBlockKind, Options, Parser, Tag};

use super::{CoreRule, CoreState};
use crate::frontmatter::{Frontmatter, FrontmatterFormat};
use crate::token::{Token, TokenBuilder, TokenKind};

/// Markdown extensions enabled in pulldown-cmark.
pub fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
        | Options::ENABLE_PLUSES_DELIMITED_METADATA_BLOCKS
}

pub(crate) struct BlockRule;

impl CoreRule for BlockRule {
    fn run(&self, state: &mut CoreState<'_>) {
        if state.inline_mode {
            let children: Vec<Token> = convert(&paragraph_source(state.src))
                .tokens
                .into_iter()
                .flat_map(|t| match t.kind {
                    TokenKind::Inline => t.children,
                    // A line opening with a block-level tag
                    TokenKind::HtmlBlock => vec![
                        Token::leaf(TokenKind::HtmlInline, "").with_content(t.content.trim_end()),
                    ],
                    _ => Vec::new(),
                })
                .collect();
            let mut b = TokenBuilder::new(0);
            b.push(Token::inline(children, state.src));
            state.tokens = b.finish();
            return;
        }

        let converted = convert(state.src);
        if let Some(frontmatter) = converted.frontmatter {
            state.env.frontmatter = frontmatter;
        }
        state.tokens = converted.tokens;
    }
}

/// Rewrite `src` so that pulldown-cmark reads all of it as one paragraph.
///
/// Lines are unindented and a character that would open a block at the start
/// of a line is backslash-escaped. An escaped ASCII punctuation character is
/// literal text, so the inline content is unchanged.
pub(crate) fn paragraph_source(src: &str) -> String {
    let mut out = String::with_capacity(src.len() + 8);
    for (n, line) in src.trim().lines().enumerate() {
        if n > 0 {
            out.push('\n');
        }
        let line = line.trim_start();
        match block_marker(line) {
            Some(at) => {
                out.push_str(&line[..at]);
                out.push('\\');
                out.push_str(&line[at..]);
            }
            None => out.push_str(line),
        }
    }
    out
}

/// Byte offset of the character that makes `line` open a block.
fn block_marker(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let spaced = |at: usize| bytes.get(at).is_none_or(u8::is_ascii_whitespace);
    match *bytes.first()? {
        b'#' | b'>' | b'-' | b'+' | b'=' | b'|' => Some(0),
        b'*' | b'_' if spaced(1) || is_thematic_break(line) => Some(0),
        b'`' if line.starts_with("```") => Some(0),
        b'~' if line.starts_with("~~~") => Some(0),
        b'[' if line
            .find(']')
            .is_some_and(|end| line[end + 1..].starts_with(':')) =>
        {
            Some(0)
        }
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            (digits <= 9 && matches!(bytes.get(digits), Some(b'.' | b')'))).then_some(digits)
        }
        _ => None,
    }
}

fn is_thematic_break(line: &str) -> bool {
    let mut marks = line.chars().filter(|c| !c.is_whitespace());
    let Some(first) = marks.next() else {
        return false;
    };
    let rest: Vec<char> = marks.collect();
    rest.len() >= 2 && rest.iter().all(|&c| c == first)
}

/// Result of converting one source text.
pub struct Converted {
    pub tokens: Vec<Token>,
    pub frontmatter: Option<Frontmatter>,
}

/// Convert markdown source into block tokens with inline children.
pub fn convert(src: &str) -> Converted {
    let mut converter = Converter {
        src,
        out: TokenBuilder::new(0),
        stack: Vec::new(),
        inline: None,
        implicit_paragraph: false,
        table: None,
        quote_depth: 0,
        frontmatter: None,
    };
    for (event, range) in Parser::new_ext(src, options()).into_offset_iter() {
        converter.event(event, range);
    }
    converter.close_implicit();
    Converted {
        tokens: converter.out.finish(),
        frontmatter: converter.frontmatter,
    }
}

/// What to do when the matching `End` event arrives.
enum Frame {
    Block(TokenKind, String),
    Blockquote,
    /// Paragraph, heading or cell: flush inline content, then close
    InlineBlock(TokenKind, String),
    Inline(TokenKind, &'static str),
    Image { src: String, title: String, alt: String },
    LiteralLink,
    CodeBlock { info: String, code: String },
    HtmlBlock(String),
    Metadata(FrontmatterFormat, String),
    Table,
    TableHead,
    TableRow,
    Ignored,
}

#[derive(Default)]
struct InlineBuffer {
    children: Vec<Token>,
    span: Option<Range<usize>>,
}

struct TableState {
    alignments: Vec<Alignment>,
    in_head: bool,
    body_open: bool,
    column: usize,
}

struct Converter<'src> {
    src: &'src str,
    out: TokenBuilder,
    stack: Vec<Frame>,
    inline: Option<InlineBuffer>,
    implicit_paragraph: bool,
    table: Option<TableState>,
    quote_depth: usize,
    frontmatter: Option<Frontmatter>,
}

impl<'src> Converter<'src> {
    fn event(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.start(tag, range),
            Event::End(_) => self.end(),
            Event::Text(text) => self.text(&text, range),
            Event::Code(code) => self.inline_leaf(
                Token::leaf(TokenKind::CodeInline, "code").with_content(code.to_string()),
                range,
            ),
            Event::Html(html) | Event::InlineHtml(html) => self.inline_leaf(
                Token::leaf(TokenKind::HtmlInline, "").with_content(html.to_string()),
                range,
            ),
            Event::SoftBreak => self.inline_leaf(Token::leaf(TokenKind::SoftBreak, ""), range),
            Event::HardBreak => self.inline_leaf(Token::leaf(TokenKind::HardBreak, "br"), range),
            Event::Rule => {
                self.close_implicit();
                self.out
                    .push(Token::leaf(TokenKind::ThematicBreak, "hr").as_block());
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>, range: Range<usize>) {
        if matches!(
            self.sink(),
            Some(Frame::Image { .. } | Frame::LiteralLink | Frame::Metadata(..))
        ) {
            self.stack.push(Frame::Ignored);
            return;
        }

        match tag {
            Tag::Paragraph => self.open_inline_block(TokenKind::Paragraph, "p".to_string(), Vec::new()),
            Tag::Heading { level, .. } => {
                self.open_inline_block(TokenKind::Heading, format!("h{}", level as u8), Vec::new())
            }
            Tag::BlockQuote(_) => {
                self.open_block(Token::open(TokenKind::Blockquote, "blockquote"));
                self.quote_depth += 1;
                self.stack.push(Frame::Blockquote);
            }
            Tag::CodeBlock(kind) => {
                self.close_implicit();
                let info = match kind {
                    CodeBlockKind::Fenced(info) => info.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.stack.push(Frame::CodeBlock {
                    info,
                    code: String::new(),
                });
            }
            Tag::HtmlBlock => {
                self.close_implicit();
                self.stack.push(Frame::HtmlBlock(String::new()));
            }
            Tag::List(Some(start)) => {
                let mut token = Token::open(TokenKind::OrderedList, "ol");
                if start != 1 {
                    token.set_attr("start", start.to_string());
                }
                self.open_block(token);
                self.stack
                    .push(Frame::Block(TokenKind::OrderedList, "ol".to_string()));
            }
            Tag::List(None) => {
                self.open_block(Token::open(TokenKind::BulletList, "ul"));
                self.stack
                    .push(Frame::Block(TokenKind::BulletList, "ul".to_string()));
            }
            Tag::Item => {
                self.open_block(Token::open(TokenKind::ListItem, "li"));
                self.stack
                    .push(Frame::Block(TokenKind::ListItem, "li".to_string()));
            }
            Tag::Table(alignments) => {
                self.open_block(Token::open(TokenKind::Table, "table"));
                self.table = Some(TableState {
                    alignments,
                    in_head: false,
                    body_open: false,
                    column: 0,
                });
                self.stack.push(Frame::Table);
            }
            Tag::TableHead => {
                self.out
                    .push(Token::open(TokenKind::TableHead, "thead").as_block())
                    .push(Token::open(TokenKind::TableRow, "tr").as_block());
                if let Some(table) = &mut self.table {
                    table.in_head = true;
                    table.column = 0;
                }
                self.stack.push(Frame::TableHead);
            }
            Tag::TableRow => {
                if let Some(table) = &mut self.table {
                    if !table.body_open {
                        table.body_open = true;
                        self.out
                            .push(Token::open(TokenKind::TableBody, "tbody").as_block());
                    }
                    table.column = 0;
                }
                self.out
                    .push(Token::open(TokenKind::TableRow, "tr").as_block());
                self.stack.push(Frame::TableRow);
            }
            Tag::TableCell => {
                let (kind, tag, alignment) = match &mut self.table {
                    Some(table) => {
                        let alignment = table
                            .alignments
                            .get(table.column)
                            .copied()
                            .unwrap_or(Alignment::None);
                        table.column += 1;
                        if table.in_head {
                            (TokenKind::TableHeaderCell, "th", alignment)
                        } else {
                            (TokenKind::TableDataCell, "td", alignment)
                        }
                    }
                    None => (TokenKind::TableDataCell, "td", Alignment::None),
                };
                let attrs = match alignment {
                    Alignment::Left => vec![("style".to_string(), "text-align:left".to_string())],
                    Alignment::Center => vec![("style".to_string(), "text-align:center".to_string())],
                    Alignment::Right => vec![("style".to_string(), "text-align:right".to_string())],
                    Alignment::None => Vec::new(),
                };
                self.open_inline_block(kind, tag.to_string(), attrs);
            }
            Tag::Emphasis => self.open_inline(TokenKind::Emphasis, "em", range),
            Tag::Strong => self.open_inline(TokenKind::Strong, "strong", range),
            Tag::Strikethrough => self.open_inline(TokenKind::Strikethrough, "s", range),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                if link_type == LinkType::Autolink && self.is_double_bracketed(&range) {
                    let literal = self.src[range.clone()].to_string();
                    self.push_text(&literal, range);
                    self.stack.push(Frame::LiteralLink);
                    return;
                }
                let href = match link_type {
                    LinkType::Email => format!("mailto:{}", &*dest_url),
                    _ => dest_url.to_string(),
                };
                let mut token = Token::open(TokenKind::Link, "a").with_attr("href", href);
                if !title.is_empty() {
                    token.set_attr("title", title.to_string());
                }
                self.push_child(token, range);
                self.stack.push(Frame::Inline(TokenKind::Link, "a"));
            }
            Tag::Image { dest_url, title, .. } => {
                self.ensure_inline();
                self.extend_span(range);
                self.stack.push(Frame::Image {
                    src: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                });
            }
            Tag::MetadataBlock(kind) => {
                let format = match kind {
                    MetadataBlockKind::YamlStyle => FrontmatterFormat::Yaml,
                    MetadataBlockKind::PlusesStyle => FrontmatterFormat::Toml,
                };
                self.stack.push(Frame::Metadata(format, String::new()));
            }
            _ => self.stack.push(Frame::Ignored),
        }
    }

    fn end(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Block(kind, tag) => {
                self.close_implicit();
                self.out.push(Token::close(kind, tag).as_block());
            }
            Frame::Blockquote => {
                self.close_implicit();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.out
                    .push(Token::close(TokenKind::Blockquote, "blockquote").as_block());
            }
            Frame::InlineBlock(kind, tag) => {
                self.flush_inline();
                self.out.push(Token::close(kind, tag).as_block());
            }
            Frame::Inline(kind, tag) => {
                if let Some(buffer) = &mut self.inline {
                    buffer.children.push(Token::close(kind, tag));
                }
            }
            Frame::Image { src, title, alt } => {
                let mut image = Token::leaf(TokenKind::Image, "img")
                    .with_attr("src", src)
                    .with_attr("alt", alt.clone())
                    .with_content(alt);
                if !title.is_empty() {
                    image.set_attr("title", title);
                }
                if let Some(buffer) = &mut self.inline {
                    buffer.children.push(image);
                }
            }
            Frame::CodeBlock { info, code } => {
                let mut token = Token::leaf(TokenKind::CodeBlock, "code")
                    .with_content(code)
                    .as_block();
                token.info = info;
                self.out.push(token);
            }
            Frame::HtmlBlock(html) => {
                self.out
                    .push(Token::leaf(TokenKind::HtmlBlock, "").with_content(html).as_block());
            }
            Frame::Metadata(format, raw) => {
                self.frontmatter = Some(Frontmatter::parse(&raw, format));
            }
            Frame::TableHead => {
                self.out
                    .push(Token::close(TokenKind::TableRow, "tr").as_block())
                    .push(Token::close(TokenKind::TableHead, "thead").as_block());
                if let Some(table) = &mut self.table {
                    table.in_head = false;
                }
            }
            Frame::TableRow => {
                self.out
                    .push(Token::close(TokenKind::TableRow, "tr").as_block());
            }
            Frame::Table => {
                if self.table.take().is_some_and(|t| t.body_open) {
                    self.out
                        .push(Token::close(TokenKind::TableBody, "tbody").as_block());
                }
                self.out
                    .push(Token::close(TokenKind::Table, "table").as_block());
            }
            Frame::LiteralLink | Frame::Ignored => {}
        }
    }

    /// Innermost frame that takes content. Ignored frames are transparent.
    fn sink(&mut self) -> Option<&mut Frame> {
        self.stack
            .iter_mut()
            .rev()
            .find(|f| !matches!(f, Frame::Ignored))
    }

    fn text(&mut self, text: &str, range: Range<usize>) {
        match self.sink() {
            Some(Frame::CodeBlock { code, .. }) => code.push_str(text),
            Some(Frame::HtmlBlock(html)) => html.push_str(text),
            Some(Frame::Metadata(_, raw)) => raw.push_str(text),
            Some(Frame::Image { alt, .. }) => alt.push_str(text),
            Some(Frame::LiteralLink) => {}
            _ => self.push_text(text, range),
        }
    }

    fn inline_leaf(&mut self, token: Token, range: Range<usize>) {
        match self.sink() {
            Some(Frame::HtmlBlock(html)) => html.push_str(&token.content),
            Some(Frame::Image { alt, .. }) => alt.push_str(&token.content),
            Some(Frame::LiteralLink) => {}
            _ => self.push_child(token, range),
        }
    }

    fn open_block(&mut self, token: Token) {
        self.close_implicit();
        self.out.push(token.as_block());
    }

    fn open_inline_block(&mut self, kind: TokenKind, tag: String, attrs: Vec<(String, String)>) {
        let mut token = Token::open(kind, tag.clone());
        token.attrs = attrs;
        self.open_block(token);
        self.inline = Some(InlineBuffer::default());
        self.stack.push(Frame::InlineBlock(kind, tag));
    }

    fn open_inline(&mut self, kind: TokenKind, tag: &'static str, range: Range<usize>) {
        self.push_child(Token::open(kind, tag), range);
        self.stack.push(Frame::Inline(kind, tag));
    }

    /// Make sure there is an inline container to add children to. Text
    /// directly inside a list item gets a hidden paragraph.
    fn ensure_inline(&mut self) {
        if self.inline.is_none() {
            self.out.push(
                Token::open(TokenKind::Paragraph, "p")
                    .as_block()
                    .with_hidden(true),
            );
            self.inline = Some(InlineBuffer::default());
            self.implicit_paragraph = true;
        }
    }

    fn extend_span(&mut self, range: Range<usize>) {
        if let Some(buffer) = &mut self.inline {
            buffer.span = Some(match buffer.span.take() {
                Some(span) => span.start.min(range.start)..span.end.max(range.end),
                None => range,
            });
        }
    }

    fn push_child(&mut self, token: Token, range: Range<usize>) {
        self.ensure_inline();
        self.extend_span(range);
        if let Some(buffer) = &mut self.inline {
            buffer.children.push(token);
        }
    }

    /// Add text, merging with a directly preceding text child.
    fn push_text(&mut self, text: &str, range: Range<usize>) {
        self.ensure_inline();
        self.extend_span(range.clone());
        if let Some(buffer) = &mut self.inline
            && let Some(last) = buffer.children.last_mut()
            && last.kind == TokenKind::Text
        {
            last.content.push_str(text);
            return;
        }
        self.push_child(Token::text(text), range);
    }

    fn flush_inline(&mut self) {
        let buffer = self.inline.take().unwrap_or_default();
        let content = match &buffer.span {
            Some(span) => self.inline_source(span.clone()),
            None => String::new(),
        };
        self.out.push(Token::inline(buffer.children, content));
    }

    fn close_implicit(&mut self) {
        if self.implicit_paragraph {
            self.implicit_paragraph = false;
            self.flush_inline();
            self.out.push(
                Token::close(TokenKind::Paragraph, "p")
                    .as_block()
                    .with_hidden(true),
            );
        }
    }

    /// Source of an inline run with container markers removed from
    /// continuation lines.
    fn inline_source(&self, span: Range<usize>) -> String {
        let raw = self.src.get(span).unwrap_or("");
        let mut lines = Vec::new();
        for (i, line) in raw.lines().enumerate() {
            let mut line = line.trim_start();
            if i > 0 {
                for _ in 0..self.quote_depth {
                    match line.strip_prefix('>') {
                        Some(rest) => line = rest.strip_prefix(' ').unwrap_or(rest).trim_start(),
                        None => break,
                    }
                }
            }
            lines.push(line);
        }
        lines.join("\n").trim().to_string()
    }

    fn is_double_bracketed(&self, range: &Range<usize>) -> bool {
        let bytes = self.src.as_bytes();
        range.start > 0
            && bytes.get(range.start - 1) == Some(&b'<')
            && bytes.get(range.end) == Some(&b'>')
    }
}

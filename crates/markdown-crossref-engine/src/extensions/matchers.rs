//! Predicates recognizing captioned elements in a token stream.
//!
//! Matchers only look. They never change tokens or registries; a `None`
//! leaves the stream exactly as it was.

use crate::token::{Nesting, Token, TokenKind};

/// A markdown table followed by a caption paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMatch {
    /// Index of the table's close token
    pub end: usize,
    /// Caption text without the leading `.`
    pub caption: String,
}

/// Title of an image standing alone in a paragraph.
///
/// Matches `Paragraph(Open) Inline Paragraph(Close)` where the inline's only
/// child is an image with a non-empty `title`.
pub fn image_figure(tokens: &[Token], i: usize) -> Option<String> {
    let [open, inline, close] = tokens.get(i..i + 3)? else {
        return None;
    };
    if !open.is(TokenKind::Paragraph, Nesting::Open)
        || inline.kind != TokenKind::Inline
        || !close.is(TokenKind::Paragraph, Nesting::Close)
    {
        return None;
    }
    let [image] = inline.children.as_slice() else {
        return None;
    };
    if image.kind != TokenKind::Image {
        return None;
    }
    image
        .attr("title")
        .filter(|title| !title.trim().is_empty())
        .map(str::to_string)
}

/// A table opening at `i` and followed by a caption paragraph.
pub fn table_figure(tokens: &[Token], i: usize) -> Option<TableMatch> {
    if !tokens.get(i)?.is(TokenKind::Table, Nesting::Open) {
        return None;
    }
    let end = find_matching_close(tokens, i)?;
    let caption = caption_paragraph(tokens, end + 1)?;
    Some(TableMatch {
        end,
        caption: caption.to_string(),
    })
}

/// Caption of a raw HTML `<table>` block at `i`.
///
/// The block must start with `<table>` and end with `</table>` plus a
/// newline.
pub fn html_table_figure(tokens: &[Token], i: usize) -> Option<String> {
    let token = tokens.get(i)?;
    if token.kind != TokenKind::HtmlBlock
        || !token.content.starts_with("<table>")
        || !token.content.ends_with("</table>\n")
    {
        return None;
    }
    caption_paragraph(tokens, i + 1).map(str::to_string)
}

/// A blockquote credited to a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionMatch {
    /// Index of the blockquote's close token
    pub end: usize,
    pub key: String,
}

/// A blockquote at `i` whose last paragraph is only `[@key]`.
///
/// ```markdown
/// > Markdown is a lightweight markup language.
/// >
/// > [@wiki:markdown]
/// ```
pub fn attribution(tokens: &[Token], i: usize) -> Option<AttributionMatch> {
    let quote = tokens.get(i)?;
    if !quote.is(TokenKind::Blockquote, Nesting::Open) {
        return None;
    }
    let end = find_matching_close(tokens, i)?;
    let marker = end.checked_sub(3).filter(|&m| m > i)?;
    let [open, inline, close] = tokens.get(marker..end)? else {
        return None;
    };
    if !open.is(TokenKind::Paragraph, Nesting::Open)
        || open.level != quote.level + 1
        || inline.kind != TokenKind::Inline
        || !close.is(TokenKind::Paragraph, Nesting::Close)
    {
        return None;
    }
    let key = inline
        .content
        .trim()
        .strip_prefix("[@")?
        .strip_suffix(']')?;
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some(AttributionMatch {
        end,
        key: key.to_string(),
    })
}

/// Text of a `.Caption` paragraph starting at `i`.
///
/// The inline content must begin with `.` directly followed by a
/// non-whitespace character.
pub fn caption_paragraph(tokens: &[Token], i: usize) -> Option<&str> {
    let [open, inline, close] = tokens.get(i..i + 3)? else {
        return None;
    };
    if !open.is(TokenKind::Paragraph, Nesting::Open)
        || inline.kind != TokenKind::Inline
        || !close.is(TokenKind::Paragraph, Nesting::Close)
    {
        return None;
    }
    let caption = inline.content.strip_prefix('.')?;
    match caption.chars().next() {
        Some(c) if !c.is_whitespace() => Some(caption),
        _ => None,
    }
}

/// Index of the close token pairing with the open token at `open`.
///
/// Tokens of the same kind in between are counted, so a nested pair never
/// ends the scan early.
pub fn find_matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let kind = tokens.get(open)?.kind;
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        if token.kind != kind {
            continue;
        }
        match token.nesting {
            Nesting::Open => depth += 1,
            Nesting::Close => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index);
                }
            }
            Nesting::Leaf => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::block::convert;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn tokens(src: &str) -> Vec<Token> {
        convert(src).tokens
    }

    #[test]
    fn image_with_title() {
        let tokens = tokens("![Cat](cat.png \"The Stormtroopocat\")\n");
        assert_eq!(image_figure(&tokens, 0), Some("The Stormtroopocat".to_string()));
    }

    #[rstest]
    #[case::no_title("![Cat](cat.png)\n")]
    #[case::blank_title("![Cat](cat.png \" \")\n")]
    #[case::text_around("See ![Cat](cat.png \"Title\")\n")]
    #[case::two_images("![a](a.png \"A\") ![b](b.png \"B\")\n")]
    fn image_non_matches(#[case] src: &str) {
        let tokens = tokens(src);
        assert_eq!(image_figure(&tokens, 0), None);
    }

    #[test]
    fn table_with_caption() {
        let tokens = tokens("| A |\n|---|\n| 1 |\n\n.Client Overview!\n");
        let found = table_figure(&tokens, 0).unwrap();
        assert_eq!(found.caption, "Client Overview!");
        assert!(tokens[found.end].is(TokenKind::Table, Nesting::Close));
    }

    #[rstest]
    #[case::no_caption("| A |\n|---|\n| 1 |\n")]
    #[case::plain_paragraph("| A |\n|---|\n| 1 |\n\nJust text.\n")]
    #[case::space_after_dot("| A |\n|---|\n| 1 |\n\n. Spaced\n")]
    #[case::bare_dot("| A |\n|---|\n| 1 |\n\n.\n")]
    fn table_non_matches(#[case] src: &str) {
        let tokens = tokens(src);
        assert_eq!(table_figure(&tokens, 0), None);
    }

    #[test]
    fn html_table_with_caption() {
        let tokens = tokens("<table>\n<tr><td>x</td></tr>\n</table>\n\n.Raw#raw-table\n");
        assert_eq!(html_table_figure(&tokens, 0), Some("Raw#raw-table".to_string()));
    }

    #[test]
    fn html_table_needs_table_markers() {
        let tokens = tokens("<div>\n<table></table>\n</div>\n\n.Caption\n");
        assert_eq!(html_table_figure(&tokens, 0), None);
    }

    #[test]
    fn html_table_needs_trailing_newline() {
        let table = Token::leaf(TokenKind::HtmlBlock, "")
            .with_content("<table><tr><td>x</td></tr></table>")
            .as_block();
        let mut stream = vec![table];
        stream.extend(tokens(".Caption\n"));
        assert_eq!(html_table_figure(&stream, 0), None);
    }

    #[test]
    fn credited_blockquote() {
        let tokens = tokens("> Quoted *text*.\n>\n> [@wiki:markdown]\n\nAfter.\n");
        let found = attribution(&tokens, 0).unwrap();
        assert_eq!(found.key, "wiki:markdown");
        assert!(tokens[found.end].is(TokenKind::Blockquote, Nesting::Close));
        assert_eq!(found.end, 7);
    }

    #[rstest]
    #[case::no_marker("> Quoted.\n")]
    #[case::marker_first("> [@key]\n>\n> Quoted.\n")]
    #[case::marker_with_text("> Quoted.\n>\n> Said [@key]\n")]
    #[case::empty_key("> Quoted.\n>\n> [@]\n")]
    #[case::nested_marker("> Quoted.\n>\n> > [@key]\n")]
    #[case::not_a_quote("[@key]\n")]
    fn attribution_non_matches(#[case] src: &str) {
        let tokens = tokens(src);
        assert_eq!(attribution(&tokens, 0), None);
    }

    #[test]
    fn matchers_do_not_mutate() {
        let tokens = tokens("| A |\n|---|\n| 1 |\n\n.Caption\n");
        let before = tokens.clone();
        let _ = table_figure(&tokens, 0);
        let _ = image_figure(&tokens, 0);
        assert_eq!(tokens, before);
    }

    #[test]
    fn matching_close_skips_nested_pairs() {
        let stream = vec![
            Token::open(TokenKind::Table, "table"),
            Token::open(TokenKind::Table, "table"),
            Token::close(TokenKind::Table, "table"),
            Token::close(TokenKind::Table, "table"),
        ];
        assert_eq!(find_matching_close(&stream, 0), Some(3));
        assert_eq!(find_matching_close(&stream, 1), Some(2));
    }

    #[test]
    fn unclosed_has_no_match() {
        let stream = vec![Token::open(TokenKind::Table, "table")];
        assert_eq!(find_matching_close(&stream, 0), None);
    }

    #[test]
    fn table_inside_list_item_is_found() {
        let tokens = tokens("- item\n\n  | A |\n  |---|\n  | 1 |\n\n  .Nested\n");
        let open = tokens
            .iter()
            .position(|t| t.is(TokenKind::Table, Nesting::Open))
            .unwrap();
        assert_eq!(
            table_figure(&tokens, open).map(|m| m.caption),
            Some("Nested".to_string())
        );
    }
}

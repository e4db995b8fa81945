//! `<<fig:key>>` and `<<tab:key>>` references.
//!
//! Figures and tables are only registered by the structural rules, which
//! run after inline parsing, so a reference may point at something that is
//! not known yet. The inline rule only records the key; the link text is
//! resolved when rendering, once every registry is complete.

use crate::env::{EntityKind, RenderEnv};
use crate::parser::{InlineRule, InlineState};
use crate::render::{RenderRule, Renderer, escape_html};
use crate::token::{Token, TokenKind};

pub struct ReferenceRule {
    kind: EntityKind,
    opener: &'static str,
}

impl ReferenceRule {
    pub fn new(kind: EntityKind) -> Self {
        let opener = match kind {
            EntityKind::Table => "<<tab:",
            _ => "<<fig:",
        };
        Self { kind, opener }
    }
}

impl InlineRule for ReferenceRule {
    fn parse(&self, state: &mut InlineState<'_, '_>) -> bool {
        if !state.cursor.starts_with(self.opener.as_bytes()) {
            return false;
        }
        let rest = &state.cursor.rest()[self.opener.len()..];
        let Some(end) = rest.find(">>") else {
            return false;
        };
        let key = &rest[..end];
        if key.is_empty() || key.contains(char::is_whitespace) {
            return false;
        }

        let len = self.opener.len() + end + 2;
        let marker = &state.cursor.rest()[..len];
        state.push(
            Token::leaf(TokenKind::Reference(self.kind), "a")
                .with_content(marker)
                .with_meta(key),
        );
        state.cursor.bump_n(len);
        true
    }
}

/// Renders a reference as a numbered link, or as its escaped marker when
/// the key was never registered.
pub struct ReferenceRenderer {
    kind: EntityKind,
    label: Option<String>,
}

impl ReferenceRenderer {
    pub fn new(kind: EntityKind, label: Option<String>) -> Self {
        Self { kind, label }
    }
}

impl RenderRule for ReferenceRenderer {
    fn render(&self, tokens: &[Token], idx: usize, env: &RenderEnv, _renderer: &Renderer) -> String {
        let token = &tokens[idx];
        let position = token
            .meta
            .as_deref()
            .and_then(|key| Some((key, env.registry(self.kind).position_of(key)?)));
        match position {
            Some((key, position)) => format!(
                "<a href=\"#{}\" class=\"{}\">{} {position}</a>",
                escape_html(key),
                self.kind.reference_class(),
                escape_html(&env.label(self.kind, self.label.as_deref())),
            ),
            None => {
                log::debug!("unresolved reference {}", token.content);
                escape_html(&token.content)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Markdown;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn md() -> Markdown {
        let mut md = Markdown::new();
        md.inline
            .push("figure_reference", Box::new(ReferenceRule::new(EntityKind::Figure)));
        md.renderer.set_rule(
            TokenKind::Reference(EntityKind::Figure),
            Box::new(ReferenceRenderer::new(EntityKind::Figure, None)),
        );
        md
    }

    #[test]
    fn reference_carries_key() {
        let md = md();
        let mut env = RenderEnv::new();
        let tokens = md.parse_inline("see <<fig:cat>>, then", &mut env);
        let contents: Vec<_> = tokens.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["see ", "<<fig:cat>>", ", then"]);
        assert_eq!(tokens[1].meta.as_deref(), Some("cat"));
        assert_eq!(tokens[1].kind, TokenKind::Reference(EntityKind::Figure));
    }

    #[rstest]
    #[case::empty("<<fig:>>")]
    #[case::space("<<fig:a b>>")]
    #[case::unclosed("<<fig:cat")]
    #[case::other_kind("<<tab:cat>>")]
    fn non_references(#[case] src: &str) {
        let md = md();
        let mut env = RenderEnv::new();
        let tokens = md.parse_inline(src, &mut env);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Text));
    }

    #[test]
    fn resolved_reference() {
        let md = md();
        let mut env = RenderEnv::new();
        env.figures.register("dog", "Dog");
        env.figures.register("cat", "Cat");
        let tokens = md.parse_inline("<<fig:cat>>", &mut env);
        assert_eq!(
            md.renderer.render_inline(&tokens, &env),
            "<a href=\"#cat\" class=\"figure-citation\">Figure 2</a>"
        );
    }

    #[test]
    fn dangling_reference_is_literal() {
        assert_eq!(
            md().render("See <<fig:nowhere>>.\n"),
            "<p>See &lt;&lt;fig:nowhere&gt;&gt;.</p>\n"
        );
    }

    #[test]
    fn references_in_code_stay_code() {
        assert_eq!(
            md().render("`<<fig:cat>>`\n"),
            "<p><code>&lt;&lt;fig:cat&gt;&gt;</code></p>\n"
        );
    }
}

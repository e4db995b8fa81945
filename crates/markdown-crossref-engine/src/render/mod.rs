//! HTML output.
//!
//! Tokens with a hook registered for their kind are rendered by the hook;
//! everything else goes through [`Renderer::render_token`], which writes a
//! tag from the token's `tag` and `attrs`. Hidden tokens render as nothing.
//!
//! Line breaks follow the usual markdown-it layout: a block token ends its
//! line unless it opens directly onto inline content (`<p>text</p>`).

use std::collections::HashMap;

use crate::env::RenderEnv;
use crate::token::{Nesting, Token, TokenKind};

/// Serializer for one token kind.
pub trait RenderRule: Send + Sync {
    fn render(&self, tokens: &[Token], idx: usize, env: &RenderEnv, renderer: &Renderer) -> String;
}

impl<F> RenderRule for F
where
    F: Fn(&[Token], usize, &RenderEnv, &Renderer) -> String + Send + Sync,
{
    fn render(&self, tokens: &[Token], idx: usize, env: &RenderEnv, renderer: &Renderer) -> String {
        self(tokens, idx, env, renderer)
    }
}

pub struct Renderer {
    rules: HashMap<TokenKind, Box<dyn RenderRule>>,
    /// Close void tags XHTML style (`<br />`)
    pub xhtml_out: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape text for HTML content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

impl Renderer {
    pub fn new() -> Self {
        let mut renderer = Self {
            rules: HashMap::new(),
            xhtml_out: true,
        };
        renderer.set_rule(TokenKind::Text, Box::new(text));
        renderer.set_rule(TokenKind::CodeInline, Box::new(code_inline));
        renderer.set_rule(TokenKind::CodeBlock, Box::new(code_block));
        renderer.set_rule(TokenKind::HtmlBlock, Box::new(html));
        renderer.set_rule(TokenKind::HtmlInline, Box::new(html));
        renderer.set_rule(TokenKind::SoftBreak, Box::new(softbreak));
        renderer.set_rule(TokenKind::HardBreak, Box::new(hardbreak));
        renderer.set_rule(TokenKind::Image, Box::new(image));
        renderer
    }

    /// Install a hook, replacing any previous one for `kind`.
    pub fn set_rule(&mut self, kind: TokenKind, rule: Box<dyn RenderRule>) {
        self.rules.insert(kind, rule);
    }

    pub fn has_rule(&self, kind: TokenKind) -> bool {
        self.rules.contains_key(&kind)
    }

    /// Render a block-level token stream.
    pub fn render(&self, tokens: &[Token], env: &RenderEnv) -> String {
        let mut out = String::new();
        for (idx, token) in tokens.iter().enumerate() {
            if token.kind == TokenKind::Inline {
                out.push_str(&self.render_inline(&token.children, env));
            } else {
                out.push_str(&self.render_one(tokens, idx, env));
            }
        }
        out
    }

    /// Render the children of an inline container.
    pub fn render_inline(&self, tokens: &[Token], env: &RenderEnv) -> String {
        (0..tokens.len())
            .map(|idx| self.render_one(tokens, idx, env))
            .collect()
    }

    fn render_one(&self, tokens: &[Token], idx: usize, env: &RenderEnv) -> String {
        let token = &tokens[idx];
        if token.hidden {
            return String::new();
        }
        match self.rules.get(&token.kind) {
            Some(rule) => rule.render(tokens, idx, env, self),
            None => self.render_token(tokens, idx),
        }
    }

    /// Render `tokens[idx]` as a plain tag.
    pub fn render_token(&self, tokens: &[Token], idx: usize) -> String {
        let token = &tokens[idx];
        if token.hidden || token.tag.is_empty() {
            return String::new();
        }

        let mut out = String::new();
        // Separate a block that follows hidden content.
        if token.block && token.nesting != Nesting::Close && idx > 0 && tokens[idx - 1].hidden {
            out.push('\n');
        }

        out.push_str(if token.nesting == Nesting::Close { "</" } else { "<" });
        out.push_str(&token.tag);
        out.push_str(&self.render_attrs(token));
        if token.nesting == Nesting::Leaf && self.xhtml_out {
            out.push_str(" /");
        }

        let mut need_lf = token.block;
        if token.block
            && token.nesting == Nesting::Open
            && let Some(next) = tokens.get(idx + 1)
        {
            if next.kind == TokenKind::Inline || next.hidden {
                need_lf = false;
            } else if next.nesting == Nesting::Close && next.tag == token.tag {
                need_lf = false;
            }
        }
        out.push_str(if need_lf { ">\n" } else { ">" });
        out
    }

    pub fn render_attrs(&self, token: &Token) -> String {
        token
            .attrs
            .iter()
            .map(|(name, value)| format!(" {}=\"{}\"", escape_html(name), escape_html(value)))
            .collect()
    }
}

fn text(tokens: &[Token], idx: usize, _env: &RenderEnv, _r: &Renderer) -> String {
    escape_html(&tokens[idx].content)
}

fn code_inline(tokens: &[Token], idx: usize, _env: &RenderEnv, r: &Renderer) -> String {
    let token = &tokens[idx];
    format!(
        "<code{}>{}</code>",
        r.render_attrs(token),
        escape_html(&token.content)
    )
}

fn code_block(tokens: &[Token], idx: usize, _env: &RenderEnv, _r: &Renderer) -> String {
    let token = &tokens[idx];
    let class = match token.info.split_whitespace().next() {
        Some(lang) => format!(" class=\"language-{}\"", escape_html(lang)),
        None => String::new(),
    };
    format!(
        "<pre><code{class}>{}</code></pre>\n",
        escape_html(&token.content)
    )
}

fn html(tokens: &[Token], idx: usize, _env: &RenderEnv, _r: &Renderer) -> String {
    tokens[idx].content.clone()
}

fn softbreak(_tokens: &[Token], _idx: usize, _env: &RenderEnv, _r: &Renderer) -> String {
    "\n".to_string()
}

fn hardbreak(_tokens: &[Token], _idx: usize, _env: &RenderEnv, r: &Renderer) -> String {
    if r.xhtml_out { "<br />\n" } else { "<br>\n" }.to_string()
}

fn image(tokens: &[Token], idx: usize, _env: &RenderEnv, r: &Renderer) -> String {
    let token = &tokens[idx];
    let close = if r.xhtml_out { " />" } else { ">" };
    format!("<img{}{close}", r.render_attrs(token))
}

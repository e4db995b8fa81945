//! Lists of figures, tables, cited sources and attributions appended to
//! the document. An empty list title drops the heading but keeps the list.

use std::sync::Arc;

use markdown_crossref_bib::Bibliography;

use super::attributions::{find, source_children};
use super::cite::entry_children;
use super::options::{AttributionSource, ListOptions, ListTag};
use crate::env::EntityKind;
use crate::parser::{CoreRule, CoreState};
use crate::registry::Entry;
use crate::slug::key_id;
use crate::token::{Token, TokenBuilder, TokenKind};

/// How the items of a list are built.
enum Items {
    /// `Label N: caption`, linking to the entity's anchor
    Captions { label: Option<String> },
    /// `[N]: entry`, with the item as the citation target
    Bibliography(Arc<Bibliography>),
    /// `[N]: title (By: author, license)`, with the item as the label target
    Attributions(Arc<[AttributionSource]>),
}

/// Core rule appending the summary list of one entity kind.
pub struct SummaryRule {
    kind: EntityKind,
    list: ListOptions,
    items: Items,
}

impl SummaryRule {
    pub fn captions(kind: EntityKind, label: Option<String>, list: ListOptions) -> Self {
        Self {
            kind,
            list,
            items: Items::Captions { label },
        }
    }

    pub fn bibliography(bibliography: Arc<Bibliography>, list: ListOptions) -> Self {
        Self {
            kind: EntityKind::Citation,
            list,
            items: Items::Bibliography(bibliography),
        }
    }

    pub fn attributions(sources: Arc<[AttributionSource]>, list: ListOptions) -> Self {
        Self {
            kind: EntityKind::Attribution,
            list,
            items: Items::Attributions(sources),
        }
    }

    fn item(&self, state: &mut CoreState<'_>, entry: &Entry, position: usize) -> (Token, Vec<Token>) {
        let item = Token::open(TokenKind::SummaryItem, "li").as_block();
        match &self.items {
            Items::Captions { label } => {
                let label = state.env.label(self.kind, label.as_deref());
                let mut children = vec![
                    Token::open(TokenKind::Link, "a").with_attr("href", format!("#{}", entry.key)),
                    Token::text(format!("{label} {position}")),
                    Token::close(TokenKind::Link, "a"),
                    Token::text(": "),
                ];
                children.extend(state.md.parse_inline(&entry.title, state.env));
                (item, children)
            }
            Items::Bibliography(bibliography) => (
                item.with_attr("id", format!("citation-{position}")),
                entry_children(&entry.key, bibliography.get(&entry.key), position),
            ),
            Items::Attributions(sources) => {
                let mut children = vec![
                    Token::open(TokenKind::Label, "span").with_attr("class", "label"),
                    Token::text(format!("[{position}]")),
                    Token::close(TokenKind::Label, "span"),
                    Token::text(": "),
                ];
                children.extend(source_children(&entry.key, find(sources, &entry.key)));
                (
                    item.with_attr("id", key_id(&entry.key))
                        .with_attr("class", "item"),
                    children,
                )
            }
        }
    }

    fn class(&self) -> String {
        match (&self.list.class, &self.items) {
            (Some(class), _) => class.clone(),
            (None, Items::Attributions(_)) => "list".to_string(),
            (None, _) => self.kind.list_class().to_string(),
        }
    }

    fn tag(&self) -> &'static str {
        let default = match self.items {
            Items::Attributions(_) => ListTag::Ol,
            _ => ListTag::Ul,
        };
        self.list.tag.unwrap_or(default).tag()
    }
}

impl CoreRule for SummaryRule {
    fn run(&self, state: &mut CoreState<'_>) {
        if state.inline_mode || !self.list.enable {
            return;
        }
        let entries = state.env.registry(self.kind).entries().to_vec();
        if entries.is_empty() {
            return;
        }

        let class = self.class();
        let title = state.env.list_title(self.kind, self.list.title.as_deref());
        let heading = self.list.heading_tag();
        let tag = self.tag();

        let mut b = TokenBuilder::new(0);
        if !matches!(self.items, Items::Attributions(_)) {
            b.push(
                Token::leaf(TokenKind::ThematicBreak, "hr")
                    .with_attr("class", class.as_str())
                    .as_block(),
            );
        }
        if !title.is_empty() {
            let mut open = Token::open(TokenKind::Heading, heading.as_str())
                .with_attr("id", self.kind.list_class());
            if let Items::Attributions(_) = self.items {
                open = open.with_attr("class", class.as_str());
            }
            b.push(open.as_block())
                .push(Token::inline(vec![Token::text(title.as_str())], title.as_str()))
                .push(Token::close(TokenKind::Heading, heading.as_str()).as_block());
        }
        b.push(
            Token::open(TokenKind::SummaryList, tag)
                .with_attr("class", class.as_str())
                .as_block(),
        );

        for (index, entry) in entries.iter().enumerate() {
            let (item, children) = self.item(state, entry, index + 1);
            b.push(item)
                .push(Token::inline(children, entry.title.as_str()))
                .push(Token::close(TokenKind::SummaryItem, "li").as_block());
        }

        b.push(Token::close(TokenKind::SummaryList, tag).as_block());
        log::debug!(
            "appending {} with {} entries",
            self.kind.list_class(),
            entries.len()
        );
        state.tokens.extend(b.finish());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::RenderEnv;
    use crate::extensions::options::ListTag;
    use crate::parser::Markdown;
    use crate::token::invariants;
    use pretty_assertions::assert_eq;

    fn md(list: ListOptions) -> Markdown {
        let mut md = Markdown::new();
        md.core.push(
            "figure_list",
            Box::new(SummaryRule::captions(EntityKind::Figure, None, list)),
        );
        // Registers every paragraph as a figure.
        md.core.after(
            "inline",
            "register",
            Box::new(|state: &mut CoreState<'_>| {
                if state.inline_mode {
                    return;
                }
                for token in state.tokens.iter().filter(|t| t.kind == TokenKind::Inline) {
                    state.env.figures.register(&token.content.to_lowercase(), &token.content);
                }
            }),
        )
        .unwrap();
        md
    }

    #[test]
    fn list_of_figures() {
        let md = md(ListOptions::default());
        assert_eq!(
            md.render("*Cat*\n"),
            "<p><em>Cat</em></p>\n\
             <hr class=\"list-of-figures\" />\n\
             <h2 id=\"list-of-figures\">List of Figures</h2>\n\
             <ul class=\"list-of-figures\">\n\
             <li><a href=\"#*cat*\">Figure 1</a>: <em>Cat</em></li>\n\
             </ul>\n"
        );
    }

    #[test]
    fn empty_registry_adds_nothing() {
        let mut md = Markdown::new();
        md.core.push(
            "figure_list",
            Box::new(SummaryRule::captions(EntityKind::Figure, None, ListOptions::default())),
        );
        assert_eq!(md.render("text\n"), "<p>text</p>\n");
    }

    #[test]
    fn disabled_list_adds_nothing() {
        let md = md(ListOptions {
            enable: false,
            ..ListOptions::default()
        });
        assert_eq!(md.render("a\n"), "<p>a</p>\n");
    }

    #[test]
    fn configured_list() {
        let md = md(ListOptions {
            class: Some("lof".to_string()),
            title: Some("Figures".to_string()),
            tag: Some(ListTag::Ol),
            level: 3,
            ..ListOptions::default()
        });
        let html = md.render("a\n\nb\n");
        assert!(html.contains("<hr class=\"lof\" />"));
        assert!(html.contains("<h3 id=\"list-of-figures\">Figures</h3>"));
        assert!(html.contains("<ol class=\"lof\">"));
        assert!(html.contains("<a href=\"#b\">Figure 2</a>: b</li>\n</ol>"));
    }

    #[test]
    fn empty_title_drops_only_the_heading() {
        let md = md(ListOptions {
            title: Some(String::new()),
            ..ListOptions::default()
        });
        assert_eq!(
            md.render("a\n"),
            "<p>a</p>\n\
             <hr class=\"list-of-figures\" />\n\
             <ul class=\"list-of-figures\">\n\
             <li><a href=\"#a\">Figure 1</a>: a</li>\n\
             </ul>\n"
        );
    }

    #[test]
    fn empty_frontmatter_title_drops_the_heading() {
        let md = md(ListOptions::default());
        let mut env = RenderEnv::new();
        let tokens = md.parse("---\nlist-of-figures:\n  title: \"\"\n---\n\nx\n", &mut env);
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Heading));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::SummaryList));
        assert_eq!(invariants::check(&tokens), Ok(()));
    }

    #[test]
    fn attribution_list_without_title() {
        let sources: Arc<[AttributionSource]> = vec![AttributionSource {
            key: "a:b".to_string(),
            title: None,
            author: None,
            license: None,
        }]
        .into();
        let mut md = Markdown::new();
        md.core.push(
            "attribution_list",
            Box::new(SummaryRule::attributions(
                sources,
                ListOptions {
                    title: Some(String::new()),
                    ..ListOptions::default()
                },
            )),
        );
        let mut env = RenderEnv::new();
        env.attributions.register("a:b", "a:b");
        let tokens = md.parse("", &mut env);
        let html = md.renderer.render(&tokens, &env);
        assert_eq!(
            html,
            "<ol class=\"list\">\n\
             <li id=\"a_b\" class=\"item\"><span class=\"label\">[1]</span>: a:b</li>\n\
             </ol>\n"
        );
    }

    #[test]
    fn frontmatter_title_and_label() {
        let md = md(ListOptions::default());
        let html = md.render("---\nlist-of-figures:\n  title: Abbildungen\n  label: Abb.\n---\n\nx\n");
        assert!(html.contains(">Abbildungen</h2>"));
        assert!(html.contains(">Abb. 1</a>"));
    }

    #[test]
    fn not_in_inline_mode() {
        let md = md(ListOptions::default());
        let mut env = RenderEnv::new();
        env.figures.register("x", "X");
        let tokens = md.parse_inline("x", &mut env);
        assert!(tokens.iter().all(|t| t.kind != TokenKind::SummaryItem));
    }

    #[test]
    fn levels_hold() {
        let md = md(ListOptions::default());
        let mut env = RenderEnv::new();
        let tokens = md.parse("- a\n- b\n", &mut env);
        assert_eq!(invariants::check(&tokens), Ok(()));
        assert_eq!(tokens.last().map(|t| t.level), Some(0));
    }
}

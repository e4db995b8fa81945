//! The flat token stream shared by every pipeline stage.
//!
//! Block structure is expressed with paired open/close tokens; inline
//! content lives in the `children` of [`TokenKind::Inline`] containers,
//! using the same open/close pairing.
//!
//! ```text
//! Paragraph(Open)        level 0
//! Inline                 level 1
//!   ├─ Text "See "       level 2
//!   ├─ Strong(Open)      level 2
//!   │  Text "this"       level 3
//!   └─ Strong(Close)     level 2
//! Paragraph(Close)       level 0
//! ```

pub mod builder;
pub mod invariants;

pub use builder::{TokenBuilder, relevel};

use crate::env::EntityKind;

/// Position of a token in its open/close pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nesting {
    Open,
    Close,
    Leaf,
}

/// Structural role of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Block containers
    Paragraph,
    Heading,
    Blockquote,
    BulletList,
    OrderedList,
    ListItem,
    Table,
    TableHead,
    TableBody,
    TableRow,
    TableHeaderCell,
    TableDataCell,

    // Inline containers
    Emphasis,
    Strong,
    Strikethrough,
    Link,
    /// Formatting from bibliography rich text (`em`, `sup`, ...)
    Mark,

    // Cross-reference structure
    Figure,
    FigureCaption,
    /// `<caption>` inside an unwrapped table
    Caption,
    /// `<span class="label">Figure N</span>`
    Label,
    SummaryList,
    SummaryItem,
    /// `<div class="parent">` around an attributed passage
    Attribution,
    /// `<div class="child">` holding the passage itself
    AttributionBody,

    // Leaves
    Inline,
    Text,
    CodeInline,
    CodeBlock,
    HtmlBlock,
    HtmlInline,
    SoftBreak,
    HardBreak,
    ThematicBreak,
    Image,
    /// `@key`, already numbered
    Citation,
    /// `<<fig:key>>` / `<<tab:key>>`, resolved when rendering
    Reference(EntityKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// HTML tag name, empty for tokens rendered by a hook
    pub tag: String,
    pub nesting: Nesting,
    pub level: usize,
    pub attrs: Vec<(String, String)>,
    /// Only used by [`TokenKind::Inline`]
    pub children: Vec<Token>,
    pub content: String,
    /// Fence info string of code blocks
    pub info: String,
    /// Referenced key of citations and references
    pub meta: Option<String>,
    pub block: bool,
    pub hidden: bool,
}

impl Token {
    pub fn new(kind: TokenKind, tag: impl Into<String>, nesting: Nesting) -> Self {
        Self {
            kind,
            tag: tag.into(),
            nesting,
            level: 0,
            attrs: Vec::new(),
            children: Vec::new(),
            content: String::new(),
            info: String::new(),
            meta: None,
            block: false,
            hidden: false,
        }
    }

    pub fn open(kind: TokenKind, tag: impl Into<String>) -> Self {
        Self::new(kind, tag, Nesting::Open)
    }

    pub fn close(kind: TokenKind, tag: impl Into<String>) -> Self {
        Self::new(kind, tag, Nesting::Close)
    }

    pub fn leaf(kind: TokenKind, tag: impl Into<String>) -> Self {
        Self::new(kind, tag, Nesting::Leaf)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::leaf(TokenKind::Text, "").with_content(content)
    }

    /// An inline container holding `children`, with `content` as its source.
    pub fn inline(children: Vec<Token>, content: impl Into<String>) -> Self {
        let mut token = Self::leaf(TokenKind::Inline, "").with_content(content);
        token.children = children;
        token
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }

    pub fn as_block(mut self) -> Self {
        self.block = true;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn is(&self, kind: TokenKind, nesting: Nesting) -> bool {
        self.kind == kind && self.nesting == nesting
    }
}

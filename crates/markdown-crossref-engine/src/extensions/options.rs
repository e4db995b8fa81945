//! Options of the figure, table and citation extensions.
//!
//! All option structs deserialize from partial input; missing fields take
//! their defaults, so a config section may set a single key.

use std::path::PathBuf;

use serde::Deserialize;

/// Number label in captions and references (`Figure 3`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LabelOptions {
    /// When disabled the label span and its separator are hidden.
    pub enable: bool,
    /// Overrides the default label text. Frontmatter wins over this.
    pub text: Option<String>,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            enable: true,
            text: None,
        }
    }
}

/// Self-link placed at the start of a caption.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnchorOptions {
    pub enable: bool,
    pub symbol: String,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            enable: false,
            symbol: "§".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListTag {
    Ul,
    Ol,
}

impl ListTag {
    pub fn tag(self) -> &'static str {
        match self {
            ListTag::Ul => "ul",
            ListTag::Ol => "ol",
        }
    }
}

/// The summary list appended to the document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    pub enable: bool,
    /// Class of the list. Defaults to the list's own id, or `list` for
    /// attributions.
    pub class: Option<String>,
    /// Heading text. Frontmatter wins over this; an empty title drops the
    /// heading but keeps the list.
    pub title: Option<String>,
    /// `ul`, except for attributions which default to `ol`.
    pub tag: Option<ListTag>,
    /// Heading level, clamped to 1..=6.
    pub level: u8,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            enable: true,
            class: None,
            title: None,
            tag: None,
            level: 2,
        }
    }
}

impl ListOptions {
    pub fn heading_tag(&self) -> String {
        format!("h{}", self.level.clamp(1, 6))
    }
}

/// Options shared by figures and tables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FigureOptions {
    pub label: LabelOptions,
    pub anchor: AnchorOptions,
    pub list: ListOptions,
    /// Wrap the element and its caption in `<figure>`. When off the element
    /// itself carries the id.
    pub wrap: bool,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            label: LabelOptions::default(),
            anchor: AnchorOptions::default(),
            list: ListOptions::default(),
            wrap: true,
        }
    }
}

pub type TableOptions = FigureOptions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CitationOptions {
    /// Bibliography files, read once when the extension is added.
    pub sources: Vec<PathBuf>,
    pub list: ListOptions,
}

/// Attribution text, plain (`"text"`) or linked (`["text", "url"]`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Attributed {
    Text(String),
    Linked(String, String),
}

impl Attributed {
    pub fn text(&self) -> &str {
        match self {
            Attributed::Text(text) | Attributed::Linked(text, _) => text,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Attributed::Text(_) => None,
            Attributed::Linked(_, url) => Some(url),
        }
    }
}

/// A source that quoted passages can be credited to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttributionSource {
    pub key: String,
    #[serde(default)]
    pub title: Option<Attributed>,
    #[serde(default)]
    pub author: Option<Attributed>,
    #[serde(default)]
    pub license: Option<Attributed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AttributionOptions {
    pub sources: Vec<AttributionSource>,
    /// Link back to the passage before its number.
    pub anchor: AnchorOptions,
    pub list: ListOptions,
}

impl Default for AttributionOptions {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            anchor: AnchorOptions {
                enable: true,
                ..AnchorOptions::default()
            },
            list: ListOptions::default(),
        }
    }
}

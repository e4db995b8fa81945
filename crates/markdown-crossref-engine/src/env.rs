use crate::frontmatter::Frontmatter;
use crate::registry::Registry;

/// The kinds of entity that get numbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Figure,
    Table,
    Citation,
    /// A quoted passage credited to a source
    Attribution,
}

impl EntityKind {
    /// Label text before the number, e.g. `Figure` in `Figure 2`.
    pub fn default_label(self) -> &'static str {
        match self {
            EntityKind::Figure => "Figure",
            EntityKind::Table => "Table",
            EntityKind::Citation | EntityKind::Attribution => "",
        }
    }

    pub fn default_list_title(self) -> &'static str {
        match self {
            EntityKind::Figure => "List of Figures",
            EntityKind::Table => "List of Tables",
            EntityKind::Citation => "Bibliography",
            EntityKind::Attribution => "List of Attributions",
        }
    }

    /// Class of the generated list and id of its heading. Also the
    /// frontmatter namespace for per-document overrides.
    pub fn list_class(self) -> &'static str {
        match self {
            EntityKind::Figure => "list-of-figures",
            EntityKind::Table => "list-of-tables",
            EntityKind::Citation => "bibliography",
            EntityKind::Attribution => "list-of-attributions",
        }
    }

    /// Class of links pointing at an entity of this kind.
    pub fn reference_class(self) -> &'static str {
        match self {
            EntityKind::Figure => "figure-citation",
            EntityKind::Table => "table-citation",
            EntityKind::Citation => "citation",
            EntityKind::Attribution => "label",
        }
    }
}

/// State of a single render.
///
/// Created empty for every document and dropped when it is rendered, so one
/// configured [`Markdown`](crate::Markdown) can render many documents.
#[derive(Debug, Clone, Default)]
pub struct RenderEnv {
    pub figures: Registry,
    pub tables: Registry,
    pub citations: Registry,
    pub attributions: Registry,
    pub frontmatter: Frontmatter,
}

impl RenderEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self, kind: EntityKind) -> &Registry {
        match kind {
            EntityKind::Figure => &self.figures,
            EntityKind::Table => &self.tables,
            EntityKind::Citation => &self.citations,
            EntityKind::Attribution => &self.attributions,
        }
    }

    pub fn registry_mut(&mut self, kind: EntityKind) -> &mut Registry {
        match kind {
            EntityKind::Figure => &mut self.figures,
            EntityKind::Table => &mut self.tables,
            EntityKind::Citation => &mut self.citations,
            EntityKind::Attribution => &mut self.attributions,
        }
    }

    /// Label for `kind`: frontmatter first, then `configured`, then the default.
    pub fn label(&self, kind: EntityKind, configured: Option<&str>) -> String {
        self.frontmatter
            .get(kind.list_class(), "label")
            .or(configured)
            .unwrap_or(kind.default_label())
            .to_string()
    }

    /// List heading for `kind`, resolved like [`RenderEnv::label`].
    pub fn list_title(&self, kind: EntityKind, configured: Option<&str>) -> String {
        self.frontmatter
            .get(kind.list_class(), "title")
            .or(configured)
            .unwrap_or(kind.default_list_title())
            .to_string()
    }
}

//! # markdown-crossref-bib
//!
//! Reads BibTeX/BibLaTeX files into normalized entries for the citation
//! extension of `markdown-crossref-engine`.
//!
//! ## Architecture
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → RawEntry → Bibliography
//!               (Logos)          (recursive descent)
//! ```
//!
//! Field values are stored raw and interpreted on demand: [`FieldValue::rich_text`]
//! resolves the LaTeX subset in [`latex`], [`FieldValue::names`] splits person
//! lists in [`names`]. Nothing is validated beyond the entry structure itself.
//!
//! ## Quick Start
//!
//! ```
//! use markdown_crossref_bib::Bibliography;
//!
//! let bib = Bibliography::parse("@book{knuth84, title = {The \\TeX{}book}}").unwrap();
//! let entry = bib.get("knuth84").unwrap();
//! assert_eq!(entry.field("TITLE").unwrap().plain_text(), "The TeXbook");
//! ```

pub mod latex;
pub mod lexer;
pub mod names;
pub mod parser;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

pub use latex::{Mark, TextRun};
pub use names::Name;
pub use parser::ParseError;

/// A parsed field value, kept as source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    raw: String,
}

impl FieldValue {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The text exactly as written between the delimiters.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn rich_text(&self) -> Vec<TextRun> {
        latex::parse_rich_text(&self.raw)
    }

    pub fn plain_text(&self) -> String {
        latex::plain_text(&self.rich_text())
    }

    pub fn names(&self) -> Vec<Name> {
        names::parse_names(&self.raw)
    }
}

/// One bibliography entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibEntry {
    pub key: String,
    pub entry_type: String,
    fields: BTreeMap<String, FieldValue>,
}

impl BibEntry {
    /// Look up a field by name, ignoring case.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(&name.to_ascii_lowercase())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<parser::RawEntry> for BibEntry {
    fn from(raw: parser::RawEntry) -> Self {
        let mut fields = BTreeMap::new();
        for (name, value) in raw.fields {
            // First occurrence of a repeated field wins.
            fields.entry(name).or_insert_with(|| FieldValue::new(value));
        }
        Self {
            key: raw.key,
            entry_type: raw.entry_type,
            fields,
        }
    }
}

/// All entries of one or more bibliography files, in source order.
#[derive(Debug, Clone, Default)]
pub struct Bibliography {
    entries: Vec<BibEntry>,
    index: HashMap<String, usize>,
}

impl Bibliography {
    /// Parse bibliography source text.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let mut bib = Self::default();
        bib.extend_from_source(source)?;
        Ok(bib)
    }

    /// Read every file in `paths` and parse them as one source, so an
    /// `@string` defined in one file can be used in the next.
    ///
    /// Files that cannot be read are skipped with a warning; syntax errors
    /// are returned.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ParseError> {
        let mut source = String::new();
        for path in paths {
            let path = path.as_ref();
            match fs::read_to_string(path) {
                Ok(text) => {
                    log::debug!("loading bibliography {}", path.display());
                    source.push_str(&text);
                    source.push('\n');
                }
                Err(err) => {
                    log::warn!("skipping bibliography {}: {err}", path.display());
                }
            }
        }
        Self::parse(&source)
    }

    fn extend_from_source(&mut self, source: &str) -> Result<(), ParseError> {
        for raw in parser::parse(source)? {
            if self.index.contains_key(&raw.key) {
                log::warn!("duplicate bibliography key `{}`, keeping the first", raw.key);
                continue;
            }
            self.index.insert(raw.key.clone(), self.entries.len());
            self.entries.push(raw.into());
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&BibEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &BibEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The longest key that `candidate` starts with.
    ///
    /// Used to find where a citation key ends in running text such as
    /// `@knuth84, p. 3`, where keys may themselves contain punctuation.
    pub fn longest_prefix_key(&self, candidate: &str) -> Option<&str> {
        self.keys()
            .filter(|key| candidate.starts_with(key))
            .max_by_key(|key| key.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
@misc{wiki,
  title = {Wikipedia},
}
@misc{wiki:markdown,
  title = {Markdown},
  Title = {ignored duplicate field},
}
@misc{wiki,
  title = {Duplicate entry},
}
"#;

    #[test]
    fn test_parse_keeps_first_duplicate() {
        let bib = Bibliography::parse(SAMPLE).unwrap();
        assert_eq!(bib.len(), 2);
        assert_eq!(bib.get("wiki").unwrap().field("title").unwrap().raw(), "Wikipedia");
        assert_eq!(
            bib.get("wiki:markdown").unwrap().field("title").unwrap().raw(),
            "Markdown"
        );
    }

    #[test]
    fn test_field_lookup_is_case_insensitive() {
        let bib = Bibliography::parse("@misc{a, DOI = {10.1/x}}").unwrap();
        let entry = bib.get("a").unwrap();
        assert_eq!(entry.field("doi").unwrap().raw(), "10.1/x");
        assert_eq!(entry.field("Doi").unwrap().raw(), "10.1/x");
        assert!(entry.field("isbn").is_none());
    }

    #[test]
    fn test_longest_prefix_key() {
        let bib = Bibliography::parse(SAMPLE).unwrap();
        assert_eq!(bib.longest_prefix_key("wiki:markdown, p. 4"), Some("wiki:markdown"));
        assert_eq!(bib.longest_prefix_key("wiki."), Some("wiki"));
        assert_eq!(bib.longest_prefix_key("wik"), None);
    }

    #[test]
    fn test_keys_in_source_order() {
        let bib = Bibliography::parse(SAMPLE).unwrap();
        assert_eq!(bib.keys().collect::<Vec<_>>(), vec!["wiki", "wiki:markdown"]);
    }

    #[test]
    fn test_load_skips_missing_files() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "@book{{k, title = {{T}}}}").unwrap();

        let bib = Bibliography::load(&[
            file.path().to_path_buf(),
            file.path().with_extension("missing"),
        ])
        .unwrap();
        assert_eq!(bib.len(), 1);
        assert!(bib.contains_key("k"));
    }

    #[test]
    fn test_load_reports_syntax_errors() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "@book{{k, title {{T}}}}").unwrap();

        let err = Bibliography::load(&[file.path()]).unwrap_err();
        assert!(matches!(err, ParseError::Unexpected { .. }));
    }

    #[test]
    fn test_names_from_field() {
        let bib = Bibliography::parse("@misc{a, author = {Jane Doe and Smith, John}}").unwrap();
        let names = bib.get("a").unwrap().field("author").unwrap().names();
        let shown: Vec<_> = names.iter().map(Name::display).collect();
        assert_eq!(shown, vec!["Jane Doe", "John Smith"]);
    }

    #[test]
    fn test_load_shares_strings_between_files() {
        let mut strings = NamedTempFile::new().unwrap();
        write!(strings, "@string{{pub = {{ACM Press}}}}").unwrap();
        let mut refs = NamedTempFile::new().unwrap();
        write!(refs, "@misc{{k, title = pub}}").unwrap();

        let bib = Bibliography::load(&[strings.path(), refs.path()]).unwrap();
        assert_eq!(bib.get("k").unwrap().field("title").unwrap().raw(), "ACM Press");
    }

    #[test]
    fn test_load_keeps_first_duplicate_across_files() {
        let mut first = NamedTempFile::new().unwrap();
        write!(first, "@misc{{k, title = {{First}}}}").unwrap();
        let mut second = NamedTempFile::new().unwrap();
        write!(second, "@misc{{k, title = {{Second}}}}\n@misc{{other, title = {{Other}}}}").unwrap();

        let bib = Bibliography::load(&[first.path(), second.path()]).unwrap();
        assert_eq!(bib.keys().collect::<Vec<_>>(), vec!["k", "other"]);
        assert_eq!(bib.get("k").unwrap().field("title").unwrap().raw(), "First");
    }
}

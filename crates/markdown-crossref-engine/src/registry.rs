use std::collections::HashMap;

/// A numbered entity: a figure, a table or a cited source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub title: String,
}

/// Append-only, first-use-ordered store of entities for one render.
///
/// Positions are 1-based and never change once assigned.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<Entry>,
    positions: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key`, returning its position. A known key keeps its
    /// position and original title.
    pub fn register(&mut self, key: &str, title: &str) -> usize {
        if let Some(&position) = self.positions.get(key) {
            return position;
        }
        self.entries.push(Entry {
            key: key.to_string(),
            title: title.to_string(),
        });
        let position = self.entries.len();
        self.positions.insert(key.to_string(), position);
        log::debug!("registered `{key}` at position {position}");
        position
    }

    pub fn position_of(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.position_of(key).map(|p| &self.entries[p - 1])
    }

    /// Entries in registration order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

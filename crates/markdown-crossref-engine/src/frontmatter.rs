//! Per-document overrides from a YAML (`---`) or TOML (`+++`) metadata block.
//!
//! Only namespaced string lookups are needed:
//!
//! ```yaml
//! ---
//! list-of-figures:
//!   label: Abbildung
//!   title: Abbildungsverzeichnis
//! ---
//! ```

use serde_json::Value;

/// Delimiter style of a metadata block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFormat {
    /// `---`
    Yaml,
    /// `+++`
    Toml,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    value: Value,
}

impl Frontmatter {
    /// Parse `raw`; invalid metadata is logged and treated as empty.
    pub fn parse(raw: &str, format: FrontmatterFormat) -> Self {
        let parsed = match format {
            FrontmatterFormat::Yaml => serde_yaml::from_str::<Value>(raw).map_err(|e| e.to_string()),
            FrontmatterFormat::Toml => toml::from_str::<Value>(raw).map_err(|e| e.to_string()),
        };
        match parsed {
            Ok(value) => Self { value },
            Err(err) => {
                log::warn!("ignoring invalid {format:?} frontmatter: {err}");
                Self::default()
            }
        }
    }

    pub fn from_yaml(raw: &str) -> Self {
        Self::parse(raw, FrontmatterFormat::Yaml)
    }

    pub fn from_toml(raw: &str) -> Self {
        Self::parse(raw, FrontmatterFormat::Toml)
    }

    /// String value of `key` under `namespace`.
    pub fn get(&self, namespace: &str, key: &str) -> Option<&str> {
        self.value.get(namespace)?.get(key)?.as_str()
    }

    pub fn is_empty(&self) -> bool {
        match &self.value {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

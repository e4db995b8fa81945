use markdown_crossref_engine::extensions::{
    AttributionOptions, CitationOptions, FigureOptions, TableOptions,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid bibliography pattern `{pattern}`: {source}")]
    SourcePatternError {
        pattern: String,
        source: glob::PatternError,
    },
}

/// Contents of `crossref.toml`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub figures: FigureOptions,
    pub tables: TableOptions,
    pub citations: CitationOptions,
    pub attributions: AttributionOptions,
}

impl Config {
    pub const FILE_NAME: &'static str = "crossref.toml";

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config = Self::parse(&content).map_err(|source| ConfigError::ConfigParseError {
            config_path: config_path.to_path_buf(),
            source,
        })?;

        // Sources are relative to the config file, not the working directory
        let base = config_path.parent().unwrap_or_else(|| Path::new(""));
        config.citations.sources = expand_sources(&config.citations.sources, base)?;
        log::debug!(
            "loaded {} with {} bibliography sources",
            config_path.display(),
            config.citations.sources.len()
        );

        Ok(Some(config))
    }

    /// Load `crossref.toml` from the working directory.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::FILE_NAME)
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

fn expand_path(path: &Path) -> Option<PathBuf> {
    let path_str = path.to_string_lossy();
    match shellexpand::full(&path_str) {
        Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
        Err(_) => None,
    }
}

fn is_pattern(path: &str) -> bool {
    path.contains(['*', '?', '['])
}

/// Expand `~`, `$VAR` and glob patterns in bibliography sources. Patterns
/// matching nothing are dropped; plain paths are kept even when missing so
/// the loader can report them.
pub fn expand_sources(sources: &[PathBuf], base: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut expanded = Vec::new();
    for source in sources {
        let path = expand_path(source).unwrap_or_else(|| source.clone());
        let path = if path.is_relative() {
            base.join(path)
        } else {
            path
        };

        let pattern = path.to_string_lossy();
        if !is_pattern(&pattern) {
            expanded.push(path);
            continue;
        }

        let matches = glob::glob(&pattern).map_err(|source| ConfigError::SourcePatternError {
            pattern: pattern.to_string(),
            source,
        })?;
        let before = expanded.len();
        for entry in matches {
            match entry {
                Ok(path) => expanded.push(path),
                Err(err) => log::warn!("skipping {}: {err}", err.path().display()),
            }
        }
        if expanded.len() == before {
            log::warn!("bibliography pattern `{pattern}` matched no files");
        }
    }
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use markdown_crossref_engine::extensions::ListTag;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.figures, FigureOptions::default());
        assert_eq!(config.tables, TableOptions::default());
        assert!(config.citations.sources.is_empty());
        assert_eq!(config.attributions, AttributionOptions::default());
    }

    #[test]
    fn test_attribution_sources() {
        let config = Config::parse(
            r#"
[[attributions.sources]]
key = "wiki:markdown"
title = ["Markdown", "https://en.wikipedia.org/wiki/Markdown"]
author = "Wikipedia Authors"

[attributions.list]
title = ""
"#,
        )
        .unwrap();

        let source = &config.attributions.sources[0];
        assert_eq!(source.key, "wiki:markdown");
        assert_eq!(
            source.title.as_ref().and_then(|title| title.url()),
            Some("https://en.wikipedia.org/wiki/Markdown")
        );
        assert_eq!(source.author.as_ref().map(|a| a.text()), Some("Wikipedia Authors"));
        assert!(source.license.is_none());
        assert_eq!(config.attributions.list.title.as_deref(), Some(""));
        assert!(config.attributions.anchor.enable);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
[figures]
wrap = false

[figures.label]
text = "Abb."

[tables.list]
tag = "ol"
level = 3

[citations.list]
enable = false
"#,
        )
        .unwrap();

        assert!(!config.figures.wrap);
        assert_eq!(config.figures.label.text.as_deref(), Some("Abb."));
        assert!(config.figures.list.enable);
        assert_eq!(config.tables.list.tag, Some(ListTag::Ol));
        assert_eq!(config.tables.list.heading_tag(), "h3");
        assert!(!config.citations.list.enable);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join(Config::FILE_NAME);
        std::fs::write(&config_file, "[figures]\nwrap = \"sometimes\"\n").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains(Config::FILE_NAME));
    }

    #[test]
    fn test_sources_relative_to_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join(Config::FILE_NAME);
        std::fs::write(
            &config_file,
            "[citations]\nsources = [\"refs/main.bib\", \"/abs/other.bib\"]\n",
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(
            config.citations.sources,
            vec![
                temp_dir.path().join("refs/main.bib"),
                PathBuf::from("/abs/other.bib"),
            ]
        );
    }

    #[test]
    fn test_glob_sources() {
        let temp_dir = TempDir::new().unwrap();
        let refs = temp_dir.path().join("refs");
        std::fs::create_dir(&refs).unwrap();
        for name in ["b.bib", "a.bib", "notes.txt"] {
            std::fs::write(refs.join(name), "").unwrap();
        }

        let sources = expand_sources(&[PathBuf::from("refs/*.bib")], temp_dir.path()).unwrap();

        assert_eq!(sources, vec![refs.join("a.bib"), refs.join("b.bib")]);
    }

    #[test]
    fn test_glob_without_matches_is_dropped() {
        let temp_dir = TempDir::new().unwrap();

        let sources = expand_sources(&[PathBuf::from("*.bib")], temp_dir.path()).unwrap();

        assert!(sources.is_empty());
    }

    #[test]
    fn test_invalid_glob_pattern() {
        let result = expand_sources(&[PathBuf::from("/refs/[.bib")], Path::new(""));

        assert!(matches!(
            result,
            Err(ConfigError::SourcePatternError { .. })
        ));
    }

    #[test]
    fn test_sources_with_env_var() {
        unsafe {
            env::set_var("CROSSREF_TEST_BIB_DIR", "/test/env/bib");
        }

        let sources = expand_sources(
            &[PathBuf::from("$CROSSREF_TEST_BIB_DIR/main.bib")],
            Path::new("/ignored"),
        )
        .unwrap();

        assert_eq!(sources, vec![PathBuf::from("/test/env/bib/main.bib")]);

        unsafe {
            env::remove_var("CROSSREF_TEST_BIB_DIR");
        }
    }

    #[test]
    fn test_sources_with_tilde() {
        let sources = expand_sources(&[PathBuf::from("~/refs.bib")], Path::new("/ignored")).unwrap();

        let path = sources[0].to_string_lossy();
        assert!(!path.starts_with('~'));
        assert!(!path.starts_with("/ignored"));
        assert!(path.ends_with("refs.bib"));
    }
}

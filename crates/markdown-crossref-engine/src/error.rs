use thiserror::Error;

/// Errors raised while configuring a pipeline. Rendering itself never fails.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no rule named `{0}`")]
    RuleNotFound(String),

    #[error("invalid bibliography: {0}")]
    Bibliography(#[from] markdown_crossref_bib::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

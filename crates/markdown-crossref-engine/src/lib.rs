//! Figure, table and citation numbering for markdown.
//!
//! ```
//! use markdown_crossref_engine::{Markdown, extensions::{figures, FigureOptions}};
//!
//! let mut md = Markdown::new();
//! figures::add(&mut md, FigureOptions::default()).unwrap();
//! let html = md.render("![Cat](cat.png \"The Cat\")\n\nSee <<fig:the-cat>>.\n");
//! assert!(html.contains("<figure id=\"the-cat\">"));
//! assert!(html.contains("<a href=\"#the-cat\" class=\"figure-citation\">Figure 1</a>"));
//! ```

pub mod env;
pub mod error;
pub mod extensions;
pub mod frontmatter;
pub mod parser;
pub mod registry;
pub mod render;
pub mod slug;
pub mod token;

// Re-export key types for easier usage
pub use env::{EntityKind, RenderEnv};
pub use error::{Error, Result};
pub use parser::Markdown;
pub use registry::{Entry, Registry};
pub use token::{Token, TokenKind};

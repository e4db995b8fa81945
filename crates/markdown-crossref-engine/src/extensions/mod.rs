//! Cross-reference extensions.
//!
//! Each extension installs its rules on a [`Markdown`](crate::Markdown)
//! pipeline:
//!
//! | extension        | core rules                          | inline rule        | render hook         |
//! |------------------|-------------------------------------|--------------------|---------------------|
//! | [`figures`]      | `figure`, `figure_list`             | `figure_reference` | `Reference(Figure)` |
//! | [`tables`]       | `table_figure`, `table_list`        | `table_reference`  | `Reference(Table)`  |
//! | [`cite`]         | `bibliography`                      | `citation`         | `Citation`          |
//! | [`attributions`] | `attribution`, `attribution_list`   |                    |                     |
//!
//! Structural rules are inserted right after `inline`; summary lists are
//! appended, so they run once every entity has been registered.

pub mod attributions;
pub mod cite;
pub mod figures;
pub mod matchers;
pub mod options;
pub mod reference;
pub mod rewrite;
pub mod summary;
pub mod tables;

pub use options::{
    AnchorOptions, Attributed, AttributionOptions, AttributionSource, CitationOptions, FigureOptions,
    LabelOptions, ListOptions, ListTag, TableOptions,
};

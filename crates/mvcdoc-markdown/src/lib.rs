//! Markdown page parser for mvcdoc.
//!
//! Parses documentation pages, extracts optional YAML frontmatter, and builds
//! a table of contents from the headings.

pub mod frontmatter;
pub mod parser;

pub use frontmatter::Frontmatter;
pub use parser::{parse_page, slugify, PageError, ParsedPage, TocEntry};

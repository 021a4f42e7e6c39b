//! Static site builder for mvcdoc documentation.
//!
//! Renders a tree of markdown pages into a browsable HTML site with a
//! navigation sidebar, per-page table of contents, search index, and sitemap.

pub mod assets;
pub mod builder;
pub mod templates;

pub use builder::{BuildError, BuildStats, SiteBuilder, SiteConfig};

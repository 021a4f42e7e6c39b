//! Configuration loading for mvcdoc.
//!
//! Reads the `mkdocs.yml` dialect: `site_name` is required, everything else
//! falls back to the conventional defaults (`docs` source directory, `site`
//! output directory, `127.0.0.1:8000` dev address).

pub mod config;
pub mod nav;

pub use config::{ConfigError, DevAddr, MkDocsConfig};
pub use nav::{NavEntry, NavTarget, NavTargetRef};

//! The `nav:` section of `mkdocs.yml`.
//!
//! Navigation entries come in three shapes: a bare page path, a single-key
//! map of title to page path, or a single-key map of title to a nested list
//! of entries.

use std::collections::BTreeMap;

use serde::Deserialize;

/// One entry in the configured navigation tree.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NavEntry {
    /// Bare page path; the title comes from the page itself
    Path(String),

    /// `Title: target` map (exactly one key in practice)
    Titled(BTreeMap<String, NavTarget>),
}

/// The target of a titled navigation entry.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NavTarget {
    /// A page path
    Path(String),

    /// A nested section of entries
    Section(Vec<NavEntry>),
}

impl NavEntry {
    /// The explicit title, if one was configured.
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Titled(map) => map.keys().next().map(String::as_str),
        }
    }

    /// The target this entry points at, if the entry is well formed.
    pub fn target(&self) -> Option<NavTargetRef<'_>> {
        match self {
            Self::Path(path) => Some(NavTargetRef::Path(path)),
            Self::Titled(map) => map.values().next().map(|t| match t {
                NavTarget::Path(path) => NavTargetRef::Path(path),
                NavTarget::Section(entries) => NavTargetRef::Section(entries),
            }),
        }
    }
}

/// Borrowed view of a navigation target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavTargetRef<'a> {
    Path(&'a str),
    Section(&'a [NavEntry]),
}

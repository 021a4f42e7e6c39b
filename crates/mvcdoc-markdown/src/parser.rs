//! Documentation page parser.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError};

/// A parsed documentation page.
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Parsed frontmatter (if present)
    pub frontmatter: Option<Frontmatter>,

    /// Markdown content (without frontmatter)
    pub content: String,

    /// Table of contents entries
    pub toc: Vec<TocEntry>,
}

/// A table of contents entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    /// Heading text
    pub title: String,
    /// Anchor ID
    pub id: String,
    /// Heading level (1-6)
    pub level: u8,
}

/// Errors that can occur when parsing a page.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Frontmatter error: {0}")]
    Frontmatter(#[from] FrontmatterError),
}

impl ParsedPage {
    /// Resolve the page title.
    ///
    /// Resolution order: frontmatter `title`, then the first level-1 heading,
    /// then the capitalized file stem.
    pub fn title_or_stem(&self, stem: &str) -> String {
        if let Some(title) = self.frontmatter.as_ref().and_then(|f| f.title.clone()) {
            return title;
        }

        if let Some(entry) = self.toc.iter().find(|e| e.level == 1) {
            return entry.title.clone();
        }

        capitalize(stem)
    }
}

/// Parse a documentation page.
///
/// Extracts frontmatter and generates a table of contents from the headings.
pub fn parse_page(source: &str) -> Result<ParsedPage, PageError> {
    let (frontmatter, content) = extract_frontmatter(source)?;

    let mut toc = Vec::new();

    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let parser = Parser::new_ext(content, options);

    let mut current_heading: Option<(u8, String)> = None;
    let mut in_code_block = false;

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
            }

            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
            }

            Event::Start(Tag::Heading { level, .. }) => {
                current_heading = Some((level as u8, String::new()));
            }

            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, title)) = current_heading.take() {
                    let id = slugify(&title);
                    toc.push(TocEntry { title, id, level });
                }
            }

            Event::Text(text) | Event::Code(text) => {
                if in_code_block {
                    continue;
                }
                if let Some((_, ref mut heading_text)) = current_heading {
                    heading_text.push_str(&text);
                }
            }

            _ => {}
        }
    }

    Ok(ParsedPage {
        frontmatter,
        content: content.to_string(),
        toc,
    })
}

/// Convert a heading to a URL-safe slug.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Capitalize first letter of a string.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_complete_page() {
        let source = r#"---
title: Models
description: Data layer
---

# Models

The data layer.

## Defining a model

Fields and validation.

## Querying

Filters and ordering.
"#;

        let page = parse_page(source).unwrap();

        assert_eq!(
            page.frontmatter.as_ref().unwrap().title,
            Some("Models".to_string())
        );
        assert_eq!(page.toc.len(), 3);
        assert_eq!(page.toc[0].level, 1);
        assert_eq!(page.toc[1].title, "Defining a model");
        assert_eq!(page.toc[1].id, "defining-a-model");
    }

    #[test]
    fn title_falls_back_to_first_heading() {
        let page = parse_page("# Getting Started\n\nIntro.").unwrap();

        assert_eq!(page.title_or_stem("getting-started"), "Getting Started");
    }

    #[test]
    fn title_falls_back_to_stem() {
        let page = parse_page("Plain paragraph, no headings.").unwrap();

        assert_eq!(page.title_or_stem("changelog"), "Changelog");
    }

    #[test]
    fn frontmatter_title_wins() {
        let page = parse_page("---\ntitle: Override\n---\n# Heading").unwrap();

        assert_eq!(page.title_or_stem("ignored"), "Override");
    }

    #[test]
    fn ignores_headings_inside_code_blocks() {
        let source = "# Real\n\n```\n# not a heading\n```\n";

        let page = parse_page(source).unwrap();

        assert_eq!(page.toc.len(), 1);
        assert_eq!(page.toc[0].title, "Real");
    }

    #[test]
    fn slugifies_headings() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
    }
}

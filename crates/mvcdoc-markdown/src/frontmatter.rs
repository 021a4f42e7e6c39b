//! Frontmatter extraction and parsing.

use serde::Deserialize;

/// Parsed frontmatter from a documentation page.
///
/// All fields are optional; a page without a `title` falls back to its first
/// heading or its file name.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Frontmatter {
    /// Page title
    #[serde(default)]
    pub title: Option<String>,

    /// Page description for metadata
    #[serde(default)]
    pub description: Option<String>,
}

/// Extract frontmatter from page content.
///
/// Returns the parsed frontmatter and the remaining content after the
/// frontmatter block.
pub fn extract_frontmatter(source: &str) -> Result<(Option<Frontmatter>, &str), FrontmatterError> {
    let trimmed = source.trim_start();

    // The opening fence must be a line of exactly ---
    let Some(first_line) = trimmed.split_inclusive('\n').next() else {
        return Ok((None, source));
    };
    if first_line.trim_end_matches(['\r', '\n']) != "---" {
        return Ok((None, source));
    }

    let after_open = &trimmed[first_line.len()..];

    // Find the closing fence: a line of exactly ---
    let mut yaml_end = None;
    let mut pos = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            yaml_end = Some((pos, pos + line.len()));
            break;
        }
        pos += line.len();
    }

    let Some((yaml_end, content_start)) = yaml_end else {
        return Err(FrontmatterError::Unclosed);
    };

    let yaml_content = after_open[..yaml_end].trim();
    let remaining = &after_open[content_start..];

    let frontmatter: Frontmatter = serde_yaml::from_str(yaml_content)
        .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;

    Ok((Some(frontmatter), remaining.trim_start()))
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed frontmatter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),
}

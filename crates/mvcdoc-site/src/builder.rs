//! Static site builder.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use walkdir::WalkDir;

use mvcdoc_config::{MkDocsConfig, NavEntry, NavTargetRef};
use mvcdoc_markdown::{parse_page, slugify, ParsedPage};

use crate::assets::{copy_static, theme_css};
use crate::templates::{NavItem, PageContext, TemplateEngine, TocEntry};

/// Configuration for building a site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Source docs directory
    pub docs_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Site title
    pub site_name: String,

    /// Site description for page metadata
    pub site_description: Option<String>,

    /// Configured navigation; auto-discovered when absent
    pub nav: Option<Vec<NavEntry>>,

    /// Extra stylesheets, relative to the docs directory
    pub extra_css: Vec<String>,

    /// Inject the live-reload client script into every page
    pub live_reload: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
            output_dir: PathBuf::from("site"),
            site_name: "Documentation".to_string(),
            site_description: None,
            nav: None,
            extra_css: vec![],
            live_reload: false,
        }
    }
}

impl SiteConfig {
    /// Derive a build configuration from a loaded `mkdocs.yml`.
    pub fn from_mkdocs(config: &MkDocsConfig, output_dir: PathBuf, live_reload: bool) -> Self {
        Self {
            docs_dir: config.docs_dir.clone(),
            output_dir,
            site_name: config.site_name.clone(),
            site_description: config.site_description.clone(),
            nav: config.nav.clone(),
            extra_css: config.extra_css.clone(),
            live_reload,
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildStats {
    /// Number of pages rendered
    pub pages: usize,

    /// Number of static files copied through
    pub assets: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read docs directory: {0}")]
    ReadError(String),

    #[error("Failed to parse page: {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Failed to render template: {0}")]
    TemplateError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// A page to be built.
#[derive(Debug)]
struct PageInfo {
    /// Relative path from the docs dir
    relative_path: PathBuf,

    /// Output path
    output_path: PathBuf,

    /// Parsed page
    page: ParsedPage,

    /// Resolved page title
    title: String,
}

/// Static site builder.
pub struct SiteBuilder {
    config: SiteConfig,
    templates: TemplateEngine,
}

impl SiteBuilder {
    /// Create a new site builder.
    pub fn new(config: SiteConfig) -> Result<Self, BuildError> {
        let templates = TemplateEngine::new().map_err(|e| BuildError::TemplateError(e.to_string()))?;

        Ok(Self { config, templates })
    }

    /// Build the site.
    pub async fn build(&self) -> Result<BuildStats, BuildError> {
        let start = Instant::now();

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        let pages = self.discover_pages()?;
        let nav = self.build_navigation(&pages);

        // Render pages in parallel
        let results: Vec<Result<(), BuildError>> = pages
            .par_iter()
            .map(|page| self.render_page(page, &nav))
            .collect();

        for result in results {
            result?;
        }

        let assets = copy_static(&self.config.docs_dir, &self.config.output_dir)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        self.write_theme_assets()?;
        self.generate_search_index(&pages)?;
        self.generate_sitemap(&pages)?;

        let duration = start.elapsed();

        Ok(BuildStats {
            pages: pages.len(),
            assets,
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Discover all markdown pages in the docs directory.
    fn discover_pages(&self) -> Result<Vec<PageInfo>, BuildError> {
        let mut pages = Vec::new();

        if !self.config.docs_dir.exists() {
            return Err(BuildError::ReadError(format!(
                "Docs directory not found: {}",
                self.config.docs_dir.display()
            )));
        }

        for entry in WalkDir::new(&self.config.docs_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ext != "md" {
                continue;
            }

            let content = fs::read_to_string(path)
                .map_err(|e| BuildError::ReadError(format!("{}: {}", path.display(), e)))?;

            let page = parse_page(&content).map_err(|e| BuildError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

            let relative_path = path
                .strip_prefix(&self.config.docs_dir)
                .unwrap_or(path)
                .to_path_buf();

            let output_path = self.calculate_output_path(&relative_path);

            let stem = relative_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("index");
            let title = page.title_or_stem(stem);

            pages.push(PageInfo {
                relative_path,
                output_path,
                page,
                title,
            });
        }

        // Index pages sort before their siblings, otherwise alphabetical
        pages.sort_by(|a, b| {
            let key = |p: &PageInfo| {
                let parent = p
                    .relative_path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                let stem = p
                    .relative_path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("")
                    .to_string();
                (parent, stem != "index", stem)
            };
            key(a).cmp(&key(b))
        });

        Ok(pages)
    }

    /// Calculate the output path for a page (directory-style URLs).
    fn calculate_output_path(&self, relative: &Path) -> PathBuf {
        let stem = relative
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("index");

        let parent = relative.parent().unwrap_or(Path::new(""));

        if stem == "index" {
            // docs/index.md -> site/index.html
            self.config.output_dir.join(parent).join("index.html")
        } else {
            // docs/about.md -> site/about/index.html
            self.config
                .output_dir
                .join(parent)
                .join(stem)
                .join("index.html")
        }
    }

    /// Convert an output path to a URL.
    fn path_to_url(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.config.output_dir).unwrap_or(path);

        let url = relative
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        if url.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", url)
        }
    }

    /// Build the navigation tree.
    fn build_navigation(&self, pages: &[PageInfo]) -> Vec<NavItem> {
        match &self.config.nav {
            Some(entries) => self.nav_from_config(entries, pages),
            None => self.nav_from_pages(pages),
        }
    }

    /// Build navigation from the configured `nav:` entries.
    fn nav_from_config(&self, entries: &[NavEntry], pages: &[PageInfo]) -> Vec<NavItem> {
        let mut nav = Vec::new();

        for entry in entries {
            let Some(target) = entry.target() else {
                tracing::warn!("Skipping empty nav entry");
                continue;
            };

            match target {
                NavTargetRef::Path(source) => {
                    let known = pages
                        .iter()
                        .find(|p| p.relative_path == Path::new(source));

                    if known.is_none() {
                        tracing::warn!("Nav references a page that does not exist: {}", source);
                    }

                    let title = entry
                        .title()
                        .map(str::to_string)
                        .or_else(|| known.map(|p| p.title.clone()))
                        .unwrap_or_else(|| title_from_source(source));

                    nav.push(NavItem {
                        title,
                        path: source_to_url(source),
                        children: Vec::new(),
                        active: false,
                    });
                }

                NavTargetRef::Section(children) => {
                    nav.push(NavItem {
                        title: entry.title().unwrap_or("Section").to_string(),
                        path: "#".to_string(),
                        children: self.nav_from_config(children, pages),
                        active: false,
                    });
                }
            }
        }

        nav
    }

    /// Build navigation from discovered pages: root pages first, one nested
    /// section per subdirectory.
    fn nav_from_pages(&self, pages: &[PageInfo]) -> Vec<NavItem> {
        let mut nav = Vec::new();
        let mut sections: Vec<(PathBuf, Vec<NavItem>)> = Vec::new();

        for page in pages {
            let item = NavItem {
                title: page.title.clone(),
                path: self.path_to_url(&page.output_path),
                children: Vec::new(),
                active: false,
            };

            let parent = page.relative_path.parent().unwrap_or(Path::new(""));

            if parent.as_os_str().is_empty() {
                nav.push(item);
            } else if let Some((_, items)) = sections.iter_mut().find(|(dir, _)| dir == parent) {
                items.push(item);
            } else {
                sections.push((parent.to_path_buf(), vec![item]));
            }
        }

        for (dir, items) in sections {
            let dir_name = dir
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("Section");

            nav.push(NavItem {
                title: capitalize(dir_name),
                path: format!("/{}/", dir.display()),
                children: items,
                active: false,
            });
        }

        nav
    }

    /// Render a single page to its output path.
    fn render_page(&self, page: &PageInfo, nav: &[NavItem]) -> Result<(), BuildError> {
        let content = render_markdown(&page.page.content);

        let toc: Vec<TocEntry> = page
            .page
            .toc
            .iter()
            .map(|e| TocEntry {
                title: e.title.clone(),
                id: e.id.clone(),
                level: e.level,
            })
            .collect();

        let context = PageContext {
            title: page.title.clone(),
            site_name: self.config.site_name.clone(),
            description: page
                .page
                .frontmatter
                .as_ref()
                .and_then(|f| f.description.clone())
                .or_else(|| self.config.site_description.clone()),
            content,
            nav: nav.to_vec(),
            toc,
            extra_css: self
                .config
                .extra_css
                .iter()
                .map(|s| format!("/{}", s.trim_start_matches('/')))
                .collect(),
            live_reload: self.config.live_reload,
        };

        let html = self
            .templates
            .render_page("page.html", &context)
            .map_err(|e| BuildError::TemplateError(e.to_string()))?;

        if let Some(parent) = page.output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::WriteError(e.to_string()))?;
        }

        fs::write(&page.output_path, html).map_err(|e| BuildError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Write the theme stylesheet.
    fn write_theme_assets(&self) -> Result<(), BuildError> {
        let assets_dir = self.config.output_dir.join("assets");
        fs::create_dir_all(&assets_dir).map_err(|e| BuildError::WriteError(e.to_string()))?;

        fs::write(assets_dir.join("mvcdoc.css"), theme_css())
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Generate the search index.
    fn generate_search_index(&self, pages: &[PageInfo]) -> Result<(), BuildError> {
        let docs: Vec<serde_json::Value> = pages
            .iter()
            .map(|page| {
                // Plain-text excerpt for search
                let text = page
                    .page
                    .content
                    .lines()
                    .filter(|l| !l.starts_with('#') && !l.starts_with("```"))
                    .take(10)
                    .collect::<Vec<_>>()
                    .join(" ");

                serde_json::json!({
                    "location": self.path_to_url(&page.output_path),
                    "title": page.title,
                    "text": text,
                })
            })
            .collect();

        let json = serde_json::to_string_pretty(&serde_json::json!({ "docs": docs }))
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        fs::write(self.config.output_dir.join("search_index.json"), json)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Generate sitemap.xml and robots.txt.
    fn generate_sitemap(&self, pages: &[PageInfo]) -> Result<(), BuildError> {
        let urls: Vec<String> = pages
            .iter()
            .map(|page| {
                format!(
                    "  <url>\n    <loc>{}</loc>\n  </url>",
                    self.path_to_url(&page.output_path)
                )
            })
            .collect();

        let sitemap = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{}
</urlset>"#,
            urls.join("\n")
        );

        fs::write(self.config.output_dir.join("sitemap.xml"), sitemap)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        let robots = "User-agent: *\nAllow: /\nSitemap: /sitemap.xml\n";
        fs::write(self.config.output_dir.join("robots.txt"), robots)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        Ok(())
    }
}

/// Map a docs-relative source path to its served URL.
fn source_to_url(source: &str) -> String {
    let path = Path::new(source);

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("index");
    let parent = path
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut url = String::from("/");
    if !parent.is_empty() {
        url.push_str(&parent);
        url.push('/');
    }
    if stem != "index" {
        url.push_str(stem);
        url.push('/');
    }

    url
}

/// Derive a display title from a source path.
fn title_from_source(source: &str) -> String {
    let stem = Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Untitled");

    capitalize(stem)
}

/// Render markdown to HTML with anchor IDs on headings.
fn render_markdown(content: &str) -> String {
    use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let events: Vec<Event> = Parser::new_ext(content, options).collect();
    let mut rewritten: Vec<Event> = Vec::with_capacity(events.len());

    let mut i = 0;
    while i < events.len() {
        match &events[i] {
            Event::Start(Tag::Heading { level, .. }) => {
                // Collect the heading text ahead of time to slug the anchor
                let mut end = i + 1;
                let mut text = String::new();
                while end < events.len() {
                    match &events[end] {
                        Event::End(TagEnd::Heading(_)) => break,
                        Event::Text(t) | Event::Code(t) => text.push_str(t),
                        _ => {}
                    }
                    end += 1;
                }

                let id = slugify(&text);
                rewritten.push(Event::Html(CowStr::from(format!(
                    "<{} id=\"{}\">",
                    level, id
                ))));
                rewritten.extend(events[i + 1..end].iter().cloned());
                rewritten.push(Event::Html(CowStr::from(format!("</{}>\n", level))));

                i = end + 1;
            }
            event => {
                rewritten.push(event.clone());
                i += 1;
            }
        }
    }

    let mut html_output = String::new();
    html::push_html(&mut html_output, rewritten.into_iter());

    html_output
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
    use tempfile::tempdir;

    fn site_fixture() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let temp = tempdir().unwrap();
        let docs = temp.path().join("docs");
        let out = temp.path().join("site");
        fs::create_dir_all(&docs).unwrap();
        (temp, docs, out)
    }

    #[tokio::test]
    async fn builds_simple_site() {
        let (_temp, docs, out) = site_fixture();

        fs::write(
            docs.join("index.md"),
            "---\ntitle: Home\n---\n\n# Welcome\n",
        )
        .unwrap();

        let builder = SiteBuilder::new(SiteConfig {
            docs_dir: docs,
            output_dir: out.clone(),
            site_name: "Documentation MVC".to_string(),
            ..Default::default()
        })
        .unwrap();

        let stats = builder.build().await.unwrap();

        assert_eq!(stats.pages, 1);
        let html = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(html.contains("<title>Home - Documentation MVC</title>"));
        assert!(html.contains(r#"<h1 id="welcome">Welcome</h1>"#));
    }

    #[tokio::test]
    async fn maps_nested_pages_to_directory_urls() {
        let (_temp, docs, out) = site_fixture();

        fs::create_dir_all(docs.join("guide")).unwrap();
        fs::write(docs.join("index.md"), "# Home").unwrap();
        fs::write(docs.join("guide/install.md"), "# Install").unwrap();

        let builder = SiteBuilder::new(SiteConfig {
            docs_dir: docs,
            output_dir: out.clone(),
            ..Default::default()
        })
        .unwrap();

        builder.build().await.unwrap();

        assert!(out.join("index.html").exists());
        assert!(out.join("guide/install/index.html").exists());
    }

    #[tokio::test]
    async fn errors_when_docs_dir_missing() {
        let temp = tempdir().unwrap();

        let builder = SiteBuilder::new(SiteConfig {
            docs_dir: temp.path().join("nope"),
            output_dir: temp.path().join("site"),
            ..Default::default()
        })
        .unwrap();

        let result = builder.build().await;

        assert!(matches!(result, Err(BuildError::ReadError(_))));
    }

    #[tokio::test]
    async fn uses_configured_nav() {
        let (_temp, docs, out) = site_fixture();

        fs::write(docs.join("index.md"), "# Home").unwrap();
        fs::write(docs.join("about.md"), "# About").unwrap();

        let nav: Vec<NavEntry> =
            serde_yaml::from_str("- Start Here: index.md\n- about.md\n").unwrap();

        let builder = SiteBuilder::new(SiteConfig {
            docs_dir: docs,
            output_dir: out.clone(),
            nav: Some(nav),
            ..Default::default()
        })
        .unwrap();

        builder.build().await.unwrap();

        let html = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(html.contains("Start Here"));
        assert!(html.contains(r#"href="/about/""#));
    }

    #[tokio::test]
    async fn does_not_modify_documentation_source() {
        let (_temp, docs, out) = site_fixture();

        let source = "---\ntitle: Home\n---\n\n# Welcome\n";
        fs::write(docs.join("index.md"), source).unwrap();

        let builder = SiteBuilder::new(SiteConfig {
            docs_dir: docs.clone(),
            output_dir: out,
            ..Default::default()
        })
        .unwrap();

        builder.build().await.unwrap();

        assert_eq!(fs::read_to_string(docs.join("index.md")).unwrap(), source);
        assert_eq!(fs::read_dir(&docs).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn generates_search_index_and_sitemap() {
        let (_temp, docs, out) = site_fixture();

        fs::write(docs.join("index.md"), "# Searchable\n\nIndexed text.").unwrap();

        let builder = SiteBuilder::new(SiteConfig {
            docs_dir: docs,
            output_dir: out.clone(),
            ..Default::default()
        })
        .unwrap();

        builder.build().await.unwrap();

        let index = fs::read_to_string(out.join("search_index.json")).unwrap();
        assert!(index.contains("Searchable"));
        assert!(index.contains("Indexed text."));
        assert!(out.join("sitemap.xml").exists());
        assert!(out.join("robots.txt").exists());
    }

    #[tokio::test]
    async fn injects_live_reload_script() {
        let (_temp, docs, out) = site_fixture();

        fs::write(docs.join("index.md"), "# Home").unwrap();

        let builder = SiteBuilder::new(SiteConfig {
            docs_dir: docs,
            output_dir: out.clone(),
            live_reload: true,
            ..Default::default()
        })
        .unwrap();

        builder.build().await.unwrap();

        let html = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(html.contains("/~/livereload.js"));
    }

    #[test]
    fn maps_source_paths_to_urls() {
        assert_eq!(source_to_url("index.md"), "/");
        assert_eq!(source_to_url("about.md"), "/about/");
        assert_eq!(source_to_url("guide/install.md"), "/guide/install/");
        assert_eq!(source_to_url("guide/index.md"), "/guide/");
    }
}

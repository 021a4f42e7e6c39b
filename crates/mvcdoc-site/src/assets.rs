//! Theme stylesheet and static file handling.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// The built-in theme stylesheet.
pub fn theme_css() -> &'static str {
    THEME_CSS
}

/// Copy every non-markdown file under `docs_dir` into `output_dir`,
/// preserving relative paths.
///
/// Returns the number of files copied.
pub fn copy_static(docs_dir: &Path, output_dir: &Path) -> io::Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(docs_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext == "md" {
            continue;
        }

        let relative = path.strip_prefix(docs_dir).unwrap_or(path);
        let dest = output_dir.join(relative);

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::copy(path, &dest)?;
        copied += 1;
    }

    Ok(copied)
}

const THEME_CSS: &str = r#"/* mvcdoc default theme */

:root {
  --sidebar-width: 280px;
  --toc-width: 200px;
  --content-max-width: 800px;
  --bg: #ffffff;
  --fg: #212529;
  --muted: #f8f9fa;
  --border: #dee2e6;
  --accent: #0d6efd;
}

* {
  box-sizing: border-box;
  margin: 0;
  padding: 0;
}

body {
  font-family: system-ui, -apple-system, sans-serif;
  background: var(--bg);
  color: var(--fg);
  line-height: 1.6;
}

.layout {
  display: grid;
  grid-template-columns: var(--sidebar-width) 1fr;
  min-height: 100vh;
}

.sidebar {
  background: var(--muted);
  border-right: 1px solid var(--border);
  padding: 1.5rem;
  position: sticky;
  top: 0;
  height: 100vh;
  overflow-y: auto;
}

.nav-header {
  margin-bottom: 1.5rem;
}

.nav-logo {
  font-weight: 700;
  font-size: 1.1rem;
  color: var(--fg);
  text-decoration: none;
}

.nav-list,
.nav-children {
  list-style: none;
}

.nav-children {
  padding-left: 1rem;
}

.nav-item a {
  display: block;
  padding: 0.25rem 0;
  color: var(--fg);
  text-decoration: none;
}

.nav-item a:hover,
.nav-item.active > a {
  color: var(--accent);
}

.main {
  display: flex;
  justify-content: center;
  padding: 2rem;
}

.page {
  max-width: var(--content-max-width);
  width: 100%;
}

.content h1,
.content h2,
.content h3 {
  margin: 1.5rem 0 0.75rem;
  line-height: 1.25;
}

.content p,
.content ul,
.content ol {
  margin-bottom: 1rem;
}

.content ul,
.content ol {
  padding-left: 1.5rem;
}

.content pre {
  background: var(--muted);
  border: 1px solid var(--border);
  border-radius: 0.5rem;
  padding: 1rem;
  overflow-x: auto;
  margin-bottom: 1rem;
}

.content code {
  font-family: ui-monospace, monospace;
  font-size: 0.9em;
}

.content table {
  border-collapse: collapse;
  margin-bottom: 1rem;
}

.content th,
.content td {
  border: 1px solid var(--border);
  padding: 0.4rem 0.75rem;
}

.content blockquote {
  border-left: 3px solid var(--accent);
  padding-left: 1rem;
  color: #495057;
  margin-bottom: 1rem;
}

.toc {
  width: var(--toc-width);
  margin-left: 2rem;
  position: sticky;
  top: 2rem;
  align-self: flex-start;
  font-size: 0.85rem;
}

.toc h2 {
  font-size: 0.8rem;
  text-transform: uppercase;
  letter-spacing: 0.05em;
  margin-bottom: 0.5rem;
}

.toc ul {
  list-style: none;
}

.toc a {
  color: var(--fg);
  text-decoration: none;
}

.toc a:hover {
  color: var(--accent);
}

.toc-level-3 {
  padding-left: 0.75rem;
}

@media (max-width: 900px) {
  .layout {
    grid-template-columns: 1fr;
  }

  .sidebar {
    position: static;
    height: auto;
  }

  .toc {
    display: none;
  }
}
"#;

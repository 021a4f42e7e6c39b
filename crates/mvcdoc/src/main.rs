//! mvcdoc - launcher for the MVC framework documentation server.
//!
//! Takes no arguments: enters the `mvc-doc/` subdirectory and serves the
//! documentation described by its `mkdocs.yml`.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Subdirectory containing the documentation source and configuration.
const DOCS_SUBDIR: &str = "mvc-doc";

/// Configuration file the serve operation reads.
const CONFIG_FILE: &str = "mkdocs.yml";

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let launch_dir = env::current_dir().context("Failed to read current directory")?;
    let docs_root = resolve_docs_root(&launch_dir)?;

    tracing::info!("Entering {}", docs_root.display());

    env::set_current_dir(&docs_root)
        .with_context(|| format!("Failed to enter {}", docs_root.display()))?;

    // Blocks until the server loop exits
    mvcdoc_server::serve(Path::new(CONFIG_FILE)).await?;

    // The original launcher printed this only after the serve call returned;
    // that ordering is preserved. The server logs the listen URL on startup.
    println!("Documentation MVC is running at http://localhost:8000");

    Ok(())
}

/// Locate the documentation subdirectory under the launch location.
fn resolve_docs_root(base: &Path) -> Result<PathBuf> {
    let root = base.join(DOCS_SUBDIR);

    if !root.is_dir() {
        anyhow::bail!("Documentation directory not found: {}", root.display());
    }

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn resolves_existing_docs_dir() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join(DOCS_SUBDIR)).unwrap();

        let root = resolve_docs_root(temp.path()).unwrap();

        assert_eq!(root, temp.path().join("mvc-doc"));
    }

    #[test]
    fn errors_when_docs_dir_missing() {
        let temp = tempdir().unwrap();

        let result = resolve_docs_root(temp.path());

        assert!(result.is_err());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("mvc-doc"));
    }

    #[test]
    fn errors_when_docs_dir_is_a_file() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(DOCS_SUBDIR), "not a directory").unwrap();

        let result = resolve_docs_root(temp.path());

        assert!(result.is_err());
    }
}

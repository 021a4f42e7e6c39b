//! Development server implementation.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::sync::RwLock;
use tower_http::services::ServeDir;

use mvcdoc_config::{ConfigError, MkDocsConfig};
use mvcdoc_site::{BuildError, BuildStats, SiteBuilder, SiteConfig};

use crate::livereload::{livereload_script, ReloadHub, ReloadMessage};
use crate::watcher::{FileWatcher, WatchEvent};

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Path to mkdocs.yml
    pub config_file: PathBuf,

    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Open browser on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("mkdocs.yml"),
            host: "127.0.0.1".to_string(),
            port: 8000,
            open: false,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Invalid listen address: {0}")]
    InvalidAddr(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),
}

/// Shared server state.
struct ServerState {
    mkdocs: MkDocsConfig,
    config_file: PathBuf,
    docs_dir: PathBuf,
    site_dir: PathBuf,
    hub: ReloadHub,
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
}

/// Serve the documentation described by a configuration file.
///
/// Loads the config, builds the site, and serves it at the configured
/// `dev_addr` until the process is terminated. This is the entry point the
/// launcher binary delegates to.
pub async fn serve(config_file: &Path) -> Result<(), ServerError> {
    let mkdocs = MkDocsConfig::load(config_file)?;

    let config = DevServerConfig {
        config_file: config_file.to_path_buf(),
        host: mkdocs.dev_addr.host.clone(),
        port: mkdocs.dev_addr.port,
        open: false,
    };

    DevServer::new(config).start().await
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Start the development server.
    ///
    /// Blocks until the server loop exits.
    pub async fn start(self) -> Result<(), ServerError> {
        let mkdocs = MkDocsConfig::load(&self.config.config_file)?;
        let docs_dir = resolve_docs_dir(&self.config.config_file, &mkdocs.docs_dir);
        let site_dir = scratch_dir();

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                ServerError::InvalidAddr(format!("{}:{}", self.config.host, self.config.port))
            })?;

        // Initial build
        let stats = build_site(&mkdocs, &docs_dir, &site_dir).await?;
        tracing::info!(
            "Built {} pages in {}ms",
            stats.pages,
            stats.duration_ms
        );

        let state = Arc::new(RwLock::new(ServerState {
            mkdocs,
            config_file: self.config.config_file.clone(),
            docs_dir: docs_dir.clone(),
            site_dir: site_dir.clone(),
            hub: ReloadHub::new(),
        }));

        // Watch sources and the config file
        let watch_paths = vec![docs_dir, self.config.config_file.clone()];

        let (watcher, mut rx) =
            FileWatcher::new(&watch_paths).map_err(|e| ServerError::WatchError(e.to_string()))?;

        let state_clone = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                handle_watch_event(&state_clone, event).await;
            }
            // Keep watcher alive
            drop(watcher);
        });

        let app = Router::new()
            .route("/~/livereload", get(ws_handler))
            .route("/~/livereload.js", get(script_handler))
            .fallback_service(ServeDir::new(&site_dir))
            .with_state(state);

        tracing::info!("Serving documentation at http://{}", addr);

        if self.config.open {
            let url = format!("http://{}", addr);
            let _ = open::that(&url);
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}

/// Resolve the docs directory relative to the config file's location.
fn resolve_docs_dir(config_file: &Path, docs_dir: &Path) -> PathBuf {
    if docs_dir.is_absolute() {
        return docs_dir.to_path_buf();
    }

    config_file
        .parent()
        .unwrap_or(Path::new("."))
        .join(docs_dir)
}

/// Per-process scratch directory for built output.
///
/// The documentation source is never written to; builds land here.
fn scratch_dir() -> PathBuf {
    static SEQ: AtomicU64 = AtomicU64::new(0);

    std::env::temp_dir().join(format!(
        "mvcdoc-{}-{}",
        std::process::id(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    ))
}

/// Build the site into the scratch directory.
async fn build_site(
    mkdocs: &MkDocsConfig,
    docs_dir: &Path,
    site_dir: &Path,
) -> Result<BuildStats, BuildError> {
    let mut config = SiteConfig::from_mkdocs(mkdocs, site_dir.to_path_buf(), true);
    config.docs_dir = docs_dir.to_path_buf();

    SiteBuilder::new(config)?.build().await
}

/// Handle file watch events.
async fn handle_watch_event(state: &Arc<RwLock<ServerState>>, event: WatchEvent) {
    match &event {
        WatchEvent::ConfigModified(path) => {
            tracing::info!("Config modified: {}", path.display());

            let config_file = state.read().await.config_file.clone();
            match MkDocsConfig::load(&config_file) {
                Ok(new_config) => {
                    let mut s = state.write().await;
                    s.docs_dir = resolve_docs_dir(&config_file, &new_config.docs_dir);
                    s.mkdocs = new_config;
                }
                Err(e) => {
                    tracing::warn!("Ignoring invalid config change: {}", e);
                    return;
                }
            }
        }

        WatchEvent::PageModified(path) => {
            tracing::info!("Page modified: {}", path.display());
        }

        WatchEvent::Created(path) | WatchEvent::Deleted(path) | WatchEvent::Modified(path) => {
            tracing::debug!("Changed: {}", path.display());
        }
    }

    rebuild(state).await;
}

/// Rebuild the site and notify connected clients.
async fn rebuild(state: &Arc<RwLock<ServerState>>) {
    let (mkdocs, docs_dir, site_dir, hub) = {
        let s = state.read().await;
        (
            s.mkdocs.clone(),
            s.docs_dir.clone(),
            s.site_dir.clone(),
            s.hub.clone(),
        )
    };

    match build_site(&mkdocs, &docs_dir, &site_dir).await {
        Ok(stats) => {
            tracing::info!("Rebuilt {} pages in {}ms", stats.pages, stats.duration_ms);
            hub.send(ReloadMessage::Rebuilt { pages: stats.pages });
        }
        Err(e) => {
            tracing::warn!("Rebuild failed: {}", e);
        }
    }
}

/// Handler for the live-reload WebSocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<RwLock<ServerState>>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_ws(mut socket: WebSocket, state: Arc<RwLock<ServerState>>) {
    let mut rx = {
        let state = state.read().await;
        state.hub.subscribe()
    };

    // Send connected message
    let Ok(msg) = serde_json::to_string(&ReloadMessage::Connected) else {
        return;
    };
    if socket.send(Message::Text(msg.into())).await.is_err() {
        return;
    }

    // Forward reload messages to the client
    while let Ok(reload_msg) = rx.recv().await {
        let Ok(json) = serde_json::to_string(&reload_msg) else {
            continue;
        };
        if socket.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}

/// Handler for the live-reload client script.
async fn script_handler() -> impl IntoResponse {
    (
        [("content-type", "application/javascript")],
        livereload_script(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn docs_fixture() -> (tempfile::TempDir, PathBuf) {
        let temp = tempdir().unwrap();
        let config_file = temp.path().join("mkdocs.yml");
        fs::write(&config_file, "site_name: Documentation MVC\n").unwrap();
        fs::create_dir_all(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/index.md"), "# Welcome\n").unwrap();
        (temp, config_file)
    }

    #[test]
    fn creates_server_with_default_config() {
        let server = DevServer::new(DevServerConfig::default());
        assert_eq!(server.config.port, 8000);
        assert_eq!(server.config.config_file, PathBuf::from("mkdocs.yml"));
    }

    #[test]
    fn resolves_docs_dir_relative_to_config() {
        let resolved = resolve_docs_dir(Path::new("/proj/mkdocs.yml"), Path::new("docs"));
        assert_eq!(resolved, PathBuf::from("/proj/docs"));

        let absolute = resolve_docs_dir(Path::new("mkdocs.yml"), Path::new("/abs/docs"));
        assert_eq!(absolute, PathBuf::from("/abs/docs"));
    }

    #[tokio::test]
    async fn errors_when_config_missing() {
        let temp = tempdir().unwrap();

        let result = serve(&temp.path().join("mkdocs.yml")).await;

        assert!(matches!(result, Err(ServerError::Config(ConfigError::NotFound(_)))));
    }

    #[tokio::test]
    async fn fails_when_port_in_use() {
        let (_temp, config_file) = docs_fixture();

        // Occupy a port first
        let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = blocker.local_addr().unwrap().port();

        let server = DevServer::new(DevServerConfig {
            config_file,
            host: "127.0.0.1".to_string(),
            port,
            open: false,
        });

        let result = server.start().await;

        assert!(matches!(result, Err(ServerError::BindError(..))));
    }

    #[tokio::test]
    async fn page_change_rebuilds_and_broadcasts() {
        let (_temp, config_file) = docs_fixture();

        let mkdocs = MkDocsConfig::load(&config_file).unwrap();
        let docs_dir = resolve_docs_dir(&config_file, &mkdocs.docs_dir);
        let state = Arc::new(RwLock::new(ServerState {
            mkdocs,
            config_file,
            docs_dir: docs_dir.clone(),
            site_dir: scratch_dir(),
            hub: ReloadHub::new(),
        }));

        let mut rx = state.read().await.hub.subscribe();

        handle_watch_event(&state, WatchEvent::PageModified(docs_dir.join("index.md"))).await;

        match rx.try_recv() {
            Ok(ReloadMessage::Rebuilt { pages }) => assert_eq!(pages, 1),
            other => panic!("expected Rebuilt broadcast, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn invalid_config_edit_keeps_last_good_config() {
        let (_temp, config_file) = docs_fixture();

        let mkdocs = MkDocsConfig::load(&config_file).unwrap();
        let docs_dir = resolve_docs_dir(&config_file, &mkdocs.docs_dir);
        let state = Arc::new(RwLock::new(ServerState {
            mkdocs,
            config_file: config_file.clone(),
            docs_dir,
            site_dir: scratch_dir(),
            hub: ReloadHub::new(),
        }));

        let mut rx = state.read().await.hub.subscribe();

        fs::write(&config_file, "site_name: [broken\n").unwrap();
        handle_watch_event(&state, WatchEvent::ConfigModified(config_file.clone())).await;

        // Last good config survives and no reload goes out
        assert_eq!(state.read().await.mkdocs.site_name, "Documentation MVC");
        assert!(rx.try_recv().is_err());

        // A fixed config is picked up again
        fs::write(&config_file, "site_name: Renamed Docs\n").unwrap();
        handle_watch_event(&state, WatchEvent::ConfigModified(config_file)).await;

        assert_eq!(state.read().await.mkdocs.site_name, "Renamed Docs");
        assert!(matches!(rx.try_recv(), Ok(ReloadMessage::Rebuilt { .. })));
    }

    #[tokio::test]
    async fn serves_built_index() {
        let (_temp, config_file) = docs_fixture();

        // Find a free port
        let port = {
            let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            probe.local_addr().unwrap().port()
        };

        let server = DevServer::new(DevServerConfig {
            config_file,
            host: "127.0.0.1".to_string(),
            port,
            open: false,
        });

        tokio::spawn(server.start());
        tokio::time::sleep(Duration::from_millis(500)).await;

        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
            .await
            .unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.contains("200 OK"));
        assert!(response.contains("Welcome"));
    }
}

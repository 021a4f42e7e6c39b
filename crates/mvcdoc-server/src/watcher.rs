//! File watching for live reload.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events emitted by the file watcher.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// Markdown page was modified
    PageModified(PathBuf),

    /// The configuration file was modified
    ConfigModified(PathBuf),

    /// File was created
    Created(PathBuf),

    /// File was deleted
    Deleted(PathBuf),

    /// Generic modification (assets, stylesheets)
    Modified(PathBuf),
}

/// File watcher for detecting documentation changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths.
    ///
    /// Returns the watcher and a channel to receive events.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            }
        }

        // Forward notify events onto the async channel, debounced
        let async_tx_clone = async_tx.clone();
        std::thread::spawn(move || {
            let debounce_duration = Duration::from_millis(100);

            while let Ok(first) = sync_rx.recv() {
                // Coalesce a burst: collect until the channel goes quiet for
                // the debounce window, then forward one event per path
                let mut burst = vec![first];
                while let Ok(next) = sync_rx.recv_timeout(debounce_duration) {
                    burst.push(next);
                }

                let mut seen: Vec<PathBuf> = Vec::new();
                for event in burst {
                    for path in event.paths {
                        if seen.contains(&path) {
                            continue;
                        }
                        if let Some(e) = classify_event(&path, &event.kind) {
                            let _ = async_tx_clone.blocking_send(e);
                            seen.push(path);
                        }
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match kind {
        EventKind::Create(_) => Some(WatchEvent::Created(path.to_path_buf())),
        EventKind::Remove(_) => Some(WatchEvent::Deleted(path.to_path_buf())),
        EventKind::Modify(_) => {
            if file_name == "mkdocs.yml" {
                Some(WatchEvent::ConfigModified(path.to_path_buf()))
            } else if ext == "md" {
                Some(WatchEvent::PageModified(path.to_path_buf()))
            } else {
                Some(WatchEvent::Modified(path.to_path_buf()))
            }
        }
        _ => None,
    }
}

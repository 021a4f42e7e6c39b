//! Development server with live reload for mvcdoc documentation.
//!
//! Builds the site into a scratch directory, serves it over HTTP, and pushes
//! WebSocket reload messages to connected browsers when sources change.

pub mod livereload;
pub mod server;
pub mod watcher;

pub use livereload::{ReloadHub, ReloadMessage};
pub use server::{serve, DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};

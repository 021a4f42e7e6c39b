//! WebSocket-based live reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Messages sent to clients over the live-reload channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Full page reload
    Reload,

    /// A rebuild finished
    Rebuilt {
        /// Number of pages rendered
        pages: usize,
    },

    /// Connection established
    Connected,
}

/// Hub for broadcasting reload messages to all connected clients.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    /// Create a new reload hub.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: ReloadMessage) {
        // Ignore send errors (no receivers)
        let _ = self.sender.send(msg);
    }

    /// Subscribe to reload messages.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// The client-side live-reload script.
///
/// Connects back to the server that delivered the page, so no address needs
/// to be baked in.
pub fn livereload_script() -> &'static str {
    r#"
(function() {
  'use strict';

  function connect() {
    const ws = new WebSocket('ws://' + location.host + '/~/livereload');

    ws.onmessage = function(event) {
      const msg = JSON.parse(event.data);
      switch (msg.type) {
        case 'reload':
        case 'rebuilt':
          location.reload();
          break;
        case 'connected':
          console.log('[livereload] connected');
          break;
      }
    };

    ws.onclose = function() {
      console.log('[livereload] disconnected, retrying...');
      setTimeout(connect, 1000);
    };
  }

  connect();
})();
"#
}

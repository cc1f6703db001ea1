//! Update notification fan-out to connected observers

use std::sync::Mutex;

#[cfg(test)]
use mockall::automock;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::manifest::Manifest;

/// Event delivered to every connected application instance when a newer
/// release is detected. Serializes as
/// `{"type":"UPDATE_AVAILABLE","updateData":{...}}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notice {
    UpdateAvailable {
        #[serde(rename = "updateData")]
        update_data: Manifest,
    },
}

/// Capability for broadcasting notices. Delivery is fire-and-forget: there is
/// no acknowledgment, and a failure to reach one observer never surfaces to
/// the caller or affects the others.
#[cfg_attr(test, automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Fans notices out over one channel per observer.
pub struct Broadcaster {
    observers: Mutex<Vec<mpsc::UnboundedSender<Notice>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Register an observer; the receiver sees every subsequent notice.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Notice> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock_observers().push(tx);
        rx
    }

    fn lock_observers(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<Notice>>> {
        // A poisoned observer list is still a usable observer list
        self.observers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for Broadcaster {
    fn notify(&self, notice: Notice) {
        let mut observers = self.lock_observers();
        observers.retain(|tx| match tx.send(notice.clone()) {
            Ok(()) => true,
            Err(_) => {
                debug!("dropping disconnected observer");
                false
            }
        });
    }
}

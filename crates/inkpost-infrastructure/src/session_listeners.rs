//! Fan-out of session changes to gateway listeners.

use inkpost_core::gateway::SessionChanges;
use inkpost_core::session::AuthSession;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Listener registry shared by the gateway implementations.
///
/// Each listener owns an unbounded channel, so a slow listener never makes
/// another one miss a change. Listeners whose receiver was dropped are
/// pruned on the next publish.
#[derive(Default)]
pub struct SessionListeners {
    senders: Mutex<Vec<mpsc::UnboundedSender<Option<AuthSession>>>>,
}

impl SessionListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> SessionChanges {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut senders) = self.senders.lock() {
            senders.push(tx);
        }
        rx
    }

    pub fn publish(&self, session: Option<AuthSession>) {
        if let Ok(mut senders) = self.senders.lock() {
            senders.retain(|tx| tx.send(session.clone()).is_ok());
        }
    }

    pub fn len(&self) -> usize {
        self.senders.lock().map(|s| s.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

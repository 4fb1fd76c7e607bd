use log::{debug, trace};
use std::sync::mpsc;

/// Sending half, shared by the cache and fetch workers.
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: mpsc::Sender<String>,
}

impl Notifier {
    pub fn notify(&self, key: &str) {
        trace!("Queued resolution notice for '{key}'.");
        if self.tx.send(key.to_string()).is_err() {
            debug!("Notification hub dropped; notice for '{key}' discarded.");
        }
    }
}

/// Receiving half, owned by the host thread and drained once per tick.
pub struct NotificationHub {
    rx: mpsc::Receiver<String>,
}

impl NotificationHub {
    pub fn channel() -> (Notifier, Self) {
        let (tx, rx) = mpsc::channel();
        (Notifier { tx }, Self { rx })
    }

    /// Delivers every queued notice to `on_resolved`, returning how many ran.
    pub fn drain<F: FnMut(&str)>(&self, mut on_resolved: F) -> usize {
        let mut delivered = 0;
        while let Ok(key) = self.rx.try_recv() {
            on_resolved(&key);
            delivered += 1;
        }
        delivered
    }
}

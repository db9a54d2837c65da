// ── Alert log ──
//
// Bounded, newest-first list of alerts.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::Alert;

/// Maximum number of alerts retained.
pub const MAX_ALERTS: usize = 5;

pub(crate) struct AlertLog {
    entries: watch::Sender<Arc<Vec<Alert>>>,
}

impl AlertLog {
    pub(crate) fn new() -> Self {
        let (entries, _) = watch::channel(Arc::new(Vec::new()));
        Self { entries }
    }

    /// Prepend `alert`, dropping the oldest entries beyond [`MAX_ALERTS`].
    pub(crate) fn push(&self, alert: Alert) {
        self.entries.send_modify(|entries| {
            let mut next = Vec::with_capacity(MAX_ALERTS);
            next.push(alert);
            next.extend(entries.iter().take(MAX_ALERTS - 1).cloned());
            *entries = Arc::new(next);
        });
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Alert>> {
        self.entries.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Alert>>> {
        self.entries.subscribe()
    }
}

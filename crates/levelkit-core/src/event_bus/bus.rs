//! Broadcast hub for leveling notifications.

use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::broadcast;

use super::events::AppEvent;

const CHANNEL_CAPACITY: usize = 256;

/// Fans events out to async receivers, optionally keeping the most recent
/// ones for later inspection
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
    history: Option<Mutex<VecDeque<AppEvent>>>,
    history_limit: usize,
}

impl EventBus {
    /// Create a bus without history
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            history: None,
            history_limit: 0,
        }
    }

    /// Create a bus that also keeps the last `limit` events
    pub fn with_history(limit: usize) -> Self {
        Self {
            history: Some(Mutex::new(VecDeque::with_capacity(limit))),
            history_limit: limit,
            ..Self::new()
        }
    }

    /// Publish an event, returning how many receivers will see it
    ///
    /// Publishing with nobody listening is not an error.
    pub fn publish(&self, event: AppEvent) -> usize {
        tracing::trace!("Publishing: {}", event.description());
        if let Some(history) = &self.history {
            let mut history = history.lock();
            if history.len() == self.history_limit {
                history.pop_front();
            }
            if self.history_limit > 0 {
                history.push_back(event.clone());
            }
        }
        self.sender.send(event).unwrap_or(0)
    }

    /// A receiver seeing every event published from now on
    pub fn receiver(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Retained events, oldest first
    pub fn history(&self) -> Vec<AppEvent> {
        self.history
            .as_ref()
            .map(|history| history.lock().iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receivers", &self.sender.receiver_count())
            .field("history_limit", &self.history_limit)
            .finish()
    }
}

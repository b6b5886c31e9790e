// Realtime channels
// Change subscriptions that accept listeners but never deliver events

use crate::auth::Subscription;
use tracing::debug;

/// A named change channel
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    name: String,
    listeners: usize,
    subscribed: bool,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            listeners: 0,
            subscribed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a listener for `event`; the callback is dropped unused
    pub fn on<F>(mut self, event: &str, _callback: F) -> Self
    where
        F: FnMut(&serde_json::Value),
    {
        debug!(channel = %self.name, event, "listener registered");
        self.listeners += 1;
        self
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn subscribe(&mut self) -> Subscription {
        self.subscribed = true;
        Subscription { active: true }
    }

    pub fn unsubscribe(&mut self) {
        self.subscribed = false;
    }
}

//! Typed action bus between network clients and the stores that consume their results.

use shared::protocol::Action;
use tokio::sync::broadcast;

const ACTION_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct Dispatcher {
    actions: broadcast::Sender<Action>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (actions, _) = broadcast::channel(ACTION_CHANNEL_CAPACITY);
        Self { actions }
    }

    /// Publishes `action` to every current subscriber. Having none is not an error.
    pub fn dispatch(&self, action: Action) {
        let name = action.name();
        match self.actions.send(action) {
            Ok(receivers) => tracing::debug!(action = name, receivers, "dispatched action"),
            Err(_) => tracing::debug!(action = name, "dispatched action with no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Action> {
        self.actions.subscribe()
    }
}

//! In-memory consumer of plugin actions.

use std::{collections::HashMap, sync::Arc};

use shared::{
    domain::WpOrgPlugin,
    error::FetchPluginError,
    protocol::{Action, FetchedPluginPayload},
};
use tokio::sync::{
    broadcast::{self, error::RecvError},
    RwLock,
};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginStoreEvent {
    PluginInfoChanged { slug: String },
    PluginInfoFetchFailed(FetchPluginError),
}

#[derive(Default)]
struct PluginStoreState {
    plugins: HashMap<String, WpOrgPlugin>,
    last_error: Option<FetchPluginError>,
}

pub struct PluginStore {
    state: RwLock<PluginStoreState>,
    events: broadcast::Sender<PluginStoreEvent>,
}

impl Default for PluginStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: RwLock::new(PluginStoreState::default()),
            events,
        }
    }

    pub async fn on_action(&self, action: &Action) {
        match action {
            Action::FetchedPluginInfo(FetchedPluginPayload::Fetched(plugin)) => {
                let slug = plugin.slug.clone();
                {
                    let mut state = self.state.write().await;
                    state.plugins.insert(slug.clone(), plugin.clone());
                    state.last_error = None;
                }
                info!(slug = %slug, "plugin info updated");
                let _ = self.events.send(PluginStoreEvent::PluginInfoChanged { slug });
            }
            Action::FetchedPluginInfo(FetchedPluginPayload::Failed(error)) => {
                self.state.write().await.last_error = Some(error.clone());
                warn!(kind = ?error.kind, "plugin info fetch failed");
                let _ = self
                    .events
                    .send(PluginStoreEvent::PluginInfoFetchFailed(error.clone()));
            }
        }
    }

    /// Consumes actions until the dispatcher side of the channel is dropped.
    pub async fn run(self: Arc<Self>, mut actions: broadcast::Receiver<Action>) {
        loop {
            match actions.recv().await {
                Ok(action) => self.on_action(&action).await,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "plugin store fell behind the action stream");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    pub async fn plugin(&self, slug: &str) -> Option<WpOrgPlugin> {
        self.state.read().await.plugins.get(slug).cloned()
    }

    pub async fn last_error(&self) -> Option<FetchPluginError> {
        self.state.read().await.last_error.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PluginStoreEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/plugin_store_tests.rs"]
mod tests;

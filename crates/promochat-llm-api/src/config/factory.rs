use std::sync::Arc;

use crate::client::{local_model::LocalModelClient, relay::RelayClient, ChatBackend};
use crate::config::{LocalConfig, RelayConfig};

/// Client factory for creating chat backends
pub struct ClientFactory;

impl ClientFactory {
    /// Build both backends at once, relay first
    pub fn create_pair(relay: RelayConfig, local: LocalConfig) -> (Arc<dyn ChatBackend>, Arc<dyn ChatBackend>) {
        (Self::create_relay(relay), Self::create_local(local))
    }

    pub fn create_relay(config: RelayConfig) -> Arc<dyn ChatBackend> {
        Arc::new(RelayClient::new(config))
    }

    pub fn create_local(config: LocalConfig) -> Arc<dyn ChatBackend> {
        Arc::new(LocalModelClient::new(config))
    }
}

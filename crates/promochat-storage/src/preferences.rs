use std::sync::Arc;

use promochat_types::BackendMode;

use crate::kv::KeyValueStore;
use crate::BACKEND_MODE_KEY;

/// Persisted backend mode; anything unreadable means `Remote`.
#[derive(Clone)]
pub struct ModePreference {
    store: Arc<dyn KeyValueStore>,
}

impl ModePreference {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> BackendMode {
        match self.store.get(BACKEND_MODE_KEY) {
            Ok(Some(raw)) => BackendMode::from_str(&raw).unwrap_or_default(),
            Ok(None) => BackendMode::default(),
            Err(e) => {
                log::warn!("Failed to read backend mode: {}", e);
                BackendMode::default()
            }
        }
    }

    pub fn save(&self, mode: BackendMode) {
        if let Err(e) = self.store.set(BACKEND_MODE_KEY, mode.as_str()) {
            log::warn!("Failed to persist backend mode: {}", e);
        }
    }
}

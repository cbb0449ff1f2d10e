//! Stable per-install session token and activity tracking.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::kv::KeyValueStore;
use crate::{LAST_ACTIVITY_KEY, SESSION_ID_KEY};

pub struct SessionIdentity {
    store: Arc<dyn KeyValueStore>,
    cached: Mutex<Option<String>>,
}

impl SessionIdentity {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            cached: Mutex::new(None),
        }
    }

    /// Return the stored session token, generating and persisting one on
    /// first use. A token that could not be persisted is still reused for
    /// the lifetime of this instance.
    pub fn session_id(&self) -> String {
        let mut cached = self.cached.lock();
        if let Some(id) = cached.as_ref() {
            return id.clone();
        }

        let id = match self.store.get(SESSION_ID_KEY) {
            Ok(Some(id)) if !id.trim().is_empty() => id,
            Ok(_) => self.generate_and_store(),
            Err(e) => {
                log::warn!("Failed to read session id: {}", e);
                self.generate_and_store()
            }
        };

        *cached = Some(id.clone());
        id
    }

    fn generate_and_store(&self) -> String {
        let id = format!("session_{}", uuid::Uuid::new_v4().simple());
        if let Err(e) = self.store.set(SESSION_ID_KEY, &id) {
            log::warn!("Failed to persist session id: {}", e);
        } else {
            log::info!("Created new chat session {}", id);
        }
        id
    }

    /// Record the current time as the session's last activity.
    pub fn update_activity(&self) {
        let now = Utc::now().timestamp_millis().to_string();
        if let Err(e) = self.store.set(LAST_ACTIVITY_KEY, &now) {
            log::warn!("Failed to update session activity: {}", e);
        }
    }

    /// Last recorded activity, if any.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        let raw = self.store.get(LAST_ACTIVITY_KEY).ok().flatten()?;
        let millis = raw.trim().parse::<i64>().ok()?;
        DateTime::<Utc>::from_timestamp_millis(millis)
    }
}

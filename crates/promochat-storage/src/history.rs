//! Versioned, expiring snapshots of the conversation log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use promochat_types::{Message, MAX_STORED_MESSAGES, SNAPSHOT_TTL_MS, STORAGE_VERSION};

use crate::kv::KeyValueStore;
use crate::HISTORY_KEY;

/// Serialized form of the conversation written to storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSnapshot {
    pub version: String,
    pub messages: Vec<Message>,
    /// Epoch milliseconds of the write
    pub last_updated: i64,
}

impl StoredSnapshot {
    /// Wrap the most recent messages with the current version and `now`.
    pub fn new(messages: &[Message], now: DateTime<Utc>) -> Self {
        let start = messages.len().saturating_sub(MAX_STORED_MESSAGES);
        Self {
            version: STORAGE_VERSION.to_string(),
            messages: messages[start..].to_vec(),
            last_updated: now.timestamp_millis(),
        }
    }

    fn is_current_version(&self) -> bool {
        self.version == STORAGE_VERSION
    }

    /// An age that does not fit in an `i64` counts as expired.
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match now.timestamp_millis().checked_sub(self.last_updated) {
            Some(age) => age > SNAPSHOT_TTL_MS,
            None => true,
        }
    }
}

/// Durable mirror of the message log.
///
/// Never returns an error: history is best-effort durability.
#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persist the most recent 50 messages.
    pub fn save(&self, messages: &[Message]) {
        self.save_at(messages, Utc::now());
    }

    fn save_at(&self, messages: &[Message], now: DateTime<Utc>) {
        let snapshot = StoredSnapshot::new(messages, now);
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize chat history: {}", e);
                return;
            }
        };

        match self.store.set(HISTORY_KEY, &json) {
            Ok(()) => log::trace!("Saved {} messages", snapshot.messages.len()),
            Err(e) => log::warn!("Failed to save chat history: {}", e),
        }
    }

    /// Load stored history, or an empty log when nothing usable is stored.
    pub fn load(&self) -> Vec<Message> {
        self.load_at(Utc::now())
    }

    fn load_at(&self, now: DateTime<Utc>) -> Vec<Message> {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("Failed to read chat history: {}", e);
                return Vec::new();
            }
        };

        let snapshot: StoredSnapshot = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Discarding unreadable chat history: {}", e);
                self.clear();
                return Vec::new();
            }
        };

        if !snapshot.is_current_version() {
            log::info!(
                "Discarding chat history with version {} (expected {})",
                snapshot.version,
                STORAGE_VERSION
            );
            self.clear();
            return Vec::new();
        }

        if snapshot.is_expired(now) {
            log::info!("Discarding expired chat history");
            self.clear();
            return Vec::new();
        }

        snapshot.messages
    }

    /// Delete the stored snapshot.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(HISTORY_KEY) {
            log::warn!("Failed to clear chat history: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn store() -> (Arc<MemoryStore>, HistoryStore) {
        let kv = Arc::new(MemoryStore::new());
        let history = HistoryStore::new(kv.clone());
        (kv, history)
    }

    fn conversation(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("question {}", i))
                } else {
                    Message::ai(format!("answer {}", i))
                }
            })
            .collect()
    }

    /// Millisecond-truncated copy, matching what survives serialization
    fn as_stored(messages: &[Message]) -> Vec<Message> {
        messages
            .iter()
            .cloned()
            .map(|mut m| {
                m.timestamp =
                    DateTime::<Utc>::from_timestamp_millis(m.timestamp.timestamp_millis()).unwrap();
                m
            })
            .collect()
    }

    #[test]
    fn test_round_trip_keeps_order() {
        let (_, history) = store();
        let messages = conversation(7);
        history.save(&messages);
        assert_eq!(history.load(), as_stored(&messages));
    }

    #[test]
    fn test_save_keeps_most_recent_fifty() {
        let (_, history) = store();
        let messages = conversation(73);
        history.save(&messages);

        let loaded = history.load();
        assert_eq!(loaded.len(), MAX_STORED_MESSAGES);
        assert_eq!(loaded, as_stored(&messages[23..]));
    }

    #[test]
    fn test_missing_history_is_empty() {
        let (_, history) = store();
        assert!(history.load().is_empty());
    }

    #[test]
    fn test_version_mismatch_purges_record() {
        let (kv, history) = store();
        let mut snapshot = StoredSnapshot::new(&conversation(3), Utc::now());
        snapshot.version = "0.9".to_string();
        kv.set(HISTORY_KEY, &serde_json::to_string(&snapshot).unwrap())
            .unwrap();

        assert!(history.load().is_empty());
        assert_eq!(kv.get(HISTORY_KEY).unwrap(), None);
        assert!(history.load().is_empty());
    }

    #[test]
    fn test_expired_history_purged() {
        let (kv, history) = store();
        let now = Utc::now();
        history.save_at(&conversation(4), now - Duration::days(7) - Duration::milliseconds(1));

        assert!(history.load_at(now).is_empty());
        assert_eq!(kv.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn test_history_at_exactly_seven_days_still_valid() {
        let (_, history) = store();
        let now = Utc::now();
        let messages = conversation(2);
        history.save_at(&messages, now - Duration::days(7));

        assert_eq!(history.load_at(now), as_stored(&messages));
    }

    #[test]
    fn test_corrupt_history_discarded() {
        let (kv, history) = store();
        kv.set(HISTORY_KEY, "{not json").unwrap();

        assert!(history.load().is_empty());
        assert_eq!(kv.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn test_out_of_range_timestamp_treated_as_expired() {
        let (kv, history) = store();
        let raw = format!(
            r#"{{"version":"1.0","messages":[],"lastUpdated":{}}}"#,
            i64::MIN
        );
        kv.set(HISTORY_KEY, &raw).unwrap();

        assert!(history.load().is_empty());
        assert_eq!(kv.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn test_wire_format_field_names() {
        let now = DateTime::<Utc>::from_timestamp_millis(1_000).unwrap();
        let snapshot = StoredSnapshot::new(&[], now);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"version": "1.0", "messages": [], "lastUpdated": 1000})
        );
    }

    #[test]
    fn test_storage_failures_are_swallowed() {
        let kv = Arc::new(MemoryStore::disabled());
        let history = HistoryStore::new(kv);
        history.save(&conversation(2));
        assert!(history.load().is_empty());
        history.clear();
    }

    #[test]
    fn test_quota_exceeded_keeps_previous_snapshot() {
        let kv = Arc::new(MemoryStore::with_quota(600));
        let history = HistoryStore::new(kv);
        let small = conversation(1);
        history.save(&small);

        let big = vec![Message::user("x".repeat(2_000))];
        history.save(&big);

        assert_eq!(history.load(), as_stored(&small));
    }
}

//! Durable client-side state for promochat.
//!
//! Everything here sits on top of a [`KeyValueStore`], the stand-in for the
//! browser's local storage: conversation snapshots ([`HistoryStore`]), the
//! per-install session token ([`SessionIdentity`]) and the backend mode
//! preference ([`ModePreference`]). All writes are best-effort; failures are
//! logged and never reach the chat flow.

pub mod error;
pub mod history;
pub mod kv;
pub mod preferences;
pub mod session;

pub use error::{StorageError, StorageResult};
pub use history::{HistoryStore, StoredSnapshot};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use preferences::ModePreference;
pub use session::SessionIdentity;

/// Storage key holding the conversation snapshot
pub const HISTORY_KEY: &str = "promochat_history";

/// Storage key holding the per-install session token
pub const SESSION_ID_KEY: &str = "promochat_session_id";

/// Storage key holding the last activity time (epoch ms)
pub const LAST_ACTIVITY_KEY: &str = "promochat_last_activity";

/// Storage key holding the backend mode preference
pub const BACKEND_MODE_KEY: &str = "promochat_backend_mode";

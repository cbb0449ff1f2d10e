//! Core types and structures for promochat
//!
//! This crate provides the foundational types shared by the storage, backend
//! and chat crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Schema version written into every stored snapshot
pub const STORAGE_VERSION: &str = "1.0";

/// Maximum number of messages kept in a stored snapshot
pub const MAX_STORED_MESSAGES: usize = 50;

/// Snapshots older than this (7 days) are purged on load
pub const SNAPSHOT_TTL_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Number of prior turns forwarded to a backend with each request
pub const HISTORY_WINDOW: usize = 6;

/// Maximum number of quick-reply suggestions surfaced at once
pub const MAX_SUGGESTIONS: usize = 3;

/// Simulated "thinking" delay before a greeting is shown
pub const GREETING_DELAY_MS: u64 = 800;

// ============================================================================
// Message Types
// ============================================================================

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Ai,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Ai => "ai",
        }
    }

    /// Role name used on the OpenAI-style wire format
    pub fn wire_role(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Ai => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque, non-sequential message identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single entry in the conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(Role::Ai, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Empty assistant message that is filled in as a reply streams in
    pub fn placeholder() -> Self {
        Self::new(Role::Ai, String::new())
    }
}

// ============================================================================
// Backend Selection
// ============================================================================

/// Which backend future sends are routed to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    #[default]
    Remote,
    Local,
}

impl BackendMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendMode::Remote => "remote",
            BackendMode::Local => "local",
        }
    }

    /// Parse a stored or user-supplied mode; unknown values yield `None`
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "remote" => Some(BackendMode::Remote),
            "local" => Some(BackendMode::Local),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            BackendMode::Remote => BackendMode::Local,
            BackendMode::Local => BackendMode::Remote,
        }
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// UI Anchor
// ============================================================================

/// Screen bounding box of the element that opened the chat
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnchorRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl AnchorRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

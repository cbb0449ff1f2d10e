//! What observers of the chat see.

use promochat_types::{AnchorRect, BackendMode, Message, MessageId};

/// Published on every state change, in the order the changes happen
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Opened { anchor: Option<AnchorRect> },
    Closed,
    MessageAppended(Message),
    /// Full current content of a message, sent once per streamed chunk and
    /// again when the reply settles
    MessageUpdated { id: MessageId, content: String },
    MessageRemoved(MessageId),
    TypingChanged(bool),
    SuggestionsChanged(Vec<String>),
    BackendModeChanged(BackendMode),
    Cleared,
}

/// Point-in-time copy of the chat state
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSnapshot {
    pub is_open: bool,
    pub messages: Vec<Message>,
    /// Reply still being filled in, if any
    pub in_flight: Option<MessageId>,
    pub is_typing: bool,
    pub backend_mode: BackendMode,
    pub suggestions: Vec<String>,
    pub trigger_anchor: Option<AnchorRect>,
}

/// Which tier produced the settled reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTier {
    /// The streaming call completed
    Streamed,
    /// Streaming failed; the single-shot call answered
    Fallback,
    /// Both calls failed; an offline reply was used
    Canned,
}

/// Result of [`crate::Orchestrator::send_message`]
#[derive(Debug, Clone, PartialEq)]
pub struct SendOutcome {
    /// The settled assistant message
    pub message_id: MessageId,
    pub tier: ReplyTier,
}

//! # promochat-chat
//!
//! The conversational core of the promo page assistant.
//!
//! [`Orchestrator`] owns the session: it opens and closes the chat, keeps the
//! ordered message log, routes each send to the backend picked by
//! [`BackendMode`](promochat_types::BackendMode), and walks the fallback
//! tiers (stream, single-shot call, canned reply) until something answers.
//! Replies are split into a display body and quick-reply suggestions by the
//! [`suggestions`] codec.

pub mod canned;
pub mod events;
pub mod greeting;
pub mod message_log;
pub mod orchestrator;
pub mod suggestions;

pub use events::{ChatEvent, ChatSnapshot, ReplyTier, SendOutcome};
pub use message_log::MessageLog;
pub use orchestrator::{Backends, Orchestrator, OrchestratorConfig};
pub use suggestions::{decode, decode_body_only, encode, ParsedReply, DEFAULT_SUGGESTIONS, SUGGESTION_SEPARATOR};

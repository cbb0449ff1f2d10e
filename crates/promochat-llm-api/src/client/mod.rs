use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use promochat_types::{BackendMode, Message, Role, HISTORY_WINDOW};

pub mod decode;
pub mod local_model;
pub mod relay;

/// Errors raised by a backend adapter
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection, TLS or body read failure
    #[error("{backend} transport error: {source}")]
    Transport {
        backend: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("{backend} returned HTTP {status}: {body}")]
    Status {
        backend: &'static str,
        status: u16,
        body: String,
    },

    /// Response body could not be understood
    #[error("{backend} sent a malformed response: {message}")]
    Malformed {
        backend: &'static str,
        message: String,
    },

    /// Server reported an error inside an otherwise healthy stream
    #[error("{backend} stream error: {message}")]
    Stream {
        backend: &'static str,
        message: String,
    },
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Text deltas in arrival order
pub type ChunkStream = Box<dyn Stream<Item = BackendResult<String>> + Send + Unpin>;

/// Role/content pair in OpenAI-compatible format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

impl WireMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

/// What the chat layer hands an adapter for one send
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationRequest {
    /// Most recent prior turns, oldest first
    pub history: Vec<WireMessage>,
    pub user_text: String,
    pub session_id: String,
}

impl ConversationRequest {
    /// Build a request from the message log preceding the new user turn.
    ///
    /// System messages and empty entries (unfilled placeholders) are skipped,
    /// and only the last [`HISTORY_WINDOW`] turns are kept.
    pub fn new(prior: &[Message], user_text: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self::with_window(prior, user_text, session_id, HISTORY_WINDOW)
    }

    /// Same as [`ConversationRequest::new`] with a custom history window
    pub fn with_window(
        prior: &[Message],
        user_text: impl Into<String>,
        session_id: impl Into<String>,
        window: usize,
    ) -> Self {
        let turns: Vec<WireMessage> = prior
            .iter()
            .filter(|m| m.role != Role::System && !m.content.trim().is_empty())
            .map(|m| WireMessage::new(m.role.wire_role(), m.content.clone()))
            .collect();
        let start = turns.len().saturating_sub(window);

        Self {
            history: turns[start..].to_vec(),
            user_text: user_text.into(),
            session_id: session_id.into(),
        }
    }

    /// System instruction, history, then the new user turn
    pub fn to_messages(&self, system_prompt: &str) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(WireMessage::system(system_prompt));
        messages.extend(self.history.iter().cloned());
        messages.push(WireMessage::user(self.user_text.clone()));
        messages
    }
}

/// Result of a non-streaming call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BackendReply {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

impl BackendReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            suggestions: None,
        }
    }
}

/// Chat backend - unified interface for the relay and the local model server
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Mode this backend serves
    fn mode(&self) -> BackendMode;

    /// Streaming chat - returns a stream of text deltas
    async fn chat_streaming(&self, request: &ConversationRequest) -> BackendResult<ChunkStream>;

    /// Non-streaming chat, used when streaming fails outright
    async fn chat(&self, request: &ConversationRequest) -> BackendResult<BackendReply>;

    /// Drive [`ChatBackend::chat_streaming`] to completion, handing every
    /// delta to `on_chunk` in arrival order. Returns the concatenated text.
    async fn stream_chat(
        &self,
        request: &ConversationRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> BackendResult<String> {
        let mut stream = self.chat_streaming(request).await?;
        let mut full = String::new();
        let mut count = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }
            count += 1;
            full.push_str(&chunk);
            on_chunk(&chunk);
        }

        log::debug!("{} stream finished after {} chunks", self.name(), count);
        Ok(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_keeps_last_six_turns() {
        let prior: Vec<Message> = (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("q{}", i))
                } else {
                    Message::ai(format!("a{}", i))
                }
            })
            .collect();

        let request = ConversationRequest::new(&prior, "next", "session_x");
        let contents: Vec<&str> = request.history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q4", "a5", "q6", "a7", "q8", "a9"]);
        assert_eq!(request.history[1].role, "assistant");
    }

    #[test]
    fn test_request_skips_system_and_empty_messages() {
        let prior = vec![
            Message::system("internal"),
            Message::ai("welcome"),
            Message::user("hi"),
            Message::placeholder(),
        ];
        let request = ConversationRequest::new(&prior, "next", "s");
        assert_eq!(
            request.history,
            vec![WireMessage::new("assistant", "welcome"), WireMessage::user("hi")]
        );
    }

    #[test]
    fn test_custom_window() {
        let prior = vec![Message::user("a"), Message::ai("b"), Message::user("c")];
        let request = ConversationRequest::with_window(&prior, "d", "s", 2);
        assert_eq!(request.history, vec![WireMessage::new("assistant", "b"), WireMessage::user("c")]);

        let none = ConversationRequest::with_window(&prior, "d", "s", 0);
        assert!(none.history.is_empty());
    }

    #[test]
    fn test_to_messages_order() {
        let request = ConversationRequest {
            history: vec![WireMessage::user("earlier")],
            user_text: "now".to_string(),
            session_id: "s".to_string(),
        };
        let messages = request.to_messages("be brief");
        assert_eq!(
            messages,
            vec![
                WireMessage::system("be brief"),
                WireMessage::user("earlier"),
                WireMessage::user("now"),
            ]
        );
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use promochat_chat::{Backends, Orchestrator, OrchestratorConfig};
use promochat_llm_api::{BackendError, BackendReply, BackendResult, ChatBackend, ChunkStream, ConversationRequest};
use promochat_storage::{KeyValueStore, MemoryStore};
use promochat_types::BackendMode;

/// What a mock stream does when opened
#[derive(Clone)]
pub enum StreamScript {
    /// Yield these chunks, then finish
    Chunks(Vec<&'static str>),
    /// Yield these chunks, then fail mid-stream
    ChunksThenError(Vec<&'static str>),
    /// Fail before any chunk
    FailToOpen,
    /// Reply `re:<user text>` in two chunks
    Echo,
    /// Yield the same chunk this many times
    Repeat(&'static str, usize),
}

/// Scripted backend that records every request it receives
pub struct MockBackend {
    mode: BackendMode,
    stream: StreamScript,
    chat: Option<BackendReply>,
    gate: Option<Arc<Notify>>,
    pause: Option<Arc<Notify>>,
    pub stream_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    pub requests: Mutex<Vec<ConversationRequest>>,
}

impl MockBackend {
    pub fn new(mode: BackendMode, stream: StreamScript) -> Self {
        Self {
            mode,
            stream,
            chat: None,
            gate: None,
            pause: None,
            stream_calls: AtomicUsize::new(0),
            chat_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Backend whose stream and single-shot call both fail
    pub fn failing(mode: BackendMode) -> Self {
        Self::new(mode, StreamScript::FailToOpen)
    }

    pub fn with_chat(mut self, reply: BackendReply) -> Self {
        self.chat = Some(reply);
        self
    }

    /// Hold every stream until the gate is notified
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Deliver the first chunk, then hold the rest until the gate is notified
    pub fn with_pause_after_first_chunk(mut self, gate: Arc<Notify>) -> Self {
        self.pause = Some(gate);
        self
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ConversationRequest> {
        self.requests.lock().last().cloned()
    }
}

fn stream_error(message: &str) -> BackendError {
    BackendError::Stream {
        backend: "mock",
        message: message.to_string(),
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn mode(&self) -> BackendMode {
        self.mode
    }

    async fn chat_streaming(&self, request: &ConversationRequest) -> BackendResult<ChunkStream> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let items: Vec<BackendResult<String>> = match &self.stream {
            StreamScript::Chunks(chunks) => chunks.iter().map(|c| Ok(c.to_string())).collect(),
            StreamScript::ChunksThenError(chunks) => chunks
                .iter()
                .map(|c| Ok(c.to_string()))
                .chain(std::iter::once(Err(stream_error("connection reset"))))
                .collect(),
            StreamScript::FailToOpen => {
                return Err(BackendError::Status {
                    backend: "mock",
                    status: 503,
                    body: "unavailable".to_string(),
                })
            }
            StreamScript::Echo => vec![Ok("re:".to_string()), Ok(request.user_text.clone())],
            StreamScript::Repeat(chunk, times) => (0..*times).map(|_| Ok(chunk.to_string())).collect(),
        };

        match &self.pause {
            Some(pause) => {
                let pause = pause.clone();
                let mut items = items.into_iter();
                let head: Vec<_> = items.by_ref().take(1).collect();
                let tail: Vec<_> = items.collect();
                let rest = stream::once(async move {
                    pause.notified().await;
                    stream::iter(tail)
                })
                .flatten();
                Ok(Box::new(Box::pin(stream::iter(head).chain(rest))))
            }
            None => Ok(Box::new(stream::iter(items))),
        }
    }

    async fn chat(&self, _request: &ConversationRequest) -> BackendResult<BackendReply> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.chat.clone().ok_or_else(|| stream_error("fallback down"))
    }
}

/// Orchestrator over an in-memory store with no greeting delay
pub fn orchestrator_with(
    store: Arc<dyn KeyValueStore>,
    remote: Arc<MockBackend>,
    local: Arc<MockBackend>,
) -> Orchestrator {
    let config = OrchestratorConfig {
        greeting_delay: std::time::Duration::ZERO,
        ..OrchestratorConfig::default()
    };
    Orchestrator::new(config, store, Backends::new(remote, local))
}

pub fn memory_store() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

//! The chat state machine: open/close, the message log, typing state, backend
//! routing and the send protocol with its fallback tiers.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use promochat_llm_api::{BackendReply, ChatBackend, ConversationRequest};
use promochat_storage::{HistoryStore, KeyValueStore, ModePreference, SessionIdentity};
use promochat_types::{AnchorRect, BackendMode, Message, MessageId, GREETING_DELAY_MS, HISTORY_WINDOW};

use crate::canned;
use crate::events::{ChatEvent, ChatSnapshot, ReplyTier, SendOutcome};
use crate::greeting;
use crate::message_log::MessageLog;
use crate::suggestions::{self, ParsedReply};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Pause before a greeting appears
    pub greeting_delay: Duration,
    /// Prior turns sent with each request
    pub history_window: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            greeting_delay: Duration::from_millis(GREETING_DELAY_MS),
            history_window: HISTORY_WINDOW,
        }
    }
}

/// The two interchangeable backends, one per [`BackendMode`]
#[derive(Clone)]
pub struct Backends {
    pub remote: Arc<dyn ChatBackend>,
    pub local: Arc<dyn ChatBackend>,
}

impl Backends {
    pub fn new(remote: Arc<dyn ChatBackend>, local: Arc<dyn ChatBackend>) -> Self {
        Self { remote, local }
    }

    pub fn for_mode(&self, mode: BackendMode) -> Arc<dyn ChatBackend> {
        match mode {
            BackendMode::Remote => Arc::clone(&self.remote),
            BackendMode::Local => Arc::clone(&self.local),
        }
    }
}

struct ChatState {
    is_open: bool,
    log: MessageLog,
    is_typing: bool,
    backend_mode: BackendMode,
    suggestions: Vec<String>,
    trigger_anchor: Option<AnchorRect>,
}

struct Inner {
    config: OrchestratorConfig,
    state: Mutex<ChatState>,
    history: HistoryStore,
    session: SessionIdentity,
    mode_preference: ModePreference,
    backends: Backends,
    events: broadcast::Sender<ChatEvent>,
    /// One send at a time; later sends queue here
    send_gate: tokio::sync::Mutex<()>,
}

/// Owns the chat session. Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    /// Restore history and mode from `store` and wire up the backends.
    pub fn new(config: OrchestratorConfig, store: Arc<dyn KeyValueStore>, backends: Backends) -> Self {
        let history = HistoryStore::new(Arc::clone(&store));
        let session = SessionIdentity::new(Arc::clone(&store));
        let mode_preference = ModePreference::new(store);

        let restored = history.load();
        let backend_mode = mode_preference.load();
        log::info!(
            "Chat restored with {} messages, backend mode {}",
            restored.len(),
            backend_mode
        );

        let state = ChatState {
            is_open: false,
            log: MessageLog::from_messages(restored),
            is_typing: false,
            backend_mode,
            suggestions: suggestions::default_suggestions(),
            trigger_anchor: None,
        };
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(state),
                history,
                session,
                mode_preference,
                backends,
                events,
                send_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.inner.events.subscribe()
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        let state = self.inner.state.lock();
        ChatSnapshot {
            is_open: state.is_open,
            messages: state.log.to_vec(),
            in_flight: state.log.in_flight().cloned(),
            is_typing: state.is_typing,
            backend_mode: state.backend_mode,
            suggestions: state.suggestions.clone(),
            trigger_anchor: state.trigger_anchor,
        }
    }

    pub fn session_id(&self) -> String {
        self.inner.session.session_id()
    }

    /// Open the chat surface.
    ///
    /// A greeting is appended after the configured delay when a trigger is
    /// given or nothing has been said yet.
    pub async fn open_chat(&self, trigger_text: Option<&str>, anchor: Option<AnchorRect>) {
        let trigger = trigger_text.map(str::trim).filter(|t| !t.is_empty());

        let needs_greeting = {
            let mut state = self.inner.state.lock();
            state.is_open = true;
            if anchor.is_some() {
                state.trigger_anchor = anchor;
            }
            self.emit(ChatEvent::Opened { anchor });
            trigger.is_some() || state.log.is_empty()
        };
        log::info!("Chat opened (trigger: {:?})", trigger);

        if !needs_greeting {
            return;
        }

        tokio::time::sleep(self.inner.config.greeting_delay).await;

        let parsed = suggestions::decode(&greeting::greeting_for(trigger));
        let message = Message::ai(parsed.body);

        let mut state = self.inner.state.lock();
        state.log.push(message.clone());
        state.suggestions = parsed.suggestions.clone();
        self.persist(&state.log);
        self.emit(ChatEvent::MessageAppended(message));
        self.emit(ChatEvent::SuggestionsChanged(parsed.suggestions));
    }

    /// Hide the chat surface. The log and any in-flight send are untouched.
    pub fn close_chat(&self) {
        let mut state = self.inner.state.lock();
        state.is_open = false;
        self.emit(ChatEvent::Closed);
        log::info!("Chat closed");
    }

    /// Forget the conversation, in memory and in storage.
    pub fn clear_chat(&self) {
        let mut state = self.inner.state.lock();
        state.log.clear();
        state.suggestions = suggestions::default_suggestions();
        self.inner.history.clear();
        self.emit(ChatEvent::Cleared);
        self.emit(ChatEvent::SuggestionsChanged(state.suggestions.clone()));
        log::info!("Chat cleared");
    }

    pub fn set_backend_mode(&self, mode: BackendMode) {
        let mut state = self.inner.state.lock();
        if state.backend_mode == mode {
            return;
        }
        state.backend_mode = mode;
        self.inner.mode_preference.save(mode);
        self.emit(ChatEvent::BackendModeChanged(mode));
        log::info!("Backend mode set to {}", mode);
    }

    /// Switch to the other backend and return the new mode
    pub fn toggle_backend_mode(&self) -> BackendMode {
        let next = self.inner.state.lock().backend_mode.toggled();
        self.set_backend_mode(next);
        next
    }

    /// Send a user message and settle the assistant's reply.
    ///
    /// Tries the selected backend's stream, then its single-shot call, then
    /// the canned table. Never fails; blank text is ignored and yields
    /// `None`. Concurrent calls are queued and run one after another.
    pub async fn send_message(&self, text: &str) -> Option<SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let _turn = self.inner.send_gate.lock().await;
        let session_id = self.inner.session.session_id();

        let (request, placeholder_id, mode) = {
            let mut state = self.inner.state.lock();
            let request = ConversationRequest::with_window(
                state.log.as_slice(),
                text,
                session_id,
                self.inner.config.history_window,
            );

            let user = Message::user(text);
            state.log.push(user.clone());
            let placeholder = Message::placeholder();
            let placeholder_id = state.log.begin_reply(placeholder.clone());
            state.is_typing = true;
            self.persist(&state.log);

            self.emit(ChatEvent::MessageAppended(user));
            self.emit(ChatEvent::MessageAppended(placeholder));
            self.emit(ChatEvent::TypingChanged(true));
            (request, placeholder_id, state.backend_mode)
        };

        let backend = self.inner.backends.for_mode(mode);
        log::info!("Sending message via {} backend", backend.name());

        let reply = self.request_reply(backend.as_ref(), &request, &placeholder_id).await;

        let outcome = match reply {
            Some((tier, reply)) => {
                let parsed = match mode {
                    BackendMode::Remote => suggestions::decode(&reply.content),
                    BackendMode::Local => suggestions::decode_body_only(&reply.content),
                };
                let chosen = pick_suggestions(&parsed, reply.suggestions.as_deref());
                self.settle_reply(&placeholder_id, parsed.body, chosen);
                SendOutcome {
                    message_id: placeholder_id,
                    tier,
                }
            }
            None => {
                let parsed = suggestions::decode(canned::reply_for(text));
                let message_id = self.replace_with_canned(&placeholder_id, parsed);
                SendOutcome {
                    message_id,
                    tier: ReplyTier::Canned,
                }
            }
        };

        log::debug!("Send settled via {:?}", outcome.tier);
        Some(outcome)
    }

    /// Stream first, then the single-shot call. `None` when both fail.
    async fn request_reply(
        &self,
        backend: &dyn ChatBackend,
        request: &ConversationRequest,
        placeholder_id: &MessageId,
    ) -> Option<(ReplyTier, BackendReply)> {
        let mut on_chunk = |chunk: &str| self.apply_chunk(placeholder_id, chunk);

        match backend.stream_chat(request, &mut on_chunk).await {
            Ok(full) if !full.trim().is_empty() => return Some((ReplyTier::Streamed, BackendReply::text(full))),
            Ok(_) => log::warn!("{} stream ended without any text", backend.name()),
            Err(e) => log::warn!("{} stream failed: {}", backend.name(), e),
        }

        match backend.chat(request).await {
            Ok(reply) if !reply.content.trim().is_empty() => Some((ReplyTier::Fallback, reply)),
            Ok(_) => {
                log::warn!("{} fallback returned an empty reply", backend.name());
                None
            }
            Err(e) => {
                log::warn!("{} fallback failed: {}", backend.name(), e);
                None
            }
        }
    }

    fn apply_chunk(&self, id: &MessageId, chunk: &str) {
        let mut state = self.inner.state.lock();
        let content = match state.log.append_to(id, chunk) {
            Some(content) => content.to_string(),
            None => {
                log::debug!("Dropping chunk for message {} that is no longer in the log", id);
                return;
            }
        };
        self.persist(&state.log);
        self.emit(ChatEvent::MessageUpdated {
            id: id.clone(),
            content,
        });
    }

    fn settle_reply(&self, id: &MessageId, body: String, suggestions: Vec<String>) {
        let mut state = self.inner.state.lock();
        if state.log.set_content(id, body.clone()) {
            self.emit(ChatEvent::MessageUpdated {
                id: id.clone(),
                content: body,
            });
        } else {
            log::debug!("Reply {} settled after the log was cleared", id);
        }
        state.log.settle(id);
        state.suggestions = suggestions.clone();
        state.is_typing = false;
        self.persist(&state.log);
        self.emit(ChatEvent::SuggestionsChanged(suggestions));
        self.emit(ChatEvent::TypingChanged(false));
    }

    /// Drop the unfilled placeholder and append the offline reply instead.
    fn replace_with_canned(&self, placeholder_id: &MessageId, parsed: ParsedReply) -> MessageId {
        let message = Message::ai(parsed.body);
        let message_id = message.id.clone();

        let mut state = self.inner.state.lock();
        if state.log.remove(placeholder_id).is_some() {
            self.emit(ChatEvent::MessageRemoved(placeholder_id.clone()));
        }
        state.log.push(message.clone());
        state.suggestions = parsed.suggestions.clone();
        state.is_typing = false;
        self.persist(&state.log);
        self.emit(ChatEvent::MessageAppended(message));
        self.emit(ChatEvent::SuggestionsChanged(parsed.suggestions));
        self.emit(ChatEvent::TypingChanged(false));

        message_id
    }

    /// Write the log through to storage; the empty log is never written.
    fn persist(&self, log: &MessageLog) {
        if log.is_empty() {
            return;
        }
        self.inner.history.save(log.as_slice());
        self.inner.session.update_activity();
    }

    fn emit(&self, event: ChatEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }
}

/// Suggestions from the text win; relay metadata is used only when the text
/// had no separator; otherwise the codec's defaults.
fn pick_suggestions(parsed: &ParsedReply, metadata: Option<&[String]>) -> Vec<String> {
    if !parsed.delimited {
        if let Some(items) = metadata {
            let cleaned = suggestions::clean_suggestions(items);
            if !cleaned.is_empty() {
                return cleaned;
            }
        }
    }
    parsed.suggestions.clone()
}

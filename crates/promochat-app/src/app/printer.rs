//! Turns chat events into terminal output.

use colored::Colorize;

use promochat_chat::suggestions::streaming_body;
use promochat_chat::{ChatEvent, ChatSnapshot};
use promochat_types::{Message, MessageId, Role};

/// Renders [`ChatEvent`]s as they arrive.
///
/// A streaming reply is printed incrementally on one line; the suggestion
/// suffix is never shown while it streams.
#[derive(Debug, Default)]
pub struct EventPrinter {
    current: Option<MessageId>,
    shown: String,
    pending_suggestions: Option<Vec<String>>,
}

impl EventPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to print for `event`; may be empty.
    pub fn render(&mut self, event: &ChatEvent) -> String {
        match event {
            ChatEvent::Opened { .. } => format!("{}\n", "Chat opened".bright_black()),
            ChatEvent::Closed => format!("{}\n", "Chat closed".bright_black()),
            ChatEvent::Cleared => format!("{}\n", "History cleared".bright_black()),
            ChatEvent::BackendModeChanged(mode) => {
                format!("{} {}\n", "Backend mode:".bright_black(), mode.as_str().bright_magenta())
            }
            ChatEvent::MessageAppended(message) => self.render_appended(message),
            ChatEvent::MessageUpdated { id, content } => self.render_update(id, content),
            ChatEvent::MessageRemoved(id) => {
                if self.current.as_ref() == Some(id) {
                    self.finish_reply();
                    "\n".to_string()
                } else {
                    String::new()
                }
            }
            ChatEvent::SuggestionsChanged(suggestions) => {
                if self.current.is_some() {
                    self.pending_suggestions = Some(suggestions.clone());
                    String::new()
                } else {
                    render_suggestions(suggestions)
                }
            }
            ChatEvent::TypingChanged(true) => String::new(),
            ChatEvent::TypingChanged(false) => {
                let mut out = String::new();
                if self.current.is_some() {
                    self.finish_reply();
                    out.push('\n');
                }
                if let Some(suggestions) = self.pending_suggestions.take() {
                    out.push_str(&render_suggestions(&suggestions));
                }
                out
            }
        }
    }

    fn render_appended(&mut self, message: &Message) -> String {
        match message.role {
            // The user's own line is already on screen
            Role::User | Role::System => String::new(),
            Role::Ai if message.content.is_empty() => self.start_reply(&message.id),
            Role::Ai => format!("{} {}\n", "Assistant:".bright_cyan().bold(), message.content),
        }
    }

    /// Catch up after missed events: pick up the in-flight reply from
    /// `snapshot` and print whatever of it is not on screen yet.
    pub fn resync(&mut self, snapshot: &ChatSnapshot) -> String {
        let Some(message) = snapshot
            .in_flight
            .as_ref()
            .and_then(|id| snapshot.messages.iter().find(|m| &m.id == id))
        else {
            return String::new();
        };

        let mut out = String::new();
        if self.current.as_ref() != Some(&message.id) {
            if self.current.is_some() {
                out.push('\n');
            }
            out.push_str(&self.start_reply(&message.id));
        }
        out.push_str(&self.render_update(&message.id, &message.content));
        out
    }

    fn start_reply(&mut self, id: &MessageId) -> String {
        self.current = Some(id.clone());
        self.shown.clear();
        format!("{} ", "Assistant:".bright_cyan().bold())
    }

    fn render_update(&mut self, id: &MessageId, content: &str) -> String {
        if self.current.is_none() {
            // Its placeholder was among the missed events
            let prefix = self.start_reply(id);
            return prefix + &self.render_update(id, content);
        }
        if self.current.as_ref() != Some(id) {
            return String::new();
        }

        let visible = streaming_body(content);
        if let Some(rest) = visible.strip_prefix(self.shown.as_str()) {
            let rest = rest.to_string();
            self.shown = visible.to_string();
            rest
        } else if self.shown.starts_with(visible) {
            // Settled body is a trimmed prefix of what is already shown
            String::new()
        } else {
            // Content replaced wholesale by the fallback reply
            self.shown = visible.to_string();
            format!("\n{} {}", "Assistant:".bright_cyan().bold(), visible)
        }
    }

    fn finish_reply(&mut self) {
        self.current = None;
        self.shown.clear();
    }
}

pub fn render_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        return String::new();
    }
    let items: Vec<String> = suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| format!("[{}] {}", i + 1, s))
        .collect();
    format!("{}\n", items.join("  ").bright_yellow())
}

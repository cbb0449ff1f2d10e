//! Ordered conversation log with in-place updates by message id.

use promochat_types::{Message, MessageId};

/// Messages in insertion order.
///
/// Only one assistant reply can be in flight at a time; chunks are applied to
/// it by id so that later appends never shift the target.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    in_flight: Option<MessageId>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            in_flight: None,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) -> MessageId {
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// Append an empty reply and mark it as the one being filled
    pub fn begin_reply(&mut self, placeholder: Message) -> MessageId {
        if let Some(previous) = self.in_flight.take() {
            log::debug!("Reply {} superseded before it settled", previous);
        }
        let id = self.push(placeholder);
        self.in_flight = Some(id.clone());
        id
    }

    /// The reply currently being filled, if any
    pub fn in_flight(&self) -> Option<&MessageId> {
        self.in_flight.as_ref()
    }

    /// Stop tracking `id` as in flight
    pub fn settle(&mut self, id: &MessageId) {
        if self.in_flight.as_ref() == Some(id) {
            self.in_flight = None;
        }
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    fn get_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| &m.id == id)
    }

    /// Concatenate `chunk` onto a message; returns the new content.
    pub fn append_to(&mut self, id: &MessageId, chunk: &str) -> Option<&str> {
        let message = self.get_mut(id)?;
        message.content.push_str(chunk);
        Some(message.content.as_str())
    }

    /// Replace a message's content wholesale
    pub fn set_content(&mut self, id: &MessageId, content: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(message) => {
                message.content = content.into();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &MessageId) -> Option<Message> {
        let index = self.messages.iter().position(|m| &m.id == id)?;
        self.settle(id);
        Some(self.messages.remove(index))
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.in_flight = None;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.clone()
    }
}

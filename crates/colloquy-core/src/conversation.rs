//! The ordered conversation log.
//!
//! Invariant: at most one system-role message exists, and it is always the
//! first entry when present. Messages are append-only apart from the explicit
//! `flush`, `replace`, and `truncate_to` operations.

use colloquy_types::{Message, Role};

/// An ordered log of conversation messages.
#[derive(Debug, Default, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system(text: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.set_system(text);
        conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn has_system(&self) -> bool {
        matches!(self.messages.first(), Some(m) if m.role == Role::System)
    }

    /// Insert or replace the leading system message.
    pub fn set_system(&mut self, text: impl Into<String>) {
        let message = Message::system(text);
        if self.has_system() {
            self.messages[0] = message;
        } else {
            self.messages.insert(0, message);
        }
    }

    /// Append a message. System-role messages route through [`set_system`]
    /// so the single-leading-system invariant holds.
    ///
    /// [`set_system`]: Conversation::set_system
    pub fn push(&mut self, message: Message) {
        if message.role == Role::System {
            if self.has_system() {
                self.messages[0] = message;
            } else {
                self.messages.insert(0, message);
            }
        } else {
            self.messages.push(message);
        }
    }

    /// Drop all history, keeping only the system message if present.
    pub fn flush(&mut self) {
        if self.has_system() {
            self.messages.truncate(1);
        } else {
            self.messages.clear();
        }
    }

    /// Replace the whole log, normalizing so the invariant holds: the first
    /// system message found moves to the front, surplus ones are dropped.
    pub fn replace(&mut self, messages: Vec<Message>) {
        let mut system = None;
        let mut rest = Vec::with_capacity(messages.len());
        for message in messages {
            if message.role == Role::System {
                if system.is_none() {
                    system = Some(message);
                }
            } else {
                rest.push(message);
            }
        }
        self.messages = rest;
        if let Some(system) = system {
            self.messages.insert(0, system);
        }
    }

    /// Keep only the last `n` non-system messages (plus the system message).
    pub fn truncate_to(&mut self, n: usize) {
        let offset = usize::from(self.has_system());
        let history = self.messages.len() - offset;
        if history > n {
            self.messages.drain(offset..offset + history - n);
        }
    }
}

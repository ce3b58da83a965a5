// crates/core/src/message.rs
use std::fmt;

use chrono::{DateTime, Utc};
use ulid::{Generator, Ulid};

use crate::text::ERROR_MARK;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "Você",
            Self::Assistant => "Agente",
        }
    }
}

/// One entry in a chat transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Ulid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Assistant messages that report a failure carry the error mark.
    pub fn is_error(&self) -> bool {
        self.role == Role::Assistant && self.content.starts_with(ERROR_MARK)
    }
}

/// Ordered transcript that hands out unique, increasing message ids.
///
/// Ids come from a monotonic ULID generator, so two messages appended in the
/// same millisecond still get distinct ids that sort in append order.
pub struct MessageLog {
    messages: Vec<Message>,
    ids: Generator,
}

impl MessageLog {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            ids: Generator::new(),
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) -> Message {
        let id = self.ids.generate().unwrap_or_else(|err| {
            // Random component overflowed inside one millisecond.
            tracing::debug!(error = %err, "monotonic ulid overflow, using fresh id");
            Ulid::new()
        });
        let message = Message {
            id,
            role,
            content: content.into(),
            created_at: Utc::now(),
        };
        self.messages.push(message.clone());
        message
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

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageLog")
            .field("messages", &self.messages)
            .finish_non_exhaustive()
    }
}

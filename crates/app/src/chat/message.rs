use chrono::{DateTime, Utc};

pub use crate::ids::ConversationId;

/// Stable identifier for one message. Allocated in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl MessageId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Chat speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Author {
    User,
    Assistant,
}

/// One immutable transcript entry.
///
/// Messages carry no pending flag. Whether a user message still waits for its
/// reply is tracked by the owning transcript, see
/// [`Transcript::is_awaiting_reply`](super::transcript::Transcript::is_awaiting_reply).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub content: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        id: MessageId,
        conversation_id: ConversationId,
        author: Author,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            conversation_id,
            content: content.into(),
            author,
            created_at,
        }
    }
}

/// Sidebar row for one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: String,
    pub last_message_preview: String,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
}

impl ConversationSummary {
    pub fn new(
        id: ConversationId,
        title: impl Into<String>,
        last_message_preview: impl Into<String>,
        updated_at: DateTime<Utc>,
        message_count: usize,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            last_message_preview: last_message_preview.into(),
            updated_at,
            message_count,
        }
    }

    /// Case-insensitive match on title or preview. An empty filter matches everything.
    pub fn matches(&self, filter: &str) -> bool {
        let filter = filter.trim().to_lowercase();
        filter.is_empty()
            || self.title.to_lowercase().contains(&filter)
            || self.last_message_preview.to_lowercase().contains(&filter)
    }
}

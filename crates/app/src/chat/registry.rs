use chrono::{DateTime, Duration, Utc};

use super::message::{ConversationId, ConversationSummary};

pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";
pub const MAX_TITLE_CHARS: usize = 48;
pub const MAX_PREVIEW_CHARS: usize = 80;

/// Conversation rows plus the single active selection.
///
/// The selection is held outside the rows and may name an id with no row yet,
/// which is how a freshly created conversation looks until its first message.
#[derive(Debug, Clone, Default)]
pub struct ConversationRegistry {
    conversations: Vec<ConversationSummary>,
    active: Option<ConversationId>,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_demo_conversations(now: DateTime<Utc>) -> Self {
        let rows = [
            ("1", "Grade 12 math exercises", "Solving quadratic equations...", Duration::minutes(2), 15),
            ("2", "Conversational English", "How to introduce yourself...", Duration::hours(1), 8),
            ("3", "Python basics", "For loops in Python...", Duration::hours(3), 23),
            ("4", "Literature review", "Character analysis of Tam...", Duration::days(1), 12),
            ("5", "Natural sciences", "Newton's laws...", Duration::days(2), 6),
        ];

        let conversations = rows
            .into_iter()
            .map(|(id, title, preview, age, count)| {
                ConversationSummary::new(ConversationId::from(id), title, preview, now - age, count)
            })
            .collect();

        Self {
            conversations,
            active: None,
        }
    }

    /// Rows whose title or preview contains `filter`, in insertion order.
    pub fn list(&self, filter: &str) -> Vec<&ConversationSummary> {
        self.conversations
            .iter()
            .filter(|conversation| conversation.matches(filter))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn get(&self, id: &ConversationId) -> Option<&ConversationSummary> {
        self.conversations.iter().find(|conversation| &conversation.id == id)
    }

    pub fn active(&self) -> Option<&ConversationId> {
        self.active.as_ref()
    }

    pub fn is_materialized(&self, id: &ConversationId) -> bool {
        self.get(id).is_some()
    }

    /// Sets the selection without checking that a row exists.
    pub fn select(&mut self, id: ConversationId) {
        self.active = Some(id);
    }

    pub fn clear_selection(&mut self) {
        self.active = None;
    }

    pub fn create(&mut self) -> ConversationId {
        let id = ConversationId::generate();
        tracing::debug!(conversation_id = %id, "conversation created");
        self.active = Some(id.clone());
        id
    }

    /// Removes the row and clears the selection when it pointed at it.
    pub fn delete(&mut self, id: &ConversationId) -> bool {
        let before = self.conversations.len();
        self.conversations.retain(|conversation| &conversation.id != id);
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        self.conversations.len() != before
    }

    /// Empties the row's activity when its transcript is wiped. The title stays.
    /// Returns false for an unmaterialized id.
    pub fn reset_activity(&mut self, id: &ConversationId, at: DateTime<Utc>) -> bool {
        let Some(conversation) = self
            .conversations
            .iter_mut()
            .find(|conversation| &conversation.id == id)
        else {
            return false;
        };

        conversation.last_message_preview.clear();
        conversation.message_count = 0;
        conversation.updated_at = at;
        true
    }

    /// Updates the row for a newly appended message, materializing it on first use.
    pub fn record_message(&mut self, id: &ConversationId, content: &str, at: DateTime<Utc>) {
        let preview = truncate_chars(content.trim(), MAX_PREVIEW_CHARS);
        match self.conversations.iter_mut().find(|conversation| &conversation.id == id) {
            Some(conversation) => {
                conversation.last_message_preview = preview;
                conversation.updated_at = at;
                conversation.message_count += 1;
            }
            None => {
                tracing::debug!(conversation_id = %id, "conversation materialized");
                self.conversations.push(ConversationSummary::new(
                    id.clone(),
                    title_from_first_message(content),
                    preview,
                    at,
                    1,
                ));
            }
        }
    }
}

pub fn title_from_first_message(content: &str) -> String {
    match content.trim() {
        "" => DEFAULT_CONVERSATION_TITLE.to_string(),
        trimmed => truncate_chars(trimmed, MAX_TITLE_CHARS),
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tnai_replies::ReplyToken;

use super::message::{Author, ConversationId, Message, MessageId};

/// Which view the chat area shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatSurface {
    Welcome,
    Transcript(ConversationId),
}

/// Ordered log for one conversation plus its in-flight replies.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    // token -> user message being answered
    pending: BTreeMap<ReplyToken, MessageId>,
    has_started: bool,
}

impl Transcript {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    /// True while at least one reply is in flight. Drives the single typing indicator.
    pub fn is_typing(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_tokens(&self) -> impl Iterator<Item = ReplyToken> + '_ {
        self.pending.keys().copied()
    }

    pub fn is_awaiting_reply(&self, message_id: MessageId) -> bool {
        self.pending.values().any(|pending| *pending == message_id)
    }
}

/// Every conversation's transcript, keyed by conversation id.
#[derive(Debug, Default)]
pub struct TranscriptBook {
    transcripts: HashMap<ConversationId, Transcript>,
    next_message_id: u64,
}

impl TranscriptBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, conversation_id: &ConversationId) -> Option<&Transcript> {
        self.transcripts.get(conversation_id)
    }

    pub fn messages(&self, conversation_id: &ConversationId) -> &[Message] {
        self.get(conversation_id)
            .map(Transcript::messages)
            .unwrap_or_default()
    }

    pub fn is_typing(&self, conversation_id: &ConversationId) -> bool {
        self.get(conversation_id).is_some_and(Transcript::is_typing)
    }

    pub fn has_started(&self, conversation_id: &ConversationId) -> bool {
        self.get(conversation_id).is_some_and(Transcript::has_started)
    }

    pub fn surface(&self, active: Option<&ConversationId>) -> ChatSurface {
        match active {
            Some(id) if self.has_started(id) => ChatSurface::Transcript(id.clone()),
            Some(_) | None => ChatSurface::Welcome,
        }
    }

    pub fn mark_started(&mut self, conversation_id: &ConversationId) {
        self.entry(conversation_id).has_started = true;
    }

    pub fn append(
        &mut self,
        conversation_id: &ConversationId,
        author: Author,
        content: &str,
        at: DateTime<Utc>,
    ) -> MessageId {
        self.next_message_id += 1;
        let id = MessageId::new(self.next_message_id);
        self.entry(conversation_id).messages.push(Message::new(
            id,
            conversation_id.clone(),
            author,
            content,
            at,
        ));
        id
    }

    /// Records that `token` will answer `message_id`.
    pub fn begin_reply(
        &mut self,
        conversation_id: &ConversationId,
        token: ReplyToken,
        message_id: MessageId,
    ) {
        self.entry(conversation_id).pending.insert(token, message_id);
    }

    /// Appends the assistant reply for `token`. Returns `None` when the token is no
    /// longer pending, so late or cancelled replies never land.
    pub fn complete_reply(
        &mut self,
        conversation_id: &ConversationId,
        token: ReplyToken,
        content: &str,
        at: DateTime<Utc>,
    ) -> Option<MessageId> {
        self.transcripts
            .get_mut(conversation_id)?
            .pending
            .remove(&token)?;
        Some(self.append(conversation_id, Author::Assistant, content, at))
    }

    /// Drops a pending token without appending anything.
    pub fn abandon_reply(&mut self, conversation_id: &ConversationId, token: ReplyToken) -> bool {
        self.transcripts
            .get_mut(conversation_id)
            .is_some_and(|transcript| transcript.pending.remove(&token).is_some())
    }

    /// Clears the conversation's messages, pending replies and started flag.
    /// Returns the tokens that were pending.
    pub fn reset(&mut self, conversation_id: &ConversationId) -> Vec<ReplyToken> {
        self.transcripts
            .insert(conversation_id.clone(), Transcript::default())
            .map(|old| old.pending.into_keys().collect())
            .unwrap_or_default()
    }

    pub fn remove(&mut self, conversation_id: &ConversationId) -> Vec<ReplyToken> {
        self.transcripts
            .remove(conversation_id)
            .map(|old| old.pending.into_keys().collect())
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.transcripts.clear();
    }

    fn entry(&mut self, conversation_id: &ConversationId) -> &mut Transcript {
        self.transcripts.entry(conversation_id.clone()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(id: &str) -> ConversationId {
        ConversationId::from(id)
    }

    #[test]
    fn replies_append_after_their_prompts_in_creation_order() {
        let mut book = TranscriptBook::new();
        let c = conversation("c");
        let now = Utc::now();

        let first = book.append(&c, Author::User, "one", now);
        book.begin_reply(&c, ReplyToken::new(1), first);
        let second = book.append(&c, Author::User, "two", now);
        book.begin_reply(&c, ReplyToken::new(2), second);
        assert!(book.is_typing(&c));
        assert!(book.get(&c).unwrap().is_awaiting_reply(first));

        book.complete_reply(&c, ReplyToken::new(1), "re one", now).unwrap();
        assert!(book.is_typing(&c));
        book.complete_reply(&c, ReplyToken::new(2), "re two", now).unwrap();
        assert!(!book.is_typing(&c));

        let messages = book.messages(&c);
        let contents = messages.iter().map(|m| m.content.as_str()).collect::<Vec<_>>();
        assert_eq!(contents, vec!["one", "two", "re one", "re two"]);
        assert!(messages.windows(2).all(|pair| pair[0].id < pair[1].id));
    }

    #[test]
    fn unknown_token_is_ignored() {
        let mut book = TranscriptBook::new();
        let c = conversation("c");

        assert_eq!(book.complete_reply(&c, ReplyToken::new(9), "late", Utc::now()), None);
        assert!(book.messages(&c).is_empty());
    }

    #[test]
    fn reset_returns_pending_tokens_and_clears_started() {
        let mut book = TranscriptBook::new();
        let c = conversation("c");
        let id = book.append(&c, Author::User, "hi", Utc::now());
        book.begin_reply(&c, ReplyToken::new(4), id);
        book.mark_started(&c);

        assert_eq!(book.reset(&c), vec![ReplyToken::new(4)]);
        assert!(!book.has_started(&c));
        assert!(book.messages(&c).is_empty());
    }

    #[test]
    fn surface_depends_on_started_flag() {
        let mut book = TranscriptBook::new();
        let c = conversation("c");

        assert_eq!(book.surface(None), ChatSurface::Welcome);
        assert_eq!(book.surface(Some(&c)), ChatSurface::Welcome);

        book.mark_started(&c);
        assert_eq!(book.surface(Some(&c)), ChatSurface::Transcript(c.clone()));
    }
}

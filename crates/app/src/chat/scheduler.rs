use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::SelectAll;
use tnai_replies::{
    ReplyEvent, ReplyEventStream, ReplyPrompt, ReplyProvider, ReplyRequest, ReplyResult,
    ReplyTarget, ReplyToken,
};

use super::message::ConversationId;

/// Owns every in-flight reply and multiplexes their completions.
///
/// `schedule` spawns the reply worker, so it must run inside a tokio runtime.
pub struct ReplyScheduler {
    provider: Arc<dyn ReplyProvider>,
    in_flight: SelectAll<ReplyEventStream>,
    next_token: u64,
}

impl ReplyScheduler {
    pub fn new(provider: Arc<dyn ReplyProvider>) -> Self {
        Self {
            provider,
            in_flight: SelectAll::new(),
            next_token: 0,
        }
    }

    /// Schedules one reply routed to `conversation_id` as captured now.
    pub fn schedule(
        &mut self,
        conversation_id: &ConversationId,
        prompt: ReplyPrompt,
        delay: Duration,
    ) -> ReplyResult<ReplyTarget> {
        self.next_token += 1;
        let target = ReplyTarget::new(conversation_id.as_str(), ReplyToken::new(self.next_token));

        let handle = self
            .provider
            .schedule(ReplyRequest::new(target.clone(), prompt, delay))?;
        tokio::spawn(handle.worker);
        self.in_flight.push(handle.stream);

        tracing::debug!(
            provider_id = %self.provider.id(),
            target = ?target,
            delay_ms = delay.as_millis() as u64,
            "reply scheduled"
        );
        Ok(target)
    }

    pub fn cancel_conversation(&mut self, conversation_id: &ConversationId) -> usize {
        self.cancel_where(|target| target.conversation_id == conversation_id.as_str())
    }

    pub fn cancel_tokens(&mut self, tokens: &[ReplyToken]) -> usize {
        self.cancel_where(|target| tokens.contains(&target.token))
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.in_flight.len();
        // Dropping a stream signals its worker to stop.
        self.in_flight = SelectAll::new();
        count
    }

    pub fn has_pending(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Waits for the next completion. Returns `None` right away when nothing is in flight.
    pub async fn next_event(&mut self) -> Option<ReplyEvent> {
        if self.in_flight.is_empty() {
            return None;
        }
        self.in_flight.next().await
    }

    fn cancel_where(&mut self, predicate: impl Fn(&ReplyTarget) -> bool) -> usize {
        let mut cancelled = 0;
        for stream in self.in_flight.iter_mut() {
            if predicate(stream.target()) && stream.cancel() {
                tracing::debug!(target = ?stream.target(), "reply cancelled");
                cancelled += 1;
            }
        }
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use tnai_replies::{ReplyPayload, create_reply_provider};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn completions_carry_the_captured_conversation() {
        let mut scheduler = ReplyScheduler::new(create_reply_provider());
        let a = ConversationId::from("a");
        let b = ConversationId::from("b");

        scheduler
            .schedule(&a, ReplyPrompt::NewAdventure, Duration::from_millis(1_500))
            .unwrap();
        scheduler
            .schedule(&b, ReplyPrompt::Faq("2".into()), Duration::from_millis(1_000))
            .unwrap();

        let first = scheduler.next_event().await.unwrap();
        let second = scheduler.next_event().await.unwrap();

        assert_eq!(first.target.conversation_id, "b");
        assert_eq!(second.target.conversation_id, "a");
        assert!(matches!(second.payload, ReplyPayload::Completed(ref text) if !text.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_conversation_produces_no_events() {
        let mut scheduler = ReplyScheduler::new(create_reply_provider());
        let a = ConversationId::from("a");
        let b = ConversationId::from("b");
        scheduler
            .schedule(&a, ReplyPrompt::FreeText("hi".into()), Duration::from_millis(2_000))
            .unwrap();
        let kept = scheduler
            .schedule(&b, ReplyPrompt::FreeText("yo".into()), Duration::from_millis(2_000))
            .unwrap();

        assert_eq!(scheduler.cancel_conversation(&a), 1);

        let event = scheduler.next_event().await.unwrap();
        assert_eq!(event.target, kept);
        assert_eq!(scheduler.next_event().await, None);
        assert!(!scheduler.has_pending());
    }

    #[tokio::test]
    async fn next_event_returns_immediately_when_idle() {
        let mut scheduler = ReplyScheduler::new(create_reply_provider());

        assert_eq!(scheduler.next_event().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_prompt_schedules_nothing() {
        let mut scheduler = ReplyScheduler::new(create_reply_provider());

        let result = scheduler.schedule(
            &ConversationId::from("a"),
            ReplyPrompt::Faq("missing".into()),
            Duration::from_millis(1_000),
        );

        assert!(result.is_err());
        assert!(!scheduler.has_pending());
    }
}

use snafu::{OptionExt, ensure};
use tokio::sync::{mpsc, oneshot};

use super::provider::{
    EmptyPromptSnafu, ReplyEvent, ReplyHandle, ReplyPayload, ReplyPrompt, ReplyProvider,
    ReplyRequest, ReplyResult, ReplyWorker, UnknownFaqSnafu, make_event_stream,
};
use super::script::{
    CONTINUE_ADVENTURE_REPLY, Faq, NEW_ADVENTURE_REPLY, default_faqs, find_faq, free_text_reply,
};

pub const CANNED_PROVIDER_ID: &str = "canned";

/// Answers every prompt with scripted text after a fixed delay.
pub struct CannedReplyProvider {
    faqs: Vec<Faq>,
}

impl Default for CannedReplyProvider {
    fn default() -> Self {
        Self::new(default_faqs())
    }
}

impl CannedReplyProvider {
    pub fn new(faqs: Vec<Faq>) -> Self {
        Self { faqs }
    }

    pub fn faqs(&self) -> &[Faq] {
        &self.faqs
    }

    fn compose(&self, request: &ReplyRequest) -> ReplyResult<String> {
        match &request.prompt {
            ReplyPrompt::FreeText(question) => {
                ensure!(
                    !question.trim().is_empty(),
                    EmptyPromptSnafu {
                        stage: "canned-compose-free-text",
                        target: request.target.clone(),
                    }
                );
                Ok(free_text_reply(question.trim()))
            }
            ReplyPrompt::NewAdventure => Ok(NEW_ADVENTURE_REPLY.to_string()),
            ReplyPrompt::ContinueAdventure => Ok(CONTINUE_ADVENTURE_REPLY.to_string()),
            ReplyPrompt::Faq(faq_id) => find_faq(&self.faqs, faq_id)
                .map(|faq| faq.answer.clone())
                .context(UnknownFaqSnafu {
                    stage: "canned-compose-faq",
                    faq_id: faq_id.clone(),
                }),
        }
    }

    async fn run_reply_worker(
        request: ReplyRequest,
        text: String,
        event_tx: mpsc::UnboundedSender<ReplyEvent>,
        mut cancel_rx: oneshot::Receiver<()>,
    ) {
        let target = request.target;

        tokio::select! {
            _ = &mut cancel_rx => {
                tracing::debug!(target = ?target, "canned reply cancelled before delivery");
            }
            _ = tokio::time::sleep(request.delay) => {
                let delivered = event_tx
                    .send(ReplyEvent {
                        target: target.clone(),
                        payload: ReplyPayload::Completed(text),
                    })
                    .is_ok();
                tracing::trace!(target = ?target, delivered, "canned reply ready");
            }
        }
    }
}

impl ReplyProvider for CannedReplyProvider {
    fn id(&self) -> &str {
        CANNED_PROVIDER_ID
    }

    fn name(&self) -> &str {
        "Canned Tutor"
    }

    fn schedule(&self, request: ReplyRequest) -> ReplyResult<ReplyHandle> {
        let text = self.compose(&request)?;

        let (event_tx, stream, cancel_rx) = make_event_stream(request.target.clone());
        let worker: ReplyWorker =
            Box::pin(Self::run_reply_worker(request, text, event_tx, cancel_rx));

        Ok(ReplyHandle { stream, worker })
    }
}

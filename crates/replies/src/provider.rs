use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use snafu::Snafu;
use tokio::sync::{mpsc, oneshot};

/// Identifies one scheduled reply so completions never clobber each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReplyToken(pub u64);

impl ReplyToken {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Routing key captured when a reply is scheduled.
///
/// Completions are applied to `conversation_id`, never to whatever conversation
/// happens to be active when the delay elapses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplyTarget {
    pub conversation_id: String,
    pub token: ReplyToken,
}

impl ReplyTarget {
    pub fn new(conversation_id: impl Into<String>, token: ReplyToken) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            token,
        }
    }
}

/// What the simulated assistant is answering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyPrompt {
    FreeText(String),
    NewAdventure,
    ContinueAdventure,
    Faq(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub target: ReplyTarget,
    pub prompt: ReplyPrompt,
    pub delay: Duration,
}

impl ReplyRequest {
    pub fn new(target: ReplyTarget, prompt: ReplyPrompt, delay: Duration) -> Self {
        Self {
            target,
            prompt,
            delay,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyPayload {
    Completed(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEvent {
    pub target: ReplyTarget,
    pub payload: ReplyPayload,
}

pub type ReplyWorker = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
pub type ReplyResult<T> = Result<T, ReplyError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReplyError {
    #[snafu(display("reply request for {target:?} has an empty prompt"))]
    EmptyPrompt {
        stage: &'static str,
        target: ReplyTarget,
    },
    #[snafu(display("no canned answer exists for FAQ '{faq_id}'"))]
    UnknownFaq { stage: &'static str, faq_id: String },
}

pub struct ReplyEventStream {
    target: ReplyTarget,
    events: mpsc::UnboundedReceiver<ReplyEvent>,
    cancel_tx: Option<oneshot::Sender<()>>,
}

pub struct ReplyHandle {
    pub stream: ReplyEventStream,
    pub worker: ReplyWorker,
}

impl ReplyEventStream {
    pub(crate) fn new(
        target: ReplyTarget,
        events: mpsc::UnboundedReceiver<ReplyEvent>,
        cancel_tx: oneshot::Sender<()>,
    ) -> Self {
        Self {
            target,
            events,
            cancel_tx: Some(cancel_tx),
        }
    }

    pub fn target(&self) -> &ReplyTarget {
        &self.target
    }

    pub async fn recv(&mut self) -> Option<ReplyEvent> {
        self.events.recv().await
    }

    /// Asks the worker to stop. Returns false when it already finished or was cancelled.
    pub fn cancel(&mut self) -> bool {
        self.cancel_tx
            .take()
            .map(|tx| tx.send(()).is_ok())
            .unwrap_or(false)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_tx.is_none()
    }
}

impl Stream for ReplyEventStream {
    type Item = ReplyEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for ReplyEventStream {
    fn drop(&mut self) {
        if let Some(cancel_tx) = self.cancel_tx.take() {
            let _ = cancel_tx.send(());
        }
    }
}

pub trait ReplyProvider: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn schedule(&self, request: ReplyRequest) -> ReplyResult<ReplyHandle>;
}

pub(crate) fn make_event_stream(
    target: ReplyTarget,
) -> (
    mpsc::UnboundedSender<ReplyEvent>,
    ReplyEventStream,
    oneshot::Receiver<()>,
) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (cancel_tx, cancel_rx) = oneshot::channel();
    (
        event_tx,
        ReplyEventStream::new(target, event_rx, cancel_tx),
        cancel_rx,
    )
}

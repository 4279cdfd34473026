pub mod canned;
pub mod provider;
pub mod script;

use std::sync::Arc;

pub use canned::{CANNED_PROVIDER_ID, CannedReplyProvider};
pub use provider::{
    ReplyError, ReplyEvent, ReplyEventStream, ReplyHandle, ReplyPayload, ReplyPrompt,
    ReplyProvider, ReplyRequest, ReplyResult, ReplyTarget, ReplyToken, ReplyWorker,
};
pub use script::{
    CONTINUE_ADVENTURE_PROMPT, CONTINUE_ADVENTURE_REPLY, Faq, NEW_ADVENTURE_PROMPT,
    NEW_ADVENTURE_REPLY, default_faqs, find_faq, free_text_reply,
};

pub fn create_reply_provider() -> Arc<dyn ReplyProvider> {
    Arc::new(CannedReplyProvider::default())
}

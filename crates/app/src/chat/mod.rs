/// Input buffer.
pub mod composer;
/// Display-time link detection.
pub mod links;
/// Domain entities.
pub mod message;
/// Conversation rows and the active selection.
pub mod registry;
/// In-flight simulated replies.
pub mod scheduler;
/// Per-conversation message logs.
pub mod transcript;

pub use composer::Composer;
pub use links::{Segment, render_message, render_segments};
pub use message::{Author, ConversationId, ConversationSummary, Message, MessageId};
pub use registry::ConversationRegistry;
pub use scheduler::ReplyScheduler;
pub use transcript::{ChatSurface, Transcript, TranscriptBook};

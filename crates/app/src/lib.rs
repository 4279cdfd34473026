#![deny(unsafe_code)]

/// The client session context that ties every state machine together.
pub mod app;
pub mod attachments;
/// Sign-in phases, form checks and the simulated credential service.
pub mod auth;
/// Conversations, transcripts and simulated replies.
pub mod chat;
pub mod ids;
pub mod notes;
pub mod notice;
pub mod panels;
/// Line-oriented terminal front end.
pub mod repl;
pub mod session;
/// Settings persistence.
pub mod settings;
pub mod usage;

pub use app::{Surface, Tab, TutorApp};

use super::message::{Author, Message};

pub const KNOWLEDGE_BASE_PHRASE: &str = "knowledge base";

/// Display-time piece of a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// Opens the knowledge-base overlay. Keeps the original casing.
    KnowledgeBaseLink(String),
}

/// Splits an assistant message so every "knowledge base" mention becomes a link.
/// User messages are returned as one text segment.
pub fn render_message(message: &Message) -> Vec<Segment> {
    match message.author {
        Author::Assistant => render_segments(&message.content),
        Author::User => vec![Segment::Text(message.content.clone())],
    }
}

pub fn render_segments(content: &str) -> Vec<Segment> {
    // ASCII lowercasing keeps byte offsets aligned with `content`.
    let haystack = content.to_ascii_lowercase();
    let mut segments = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = haystack[cursor..].find(KNOWLEDGE_BASE_PHRASE) {
        let start = cursor + offset;
        let end = start + KNOWLEDGE_BASE_PHRASE.len();
        if start > cursor {
            segments.push(Segment::Text(content[cursor..start].to_string()));
        }
        segments.push(Segment::KnowledgeBaseLink(content[start..end].to_string()));
        cursor = end;
    }

    if cursor < content.len() {
        segments.push(Segment::Text(content[cursor..].to_string()));
    }
    segments
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::chat::message::{ConversationId, MessageId};

    #[test]
    fn mentions_become_links_in_any_case() {
        let segments = render_segments("Open the Knowledge Base or the KNOWLEDGE BASE.");

        assert_eq!(
            segments,
            vec![
                Segment::Text("Open the ".to_string()),
                Segment::KnowledgeBaseLink("Knowledge Base".to_string()),
                Segment::Text(" or the ".to_string()),
                Segment::KnowledgeBaseLink("KNOWLEDGE BASE".to_string()),
                Segment::Text(".".to_string()),
            ]
        );
    }

    #[test]
    fn text_without_mentions_is_one_segment() {
        assert_eq!(
            render_segments("Định luật Newton"),
            vec![Segment::Text("Định luật Newton".to_string())]
        );
        assert!(render_segments("").is_empty());
    }

    #[test]
    fn user_messages_are_never_linked() {
        let message = Message::new(
            MessageId::new(1),
            ConversationId::from("c"),
            Author::User,
            "my knowledge base",
            Utc::now(),
        );

        assert_eq!(
            render_message(&message),
            vec![Segment::Text("my knowledge base".to_string())]
        );
    }
}

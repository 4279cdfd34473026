/// One entry on the welcome screen's frequently-asked list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Faq {
    pub id: String,
    pub question: String,
    pub answer: String,
}

impl Faq {
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
        }
    }
}

pub const NEW_ADVENTURE_PROMPT: &str = "I want to start a new learning adventure!";

pub const NEW_ADVENTURE_REPLY: &str = "🎉 Wonderful! Welcome to a brand new learning adventure.\n\n\
📚 **Here is what we can explore together:**\n\
• Mathematics, from the basics to advanced topics\n\
• Science: physics, chemistry and biology\n\
• Languages: English grammar and vocabulary\n\
• Programming with Python, JavaScript and more\n\
• Study skills and logical thinking\n\n\
💡 **To get started, tell me:**\n\
1. Which topic would you like to learn?\n\
2. How comfortable are you with it today?\n\
3. What goal are you working towards?";

pub const CONTINUE_ADVENTURE_PROMPT: &str = "I want to continue my previous learning adventure.";

pub const CONTINUE_ADVENTURE_REPLY: &str = "🔄 Welcome back! Let's pick up where we left off.\n\n\
📖 **Recent topics:**\n\
• Quadratic equations (mathematics)\n\
• Present perfect tense (English)\n\
• Sorting algorithms (programming)\n\n\
🎯 **We can:**\n\
1. Review what you already learned\n\
2. Practice with new exercises\n\
3. Explore a related topic\n\
4. Clear up any open questions\n\n\
💭 What would you like to do next?";

pub fn free_text_reply(question: &str) -> String {
    format!(
        "Great question! Based on \"{question}\", here is how I suggest we approach it:\n\n\
🎯 **Breaking it down:**\nWe'll go through the idea step by step.\n\n\
💡 **Explanation:**\nI'll explain the key concepts in plain language.\n\n\
✅ **Worked example:**\nThen we'll try a concrete example together.\n\n\
Would you like me to go deeper on any part? 🤓"
    )
}

pub fn default_faqs() -> Vec<Faq> {
    vec![
        Faq::new(
            "1",
            "Can you explain a lecture to me again?",
            "Of course! Upload the lecture notes to your Knowledge Base and I'll walk you \
             through them in simpler terms. You can also ask me about the topic right here.",
        ),
        Faq::new(
            "2",
            "How should I practice solving exercises?",
            "Practice a little every day and make sure you understand the underlying concepts. \
             I can add exercises on related topics to the Knowledge Base, or you can ask me \
             about any topic right here.",
        ),
        Faq::new(
            "3",
            "What features do you have?",
            "I support you throughout your learning journey. Check the user guide in the \
             left-hand menu for a tour of every feature, or join the community to discuss \
             with other learners. How would you like to begin?",
        ),
        Faq::new(
            "4",
            "How do I get the most out of you?",
            "Ask specific questions about what you want to understand so I can break them \
             down. The user guide in the left-hand menu has more tips. How would you like \
             to begin?",
        ),
    ]
}

pub fn find_faq<'a>(faqs: &'a [Faq], faq_id: &str) -> Option<&'a Faq> {
    faqs.iter().find(|faq| faq.id == faq_id)
}

use chrono::{DateTime, Duration, Utc};

use crate::ids::NoteId;

pub const DEFAULT_NOTE_TITLE: &str = "New note";
pub const NEW_NOTE_TAG: &str = "new";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

/// Notes shown in the side panel, newest first.
#[derive(Debug, Clone, Default)]
pub struct NotesBook {
    notes: Vec<Note>,
    active: Option<NoteId>,
}

impl NotesBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_demo_notes(now: DateTime<Utc>) -> Self {
        let notes = vec![
            Note {
                id: NoteId::from("1"),
                title: "Math formulas".to_string(),
                content: "Quadratic equation: ax² + bx + c = 0\nDiscriminant: Δ = b² - 4ac\n\n\
                          Roots:\n- Δ > 0: two distinct roots\n- Δ = 0: one double root\n\
                          - Δ < 0: no real roots"
                    .to_string(),
                updated_at: now - Duration::hours(1),
                tags: vec!["Math".to_string(), "Equations".to_string()],
            },
            Note {
                id: NoteId::from("2"),
                title: "English vocabulary".to_string(),
                content: "Education\nKnowledge\nLearning\nStudy\nPractice".to_string(),
                updated_at: now - Duration::hours(2),
                tags: vec!["English".to_string(), "Vocabulary".to_string()],
            },
        ];

        Self {
            notes,
            active: None,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }

    pub fn active(&self) -> Option<&Note> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    pub fn active_id(&self) -> Option<&NoteId> {
        self.active.as_ref()
    }

    /// Prepends a note and makes it active. Returns `None` when both fields are blank.
    pub fn create(&mut self, title: &str, content: &str, now: DateTime<Utc>) -> Option<NoteId> {
        if title.trim().is_empty() && content.trim().is_empty() {
            return None;
        }

        let title = match title.trim() {
            "" => DEFAULT_NOTE_TITLE.to_string(),
            trimmed => trimmed.to_string(),
        };
        let note = Note {
            id: NoteId::generate(),
            title,
            content: content.to_string(),
            updated_at: now,
            tags: vec![NEW_NOTE_TAG.to_string()],
        };
        let id = note.id.clone();
        self.notes.insert(0, note);
        self.active = Some(id.clone());
        Some(id)
    }

    pub fn update(
        &mut self,
        id: &NoteId,
        title: Option<&str>,
        content: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(note) = self.notes.iter_mut().find(|note| &note.id == id) else {
            return false;
        };

        if let Some(title) = title.map(str::trim).filter(|title| !title.is_empty()) {
            note.title = title.to_string();
        }
        if let Some(content) = content {
            note.content = content.to_string();
        }
        note.updated_at = now;
        true
    }

    pub fn delete(&mut self, id: &NoteId) -> bool {
        let before = self.notes.len();
        self.notes.retain(|note| &note.id != id);
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        self.notes.len() != before
    }

    pub fn select(&mut self, id: Option<NoteId>) {
        self.active = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_note_is_not_created() {
        let mut book = NotesBook::new();

        assert_eq!(book.create("  ", "\n", Utc::now()), None);
        assert!(book.notes().is_empty());
    }

    #[test]
    fn new_note_goes_first_with_default_title_and_becomes_active() {
        let now = Utc::now();
        let mut book = NotesBook::with_demo_notes(now);

        let id = book.create("", "remember the quiz", now).unwrap();

        assert_eq!(book.notes()[0].id, id);
        assert_eq!(book.notes()[0].title, DEFAULT_NOTE_TITLE);
        assert_eq!(book.notes()[0].tags, vec![NEW_NOTE_TAG.to_string()]);
        assert_eq!(book.active_id(), Some(&id));
    }

    #[test]
    fn deleting_the_active_note_clears_selection() {
        let now = Utc::now();
        let mut book = NotesBook::with_demo_notes(now);
        let id = NoteId::from("1");
        book.select(Some(id.clone()));

        assert!(book.delete(&id));
        assert!(book.active().is_none());
        assert_eq!(book.notes().len(), 1);
        assert!(!book.delete(&id));
    }

    #[test]
    fn update_keeps_title_when_blank() {
        let now = Utc::now();
        let mut book = NotesBook::with_demo_notes(now);
        let id = NoteId::from("2");

        assert!(book.update(&id, Some(" "), Some("Study"), now));

        let note = book.get(&id).unwrap();
        assert_eq!(note.title, "English vocabulary");
        assert_eq!(note.content, "Study");
        assert_eq!(note.updated_at, now);
    }
}

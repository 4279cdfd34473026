use snafu::{Snafu, ensure};

use crate::ids::AttachmentId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentKind {
    Document { size: String, format: String },
    KnowledgeBase { item_count: u32, description: String },
}

impl AttachmentKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Document { .. } => "document",
            Self::KnowledgeBase { .. } => "knowledge base",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub id: AttachmentId,
    pub display_name: String,
    pub kind: AttachmentKind,
}

impl AttachmentRef {
    pub fn document(
        id: impl Into<AttachmentId>,
        display_name: impl Into<String>,
        size: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            kind: AttachmentKind::Document {
                size: size.into(),
                format: format.into(),
            },
        }
    }

    pub fn knowledge_base(
        id: impl Into<AttachmentId>,
        display_name: impl Into<String>,
        item_count: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            kind: AttachmentKind::KnowledgeBase {
                item_count,
                description: description.into(),
            },
        }
    }

    pub fn description(&self) -> Option<&str> {
        match &self.kind {
            AttachmentKind::KnowledgeBase { description, .. } => Some(description),
            AttachmentKind::Document { .. } => None,
        }
    }

    /// Case-insensitive match on name or description.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.display_name.to_lowercase().contains(&query)
            || self
                .description()
                .is_some_and(|description| description.to_lowercase().contains(&query))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AttachmentError {
    #[snafu(display("\"{name}\" is already attached"))]
    Duplicate {
        stage: &'static str,
        id: AttachmentId,
        name: String,
    },
}

/// Attached items, unique by id, in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct AttachmentSet {
    items: Vec<AttachmentRef>,
}

impl AttachmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: AttachmentRef) -> Result<(), AttachmentError> {
        ensure!(
            !self.contains(&item.id),
            DuplicateSnafu {
                stage: "attachment-add",
                id: item.id.clone(),
                name: item.display_name.clone(),
            }
        );
        self.items.push(item);
        Ok(())
    }

    pub fn remove(&mut self, id: &AttachmentId) -> Option<AttachmentRef> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn contains(&self, id: &AttachmentId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    pub fn items(&self) -> &[AttachmentRef] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

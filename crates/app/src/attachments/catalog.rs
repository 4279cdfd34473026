use snafu::ensure;

use super::set::AttachmentRef;
use crate::auth::validation::{MissingKnowledgeBaseNameSnafu, ValidationError};
use crate::ids::AttachmentId;

/// Everything that can be attached: uploaded documents and knowledge bases.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    documents: Vec<AttachmentRef>,
    knowledge_bases: Vec<AttachmentRef>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_demo_items() -> Self {
        let documents = vec![
            AttachmentRef::document("doc-1", "Math textbook.pdf", "3.2 MB", "PDF"),
            AttachmentRef::document("doc-2", "Physics exercises.docx", "1.8 MB", "DOCX"),
            AttachmentRef::document("doc-3", "Sample exam.pdf", "2.1 MB", "PDF"),
            AttachmentRef::document("doc-4", "Chemistry formulas.xlsx", "856 KB", "XLSX"),
            AttachmentRef::document("doc-5", "Biology lecture.pdf", "4.2 MB", "PDF"),
            AttachmentRef::document("doc-6", "English vocabulary.docx", "1.2 MB", "DOCX"),
        ];
        let knowledge_bases = vec![
            AttachmentRef::knowledge_base("kb1", "High school math", 128, "Math from grade 10 to 12"),
            AttachmentRef::knowledge_base("kb2", "Basic physics", 95, "Fundamental physics concepts"),
            AttachmentRef::knowledge_base("kb3", "Python programming", 203, "From basics to advanced"),
        ];

        Self {
            documents,
            knowledge_bases,
        }
    }

    pub fn documents(&self) -> &[AttachmentRef] {
        &self.documents
    }

    pub fn knowledge_bases(&self) -> &[AttachmentRef] {
        &self.knowledge_bases
    }

    pub fn get(&self, id: &AttachmentId) -> Option<&AttachmentRef> {
        self.documents
            .iter()
            .chain(&self.knowledge_bases)
            .find(|item| &item.id == id)
    }

    /// Documents then knowledge bases whose name or description contains `query`.
    pub fn search(&self, query: &str) -> Vec<&AttachmentRef> {
        self.documents
            .iter()
            .chain(&self.knowledge_bases)
            .filter(|item| item.matches(query))
            .collect()
    }

    pub fn create_knowledge_base(
        &mut self,
        name: &str,
        description: &str,
    ) -> Result<AttachmentRef, ValidationError> {
        ensure!(
            !name.trim().is_empty(),
            MissingKnowledgeBaseNameSnafu {
                stage: "catalog-create-knowledge-base",
            }
        );

        let knowledge_base =
            AttachmentRef::knowledge_base(AttachmentId::generate(), name.trim(), 0, description.trim());
        self.knowledge_bases.push(knowledge_base.clone());
        tracing::debug!(id = %knowledge_base.id, "knowledge base created");
        Ok(knowledge_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::set::AttachmentKind;

    #[test]
    fn search_spans_documents_and_knowledge_bases() {
        let catalog = Catalog::with_demo_items();

        let names = catalog
            .search("math")
            .into_iter()
            .map(|item| item.display_name.as_str())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["Math textbook.pdf", "High school math"]);
        assert_eq!(catalog.search("").len(), 9);
    }

    #[test]
    fn created_knowledge_base_starts_empty_and_is_searchable() {
        let mut catalog = Catalog::new();

        let created = catalog
            .create_knowledge_base("  Chemistry ", "Organic chemistry notes")
            .unwrap();

        assert_eq!(created.display_name, "Chemistry");
        assert!(matches!(created.kind, AttachmentKind::KnowledgeBase { item_count: 0, .. }));
        assert_eq!(catalog.search("organic").len(), 1);
        assert!(catalog.get(&created.id).is_some());
    }

    #[test]
    fn knowledge_base_needs_a_name() {
        let mut catalog = Catalog::new();

        assert!(matches!(
            catalog.create_knowledge_base(" ", "desc"),
            Err(ValidationError::MissingKnowledgeBaseName { .. })
        ));
        assert!(catalog.knowledge_bases().is_empty());
    }
}

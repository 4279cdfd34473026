/// Auxiliary overlays that flank the main view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Notes,
    DocumentsDropdown,
    KnowledgeBaseModal,
}

/// Process-wide panel flags. Each flag moves only through its own actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelVisibility {
    notes_panel_open: bool,
    documents_dropdown_open: bool,
    knowledge_base_modal_open: bool,
}

impl Default for PanelVisibility {
    fn default() -> Self {
        Self {
            notes_panel_open: true,
            documents_dropdown_open: false,
            knowledge_base_modal_open: false,
        }
    }
}

impl PanelVisibility {
    pub fn is_open(&self, panel: Panel) -> bool {
        match panel {
            Panel::Notes => self.notes_panel_open,
            Panel::DocumentsDropdown => self.documents_dropdown_open,
            Panel::KnowledgeBaseModal => self.knowledge_base_modal_open,
        }
    }

    /// Flips one panel and returns its new state.
    pub fn toggle(&mut self, panel: Panel) -> bool {
        let flag = self.flag_mut(panel);
        *flag = !*flag;
        *flag
    }

    pub fn open(&mut self, panel: Panel) {
        *self.flag_mut(panel) = true;
    }

    pub fn close(&mut self, panel: Panel) {
        *self.flag_mut(panel) = false;
    }

    pub fn notes_panel_open(&self) -> bool {
        self.notes_panel_open
    }

    pub fn documents_dropdown_open(&self) -> bool {
        self.documents_dropdown_open
    }

    pub fn knowledge_base_modal_open(&self) -> bool {
        self.knowledge_base_modal_open
    }

    fn flag_mut(&mut self, panel: Panel) -> &mut bool {
        match panel {
            Panel::Notes => &mut self.notes_panel_open,
            Panel::DocumentsDropdown => &mut self.documents_dropdown_open,
            Panel::KnowledgeBaseModal => &mut self.knowledge_base_modal_open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panels_toggle_independently() {
        let mut panels = PanelVisibility::default();

        assert!(panels.toggle(Panel::KnowledgeBaseModal));
        assert!(panels.notes_panel_open());

        assert!(!panels.toggle(Panel::Notes));
        assert!(panels.knowledge_base_modal_open());
        assert!(!panels.documents_dropdown_open());
    }

    #[test]
    fn open_and_close_are_idempotent() {
        let mut panels = PanelVisibility::default();
        panels.open(Panel::DocumentsDropdown);
        panels.open(Panel::DocumentsDropdown);
        assert!(panels.is_open(Panel::DocumentsDropdown));

        panels.close(Panel::DocumentsDropdown);
        panels.close(Panel::DocumentsDropdown);
        assert!(!panels.is_open(Panel::DocumentsDropdown));
    }
}

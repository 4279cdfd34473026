/// The chat input buffer.
#[derive(Debug, Clone)]
pub struct Composer {
    buffer: String,
    expanded: bool,
    max_chars: usize,
}

impl Composer {
    pub fn new(max_chars: usize) -> Self {
        Self {
            buffer: String::new(),
            expanded: false,
            max_chars,
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn char_count(&self) -> usize {
        self.buffer.chars().count()
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn is_over_limit(&self) -> bool {
        self.char_count() > self.max_chars
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn toggle_expanded(&mut self) -> bool {
        self.expanded = !self.expanded;
        self.expanded
    }
}

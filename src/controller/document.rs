use xplayground_types::Language;

/// The text being edited plus its language tag. Session-scoped, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    text: String,
    language: Language,
}

impl SourceDocument {
    pub fn new(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            language,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Editor change notification.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }
}

impl Default for SourceDocument {
    fn default() -> Self {
        Self::new(String::new(), Language::JavaScript)
    }
}

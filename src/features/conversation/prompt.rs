//! Contextual prompt construction
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use super::context::EMPTY_HISTORY_MARKER;

/// Builder for the single text payload sent to the model
///
/// Layout: persona prompt, the history block, the incoming message tagged
/// with its author, then the assistant's label so the model answers as it.
///
/// # Example
///
/// ```ignore
/// let prompt = PromptBuilder::new("Talk like a pirate.", "Droid")
///     .with_history(&context.render_history("Droid"))
///     .with_message("Alice", "Hello")
///     .build();
/// ```
pub struct PromptBuilder<'a> {
    persona_prompt: &'a str,
    assistant_label: &'a str,
    history: Option<&'a str>,
    author: &'a str,
    message: &'a str,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(persona_prompt: &'a str, assistant_label: &'a str) -> Self {
        Self {
            persona_prompt,
            assistant_label,
            history: None,
            author: "User",
            message: "",
        }
    }

    /// Rendered history; omitted means "no recent history"
    pub fn with_history(mut self, history: &'a str) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_message(mut self, author: &'a str, message: &'a str) -> Self {
        self.author = author;
        self.message = message;
        self
    }

    pub fn build(self) -> String {
        let history = self.history.unwrap_or(EMPTY_HISTORY_MARKER);
        format!(
            "{}\n\n--- HISTORY ---\n{}\n--- END HISTORY ---\n\nMsg ({}): {}\n\n{}:",
            self.persona_prompt, history, self.author, self.message, self.assistant_label
        )
    }
}

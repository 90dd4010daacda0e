//! Demo questions and the pending-input model.
//!
//! The demo list is fixed and static; picking an entry only populates the
//! pending input — it never submits. `PendingInput` is the console's
//! input-field state: whatever sits in it is what an empty-line submit
//! will send.

/// The six example questions offered at startup.
pub const DEMO_QUESTIONS: [&str; 6] = [
    "When was Acme founded?",
    "What products does Acme offer?",
    "Tell me about AcmeFlow workflow automation",
    "What is InsightEdge analytics platform?",
    "Is Acme a remote-first organization?",
    "Tell me about professional development at Acme",
];

/// Look up a demo question by its 1-based display number.
pub fn pick(number: usize) -> Option<&'static str> {
    if number == 0 {
        return None;
    }
    DEMO_QUESTIONS.get(number - 1).copied()
}

/// The not-yet-submitted input text.
#[derive(Debug, Default)]
pub struct PendingInput {
    text: String,
}

impl PendingInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending text, e.g. with a picked demo question.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Take the pending text out, leaving the field empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    pub fn peek(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_is_one_based() {
        assert_eq!(pick(1), Some("When was Acme founded?"));
        assert_eq!(pick(6), Some("Tell me about professional development at Acme"));
        assert_eq!(pick(0), None);
        assert_eq!(pick(7), None);
    }

    #[test]
    fn picking_populates_without_submitting() {
        let mut input = PendingInput::new();
        input.set(pick(3).unwrap());
        assert_eq!(input.peek(), "Tell me about AcmeFlow workflow automation");
        // Still pending; nothing consumed it.
        assert!(!input.is_empty());
    }

    #[test]
    fn take_empties_the_field() {
        let mut input = PendingInput::new();
        input.set("draft");
        assert_eq!(input.take(), "draft");
        assert!(input.is_empty());
        assert_eq!(input.take(), "");
    }
}

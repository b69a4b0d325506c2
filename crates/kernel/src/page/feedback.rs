//! Request-scoped feedback messages.

use serde::Serialize;

/// Kind of a feedback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    #[default]
    Success,
    Error,
}

impl FeedbackKind {
    /// CSS classes for the notice container.
    pub fn css_class(self) -> &'static str {
        match self {
            FeedbackKind::Success => "updated notice",
            FeedbackKind::Error => "error notice",
        }
    }
}

/// A user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackMessage {
    pub text: String,
    pub kind: FeedbackKind,
}

/// Messages accumulated during one request, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feedback {
    messages: Vec<FeedbackMessage>,
}

impl Feedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message.
    pub fn add(&mut self, kind: FeedbackKind, text: impl Into<String>) {
        self.messages.push(FeedbackMessage {
            text: text.into(),
            kind,
        });
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.add(FeedbackKind::Success, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.add(FeedbackKind::Error, text);
    }

    pub fn messages(&self) -> &[FeedbackMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person asking
    User,
    /// The assistant answering
    Assistant,
}

impl Sender {
    /// Get the sender as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

/// Renderable message content, classified once when the message is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format", content = "content", rename_all = "snake_case")]
pub enum MessageBody {
    /// Plain text split on newlines, blank lines dropped
    Paragraphs(Vec<String>),
    /// Pre-built list markup, rendered as-is
    Markup(String),
}

impl MessageBody {
    /// Classify authored text: list markers mean markup, anything else is
    /// paragraphs.
    pub fn from_text(text: &str) -> Self {
        if text.contains("<ul>") || text.contains("<li>") {
            return MessageBody::Markup(text.to_string());
        }

        MessageBody::Paragraphs(
            text.split('\n')
                .filter(|p| !p.trim().is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Flatten back to text (paragraphs joined by newlines)
    pub fn to_text(&self) -> String {
        match self {
            MessageBody::Paragraphs(paragraphs) => paragraphs.join("\n"),
            MessageBody::Markup(markup) => markup.clone(),
        }
    }
}

/// One immutable transcript entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    ordinal: u64,
    sender: Sender,
    body: MessageBody,
    created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Position in the transcript, starting at 1
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// Who wrote it
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Classified content
    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    /// Creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Message text
    pub fn text(&self) -> String {
        self.body.to_text()
    }
}

/// Append-only, insertion-ordered message log
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return it
    pub fn append(&mut self, sender: Sender, text: &str) -> &ChatMessage {
        let ordinal = self.messages.len() as u64 + 1;
        self.messages.push(ChatMessage {
            ordinal,
            sender,
            body: MessageBody::from_text(text),
            created_at: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    /// All messages, oldest first
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Most recent message
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing has been said yet
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// `(sender, text)` pairs, convenient for assertions and export
    pub fn entries(&self) -> Vec<(Sender, String)> {
        self.messages
            .iter()
            .map(|m| (m.sender, m.text()))
            .collect()
    }
}

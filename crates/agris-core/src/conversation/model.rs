//! Conversation domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder title for conversations the backend stored without one.
pub const DEFAULT_TITLE: &str = "New conversation";

/// Character budget for displayed titles.
pub const TITLE_MAX_CHARS: usize = 60;

/// Character budget for displayed preview text.
pub const PREVIEW_MAX_CHARS: usize = 120;

/// User feedback attached to a conversation or message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Helpful,
    NotHelpful,
}

/// A conversation as it appears in the history list.
///
/// Summaries are owned by the store and replaced wholesale on each
/// successful load; individual entries are removed on delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Unique conversation identifier
    pub id: String,
    /// Display title (shaped: defaulted and truncated)
    pub title: String,
    /// Preview of the opening user question
    pub preview: String,
    /// Number of messages in the conversation
    pub message_count: u32,
    /// Timestamp when the conversation was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the conversation was last updated
    pub updated_at: DateTime<Utc>,
    /// Preview of the most recent message
    pub last_message_preview: String,
    /// Feedback left on the conversation, if any
    pub feedback: Option<Feedback>,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier
    pub id: String,
    /// Id of the conversation this message belongs to
    pub conversation_id: String,
    /// Message text
    pub content: String,
    /// True when the message was authored by the user, false for the
    /// assistant
    pub is_user: bool,
    /// Timestamp when the message was created
    pub timestamp: DateTime<Utc>,
    /// Feedback left on the message, if any
    pub feedback: Option<Feedback>,
}

/// A conversation opened for display: its summary plus the full ordered
/// message list.
///
/// Exactly one detail is "current" in the store at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationDetail {
    pub summary: ConversationSummary,
    pub messages: Vec<Message>,
}

/// Shapes a raw backend title for display: missing or blank titles get the
/// placeholder, overlong ones are truncated to the title budget.
pub fn display_title(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(title) if !title.is_empty() => truncate_chars(title, TITLE_MAX_CHARS),
        _ => DEFAULT_TITLE.to_string(),
    }
}

/// Truncates text to a character budget, appending an ellipsis when
/// anything was cut. Counts `char`s, never bytes, so multi-byte text is
/// safe to cut anywhere.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_defaults() {
        assert_eq!(display_title(None), DEFAULT_TITLE);
        assert_eq!(display_title(Some("")), DEFAULT_TITLE);
        assert_eq!(display_title(Some("   ")), DEFAULT_TITLE);
        assert_eq!(display_title(Some("Wheat rust outbreak")), "Wheat rust outbreak");
    }

    #[test]
    fn test_display_title_truncates() {
        let long = "x".repeat(TITLE_MAX_CHARS + 10);
        let shaped = display_title(Some(&long));
        assert_eq!(shaped.chars().count(), TITLE_MAX_CHARS);
        assert!(shaped.ends_with('…'));
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        // Multi-byte characters must be counted, not sliced by byte.
        let text = "ハダニがトマトの葉に発生しています";
        let truncated = truncate_chars(text, 5);
        assert_eq!(truncated.chars().count(), 5);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_truncate_chars_noop_within_budget() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exact", 5), "exact");
    }
}

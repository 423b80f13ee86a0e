//! Remote record DTOs and their domain conversions.
//!
//! The backend's wire records do not match the domain models exactly: field
//! names differ (`created_at` vs `timestamp`), several fields are optional on
//! the wire, and the profile endpoint still serves a legacy `role` field on
//! older accounts. Conversions are total: unparseable values degrade to
//! defaults instead of failing the whole response.

use agris_core::conversation::{ConversationDetail, ConversationSummary, Feedback, Message};
use agris_core::user::{Profile, UserRole};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Wire record for `GET /v1/auth/me`.
#[derive(Debug, Deserialize)]
pub struct RemoteProfile {
    pub user_type: Option<String>,
    /// Legacy field name still served for accounts created before the
    /// `user_type` rename.
    pub role: Option<String>,
    pub language: Option<String>,
}

impl RemoteProfile {
    pub fn into_domain(self) -> Profile {
        let user_type = self
            .user_type
            .or(self.role)
            .map(|value| UserRole::parse(&value));
        Profile {
            user_type,
            language: self.language,
        }
    }
}

/// Wire record for a conversation in the history listing.
#[derive(Debug, Deserialize)]
pub struct RemoteConversation {
    pub id: String,
    pub title: Option<String>,
    pub preview: Option<String>,
    #[serde(default)]
    pub message_count: u32,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub last_message_preview: Option<String>,
    #[allow(dead_code)]
    pub status: Option<String>,
    pub feedback: Option<String>,
}

impl RemoteConversation {
    pub fn into_domain(self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            title: self.title.unwrap_or_default(),
            preview: self.preview.unwrap_or_default(),
            message_count: self.message_count,
            created_at: parse_timestamp(self.created_at.as_deref()),
            updated_at: parse_timestamp(self.updated_at.as_deref()),
            last_message_preview: self.last_message_preview.unwrap_or_default(),
            feedback: parse_feedback(self.feedback.as_deref()),
        }
    }
}

/// Wire record for a message inside a conversation detail.
#[derive(Debug, Deserialize)]
pub struct RemoteMessage {
    pub id: String,
    #[serde(default)]
    pub conversation_id: String,
    pub content: String,
    #[serde(default)]
    pub is_user: bool,
    pub created_at: Option<String>,
    pub feedback: Option<String>,
}

impl RemoteMessage {
    pub fn into_domain(self, conversation_id: &str) -> Message {
        let conversation_id = if self.conversation_id.is_empty() {
            conversation_id.to_string()
        } else {
            self.conversation_id
        };
        Message {
            id: self.id,
            conversation_id,
            content: self.content,
            is_user: self.is_user,
            timestamp: parse_timestamp(self.created_at.as_deref()),
            feedback: parse_feedback(self.feedback.as_deref()),
        }
    }
}

/// Wire record for `GET /v1/conversations/{id}`.
#[derive(Debug, Deserialize)]
pub struct RemoteConversationDetail {
    #[serde(flatten)]
    pub conversation: RemoteConversation,
    #[serde(default)]
    pub messages: Vec<RemoteMessage>,
}

impl RemoteConversationDetail {
    pub fn into_domain(self) -> ConversationDetail {
        let summary = self.conversation.into_domain();
        let messages = self
            .messages
            .into_iter()
            .map(|m| m.into_domain(&summary.id))
            .collect();
        ConversationDetail { summary, messages }
    }
}

/// Parses an RFC 3339 timestamp, degrading to "now" when the backend sent
/// something unparseable.
fn parse_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    match raw {
        Some(value) => match DateTime::parse_from_rfc3339(value) {
            Ok(parsed) => parsed.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!("[Dto] Unparseable timestamp '{}': {}", value, e);
                Utc::now()
            }
        },
        None => Utc::now(),
    }
}

/// Maps a wire feedback string; unknown values become no feedback.
fn parse_feedback(raw: Option<&str>) -> Option<Feedback> {
    match raw {
        Some("helpful") => Some(Feedback::Helpful),
        Some("not_helpful") => Some(Feedback::NotHelpful),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_prefers_user_type_over_legacy_role() {
        let dto: RemoteProfile = serde_json::from_value(serde_json::json!({
            "user_type": "admin",
            "role": "expert"
        }))
        .unwrap();

        let profile = dto.into_domain();
        assert_eq!(profile.user_type, Some(UserRole::Admin));
    }

    #[test]
    fn test_profile_falls_back_to_legacy_role() {
        let dto: RemoteProfile = serde_json::from_value(serde_json::json!({
            "role": "expert"
        }))
        .unwrap();

        let profile = dto.into_domain();
        assert_eq!(profile.user_type, Some(UserRole::Expert));
    }

    #[test]
    fn test_conversation_maps_fields() {
        let dto: RemoteConversation = serde_json::from_value(serde_json::json!({
            "id": "c-1",
            "title": "Soil acidity",
            "preview": "How do I raise soil pH?",
            "message_count": 4,
            "created_at": "2025-06-01T08:00:00Z",
            "updated_at": "2025-06-02T09:30:00Z",
            "last_message_preview": "Apply agricultural lime…",
            "status": "active",
            "feedback": "helpful"
        }))
        .unwrap();

        let summary = dto.into_domain();
        assert_eq!(summary.id, "c-1");
        assert_eq!(summary.message_count, 4);
        assert_eq!(summary.feedback, Some(Feedback::Helpful));
        assert_eq!(summary.updated_at.to_rfc3339(), "2025-06-02T09:30:00+00:00");
    }

    #[test]
    fn test_conversation_tolerates_missing_fields() {
        let dto: RemoteConversation =
            serde_json::from_value(serde_json::json!({ "id": "c-2" })).unwrap();

        let summary = dto.into_domain();
        assert_eq!(summary.title, "");
        assert_eq!(summary.message_count, 0);
        assert!(summary.feedback.is_none());
    }

    #[test]
    fn test_unknown_feedback_maps_to_none() {
        assert_eq!(parse_feedback(Some("thumbs_sideways")), None);
        assert_eq!(parse_feedback(None), None);
    }

    #[test]
    fn test_detail_fills_message_conversation_id() {
        let dto: RemoteConversationDetail = serde_json::from_value(serde_json::json!({
            "id": "c-3",
            "title": "Locust swarm",
            "messages": [
                { "id": "m-1", "content": "Locusts in my field", "is_user": true,
                  "created_at": "2025-06-01T10:00:00Z" },
                { "id": "m-2", "content": "Report the swarm to…", "is_user": false,
                  "created_at": "2025-06-01T10:00:05Z" }
            ]
        }))
        .unwrap();

        let detail = dto.into_domain();
        assert_eq!(detail.messages.len(), 2);
        assert!(detail.messages.iter().all(|m| m.conversation_id == "c-3"));
        assert!(detail.messages[0].is_user);
        assert!(!detail.messages[1].is_user);
    }
}

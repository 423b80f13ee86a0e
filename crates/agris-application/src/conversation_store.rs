//! In-memory conversation store.
//!
//! Holds the history list (grouped by recency) and the currently open
//! conversation. Network loads are admitted through the `HistoryLoadGuard`;
//! a denied load is a silent no-op so callers can invoke `load` freely from
//! UI lifecycle hooks.

use crate::history_guard::HistoryLoadGuard;
use agris_core::auth::SessionIdentity;
use agris_core::conversation::{
    display_title, group_by_recency, truncate_chars, ConversationApi, ConversationDetail,
    ConversationGroup, ConversationSummary, Feedback, Message, PREVIEW_MAX_CHARS,
};
use agris_core::error::Result;
use chrono::{Local, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Prefix of conversation ids created locally before the backend has
/// assigned a real one.
const PROVISIONAL_ID_PREFIX: &str = "local-";

/// Message shown when a conversation cannot be reconstructed at all.
const UNAVAILABLE_MESSAGE: &str =
    "Sorry, this conversation could not be loaded. Please try again later.";

/// Partial update applied to a message in place.
#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub feedback: Option<Feedback>,
}

#[derive(Default)]
struct StoreState {
    conversations: Vec<ConversationSummary>,
    groups: Vec<ConversationGroup>,
    current: Option<ConversationDetail>,
}

/// In-memory collection of conversation summaries and the open conversation.
pub struct ConversationStore {
    api: Arc<dyn ConversationApi>,
    guard: Arc<HistoryLoadGuard>,
    state: RwLock<StoreState>,
}

impl ConversationStore {
    pub fn new(api: Arc<dyn ConversationApi>, guard: Arc<HistoryLoadGuard>) -> Self {
        Self {
            api,
            guard,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Loads the conversation history, gated by the guard.
    ///
    /// A denied load returns `Ok(())` without side effects. On success the
    /// list state is replaced wholesale; on failure it is cleared and the
    /// error propagated — no retry is scheduled here.
    pub async fn load(&self, identity: &SessionIdentity) -> Result<()> {
        if !self.guard.begin_load(identity).await {
            return Ok(());
        }

        match self.api.list_conversations(identity).await {
            Ok(remote) => {
                let mut summaries: Vec<ConversationSummary> =
                    remote.into_iter().map(shape_summary).collect();
                summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
                let groups = group_by_recency(summaries.clone(), Local::now());

                let mut state = self.state.write().await;
                state.conversations = summaries;
                state.groups = groups;
                drop(state);

                self.guard.record_success(identity).await;
                tracing::debug!(
                    "[ConversationStore] Loaded history for user {}",
                    identity.user_id
                );
                Ok(())
            }
            Err(e) => {
                let mut state = self.state.write().await;
                state.conversations.clear();
                state.groups.clear();
                drop(state);

                self.guard.record_failure(identity).await;
                tracing::warn!(
                    "[ConversationStore] History load failed for user {}: {}",
                    identity.user_id,
                    e
                );
                Err(e)
            }
        }
    }

    /// Opens a conversation, replacing the current one.
    ///
    /// This path never fails: when the detail transport has no data the
    /// detail is reconstructed from the loaded summary, and when that is
    /// also missing a placeholder conversation is returned.
    pub async fn load_conversation(
        &self,
        identity: &SessionIdentity,
        id: &str,
    ) -> ConversationDetail {
        match self.api.fetch_conversation(identity, id).await {
            Ok(Some(detail)) => {
                self.state.write().await.current = Some(detail.clone());
                return detail;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    "[ConversationStore] Detail fetch failed for conversation {}: {}",
                    id,
                    e
                );
            }
        }

        let summary = {
            let state = self.state.read().await;
            state.conversations.iter().find(|c| c.id == id).cloned()
        };

        let detail = match summary {
            Some(summary) => detail_from_summary(summary),
            None => unavailable_detail(id),
        };
        self.state.write().await.current = Some(detail.clone());
        detail
    }

    /// Starts a fresh provisional conversation and makes it current.
    pub async fn new_conversation(&self) -> ConversationDetail {
        let now = Utc::now();
        let detail = ConversationDetail {
            summary: ConversationSummary {
                id: provisional_id(),
                title: display_title(None),
                preview: String::new(),
                message_count: 0,
                created_at: now,
                updated_at: now,
                last_message_preview: String::new(),
                feedback: None,
            },
            messages: Vec::new(),
        };
        self.state.write().await.current = Some(detail.clone());
        detail
    }

    /// Appends a message to the current conversation.
    ///
    /// Duplicate message ids are dropped. Without a current conversation a
    /// provisional one is synthesized around the message. When a provisional
    /// conversation receives a message carrying the backend-assigned id, the
    /// conversation is rebound to that id.
    pub async fn add_message(&self, message: Message) {
        let mut state = self.state.write().await;
        let Some(mut detail) = state.current.take() else {
            state.current = Some(detail_from_message(message));
            return;
        };

        if detail.messages.iter().any(|m| m.id == message.id) {
            state.current = Some(detail);
            return;
        }

        if detail.summary.id.starts_with(PROVISIONAL_ID_PREFIX)
            && !message.conversation_id.is_empty()
            && !message.conversation_id.starts_with(PROVISIONAL_ID_PREFIX)
        {
            let real_id = message.conversation_id.clone();
            detail.summary.id = real_id.clone();
            for m in &mut detail.messages {
                m.conversation_id = real_id.clone();
            }
        }

        let mut message = message;
        message.conversation_id = detail.summary.id.clone();
        detail.summary.message_count += 1;
        detail.summary.updated_at = message.timestamp;
        detail.summary.last_message_preview =
            truncate_chars(&message.content, PREVIEW_MAX_CHARS);
        detail.messages.push(message);
        state.current = Some(detail);
    }

    /// Merges a patch into the matching message of the current conversation.
    /// No-op without a current conversation or matching message.
    pub async fn update_message(&self, id: &str, patch: MessagePatch) {
        let mut state = self.state.write().await;
        let Some(detail) = &mut state.current else {
            return;
        };
        let Some(message) = detail.messages.iter_mut().find(|m| m.id == id) else {
            return;
        };

        if let Some(content) = patch.content {
            message.content = content;
        }
        if let Some(feedback) = patch.feedback {
            message.feedback = Some(feedback);
        }
    }

    /// Deletes a conversation: optimistic local removal first, then the
    /// backend call. A backend failure is surfaced but the local removal is
    /// kept.
    pub async fn delete_conversation(&self, identity: &SessionIdentity, id: &str) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.conversations.retain(|c| c.id != id);
            for group in &mut state.groups {
                group.conversations.retain(|c| c.id != id);
            }
            state.groups.retain(|g| !g.conversations.is_empty());
            if state.current.as_ref().is_some_and(|d| d.summary.id == id) {
                state.current = None;
            }
        }

        if let Err(e) = self.api.delete_conversation(identity, id).await {
            tracing::warn!(
                "[ConversationStore] Backend delete failed for conversation {}: {}",
                id,
                e
            );
            return Err(e);
        }
        Ok(())
    }

    /// Clears all conversations: optimistic local clear, guard reset, then
    /// the backend call. A backend failure is surfaced but the local clear
    /// is kept.
    pub async fn clear_all(&self, identity: &SessionIdentity) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.conversations.clear();
            state.groups.clear();
            state.current = None;
        }

        // Reset so the next load is not blocked by stale cooldown or
        // success-cache state.
        self.guard.force_reset(identity).await;

        if let Err(e) = self.api.clear_conversations(identity).await {
            tracing::warn!(
                "[ConversationStore] Backend clear-all failed for user {}: {}",
                identity.user_id,
                e
            );
            return Err(e);
        }
        Ok(())
    }

    /// Explicit user-triggered refresh: bypasses cooldown and success-cache
    /// (but not the in-flight check), then loads.
    pub async fn refresh(&self, identity: &SessionIdentity) -> Result<()> {
        self.guard.force_reset(identity).await;
        self.load(identity).await
    }

    pub async fn conversations(&self) -> Vec<ConversationSummary> {
        self.state.read().await.conversations.clone()
    }

    pub async fn groups(&self) -> Vec<ConversationGroup> {
        self.state.read().await.groups.clone()
    }

    pub async fn current(&self) -> Option<ConversationDetail> {
        self.state.read().await.current.clone()
    }
}

/// Applies display shaping to a raw backend summary.
fn shape_summary(summary: ConversationSummary) -> ConversationSummary {
    ConversationSummary {
        title: display_title(Some(&summary.title)),
        preview: truncate_chars(&summary.preview, PREVIEW_MAX_CHARS),
        last_message_preview: truncate_chars(&summary.last_message_preview, PREVIEW_MAX_CHARS),
        ..summary
    }
}

fn provisional_id() -> String {
    format!("{}{}", PROVISIONAL_ID_PREFIX, Uuid::new_v4())
}

/// Reconstructs a detail from a summary as a two-message preview: the
/// opening user question and the latest assistant answer.
fn detail_from_summary(summary: ConversationSummary) -> ConversationDetail {
    let messages = vec![
        Message {
            id: format!("{}-preview-user", summary.id),
            conversation_id: summary.id.clone(),
            content: summary.preview.clone(),
            is_user: true,
            timestamp: summary.created_at,
            feedback: None,
        },
        Message {
            id: format!("{}-preview-assistant", summary.id),
            conversation_id: summary.id.clone(),
            content: summary.last_message_preview.clone(),
            is_user: false,
            timestamp: summary.updated_at,
            feedback: summary.feedback,
        },
    ];
    ConversationDetail { summary, messages }
}

/// Synthesizes a provisional conversation seeded by its first message.
fn detail_from_message(message: Message) -> ConversationDetail {
    let id = if message.conversation_id.is_empty() {
        provisional_id()
    } else {
        message.conversation_id.clone()
    };
    let mut message = message;
    message.conversation_id = id.clone();

    ConversationDetail {
        summary: ConversationSummary {
            id,
            title: display_title(Some(&message.content)),
            preview: truncate_chars(&message.content, PREVIEW_MAX_CHARS),
            message_count: 1,
            created_at: message.timestamp,
            updated_at: message.timestamp,
            last_message_preview: truncate_chars(&message.content, PREVIEW_MAX_CHARS),
            feedback: None,
        },
        messages: vec![message],
    }
}

/// Last-resort placeholder when neither the backend nor the local summaries
/// know the conversation.
fn unavailable_detail(id: &str) -> ConversationDetail {
    let now = Utc::now();
    ConversationDetail {
        summary: ConversationSummary {
            id: id.to_string(),
            title: display_title(None),
            preview: String::new(),
            message_count: 1,
            created_at: now,
            updated_at: now,
            last_message_preview: String::new(),
            feedback: None,
        },
        messages: vec![Message {
            id: format!("{id}-unavailable"),
            conversation_id: id.to_string(),
            content: UNAVAILABLE_MESSAGE.to_string(),
            is_user: false,
            timestamp: now,
            feedback: None,
        }],
    }
}

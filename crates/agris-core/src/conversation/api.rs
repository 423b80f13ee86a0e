//! Conversation API trait.
//!
//! Defines the interface for the backend conversation endpoints.

use super::model::{ConversationDetail, ConversationSummary};
use crate::auth::SessionIdentity;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract interface to the backend conversation endpoints.
///
/// This trait decouples the store from the concrete HTTP transport.
/// All calls authenticate with the identity's access token.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    /// Lists the user's conversations.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<ConversationSummary>)`: raw summaries as the backend
    ///   stores them (display shaping happens in the store)
    /// - `Err(_)`: transport or API failure
    async fn list_conversations(
        &self,
        identity: &SessionIdentity,
    ) -> Result<Vec<ConversationSummary>>;

    /// Fetches the full message list for a conversation.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ConversationDetail))`: detail found
    /// - `Ok(None)`: the detail transport has no data for this id
    /// - `Err(_)`: transport or API failure
    async fn fetch_conversation(
        &self,
        identity: &SessionIdentity,
        id: &str,
    ) -> Result<Option<ConversationDetail>>;

    /// Deletes a single conversation.
    async fn delete_conversation(&self, identity: &SessionIdentity, id: &str) -> Result<()>;

    /// Deletes all of the user's conversations.
    async fn clear_conversations(&self, identity: &SessionIdentity) -> Result<()>;
}

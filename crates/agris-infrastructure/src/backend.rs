//! Backend HTTP client.
//!
//! Implements the `ProfileApi` and `ConversationApi` traits against the
//! AGRIS backend. Every request carries the identity's bearer token and a
//! bounded timeout; a timeout is treated like any other transport failure.

use crate::dto::{RemoteConversation, RemoteConversationDetail, RemoteProfile};
use agris_core::auth::SessionIdentity;
use agris_core::conversation::{ConversationApi, ConversationDetail, ConversationSummary};
use agris_core::error::{AgrisError, Result};
use agris_core::user::{Profile, ProfileApi};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the AGRIS backend API.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl BackendClient {
    /// Creates a new client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds an authenticated request with the bounded timeout applied.
    fn auth_request(
        &self,
        request: reqwest::RequestBuilder,
        identity: &SessionIdentity,
    ) -> reqwest::RequestBuilder {
        request
            .header(
                "Authorization",
                format!("Bearer {}", identity.access_token),
            )
            .timeout(self.timeout)
    }

    /// Maps a non-success response into an API error with the body text.
    async fn api_error(response: reqwest::Response) -> AgrisError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        AgrisError::api(status, message)
    }
}

#[async_trait]
impl ProfileApi for BackendClient {
    async fn fetch_profile(&self, identity: &SessionIdentity) -> Result<Profile> {
        let url = format!("{}/v1/auth/me", self.base_url);
        let request = self.auth_request(self.client.get(&url), identity);

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let remote: RemoteProfile = response.json().await?;
        tracing::debug!(
            "[BackendClient] Fetched profile for user {}",
            identity.user_id
        );
        Ok(remote.into_domain())
    }
}

#[async_trait]
impl ConversationApi for BackendClient {
    async fn list_conversations(
        &self,
        identity: &SessionIdentity,
    ) -> Result<Vec<ConversationSummary>> {
        let url = format!(
            "{}/v1/users/{}/conversations",
            self.base_url, identity.user_id
        );
        let request = self.auth_request(self.client.get(&url), identity);

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let remote: Vec<RemoteConversation> = response.json().await?;
        tracing::debug!(
            "[BackendClient] Listed {} conversations for user {}",
            remote.len(),
            identity.user_id
        );
        Ok(remote.into_iter().map(|c| c.into_domain()).collect())
    }

    async fn fetch_conversation(
        &self,
        identity: &SessionIdentity,
        id: &str,
    ) -> Result<Option<ConversationDetail>> {
        let url = format!("{}/v1/conversations/{}", self.base_url, id);
        let request = self.auth_request(self.client.get(&url), identity);

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            // The detail transport has nothing for this id; callers fall
            // back to the loaded summary.
            tracing::debug!("[BackendClient] No detail for conversation {}", id);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let remote: RemoteConversationDetail = response.json().await?;
        Ok(Some(remote.into_domain()))
    }

    async fn delete_conversation(&self, identity: &SessionIdentity, id: &str) -> Result<()> {
        let url = format!("{}/v1/conversations/{}", self.base_url, id);
        let request = self.auth_request(self.client.delete(&url), identity);

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        tracing::info!("[BackendClient] Deleted conversation {}", id);
        Ok(())
    }

    async fn clear_conversations(&self, identity: &SessionIdentity) -> Result<()> {
        let url = format!(
            "{}/v1/users/{}/conversations",
            self.base_url, identity.user_id
        );
        let request = self.auth_request(self.client.delete(&url), identity);

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        tracing::info!(
            "[BackendClient] Cleared all conversations for user {}",
            identity.user_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BackendClient::new("https://api.agris.example/");
        assert_eq!(client.base_url, "https://api.agris.example");
    }

    #[test]
    fn test_with_timeout_overrides_default() {
        let client = BackendClient::new("https://api.agris.example")
            .with_timeout(Duration::from_secs(3));
        assert_eq!(client.timeout, Duration::from_secs(3));
    }
}

//! Auth provider trait.
//!
//! Defines the interface for the opaque external session issuer.

use super::session::{AuthSession, SessionChange};
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Scope of a sign-out request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutScope {
    /// Revoke the session everywhere.
    Global,
    /// Revoke only the local session.
    Local,
}

/// An abstract interface to the authentication provider.
///
/// The provider is an opaque session issuer: it owns token lifetimes and
/// refresh scheduling, and reports changes through an event subscription.
/// This trait decouples the coordination core from the concrete provider SDK.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Fetches the current session from the provider.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(AuthSession))`: an authenticated session is active
    /// - `Ok(None)`: no session (signed out)
    /// - `Err(_)`: the provider failed unexpectedly
    async fn current_session(&self) -> Result<Option<AuthSession>>;

    /// Signs the user out with the given scope.
    async fn sign_out(&self, scope: SignOutScope) -> Result<()>;

    /// Subscribes to session-change notifications.
    ///
    /// Events arrive in the order the provider emits them. Dropping the
    /// receiver cancels the subscription.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionChange>;
}

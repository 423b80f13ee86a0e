//! Session identity and change-event types.

use serde::{Deserialize, Serialize};

/// The pairing of user id and current access token representing
/// "who is logged in right now".
///
/// Equality is by value over both fields: a difference in either `user_id`
/// or `access_token` constitutes an identity change, and cached state keyed
/// to the old identity must not be served across it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// Unique user identifier from the auth provider
    pub user_id: String,
    /// Opaque access token for backend calls
    pub access_token: String,
}

impl SessionIdentity {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

/// An authenticated session as reported by the auth provider.
///
/// Carries the identity plus the provider-supplied profile fields. Backend
/// profile data (`user_type`) only ever augments these fields, never
/// replaces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    /// The session identity (user id + access token)
    pub identity: SessionIdentity,
    /// Email address registered with the provider
    pub email: String,
    /// Display name from provider metadata, if any
    pub display_name: Option<String>,
    /// Preferred UI language from provider metadata, if any
    pub language: Option<String>,
}

/// The kind of session-change notification emitted by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionChangeKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// A session-change notification with the new session (if any).
///
/// Providers may emit `TokenRefreshed`/`UserUpdated` events far more often
/// than the identity actually changes; consumers are expected to filter
/// redundant notifications by comparing identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionChange {
    pub kind: SessionChangeKind,
    pub session: Option<AuthSession>,
}

impl SessionChange {
    /// Returns the identity carried by this notification, if any.
    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.session.as_ref().map(|s| &s.identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_equality_by_value() {
        let a = SessionIdentity::new("42", "tok-a");
        let b = SessionIdentity::new("42", "tok-a");
        let c = SessionIdentity::new("42", "tok-b");
        let d = SessionIdentity::new("43", "tok-a");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }
}

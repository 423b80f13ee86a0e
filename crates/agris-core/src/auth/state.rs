//! Authentication state machine.

use crate::user::AuthenticatedUser;
use serde::{Deserialize, Serialize};

/// The authentication lifecycle state.
///
/// Transitions: `Uninitialized → Initializing → {Authenticated |
/// Unauthenticated}`, with `Error` reachable from any state on an unexpected
/// provider failure. `Error` reports as unauthenticated to callers but is
/// kept as its own variant so it can be logged and surfaced distinctly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    /// `init()` has not run yet.
    Uninitialized,
    /// The first reload is in progress.
    Initializing,
    /// A session is active and the user record has been normalized.
    Authenticated(AuthenticatedUser),
    /// No active session.
    Unauthenticated,
    /// The provider failed unexpectedly; treated as unauthenticated.
    Error,
}

impl AuthState {
    /// Returns the authenticated user, if any.
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::UserRole;

    #[test]
    fn test_error_state_reports_unauthenticated() {
        assert!(AuthState::Error.user().is_none());
        assert!(!AuthState::Error.is_authenticated());
    }

    #[test]
    fn test_authenticated_exposes_user() {
        let user = AuthenticatedUser {
            id: "42".to_string(),
            email: "grower@example.com".to_string(),
            display_name: "Grower".to_string(),
            role: UserRole::Farmer,
            language: "en".to_string(),
        };
        let state = AuthState::Authenticated(user);
        assert!(state.is_authenticated());
        assert_eq!(state.user().unwrap().id, "42");
    }
}

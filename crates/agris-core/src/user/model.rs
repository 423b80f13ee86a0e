//! User domain models.
//!
//! The provider supplies identity fields (email, display name, language);
//! the backend profile endpoint augments them with a `user_type`. The
//! normalized record merges both, with baseline defaults for anything absent.

use crate::auth::AuthSession;
use serde::{Deserialize, Serialize};

/// Fallback UI language when neither provider nor backend supplies one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// The role a user holds within the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Baseline role for every account.
    #[default]
    Farmer,
    /// Agronomy expert able to review assistant answers.
    Expert,
    /// Administrative account.
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Farmer => "farmer",
            Self::Expert => "expert",
            Self::Admin => "admin",
        }
    }

    /// Parses a backend role string; unknown values fall back to the
    /// baseline role.
    pub fn parse(value: &str) -> Self {
        match value {
            "expert" => Self::Expert,
            "admin" => Self::Admin,
            _ => Self::Farmer,
        }
    }
}

/// Backend profile augmentation record (`GET /v1/auth/me`).
///
/// Only augments the provider-supplied identity fields, never replaces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Backend-assigned role, if the account has one.
    pub user_type: Option<UserRole>,
    /// Backend-preferred language, if set.
    pub language: Option<String>,
}

/// The normalized authenticated user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Provider user id.
    pub id: String,
    /// Email address from the provider.
    pub email: String,
    /// Display name; falls back to the email local part.
    pub display_name: String,
    /// Merged role; baseline when neither source supplies one.
    pub role: UserRole,
    /// Merged UI language; `DEFAULT_LANGUAGE` when absent everywhere.
    pub language: String,
}

impl AuthenticatedUser {
    /// Merges provider session fields with the backend profile.
    ///
    /// The profile is optional: a failed profile fetch still yields an
    /// authenticated user built from provider fields alone.
    pub fn merge(session: &AuthSession, profile: Option<&Profile>) -> Self {
        let display_name = session
            .display_name
            .clone()
            .unwrap_or_else(|| local_part(&session.email));

        let role = profile
            .and_then(|p| p.user_type)
            .unwrap_or_default();

        let language = session
            .language
            .clone()
            .or_else(|| profile.and_then(|p| p.language.clone()))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        Self {
            id: session.identity.user_id.clone(),
            email: session.email.clone(),
            display_name,
            role,
            language,
        }
    }
}

fn local_part(email: &str) -> String {
    email
        .split_once('@')
        .map(|(local, _)| local.to_string())
        .unwrap_or_else(|| email.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionIdentity;

    fn session() -> AuthSession {
        AuthSession {
            identity: SessionIdentity::new("42", "tok-a"),
            email: "maize.grower@example.com".to_string(),
            display_name: None,
            language: None,
        }
    }

    #[test]
    fn test_merge_defaults_without_profile() {
        let user = AuthenticatedUser::merge(&session(), None);

        assert_eq!(user.id, "42");
        assert_eq!(user.role, UserRole::Farmer);
        assert_eq!(user.language, DEFAULT_LANGUAGE);
        assert_eq!(user.display_name, "maize.grower");
    }

    #[test]
    fn test_merge_takes_backend_role() {
        let profile = Profile {
            user_type: Some(UserRole::Admin),
            language: Some("fr".to_string()),
        };
        let user = AuthenticatedUser::merge(&session(), Some(&profile));

        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(user.language, "fr");
    }

    #[test]
    fn test_provider_language_wins_over_backend() {
        let mut s = session();
        s.language = Some("sw".to_string());
        let profile = Profile {
            user_type: None,
            language: Some("fr".to_string()),
        };
        let user = AuthenticatedUser::merge(&s, Some(&profile));

        assert_eq!(user.language, "sw");
        assert_eq!(user.role, UserRole::Farmer);
    }

    #[test]
    fn test_role_parse_unknown_falls_back() {
        assert_eq!(UserRole::parse("admin"), UserRole::Admin);
        assert_eq!(UserRole::parse("agronomist"), UserRole::Farmer);
    }
}

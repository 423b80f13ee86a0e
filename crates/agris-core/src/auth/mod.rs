//! Authentication domain module.
//!
//! This module contains the session identity models, session-change events,
//! authentication state, and the provider interface.
//!
//! # Module Structure
//!
//! - `session`: Session identity and change-event types (`SessionIdentity`,
//!   `AuthSession`, `SessionChange`)
//! - `state`: Authentication state machine (`AuthState`)
//! - `provider`: Provider trait for the opaque session issuer (`AuthProvider`)

mod provider;
mod session;
mod state;

// Re-export public API
pub use provider::{AuthProvider, SignOutScope};
pub use session::{AuthSession, SessionChange, SessionChangeKind, SessionIdentity};
pub use state::AuthState;

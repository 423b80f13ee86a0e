//! Session coordinator.
//!
//! Owns the lifecycle of the authenticated identity: one-time
//! initialization, consumption of provider session-change notifications,
//! filtering of redundant notifications, and serialized reload of identity
//! and profile.

use crate::identity_cache::IdentityCache;
use agris_core::auth::{
    AuthProvider, AuthState, SessionChange, SessionChangeKind, SessionIdentity, SignOutScope,
};
use agris_core::user::AuthenticatedUser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tokio::task::JoinHandle;

/// Coordinates the authenticated identity across the client.
///
/// State machine: `Uninitialized → Initializing → {Authenticated |
/// Unauthenticated}`, with `Error` reachable on unexpected provider failure.
pub struct SessionCoordinator {
    provider: Arc<dyn AuthProvider>,
    profile_cache: Arc<IdentityCache>,
    state: RwLock<AuthState>,
    /// Identity observed by the most recent reload; notifications carrying
    /// the same user id and access token are filtered out.
    last_identity: Mutex<Option<SessionIdentity>>,
    /// Suppresses notification handling while a logout is in progress.
    logging_out: AtomicBool,
    /// One-shot init guard.
    initialized: AtomicBool,
    /// In-flight reload that concurrent callers join.
    reload_slot: Mutex<Option<Arc<OnceCell<AuthState>>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionCoordinator {
    pub fn new(provider: Arc<dyn AuthProvider>, profile_cache: Arc<IdentityCache>) -> Self {
        Self {
            provider,
            profile_cache,
            state: RwLock::new(AuthState::Uninitialized),
            last_identity: Mutex::new(None),
            logging_out: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
            reload_slot: Mutex::new(None),
            listener: Mutex::new(None),
        }
    }

    /// Initializes the coordinator: one reload, then the notification
    /// listener. Runs at most once per process; repeated calls are no-ops.
    pub async fn init(self: &Arc<Self>) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!("[SessionCoordinator] init() already ran, skipping");
            return;
        }

        *self.state.write().await = AuthState::Initializing;
        self.reload().await;

        let mut rx = self.provider.subscribe();
        let coordinator = Arc::clone(self);
        let handle = tokio::spawn(async move {
            while let Some(change) = rx.recv().await {
                coordinator.handle_session_change(change).await;
            }
        });
        *self.listener.lock().await = Some(handle);
    }

    /// Reloads the identity and profile from the provider and backend.
    ///
    /// Reloads are serialized: a caller arriving while one is in flight
    /// joins it instead of racing a second reload to completion. Returns
    /// the resulting state.
    pub async fn reload(&self) -> AuthState {
        let cell = {
            let mut slot = self.reload_slot.lock().await;
            match slot.as_ref() {
                Some(cell) => cell.clone(),
                None => {
                    let cell = Arc::new(OnceCell::new());
                    *slot = Some(cell.clone());
                    cell
                }
            }
        };

        let result = cell.get_or_init(|| self.perform_reload()).await.clone();

        let mut slot = self.reload_slot.lock().await;
        if let Some(current) = slot.as_ref() {
            if Arc::ptr_eq(current, &cell) {
                *slot = None;
            }
        }

        result
    }

    async fn perform_reload(&self) -> AuthState {
        let next = match self.provider.current_session().await {
            Err(e) => {
                tracing::error!("[SessionCoordinator] Session retrieval failed: {}", e);
                self.profile_cache.invalidate().await;
                *self.last_identity.lock().await = None;
                AuthState::Error
            }
            Ok(None) => {
                self.profile_cache.invalidate().await;
                *self.last_identity.lock().await = None;
                AuthState::Unauthenticated
            }
            Ok(Some(session)) => {
                *self.last_identity.lock().await = Some(session.identity.clone());
                // A failed profile fetch is non-fatal: the user stays
                // authenticated on provider fields alone.
                let profile = self.profile_cache.profile(&session.identity).await;
                let user = AuthenticatedUser::merge(&session, profile.as_ref());
                AuthState::Authenticated(user)
            }
        };

        *self.state.write().await = next.clone();
        next
    }

    /// Handles one provider notification.
    ///
    /// Sign-out clears everything unconditionally. Sign-in, token-refresh,
    /// and user-updated notifications only trigger a reload when the
    /// identity actually changed; providers emit no-op refreshes far more
    /// often than the identity changes, and an unconditional reload would
    /// cause redundant backend calls.
    pub(crate) async fn handle_session_change(&self, change: SessionChange) {
        if self.logging_out.load(Ordering::SeqCst) {
            tracing::debug!(
                "[SessionCoordinator] Ignoring {:?} during logout",
                change.kind
            );
            return;
        }

        match change.kind {
            SessionChangeKind::SignedOut => {
                self.profile_cache.invalidate().await;
                *self.last_identity.lock().await = None;
                *self.state.write().await = AuthState::Unauthenticated;
            }
            SessionChangeKind::SignedIn
            | SessionChangeKind::TokenRefreshed
            | SessionChangeKind::UserUpdated => {
                let incoming = change.session.as_ref().map(|s| s.identity.clone());
                let unchanged = *self.last_identity.lock().await == incoming;
                if unchanged {
                    tracing::debug!(
                        "[SessionCoordinator] {:?} with unchanged identity, skipping reload",
                        change.kind
                    );
                    return;
                }
                self.reload().await;
            }
        }
    }

    /// Logs the user out.
    ///
    /// Local identity and cache are cleared regardless of whether the
    /// provider sign-out succeeds; notifications arriving while the logout
    /// runs are suppressed.
    pub async fn logout(&self) {
        self.logging_out.store(true, Ordering::SeqCst);

        self.profile_cache.invalidate().await;

        if let Err(e) = self.provider.sign_out(SignOutScope::Global).await {
            tracing::warn!("[SessionCoordinator] Provider sign-out failed: {}", e);
        }

        *self.last_identity.lock().await = None;
        *self.state.write().await = AuthState::Unauthenticated;

        self.logging_out.store(false, Ordering::SeqCst);
    }

    /// Stops the notification listener (unsubscribes).
    pub async fn shutdown(&self) {
        if let Some(handle) = self.listener.lock().await.take() {
            handle.abort();
        }
    }

    /// Returns a snapshot of the current authentication state.
    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    /// Returns the authenticated user, if any.
    pub async fn current_user(&self) -> Option<AuthenticatedUser> {
        self.state.read().await.user().cloned()
    }
}

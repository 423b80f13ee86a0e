//! Admission control for conversation-history loads.
//!
//! UI remounts and effect re-runs can invoke the history load far more often
//! than the data changes; this guard bounds how often a load may actually
//! reach the network. Admission state is kept per user id so concurrent
//! identities never corrupt each other's cooldown or retry budget.

use agris_core::auth::SessionIdentity;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Admission policy.
#[derive(Debug, Clone)]
pub struct HistoryLoadPolicy {
    /// Minimum spacing between admitted attempts.
    pub cooldown: Duration,
    /// Window after a success during which repeat loads are treated as
    /// already satisfied.
    pub success_cache: Duration,
    /// Retries admitted after the initial attempt before the guard blocks
    /// until a manual reset.
    pub max_retries: u32,
    /// How long the in-flight flag stays set after a failed attempt, to
    /// absorb racing re-entrant calls.
    pub failure_unlock_delay: Duration,
}

impl Default for HistoryLoadPolicy {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(10 * 60),
            success_cache: Duration::from_secs(30 * 60),
            max_retries: 1,
            failure_unlock_delay: Duration::from_secs(60),
        }
    }
}

/// Per-identity admission state.
#[derive(Debug, Default)]
struct GuardState {
    is_loading: bool,
    last_attempt_at: Option<Instant>,
    last_success_at: Option<Instant>,
    /// Started attempts since the last success or reset. Incremented when
    /// an attempt starts, not when it fails, so repeated attempts exhaust
    /// the budget even if their failures are never reported.
    retry_count: u32,
}

/// Admission-control guard for history loads.
///
/// One instance is shared process-wide via `Arc` so unrelated callers get
/// the same cooldown and retry guarantees.
pub struct HistoryLoadGuard {
    policy: HistoryLoadPolicy,
    states: Arc<Mutex<HashMap<String, GuardState>>>,
}

impl Default for HistoryLoadGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryLoadGuard {
    /// Creates a guard with the default policy.
    pub fn new() -> Self {
        Self::with_policy(HistoryLoadPolicy::default())
    }

    /// Creates a guard with a custom policy.
    pub fn with_policy(policy: HistoryLoadPolicy) -> Self {
        Self {
            policy,
            states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns whether a load would currently be admitted for the identity.
    pub async fn can_load(&self, identity: &SessionIdentity) -> bool {
        let states = self.states.lock().await;
        self.admissible(states.get(&identity.user_id))
    }

    /// Atomically checks admission and, when admitted, marks the attempt
    /// started: sets the in-flight flag, stamps the attempt time, and
    /// advances the retry counter.
    pub async fn begin_load(&self, identity: &SessionIdentity) -> bool {
        let mut states = self.states.lock().await;
        if !self.admissible(states.get(&identity.user_id)) {
            tracing::debug!(
                "[HistoryLoadGuard] Load denied for user {}",
                identity.user_id
            );
            return false;
        }

        let state = states.entry(identity.user_id.clone()).or_default();
        state.is_loading = true;
        state.last_attempt_at = Some(Instant::now());
        state.retry_count += 1;
        true
    }

    /// Records a successful load: stamps the success time, resets the retry
    /// budget, clears the in-flight flag.
    pub async fn record_success(&self, identity: &SessionIdentity) {
        let mut states = self.states.lock().await;
        let state = states.entry(identity.user_id.clone()).or_default();
        state.last_success_at = Some(Instant::now());
        state.retry_count = 0;
        state.is_loading = false;
    }

    /// Records a failed load.
    ///
    /// The in-flight flag clears only after the unlock delay; the retry
    /// counter already advanced when the attempt started.
    pub async fn record_failure(&self, identity: &SessionIdentity) {
        let states = Arc::clone(&self.states);
        let user_id = identity.user_id.clone();
        let delay = self.policy.failure_unlock_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut states = states.lock().await;
            if let Some(state) = states.get_mut(&user_id) {
                state.is_loading = false;
            }
        });
    }

    /// Manual override re-enabling immediate loads: zeroes the retry budget
    /// and both timestamps. The in-flight flag is left alone — a reset never
    /// bypasses the in-flight check.
    pub async fn force_reset(&self, identity: &SessionIdentity) {
        let mut states = self.states.lock().await;
        if let Some(state) = states.get_mut(&identity.user_id) {
            state.retry_count = 0;
            state.last_attempt_at = None;
            state.last_success_at = None;
        }
    }

    fn admissible(&self, state: Option<&GuardState>) -> bool {
        let Some(state) = state else {
            // First attempt for this identity.
            return true;
        };
        if state.is_loading {
            return false;
        }
        if let Some(success) = state.last_success_at {
            if success.elapsed() < self.policy.success_cache {
                return false;
            }
        }
        if let Some(attempt) = state.last_attempt_at {
            if attempt.elapsed() < self.policy.cooldown {
                return false;
            }
        }
        // The counter tracks started attempts: the initial attempt plus
        // max_retries more are admitted, then the guard blocks until a
        // manual reset.
        if state.retry_count > self.policy.max_retries {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agris_core::auth::SessionIdentity;

    fn identity(user_id: &str) -> SessionIdentity {
        SessionIdentity::new(user_id, "tok")
    }

    fn minutes(m: u64) -> Duration {
        Duration::from_secs(m * 60)
    }

    #[tokio::test(start_paused = true)]
    async fn test_denies_while_loading() {
        let guard = HistoryLoadGuard::new();
        let id = identity("42");

        assert!(guard.begin_load(&id).await);
        assert!(!guard.can_load(&id).await);
        assert!(!guard.begin_load(&id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_spacing() {
        let guard = HistoryLoadGuard::new();
        let id = identity("42");

        assert!(guard.begin_load(&id).await);
        guard.record_failure(&id).await;
        tokio::task::yield_now().await;

        // Unlock delay has passed, but the cooldown has not.
        tokio::time::advance(minutes(2)).await;
        assert!(!guard.can_load(&id).await);

        tokio::time::advance(minutes(9)).await;
        assert!(guard.can_load(&id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_cache_window() {
        let guard = HistoryLoadGuard::new();
        let id = identity("42");

        assert!(guard.begin_load(&id).await);
        guard.record_success(&id).await;

        tokio::time::advance(minutes(5)).await;
        assert!(!guard.can_load(&id).await, "recent success satisfies the load");

        tokio::time::advance(minutes(26)).await;
        assert!(guard.can_load(&id).await, "success cache expired");
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_budget_exhausts_until_reset() {
        let guard = HistoryLoadGuard::new();
        let id = identity("42");

        assert!(guard.begin_load(&id).await);
        guard.record_failure(&id).await;
        tokio::task::yield_now().await;
        tokio::time::advance(minutes(11)).await;
        tokio::task::yield_now().await;

        assert!(guard.begin_load(&id).await, "one retry is admitted");
        guard.record_failure(&id).await;
        tokio::task::yield_now().await;
        tokio::time::advance(minutes(11)).await;
        tokio::task::yield_now().await;

        assert!(!guard.can_load(&id).await, "budget exhausted");
        assert!(!guard.begin_load(&id).await);

        guard.force_reset(&id).await;
        assert!(guard.begin_load(&id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_unlock_is_delayed() {
        let guard = HistoryLoadGuard::with_policy(HistoryLoadPolicy {
            cooldown: Duration::ZERO,
            success_cache: Duration::ZERO,
            max_retries: 10,
            failure_unlock_delay: Duration::from_secs(60),
        });
        let id = identity("42");

        assert!(guard.begin_load(&id).await);
        guard.record_failure(&id).await;
        tokio::task::yield_now().await;

        // Still locked: the in-flight flag absorbs racing re-entrant calls.
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(!guard.can_load(&id).await);

        tokio::time::advance(Duration::from_secs(31)).await;
        tokio::task::yield_now().await;
        assert!(guard.can_load(&id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_retry_budget() {
        let guard = HistoryLoadGuard::new();
        let id = identity("42");

        assert!(guard.begin_load(&id).await);
        guard.record_success(&id).await;
        tokio::time::advance(minutes(31)).await;

        assert!(guard.begin_load(&id).await);
        guard.record_success(&id).await;
        tokio::time::advance(minutes(31)).await;

        // Two successful rounds never eat into the retry budget.
        assert!(guard.can_load(&id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identities_do_not_interfere() {
        let guard = HistoryLoadGuard::new();

        assert!(guard.begin_load(&identity("42")).await);
        assert!(guard.can_load(&identity("43")).await);
        assert!(guard.begin_load(&identity("43")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_reset_keeps_in_flight_check() {
        let guard = HistoryLoadGuard::new();
        let id = identity("42");

        assert!(guard.begin_load(&id).await);
        guard.force_reset(&id).await;

        assert!(!guard.can_load(&id).await, "reset must not bypass in-flight");
    }
}

//! Time-bound cache of the backend profile for the current identity.
//!
//! The profile endpoint is hit from several unrelated places (initial
//! reload, token refreshes, settings views), so the cache deduplicates
//! concurrent fetches and serves recent results without a network call.
//! One instance is shared process-wide via `Arc` so every caller gets the
//! same dedup guarantee without explicit coordination.

use agris_core::auth::SessionIdentity;
use agris_core::user::{Profile, ProfileApi};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::{Duration, Instant};

/// Cache policy.
#[derive(Debug, Clone)]
pub struct IdentityCachePolicy {
    /// Maximum age at which a cached profile is served without a fetch.
    pub profile_ttl: Duration,
}

impl Default for IdentityCachePolicy {
    fn default() -> Self {
        Self {
            profile_ttl: Duration::from_secs(60),
        }
    }
}

/// A fetched profile together with the identity it belongs to.
///
/// Valid only while the owner matches the requesting identity (both user id
/// and access token) and the entry is younger than the TTL.
struct CachedProfile {
    value: Profile,
    owner: SessionIdentity,
    fetched_at: Instant,
}

/// A pending fetch that concurrent callers join instead of issuing their
/// own request. The cell resolves exactly once; failures resolve `None`
/// for every joiner.
struct InFlightFetch {
    owner: SessionIdentity,
    cell: Arc<OnceCell<Option<Profile>>>,
}

#[derive(Default)]
struct CacheState {
    cached: Option<CachedProfile>,
    in_flight: Option<InFlightFetch>,
}

/// Deduplicating, TTL-bound profile cache.
pub struct IdentityCache {
    api: Arc<dyn ProfileApi>,
    policy: IdentityCachePolicy,
    state: Mutex<CacheState>,
}

impl IdentityCache {
    /// Creates a cache with the default policy.
    pub fn new(api: Arc<dyn ProfileApi>) -> Self {
        Self::with_policy(api, IdentityCachePolicy::default())
    }

    /// Creates a cache with a custom policy.
    pub fn with_policy(api: Arc<dyn ProfileApi>, policy: IdentityCachePolicy) -> Self {
        Self {
            api,
            policy,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Returns the profile for the given identity.
    ///
    /// A valid cached value is returned without a network call. If a fetch
    /// for the same identity is already in flight, the caller joins it.
    /// Otherwise exactly one fetch is issued; its success is cached, its
    /// failure resolves to `None` and is not cached, so the next call may
    /// retry immediately.
    pub async fn profile(&self, identity: &SessionIdentity) -> Option<Profile> {
        let cell = {
            let mut state = self.state.lock().await;

            if let Some(cached) = &state.cached {
                if cached.owner == *identity
                    && cached.fetched_at.elapsed() < self.policy.profile_ttl
                {
                    return Some(cached.value.clone());
                }
            }

            match &state.in_flight {
                Some(fetch) if fetch.owner == *identity => fetch.cell.clone(),
                // No fetch for this identity in flight; claim the slot.
                // A stale fetch for a previous identity keeps running
                // detached and can no longer touch the cache.
                _ => {
                    let cell = Arc::new(OnceCell::new());
                    state.in_flight = Some(InFlightFetch {
                        owner: identity.clone(),
                        cell: cell.clone(),
                    });
                    cell
                }
            }
        };

        let result = cell
            .get_or_init(|| async {
                match self.api.fetch_profile(identity).await {
                    Ok(profile) => Some(profile),
                    Err(e) => {
                        tracing::warn!(
                            "[IdentityCache] Profile fetch failed for user {}: {}",
                            identity.user_id,
                            e
                        );
                        None
                    }
                }
            })
            .await
            .clone();

        let mut state = self.state.lock().await;
        if let Some(fetch) = &state.in_flight {
            // Only the fetch that still owns the slot may publish its
            // result; an invalidation or identity change in the meantime
            // discards it.
            if Arc::ptr_eq(&fetch.cell, &cell) {
                if let Some(profile) = &result {
                    state.cached = Some(CachedProfile {
                        value: profile.clone(),
                        owner: identity.clone(),
                        fetched_at: Instant::now(),
                    });
                }
                state.in_flight = None;
            }
        }

        result
    }

    /// Clears the cache wholesale.
    ///
    /// Called on sign-out and identity change. An in-flight fetch keeps
    /// running but its result is discarded.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.cached = None;
        state.in_flight = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agris_core::error::{AgrisError, Result};
    use agris_core::user::UserRole;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct MockProfileApi {
        fetch_calls: AtomicUsize,
        fail_next: AtomicBool,
        delay: Duration,
    }

    impl MockProfileApi {
        fn new() -> Self {
            Self {
                fetch_calls: AtomicUsize::new(0),
                fail_next: AtomicBool::new(false),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new()
            }
        }

        fn calls(&self) -> usize {
            self.fetch_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProfileApi for MockProfileApi {
        async fn fetch_profile(&self, identity: &SessionIdentity) -> Result<Profile> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(AgrisError::api(503, "backend unavailable"));
            }
            Ok(Profile {
                user_type: Some(UserRole::Expert),
                language: Some(format!("lang-{}", identity.user_id)),
            })
        }
    }

    fn identity(user_id: &str, token: &str) -> SessionIdentity {
        SessionIdentity::new(user_id, token)
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_calls_share_one_fetch() {
        let api = Arc::new(MockProfileApi::with_delay(Duration::from_millis(100)));
        let cache = IdentityCache::new(api.clone());
        let id = identity("42", "tok-a");

        let (a, b, c) = tokio::join!(cache.profile(&id), cache.profile(&id), cache.profile(&id));

        assert_eq!(api.calls(), 1);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert!(a.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_serves_cache_then_refetches() {
        let api = Arc::new(MockProfileApi::new());
        let cache = IdentityCache::new(api.clone());
        let id = identity("42", "tok-a");

        assert!(cache.profile(&id).await.is_some());
        assert_eq!(api.calls(), 1);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.profile(&id).await.is_some());
        assert_eq!(api.calls(), 1, "59s-old entry must be served from cache");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.profile(&id).await.is_some());
        assert_eq!(api.calls(), 2, "61s-old entry must trigger a fresh fetch");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_is_identity_scoped() {
        let api = Arc::new(MockProfileApi::new());
        let cache = IdentityCache::new(api.clone());

        let a = cache.profile(&identity("42", "tok-a")).await.unwrap();
        // Same user, new token: still a changed identity.
        let b = cache.profile(&identity("42", "tok-b")).await.unwrap();

        assert_eq!(api.calls(), 2);
        assert_eq!(a.language.as_deref(), Some("lang-42"));
        assert_eq!(b.language.as_deref(), Some("lang-42"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_not_cached() {
        let api = Arc::new(MockProfileApi::new());
        api.fail_next.store(true, Ordering::SeqCst);
        let cache = IdentityCache::new(api.clone());
        let id = identity("42", "tok-a");

        assert!(cache.profile(&id).await.is_none());
        assert_eq!(api.calls(), 1);

        // The failed result was not cached; the retry may happen at once.
        assert!(cache.profile(&id).await.is_some());
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_failure() {
        let api = Arc::new(MockProfileApi::with_delay(Duration::from_millis(100)));
        api.fail_next.store(true, Ordering::SeqCst);
        let cache = IdentityCache::new(api.clone());
        let id = identity("42", "tok-a");

        let (a, b) = tokio::join!(cache.profile(&id), cache.profile(&id));

        assert_eq!(api.calls(), 1, "joiners must not issue a second fetch");
        assert!(a.is_none());
        assert!(b.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_discards_entry() {
        let api = Arc::new(MockProfileApi::new());
        let cache = IdentityCache::new(api.clone());
        let id = identity("42", "tok-a");

        cache.profile(&id).await;
        cache.invalidate().await;
        cache.profile(&id).await;

        assert_eq!(api.calls(), 2);
    }
}

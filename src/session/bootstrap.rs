// SPDX-License-Identifier: MIT

//! Identity-to-profile resolution.
//!
//! A profile row is created by a backend trigger when an identity signs up,
//! so right after signup the row can trail the identity by a moment. The
//! resolver retries a fixed number of times with a fixed delay, treating
//! only the no-matching-row condition as transient. Anything else is a real
//! failure and aborts immediately.

use std::time::Duration;

use tokio::sync::watch;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::ProfileRow;
use crate::session::ProfileStore;

/// Retry shape for profile resolution.
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Total fetch attempts per resolution, including the first.
    pub max_attempts: u32,
    /// Fixed pause between consecutive attempts. No backoff; the window
    /// being covered is trigger replication lag, not service outage.
    pub retry_delay: Duration,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            retry_delay: Duration::from_millis(750),
        }
    }
}

/// Watches the manager's generation counter so a resolution can notice it
/// has been superseded, even mid-delay.
pub(crate) struct ResolveGuard {
    generation: watch::Receiver<u64>,
    origin: u64,
}

impl ResolveGuard {
    pub(crate) fn new(mut generation: watch::Receiver<u64>) -> Self {
        let origin = *generation.borrow_and_update();
        Self { generation, origin }
    }

    /// True once a newer auth event has claimed the session state.
    pub(crate) fn is_stale(&self) -> bool {
        *self.generation.borrow() != self.origin
    }

    /// Resolves when this resolution becomes stale (or the manager is
    /// gone, which means the same thing here).
    pub(crate) async fn cancelled(&mut self) {
        loop {
            if *self.generation.borrow_and_update() != self.origin {
                return;
            }
            if self.generation.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Where a resolution ended up.
#[derive(Debug)]
pub(crate) enum ResolveOutcome {
    Resolved(Box<ProfileRow>),
    /// Every attempt saw no row.
    Exhausted { attempts: u32 },
    /// A fetch failed with something other than the no-row condition.
    Fatal(AppError),
    /// A newer auth event superseded this resolution; nothing was
    /// committed.
    Cancelled,
}

/// Resolution progress between awaits.
#[derive(Debug, Clone, Copy)]
enum ResolveState {
    /// About to run fetch attempt `n` (1-based).
    Attempting(u32),
    /// Sitting out the fixed delay after empty attempt `n`.
    Waiting(u32),
}

/// Run one full resolution for `user_id`. Per-call state only; concurrent
/// resolutions for the same identity do not interfere.
pub(crate) async fn resolve_profile(
    profiles: &dyn ProfileStore,
    user_id: Uuid,
    options: &BootstrapOptions,
    guard: &mut ResolveGuard,
) -> ResolveOutcome {
    let mut state = ResolveState::Attempting(1);

    loop {
        state = match state {
            ResolveState::Attempting(attempt) => {
                if guard.is_stale() {
                    return ResolveOutcome::Cancelled;
                }

                match profiles.fetch_profile(user_id).await {
                    _ if guard.is_stale() => return ResolveOutcome::Cancelled,
                    Ok(Some(row)) => return ResolveOutcome::Resolved(Box::new(row)),
                    Ok(None) if attempt < options.max_attempts => {
                        tracing::debug!(
                            user_id = %user_id,
                            attempt,
                            "Profile not visible yet; waiting to retry"
                        );
                        ResolveState::Waiting(attempt)
                    }
                    Ok(None) => {
                        return ResolveOutcome::Exhausted {
                            attempts: options.max_attempts,
                        }
                    }
                    Err(e) => return ResolveOutcome::Fatal(e),
                }
            }
            ResolveState::Waiting(attempt) => {
                tokio::select! {
                    _ = tokio::time::sleep(options.retry_delay) => ResolveState::Attempting(attempt + 1),
                    _ = guard.cancelled() => return ResolveOutcome::Cancelled,
                }
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use super::*;

    /// Scripted profile store: each fetch pops the next outcome.
    struct ScriptedStore {
        script: Mutex<VecDeque<Result<Option<ProfileRow>, AppError>>>,
        fetches: AtomicUsize,
    }

    impl ScriptedStore {
        fn new(script: Vec<Result<Option<ProfileRow>, AppError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProfileStore for ScriptedStore {
        async fn fetch_profile(&self, _user_id: Uuid) -> Result<Option<ProfileRow>, AppError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(None))
        }

        async fn touch_last_login(
            &self,
            _user_id: Uuid,
            _at: DateTime<Utc>,
        ) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn profile(id: Uuid) -> ProfileRow {
        ProfileRow {
            id,
            name: Some("Ana".to_string()),
            email: Some("ana@example.com".to_string()),
            role: Default::default(),
            avatar: None,
            profession: None,
            app_plan: None,
            app_purchase_date: None,
            xp: None,
            level: None,
            streak: None,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    fn guard_pair() -> (watch::Sender<u64>, ResolveGuard) {
        let (tx, rx) = watch::channel(0u64);
        let guard = ResolveGuard::new(rx);
        (tx, guard)
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_profile_resolves_on_first_attempt() {
        let id = Uuid::new_v4();
        let store = ScriptedStore::new(vec![Ok(Some(profile(id)))]);
        let (_tx, mut guard) = guard_pair();
        let started = tokio::time::Instant::now();

        let outcome =
            resolve_profile(&store, id, &BootstrapOptions::default(), &mut guard).await;

        assert!(matches!(outcome, ResolveOutcome::Resolved(row) if row.id == id));
        assert_eq!(store.fetches(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn late_profile_resolves_after_delays() {
        let id = Uuid::new_v4();
        let store = ScriptedStore::new(vec![Ok(None), Ok(None), Ok(Some(profile(id)))]);
        let (_tx, mut guard) = guard_pair();
        let options = BootstrapOptions::default();
        let started = tokio::time::Instant::now();

        let outcome = resolve_profile(&store, id, &options, &mut guard).await;

        assert!(matches!(outcome, ResolveOutcome::Resolved(_)));
        assert_eq!(store.fetches(), 3);
        // two waits, one per empty attempt
        assert_eq!(started.elapsed(), options.retry_delay * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_profile_exhausts_all_attempts() {
        let id = Uuid::new_v4();
        let store = ScriptedStore::new(vec![Ok(None), Ok(None), Ok(None), Ok(None)]);
        let (_tx, mut guard) = guard_pair();
        let options = BootstrapOptions::default();
        let started = tokio::time::Instant::now();

        let outcome = resolve_profile(&store, id, &options, &mut guard).await;

        assert!(matches!(outcome, ResolveOutcome::Exhausted { attempts: 4 }));
        assert_eq!(store.fetches(), 4);
        assert_eq!(started.elapsed(), options.retry_delay * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_aborts_without_retrying() {
        let id = Uuid::new_v4();
        let store = ScriptedStore::new(vec![Err(AppError::Database("boom".to_string()))]);
        let (_tx, mut guard) = guard_pair();
        let started = tokio::time::Instant::now();

        let outcome =
            resolve_profile(&store, id, &BootstrapOptions::default(), &mut guard).await;

        assert!(matches!(outcome, ResolveOutcome::Fatal(_)));
        assert_eq!(store.fetches(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_mid_retry_aborts() {
        let id = Uuid::new_v4();
        let store = ScriptedStore::new(vec![
            Ok(None),
            Err(AppError::Database("boom".to_string())),
        ]);
        let (_tx, mut guard) = guard_pair();

        let outcome =
            resolve_profile(&store, id, &BootstrapOptions::default(), &mut guard).await;

        assert!(matches!(outcome, ResolveOutcome::Fatal(_)));
        assert_eq!(store.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn generation_bump_cancels_a_waiting_resolution() {
        let id = Uuid::new_v4();
        let store =
            std::sync::Arc::new(ScriptedStore::new(vec![Ok(None), Ok(Some(profile(id)))]));
        let (tx, rx) = watch::channel(0u64);
        let mut guard = ResolveGuard::new(rx);

        let task = {
            let store = store.clone();
            tokio::spawn(async move {
                resolve_profile(store.as_ref(), id, &BootstrapOptions::default(), &mut guard)
                    .await
            })
        };

        // Let the first fetch land and the delay start.
        while store.fetches() == 0 {
            tokio::task::yield_now().await;
        }
        tx.send_modify(|g| *g += 1);

        let outcome = task.await.unwrap();
        assert!(matches!(outcome, ResolveOutcome::Cancelled));
        assert_eq!(store.fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_guard_cancels_before_any_fetch() {
        let id = Uuid::new_v4();
        let store = ScriptedStore::new(vec![Ok(Some(profile(id)))]);
        let (tx, rx) = watch::channel(0u64);
        let mut guard = ResolveGuard::new(rx);
        tx.send_modify(|g| *g += 1);

        let outcome =
            resolve_profile(&store, id, &BootstrapOptions::default(), &mut guard).await;

        assert!(matches!(outcome, ResolveOutcome::Cancelled));
        assert_eq!(store.fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn resolutions_do_not_share_retry_state() {
        let id = Uuid::new_v4();
        let exhaust = ScriptedStore::new(vec![Ok(None), Ok(None), Ok(None), Ok(None)]);
        let (_tx1, mut guard1) = guard_pair();
        let outcome =
            resolve_profile(&exhaust, id, &BootstrapOptions::default(), &mut guard1).await;
        assert!(matches!(outcome, ResolveOutcome::Exhausted { .. }));

        // A fresh resolution for the same identity starts from attempt 1.
        let fresh = ScriptedStore::new(vec![Ok(Some(profile(id)))]);
        let (_tx2, mut guard2) = guard_pair();
        let outcome =
            resolve_profile(&fresh, id, &BootstrapOptions::default(), &mut guard2).await;
        assert!(matches!(outcome, ResolveOutcome::Resolved(_)));
        assert_eq!(fresh.fetches(), 1);
    }
}

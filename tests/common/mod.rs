// SPDX-License-Identifier: MIT

//! Shared test doubles: a scripted auth backend, a scripted profile
//! store, and helpers for driving the session manager deterministically.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

use atlon_core::config::Config;
use atlon_core::error::AppError;
use atlon_core::models::{AuthEvent, Identity, ProfileRow, Session, UserRole};
use atlon_core::routes::create_router;
use atlon_core::session::{AuthApi, AuthSnapshot, Notifier, ProfileStore};
use atlon_core::supabase::Client;
use atlon_core::AppState;

/// A session for the given identity, valid for an hour.
#[allow(dead_code)]
pub fn test_session(user_id: Uuid) -> Session {
    Session {
        access_token: format!("access-{user_id}"),
        refresh_token: format!("refresh-{user_id}"),
        expires_at: Utc::now() + chrono::Duration::hours(1),
        user: Identity {
            id: user_id,
            email: "aluna@example.com".to_string(),
        },
    }
}

/// A plausible backend profile row for the given identity.
#[allow(dead_code)]
pub fn profile_row(user_id: Uuid) -> ProfileRow {
    ProfileRow {
        id: user_id,
        name: Some("Ana Silva".to_string()),
        email: Some("aluna@example.com".to_string()),
        role: UserRole::Student,
        avatar: None,
        profession: Some("Fisioterapeuta".to_string()),
        app_plan: None,
        app_purchase_date: None,
        xp: Some(120),
        level: Some(2),
        streak: Some(4),
        created_at: Utc::now(),
        last_login: None,
    }
}

/// Park on the snapshot channel until `pred` holds. Waiting this way keeps
/// the test task idle, so the paused clock is free to advance to the
/// resolver's timers.
#[allow(dead_code)]
pub async fn wait_until(
    rx: &mut watch::Receiver<AuthSnapshot>,
    pred: impl Fn(&AuthSnapshot) -> bool,
) {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            if pred(&rx.borrow_and_update()) {
                return;
            }
            rx.changed().await.expect("session manager dropped");
        }
    })
    .await
    .expect("snapshot never reached the expected state");
}

/// Yield until `cond` holds, without letting the clock advance. Only for
/// conditions that no pending timer gates, like a spawned write landing.
#[allow(dead_code)]
pub async fn settle(cond: impl Fn() -> bool) {
    for _ in 0..1024 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never settled");
}

// ─── Auth backend double ────────────────────────────────────────────────

/// Scripted auth backend. Behaves like the real client: a successful
/// sign-in stores the session and emits `SignedIn`, sign-out clears it
/// and emits `SignedOut`.
#[allow(dead_code)]
pub struct MockAuthApi {
    events: broadcast::Sender<AuthEvent>,
    current: Mutex<Option<Session>>,
    sign_in_script: Mutex<VecDeque<Result<Session, AppError>>>,
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockAuthApi {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(32);
        Arc::new(Self {
            events,
            current: Mutex::new(None),
            sign_in_script: Mutex::new(VecDeque::new()),
            sign_in_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        })
    }

    /// Pretend a session was persisted before the manager started.
    pub fn with_current_session(session: Session) -> Arc<Self> {
        let mock = Self::new();
        *mock.current.lock().unwrap() = Some(session);
        mock
    }

    /// Queue the outcome of the next `sign_in_with_password` call.
    pub fn script_sign_in(&self, outcome: Result<Session, AppError>) {
        self.sign_in_script.lock().unwrap().push_back(outcome);
    }

    /// Emit an auth event as the backend would.
    pub fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn sign_in_with_password(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<Session, AppError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .sign_in_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Auth("no scripted sign-in".to_string())));
        let session = outcome?;
        *self.current.lock().unwrap() = Some(session.clone());
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        *self.current.lock().unwrap() = None;
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    fn current_session(&self) -> Option<Session> {
        self.current.lock().unwrap().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

// ─── Profile store double ───────────────────────────────────────────────

/// One scripted fetch outcome.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum FetchOutcome {
    /// The profile row is visible.
    Found,
    /// No row yet, the transient condition the retry loop tolerates.
    Missing,
    /// A real backend failure.
    Fail(&'static str),
}

/// Profile store whose fetches follow a script, then repeat a fallback
/// outcome. Counts every call.
#[allow(dead_code)]
pub struct ScriptedProfiles {
    script: Mutex<VecDeque<FetchOutcome>>,
    fallback: FetchOutcome,
    fetches: AtomicUsize,
    touch_attempts: AtomicUsize,
    touches: Mutex<Vec<Uuid>>,
    fail_touch: AtomicBool,
}

#[allow(dead_code)]
impl ScriptedProfiles {
    fn with_script(script: Vec<FetchOutcome>, fallback: FetchOutcome) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            fetches: AtomicUsize::new(0),
            touch_attempts: AtomicUsize::new(0),
            touches: Mutex::new(Vec::new()),
            fail_touch: AtomicBool::new(false),
        })
    }

    /// Every fetch finds the row.
    pub fn appears_immediately() -> Arc<Self> {
        Self::with_script(Vec::new(), FetchOutcome::Found)
    }

    /// The first `misses` fetches see nothing; later ones find the row.
    pub fn appears_after(misses: usize) -> Arc<Self> {
        Self::with_script(vec![FetchOutcome::Missing; misses], FetchOutcome::Found)
    }

    /// No fetch ever finds the row.
    pub fn never_appears() -> Arc<Self> {
        Self::with_script(Vec::new(), FetchOutcome::Missing)
    }

    /// Fetches follow `script` exactly, then keep failing.
    pub fn scripted(script: Vec<FetchOutcome>) -> Arc<Self> {
        Self::with_script(script, FetchOutcome::Fail("script exhausted"))
    }

    /// Make `touch_last_login` fail from now on.
    pub fn refuse_touches(&self) {
        self.fail_touch.store(true, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Calls to `touch_last_login`, successful or not.
    pub fn touch_attempts(&self) -> usize {
        self.touch_attempts.load(Ordering::SeqCst)
    }

    /// User ids whose last login was recorded, in call order.
    pub fn touched(&self) -> Vec<Uuid> {
        self.touches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileStore for ScriptedProfiles {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>, AppError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        match outcome {
            FetchOutcome::Found => Ok(Some(profile_row(user_id))),
            FetchOutcome::Missing => Ok(None),
            FetchOutcome::Fail(msg) => Err(AppError::Database(msg.to_string())),
        }
    }

    async fn touch_last_login(&self, user_id: Uuid, _at: DateTime<Utc>) -> Result<(), AppError> {
        self.touch_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_touch.load(Ordering::SeqCst) {
            return Err(AppError::Database("last-login write refused".to_string()));
        }
        self.touches.lock().unwrap().push(user_id);
        Ok(())
    }
}

// ─── Notifier double ────────────────────────────────────────────────────

/// Captures user-visible error messages.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

// ─── Webhook app ────────────────────────────────────────────────────────

/// A webhook server over an offline database client. Requests that get as
/// far as the database fail with a 500; everything before that runs for
/// real.
#[allow(dead_code)]
pub fn create_test_app() -> axum::Router {
    let config = Config::default();
    let db = Client::new_mock();
    let state = Arc::new(AppState { config, db });
    create_router(state)
}

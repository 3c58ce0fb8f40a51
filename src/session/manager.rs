// SPDX-License-Identifier: MIT

//! The session manager: consumes auth events, drives profile resolution,
//! and publishes the observable snapshot.
//!
//! Concurrency model:
//! - an intake task reads the auth client's broadcast and bumps the
//!   generation counter the moment a superseding event arrives, then queues
//!   the event;
//! - a processor task handles queued events strictly one at a time, so at
//!   most one resolution runs and snapshot writes never interleave;
//! - every resolution carries a [`ResolveGuard`] and commits nothing once
//!   it is stale.
//!
//! Token refreshes bump no generation: rotating a token must not cancel a
//! live resolution for the same identity.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, watch};

use crate::error::AppError;
use crate::models::session::{AuthEvent, Session};
use crate::models::user::User;
use crate::session::bootstrap::{resolve_profile, BootstrapOptions, ResolveGuard, ResolveOutcome};
use crate::session::{AuthApi, AuthSnapshot, Notifier, ProfileStore};

const PROFILE_LOAD_ERROR: &str = "Erro ao carregar seu perfil.";
const PROFILE_MISSING_ERROR: &str =
    "Não foi possível carregar seu perfil. Entre novamente para tentar de novo.";

/// Owns session state for the lifetime of the application. Cheap to clone;
/// clones share state.
#[derive(Clone)]
pub struct SessionManager {
    shared: Arc<Shared>,
}

struct Shared {
    auth: Arc<dyn AuthApi>,
    profiles: Arc<dyn ProfileStore>,
    notifier: Arc<dyn Notifier>,
    options: BootstrapOptions,
    snapshot: watch::Sender<AuthSnapshot>,
    /// Bumped per superseding auth event; resolutions born under an older
    /// value are stale.
    generation: watch::Sender<u64>,
    started: AtomicBool,
}

impl SessionManager {
    pub fn new(
        auth: Arc<dyn AuthApi>,
        profiles: Arc<dyn ProfileStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_options(auth, profiles, notifier, BootstrapOptions::default())
    }

    pub fn with_options(
        auth: Arc<dyn AuthApi>,
        profiles: Arc<dyn ProfileStore>,
        notifier: Arc<dyn Notifier>,
        options: BootstrapOptions,
    ) -> Self {
        let (snapshot, _) = watch::channel(AuthSnapshot::initial());
        let (generation, _) = watch::channel(0u64);
        Self {
            shared: Arc::new(Shared {
                auth,
                profiles,
                notifier,
                options,
                snapshot,
                generation,
                started: AtomicBool::new(false),
            }),
        }
    }

    /// Spawn the intake and processor tasks. Subsequent calls are no-ops.
    ///
    /// The tasks end on their own when the auth client (and its event
    /// channel) goes away.
    pub fn start(&self) {
        if self.shared.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let (queue_tx, mut queue_rx) = mpsc::unbounded_channel::<AuthEvent>();

        let shared = self.shared.clone();
        let mut events = shared.auth.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if event.replaces_auth_state() {
                            shared.generation.send_modify(|g| *g += 1);
                        }
                        if queue_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let shared = self.shared.clone();
        tokio::spawn(async move {
            shared.startup_check().await;
            while let Some(event) = queue_rx.recv().await {
                shared.handle_event(event).await;
            }
        });
    }

    /// Watch the session snapshot.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.shared.snapshot.subscribe()
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.shared.snapshot.borrow().is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.shared.snapshot.borrow().is_admin()
    }

    /// Sign in. Credential errors propagate to the caller untouched; on
    /// success the resulting `SignedIn` event drives profile resolution,
    /// so a failed sign-in never reaches the profile store.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AppError> {
        self.shared
            .auth
            .sign_in_with_password(email, password)
            .await?;
        Ok(())
    }

    /// Sign out. Local state clears unconditionally; a failed revocation
    /// call is logged, never surfaced.
    pub async fn logout(&self) {
        self.shared.generation.send_modify(|g| *g += 1);
        self.shared.snapshot.send_modify(|s| {
            s.user = None;
            s.session = None;
        });

        if let Err(e) = self.shared.auth.sign_out().await {
            tracing::warn!(error = %e, "Sign-out call failed; local session already cleared");
        }
    }
}

impl Shared {
    /// One-time startup path: check for an existing session, resolve it if
    /// present, then release the loading gate. The gate drops exactly once
    /// per manager lifetime, whatever the outcome.
    async fn startup_check(&self) {
        if let Some(session) = self.auth.current_session() {
            self.snapshot
                .send_modify(|s| s.session = Some(session.clone()));
            self.resolve_and_commit(&session).await;
        }

        self.snapshot.send_modify(|s| s.loading = false);
    }

    async fn handle_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::InitialSession(Some(session)) | AuthEvent::SignedIn(session) => {
                self.snapshot
                    .send_modify(|s| s.session = Some(session.clone()));
                self.resolve_and_commit(&session).await;
            }
            AuthEvent::InitialSession(None) => {
                self.snapshot.send_modify(|s| {
                    s.user = None;
                    s.session = None;
                });
            }
            AuthEvent::SignedOut => {
                self.snapshot.send_modify(|s| {
                    s.user = None;
                    s.session = None;
                });
            }
            AuthEvent::TokenRefreshed(session) => {
                self.snapshot.send_modify(|s| s.session = Some(session));
            }
        }
    }

    /// Resolve the session's identity to a profile and commit the outcome,
    /// unless a newer auth event made this resolution stale.
    async fn resolve_and_commit(&self, session: &Session) {
        let user_id = session.user_id();
        let mut guard = ResolveGuard::new(self.generation.subscribe());

        let outcome = resolve_profile(
            self.profiles.as_ref(),
            user_id,
            &self.options,
            &mut guard,
        )
        .await;

        if guard.is_stale() {
            tracing::debug!(user_id = %user_id, "Discarding superseded resolution");
            return;
        }

        match outcome {
            ResolveOutcome::Resolved(row) => {
                let user: User = (*row).into();
                tracing::info!(user_id = %user.id, role = ?user.role, "Profile resolved");
                self.snapshot.send_modify(|s| s.user = Some(user));
                self.spawn_last_login_update(user_id);
            }
            ResolveOutcome::Exhausted { attempts } => {
                tracing::warn!(
                    user_id = %user_id,
                    attempts,
                    "Profile never became visible; signing out"
                );
                self.notifier.error(PROFILE_MISSING_ERROR);
                self.fail_session().await;
            }
            ResolveOutcome::Fatal(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Profile fetch failed; signing out");
                self.notifier.error(PROFILE_LOAD_ERROR);
                self.fail_session().await;
            }
            ResolveOutcome::Cancelled => {
                tracing::debug!(user_id = %user_id, "Resolution cancelled");
            }
        }
    }

    /// A session whose profile cannot be resolved is unusable: clear it
    /// and revoke it so the auth state cannot point at a half-authenticated
    /// identity.
    async fn fail_session(&self) {
        self.snapshot.send_modify(|s| {
            s.user = None;
            s.session = None;
        });
        if let Err(e) = self.auth.sign_out().await {
            tracing::warn!(error = %e, "Forced sign-out failed");
        }
    }

    /// Record the sign-in timestamp without holding up resolution. One
    /// update per successful resolution; failures only warn.
    fn spawn_last_login_update(&self, user_id: uuid::Uuid) {
        let profiles = self.profiles.clone();
        tokio::spawn(async move {
            if let Err(e) = profiles.touch_last_login(user_id, Utc::now()).await {
                tracing::warn!(user_id = %user_id, error = %e, "Last-login update failed");
            }
        });
    }
}

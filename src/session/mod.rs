// SPDX-License-Identifier: MIT

//! Session state: who is signed in, their resolved profile, and the
//! bootstrap flow that connects the two.
//!
//! The auth service and the profile table are separate systems, and the
//! profile row for a fresh signup can lag behind the auth identity. The
//! [`SessionManager`] owns that gap: it resolves identities to profiles
//! with a bounded retry loop and publishes an observable [`AuthSnapshot`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::session::{AuthEvent, Session};
use crate::models::user::{ProfileRow, User};

mod bootstrap;
mod manager;

pub use bootstrap::BootstrapOptions;
pub use manager::SessionManager;

/// Auth-service operations the session manager depends on.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Session, AppError>;

    async fn sign_out(&self) -> Result<(), AppError>;

    fn current_session(&self) -> Option<Session>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Profile-row operations the session manager depends on.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile for an auth identity. `Ok(None)` is the transient
    /// "row not visible yet" outcome; any error is final.
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>, AppError>;

    /// Record a sign-in timestamp. Best-effort; callers fire and forget.
    async fn touch_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), AppError>;
}

/// User-visible notifications. The UI shell plugs its toast system in
/// here; the default just logs.
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Notifier that writes to the log. Useful headless and in tests.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        tracing::error!(message, "User-visible error");
    }
}

/// Observable session state.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSnapshot {
    /// Resolved application user. `None` while signed out, during
    /// resolution, and after a failed resolution.
    pub user: Option<User>,
    /// The raw auth session, present as soon as the auth service reports
    /// one, before the profile resolves.
    pub session: Option<Session>,
    /// True from startup until the first session resolution completes.
    /// Never becomes true again; later sign-ins resolve without blocking
    /// the whole app.
    pub loading: bool,
}

impl AuthSnapshot {
    /// The pre-resolution state a manager starts in.
    pub fn initial() -> Self {
        Self {
            user: None,
            session: None,
            loading: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role.is_admin())
    }
}

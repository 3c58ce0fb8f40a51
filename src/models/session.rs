// SPDX-License-Identifier: MIT

//! Auth session types shared by the auth client and the session manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Backend auth identity, as returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

/// An authenticated session: tokens plus the identity they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Identity,
}

impl Session {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

/// Auth state transitions broadcast by the auth client.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    /// Emitted once after startup hydration, whether or not a persisted
    /// session could be restored.
    InitialSession(Option<Session>),
    SignedIn(Session),
    SignedOut,
    /// Token rotation only. The identity is unchanged, so handling this
    /// must not disturb an in-flight profile resolution.
    TokenRefreshed(Session),
}

impl AuthEvent {
    /// Whether this event replaces the authenticated identity, making any
    /// in-flight profile resolution stale.
    pub fn replaces_auth_state(&self) -> bool {
        !matches!(self, AuthEvent::TokenRefreshed(_))
    }

    /// The session carried by this event, if any.
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthEvent::InitialSession(session) => session.as_ref(),
            AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) => Some(session),
            AuthEvent::SignedOut => None,
        }
    }
}

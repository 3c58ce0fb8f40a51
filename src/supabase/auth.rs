// SPDX-License-Identifier: MIT

//! Supabase auth (GoTrue) client.
//!
//! Handles:
//! - Password sign-in and sign-out
//! - Refresh-token exchange and startup session hydration
//! - Broadcasting auth state transitions to subscribers
//!
//! Signing in installs the user's access token into the shared row client,
//! so row queries run under that user's row-level security from then on.

use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::session::{AuthEvent, Identity, Session};
use crate::supabase::rest::Client;

/// Capacity of the auth event channel. Events are tiny and consumers keep
/// up; lagging only drops history a late subscriber never needed.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Supabase auth client.
pub struct AuthClient {
    client: Client,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthClient {
    /// Create an auth client sharing the given row client's credentials.
    pub fn new(client: Client) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            session: RwLock::new(None),
            events,
        }
    }

    /// Subscribe to auth state transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// The session currently held, if any.
    pub fn current_session(&self) -> Option<Session> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    /// Hydrate a persisted session at startup and announce the result.
    ///
    /// Always emits `AuthEvent::InitialSession`, present or absent, so
    /// subscribers learn the starting state exactly once.
    pub async fn initialize(&self, persisted_refresh_token: Option<String>) {
        let session = match persisted_refresh_token {
            Some(token) => match self.exchange_refresh_token(&token).await {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!(error = %e, "Persisted session could not be restored");
                    None
                }
            },
            None => None,
        };

        self.store_session(session.clone());
        self.emit(AuthEvent::InitialSession(session));
    }

    /// Sign in with email and password.
    ///
    /// Bad credentials surface as `AppError::InvalidCredentials`; the caller
    /// decides how to present them. Success broadcasts `SignedIn`.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        let url = format!(
            "{}/auth/v1/token?grant_type=password",
            self.client.base_url()
        );
        let body = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .client
            .http()?
            .post(url)
            .header("apikey", self.client.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let session = self.token_response(response).await?;
        tracing::info!(user_id = %session.user_id(), "User signed in");

        self.store_session(Some(session.clone()));
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// Sign out: revoke the session server-side and clear local state.
    ///
    /// Local state always clears and `SignedOut` is always broadcast; a
    /// failed revocation call is logged, not surfaced.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        let token = self.current_session().map(|s| s.access_token);

        if let Some(token) = token {
            let url = format!("{}/auth/v1/logout", self.client.base_url());
            let result = match self.client.http() {
                Ok(http) => http
                    .post(url)
                    .header("apikey", self.client.api_key())
                    .bearer_auth(&token)
                    .send()
                    .await
                    .map_err(|e| AppError::Auth(e.to_string()))
                    .map(|_| ()),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, "Sign-out revocation failed; clearing local session anyway");
            }
        }

        self.store_session(None);
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    /// Exchange a refresh token for a fresh session and announce the
    /// rotation.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, AppError> {
        let session = self.exchange_refresh_token(refresh_token).await?;
        self.store_session(Some(session.clone()));
        self.emit(AuthEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<Session, AppError> {
        let url = format!(
            "{}/auth/v1/token?grant_type=refresh_token",
            self.client.base_url()
        );
        let body = serde_json::json!({ "refresh_token": refresh_token });

        let response = self
            .client
            .http()?
            .post(url)
            .header("apikey", self.client.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        self.token_response(response).await
    }

    async fn token_response(&self, response: reqwest::Response) -> Result<Session, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(parse_auth_error(status, &body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Token response parse error: {}", e)))?;
        Ok(token.into_session())
    }

    fn store_session(&self, session: Option<Session>) {
        self.client
            .set_bearer(session.as_ref().map(|s| s.access_token.clone()));
        if let Ok(mut slot) = self.session.write() {
            *slot = session;
        }
    }

    fn emit(&self, event: AuthEvent) {
        // No subscribers is fine; nothing is listening yet.
        let _ = self.events.send(event);
    }
}

#[async_trait::async_trait]
impl crate::session::AuthApi for AuthClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        AuthClient::sign_in_with_password(self, email, password).await
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        AuthClient::sign_out(self).await
    }

    fn current_session(&self) -> Option<Session> {
        AuthClient::current_session(self)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        AuthClient::subscribe(self)
    }
}

/// Token grant response from the auth service.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: Uuid,
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or_else(|| Utc::now() + Duration::seconds(self.expires_in.unwrap_or(3600)));

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: Identity {
                id: self.user.id,
                email: self.user.email.unwrap_or_default(),
            },
        }
    }
}

/// Map a failed auth response to an `AppError`, telling bad credentials
/// apart from service trouble.
fn parse_auth_error(status: reqwest::StatusCode, body: &str) -> AppError {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let error_code = value.get("error_code").and_then(|v| v.as_str());
        let error = value.get("error").and_then(|v| v.as_str());
        let message = value
            .get("error_description")
            .or_else(|| value.get("msg"))
            .and_then(|v| v.as_str());

        if error_code == Some("invalid_credentials")
            || error == Some("invalid_grant")
            || message == Some("Invalid login credentials")
        {
            return AppError::InvalidCredentials;
        }
        if let Some(message) = message {
            return AppError::Auth(message.to_string());
        }
    }
    AppError::Auth(format!("HTTP {}: {}", status, body))
}

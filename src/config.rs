//! Application configuration loaded from environment variables.
//!
//! The webhook server additionally needs the service-role key so purchase
//! processing can bypass row-level security.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Supabase project (no trailing slash)
    pub supabase_url: String,
    /// Public anon key, used when no user session is active
    pub supabase_anon_key: String,
    /// Service-role key for trusted server-side processing
    pub service_role_key: Option<String>,
    /// Shared secret for the Kiwify purchase webhook; when unset the
    /// secret check is skipped
    pub webhook_secret: Option<String>,
    /// Server port
    pub port: u16,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test_anon_key".to_string(),
            service_role_key: Some("test_service_role_key".to_string()),
            webhook_secret: Some("test_webhook_secret".to_string()),
            port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            supabase_url: env::var("SUPABASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("SUPABASE_URL"))?,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .ok()
                .map(|v| v.trim().to_string()),
            webhook_secret: env::var("KIWIFY_WEBHOOK_SECRET")
                .ok()
                .map(|v| v.trim().to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
        })
    }

    /// Service-role key, required for the webhook server.
    pub fn require_service_role(&self) -> Result<&str, ConfigError> {
        self.service_role_key
            .as_deref()
            .ok_or(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

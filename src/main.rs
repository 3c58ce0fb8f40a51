// SPDX-License-Identifier: MIT

//! Atlon purchase-webhook server
//!
//! Receives purchase notifications from Kiwify and turns them into course
//! enrollments, or pending enrollments for buyers who have no account yet.

use atlon_core::{config::Config, supabase::Client, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Atlon webhook server");

    // Enrollment writes bypass row-level security, so this server runs on
    // the service-role key rather than the anon key.
    let service_key = config
        .require_service_role()
        .expect("Webhook server needs SUPABASE_SERVICE_ROLE_KEY")
        .to_string();
    let db = Client::new(config.supabase_url.as_str(), service_key);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
    });

    // Build router
    let app = atlon_core::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("atlon_core=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}

// SPDX-License-Identifier: MIT

//! Atlon: course platform backend.
//!
//! This crate provides the Supabase-backed data layer for the Atlon
//! learning platform (catalog, enrollments, progress, marketing, finance),
//! the session bootstrap flow that resolves an authenticated identity to
//! its profile, and the Kiwify purchase-webhook server.

pub mod config;
pub mod error;
pub mod models;
pub mod refresh;
pub mod routes;
pub mod services;
pub mod session;
pub mod supabase;

use config::Config;
use supabase::Client;

/// Shared application state for the webhook server.
pub struct AppState {
    pub config: Config,
    pub db: Client,
}

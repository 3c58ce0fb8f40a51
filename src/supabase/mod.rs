// SPDX-License-Identifier: MIT

//! Clients for the Supabase backend: the row API (PostgREST dialect) and
//! the auth service (GoTrue).

pub mod auth;
pub mod rest;

pub use auth::AuthClient;
pub use rest::{Client, Direction, Query};

// SPDX-License-Identifier: MIT

//! Profile reads and edits, and the profile side of session bootstrap.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::models::user::{ProfileRow, ProfileUpdate, User};
use crate::refresh::{QueryKey, RefreshBus};
use crate::session::ProfileStore;
use crate::supabase::Client;

#[derive(Clone)]
pub struct ProfileService {
    db: Client,
    refresh: RefreshBus,
}

impl ProfileService {
    pub fn new(db: Client) -> Self {
        Self::with_refresh(db, RefreshBus::default())
    }

    pub fn with_refresh(db: Client, refresh: RefreshBus) -> Self {
        Self { db, refresh }
    }

    /// A user's profile. Errors if the row does not exist.
    pub async fn fetch(&self, user_id: Uuid) -> Result<User> {
        let row: ProfileRow = self
            .db
            .from("profiles")
            .select("*")
            .eq("id", user_id)
            .fetch_one()
            .await?;
        Ok(row.into())
    }

    /// Self-service profile edit.
    pub async fn update(&self, user_id: Uuid, patch: ProfileUpdate) -> Result<User> {
        patch.validate()?;
        let updated: ProfileRow = self
            .db
            .from("profiles")
            .eq("id", user_id)
            .update(&patch)
            .await?;
        self.refresh.invalidate(QueryKey::Profile { user_id });
        Ok(updated.into())
    }
}

#[async_trait]
impl ProfileStore for ProfileService {
    /// A missing row is not an error here: right after signup the profile
    /// may not have replicated yet, and the bootstrap retry loop owns that
    /// case.
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>> {
        match self
            .db
            .from("profiles")
            .select("*")
            .eq("id", user_id)
            .fetch_one::<ProfileRow>()
            .await
        {
            Ok(row) => Ok(Some(row)),
            Err(e) if e.is_row_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn touch_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.db
            .from("profiles")
            .eq("id", user_id)
            .update_only(&serde_json::json!({ "last_login": at }))
            .await
    }
}

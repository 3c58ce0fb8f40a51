// SPDX-License-Identifier: MIT

//! Marketing banner management and engagement counters.

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::models::marketing::{BannerEvent, BannerUpdate, MarketingBanner, NewBanner};
use crate::refresh::{QueryKey, RefreshBus};
use crate::supabase::{Client, Direction};

#[derive(Clone)]
pub struct MarketingService {
    db: Client,
    refresh: RefreshBus,
}

impl MarketingService {
    pub fn new(db: Client, refresh: RefreshBus) -> Self {
        Self { db, refresh }
    }

    /// Banners currently live: active, started (or no start), not yet
    /// ended (or no end). Newest first.
    pub async fn active_banners(&self) -> Result<Vec<MarketingBanner>> {
        let now = Utc::now().to_rfc3339();
        self.db
            .from("marketing_banners")
            .select("*")
            .eq("active", true)
            .or(&format!("starts_at.is.null,starts_at.lte.{}", now))
            .or(&format!("ends_at.is.null,ends_at.gte.{}", now))
            .order("created_at", Direction::Desc)
            .fetch()
            .await
    }

    /// Every banner, live or not. Admin view.
    pub async fn all_banners(&self) -> Result<Vec<MarketingBanner>> {
        self.db
            .from("marketing_banners")
            .select("*")
            .order("created_at", Direction::Desc)
            .fetch()
            .await
    }

    pub async fn create(&self, banner: NewBanner) -> Result<MarketingBanner> {
        banner.validate()?;
        let created: MarketingBanner = self.db.from("marketing_banners").insert(&banner).await?;
        tracing::info!(banner_id = %created.id, title = %created.title, "Banner created");
        self.refresh.invalidate(QueryKey::AllBanners);
        self.refresh.invalidate(QueryKey::ActiveBanners);
        Ok(created)
    }

    pub async fn update(&self, banner_id: Uuid, patch: BannerUpdate) -> Result<MarketingBanner> {
        patch.validate()?;
        let updated: MarketingBanner = self
            .db
            .from("marketing_banners")
            .eq("id", banner_id)
            .update(&patch)
            .await?;
        self.refresh.invalidate(QueryKey::AllBanners);
        self.refresh.invalidate(QueryKey::ActiveBanners);
        Ok(updated)
    }

    pub async fn delete(&self, banner_id: Uuid) -> Result<()> {
        self.db
            .from("marketing_banners")
            .eq("id", banner_id)
            .delete()
            .await?;
        self.refresh.invalidate(QueryKey::AllBanners);
        self.refresh.invalidate(QueryKey::ActiveBanners);
        Ok(())
    }

    /// Count an impression or click. Counters are bumped server-side so
    /// concurrent viewers cannot lose updates.
    pub async fn record_event(&self, banner_id: Uuid, event: BannerEvent) -> Result<()> {
        self.db
            .rpc_void(
                "record_marketing_event",
                serde_json::json!({
                    "p_banner_id": banner_id,
                    "p_event": event.as_str(),
                }),
            )
            .await
    }
}

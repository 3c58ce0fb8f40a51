// SPDX-License-Identifier: MIT

//! Payment-provider product mappings.
//!
//! A mapping ties a provider's product id to a course; the purchase
//! webhook refuses to enroll anyone for an unmapped product.

use uuid::Uuid;

use crate::error::Result;
use crate::models::enrollment::{NewProductMapping, ProductMapping};
use crate::refresh::{QueryKey, RefreshBus};
use crate::supabase::{Client, Direction};

#[derive(Clone)]
pub struct ProductMappingService {
    db: Client,
    refresh: RefreshBus,
}

impl ProductMappingService {
    pub fn new(db: Client, refresh: RefreshBus) -> Self {
        Self { db, refresh }
    }

    /// Every mapping with its course title embedded, newest first.
    pub async fn all(&self) -> Result<Vec<ProductMapping>> {
        self.db
            .from("product_mappings")
            .select("*, courses(title)")
            .order("created_at", Direction::Desc)
            .fetch()
            .await
    }

    /// The mapping for a provider's product, if one exists.
    pub async fn find(&self, provider: &str, product_id: &str) -> Result<Option<ProductMapping>> {
        self.db
            .from("product_mappings")
            .select("*")
            .eq("provider", provider)
            .eq("product_id", product_id)
            .fetch_optional()
            .await
    }

    pub async fn create(&self, mapping: NewProductMapping) -> Result<ProductMapping> {
        let created: ProductMapping = self.db.from("product_mappings").insert(&mapping).await?;
        tracing::info!(
            mapping_id = %created.id,
            provider = %created.provider,
            product_id = %created.product_id,
            "Product mapping created"
        );
        self.refresh.invalidate(QueryKey::ProductMappings);
        Ok(created)
    }

    pub async fn delete(&self, mapping_id: Uuid) -> Result<()> {
        self.db
            .from("product_mappings")
            .eq("id", mapping_id)
            .delete()
            .await?;
        self.refresh.invalidate(QueryKey::ProductMappings);
        Ok(())
    }
}

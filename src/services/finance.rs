// SPDX-License-Identifier: MIT

//! Revenue reporting.

use crate::error::Result;
use crate::models::finance::{FinanceStats, Transaction};
use crate::supabase::{Client, Direction};

#[derive(Clone)]
pub struct FinanceService {
    db: Client,
}

impl FinanceService {
    pub fn new(db: Client) -> Self {
        Self { db }
    }

    /// Aggregate revenue figures, computed server-side.
    pub async fn stats(&self) -> Result<FinanceStats> {
        self.db
            .rpc_one("get_finance_stats", serde_json::json!({}))
            .await
    }

    /// The most recent paid enrollments with buyer and course embedded.
    pub async fn transactions(&self) -> Result<Vec<Transaction>> {
        self.db
            .from("enrollments")
            .select("id, enrolled_at, profiles!inner(name), courses!inner(title, price)")
            .eq("payment_status", "paid")
            .order("enrolled_at", Direction::Desc)
            .limit(100)
            .fetch()
            .await
    }
}

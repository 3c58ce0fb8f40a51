// SPDX-License-Identifier: MIT

//! Admin dashboard aggregates.

use crate::error::Result;
use crate::models::catalog::TopCourse;
use crate::models::finance::{DashboardStats, DashboardStatsRow, RecentActivity};
use crate::supabase::{Client, Direction};

#[derive(Clone)]
pub struct DashboardService {
    db: Client,
}

impl DashboardService {
    pub fn new(db: Client) -> Self {
        Self { db }
    }

    /// Headline counters. Missing aggregates read as zero.
    pub async fn stats(&self) -> Result<DashboardStats> {
        let row: DashboardStatsRow = self
            .db
            .rpc_one("get_dashboard_stats", serde_json::json!({}))
            .await?;
        Ok(row.into())
    }

    /// Recent platform events, newest first, assembled server-side.
    pub async fn recent_activity(&self) -> Result<Vec<RecentActivity>> {
        self.db
            .rpc("get_recent_activity", serde_json::json!({}))
            .await
    }

    /// The five most-enrolled published courses.
    pub async fn top_courses(&self) -> Result<Vec<TopCourse>> {
        self.db
            .from("courses")
            .select("id, title, cover_image, total_students, total_modules, total_lessons")
            .eq("status", "published")
            .order("total_students", Direction::Desc)
            .limit(5)
            .fetch()
            .await
    }
}

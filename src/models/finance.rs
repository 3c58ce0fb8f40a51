// SPDX-License-Identifier: MIT

//! Finance and dashboard reporting models, all produced by backend
//! procedures or aggregate queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Result row of the `get_finance_stats` procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct FinanceStats {
    pub total_revenue: f64,
    pub sales_today: i64,
    pub total_paid_enrollments: i64,
}

/// Paid enrollment with buyer and course embedded, for the finance table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct Transaction {
    pub id: Uuid,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub profiles: TransactionBuyer,
    pub courses: TransactionCourse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct TransactionBuyer {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct TransactionCourse {
    pub title: String,
    pub price: Option<f64>,
}

/// Raw result row of the `get_dashboard_stats` procedure.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardStatsRow {
    pub total_courses: Option<i64>,
    pub total_students: Option<i64>,
    pub total_lessons: Option<i64>,
    pub avg_completion_rate: Option<f64>,
}

/// Admin dashboard headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct DashboardStats {
    pub total_courses: i64,
    pub total_students: i64,
    pub total_lessons: i64,
    /// Average completion across all progress rows, rounded to a whole
    /// percentage.
    pub completion_rate: i64,
}

impl From<DashboardStatsRow> for DashboardStats {
    fn from(row: DashboardStatsRow) -> Self {
        Self {
            total_courses: row.total_courses.unwrap_or(0),
            total_students: row.total_students.unwrap_or(0),
            total_lessons: row.total_lessons.unwrap_or(0),
            completion_rate: row.avg_completion_rate.unwrap_or(0.0).round() as i64,
        }
    }
}

/// One line of the admin activity feed (`get_recent_activity`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct RecentActivity {
    pub id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

// SPDX-License-Identifier: MIT

//! Enrollment queries and self-service enrollment.

use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;
use crate::models::catalog::Course;
use crate::models::enrollment::{Enrollment, NewEnrollment, PaymentStatus};
use crate::refresh::{QueryKey, RefreshBus};
use crate::supabase::Client;

#[derive(Debug, Deserialize)]
struct RowId {
    #[allow(dead_code)]
    id: Uuid,
}

#[derive(Clone)]
pub struct EnrollmentService {
    db: Client,
    refresh: RefreshBus,
}

impl EnrollmentService {
    pub fn new(db: Client, refresh: RefreshBus) -> Self {
        Self { db, refresh }
    }

    /// A user's active enrollments.
    pub async fn for_user(&self, user_id: Uuid) -> Result<Vec<Enrollment>> {
        self.db
            .from("enrollments")
            .select("*")
            .eq("user_id", user_id)
            .eq("status", "active")
            .fetch()
            .await
    }

    /// Whether the user holds an active enrollment for the course.
    pub async fn is_enrolled(&self, user_id: Uuid, course_id: Uuid) -> Result<bool> {
        let row: Option<RowId> = self
            .db
            .from("enrollments")
            .select("id")
            .eq("user_id", user_id)
            .eq("course_id", course_id)
            .eq("status", "active")
            .fetch_optional()
            .await?;
        Ok(row.is_some())
    }

    /// Enroll a user. Enrollment changes feed the revenue and dashboard
    /// views, so those get signalled too.
    pub async fn enroll(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Enrollment> {
        let created: Enrollment = self
            .db
            .from("enrollments")
            .insert(&NewEnrollment::active(user_id, course_id, payment_status))
            .await?;
        tracing::info!(user_id = %user_id, course_id = %course_id, "User enrolled");
        self.refresh.invalidate(QueryKey::Enrollments { user_id });
        self.refresh.invalidate(QueryKey::UserCourses { user_id });
        self.refresh.invalidate(QueryKey::FinanceStats);
        self.refresh.invalidate(QueryKey::Transactions);
        self.refresh.invalidate(QueryKey::DashboardStats);
        Ok(created)
    }

    /// The courses a user can access, resolved server-side from their
    /// enrollments.
    pub async fn user_courses(&self, user_id: Uuid) -> Result<Vec<Course>> {
        self.db
            .rpc(
                "get_user_courses",
                serde_json::json!({ "user_id_param": user_id }),
            )
            .await
    }
}

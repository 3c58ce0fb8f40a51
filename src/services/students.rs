// SPDX-License-Identifier: MIT

//! Admin-side student management.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::enrollment::{
    Enrollment, NewEnrollment, PaymentStatus, StudentEnrollment,
};
use crate::models::progress::ProgressOverviewRow;
use crate::models::user::{ProfileRow, StudentUpdate, User};
use crate::refresh::{QueryKey, RefreshBus};
use crate::supabase::{Client, Direction};

#[derive(Debug, Deserialize)]
struct RowId {
    #[allow(dead_code)]
    id: Uuid,
}

#[derive(Clone)]
pub struct StudentService {
    db: Client,
    refresh: RefreshBus,
}

impl StudentService {
    pub fn new(db: Client, refresh: RefreshBus) -> Self {
        Self { db, refresh }
    }

    /// All student profiles, newest first.
    pub async fn all(&self) -> Result<Vec<User>> {
        let rows: Vec<ProfileRow> = self
            .db
            .from("profiles")
            .select("*")
            .eq("role", "student")
            .order("created_at", Direction::Desc)
            .fetch()
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    /// A student's progress rows with their courses embedded.
    pub async fn progress(&self, user_id: Uuid) -> Result<Vec<ProgressOverviewRow>> {
        self.db
            .from("student_progress")
            .select("*, courses!student_progress_course_id_fkey(title, cover_image)")
            .eq("user_id", user_id)
            .fetch()
            .await
    }

    /// A student's enrollments with their courses embedded.
    pub async fn enrollments(&self, user_id: Uuid) -> Result<Vec<StudentEnrollment>> {
        self.db
            .from("enrollments")
            .select("*, courses!enrollments_course_id_fkey(title, cover_image, category)")
            .eq("user_id", user_id)
            .fetch()
            .await
    }

    /// Enroll a student on a course, free of charge. Rejects duplicates so
    /// the admin table cannot double-grant.
    pub async fn enroll(&self, user_id: Uuid, course_id: Uuid) -> Result<Enrollment> {
        let existing: Option<RowId> = self
            .db
            .from("enrollments")
            .select("id")
            .eq("user_id", user_id)
            .eq("course_id", course_id)
            .fetch_optional()
            .await?;
        if existing.is_some() {
            return Err(AppError::BadRequest(
                "Aluno já está matriculado neste curso".to_string(),
            ));
        }

        let created: Enrollment = self
            .db
            .from("enrollments")
            .insert(&NewEnrollment::active(user_id, course_id, PaymentStatus::Free))
            .await?;
        tracing::info!(user_id = %user_id, course_id = %course_id, "Student enrolled by admin");
        self.invalidate_enrollment_views(user_id);
        Ok(created)
    }

    /// Remove a single enrollment. The user id only routes the refresh
    /// signal.
    pub async fn unenroll(&self, enrollment_id: Uuid, user_id: Uuid) -> Result<()> {
        self.db
            .from("enrollments")
            .eq("id", enrollment_id)
            .delete()
            .await?;
        tracing::info!(enrollment_id = %enrollment_id, user_id = %user_id, "Enrollment removed");
        self.invalidate_enrollment_views(user_id);
        Ok(())
    }

    /// Admin edit of a student's profile fields.
    pub async fn update(&self, user_id: Uuid, patch: StudentUpdate) -> Result<User> {
        patch.validate()?;
        let updated: ProfileRow = self
            .db
            .from("profiles")
            .eq("id", user_id)
            .update(&patch)
            .await?;
        self.refresh.invalidate(QueryKey::Students);
        self.refresh.invalidate(QueryKey::Profile { user_id });
        Ok(updated.into())
    }

    fn invalidate_enrollment_views(&self, user_id: Uuid) {
        self.refresh
            .invalidate(QueryKey::StudentEnrollments { user_id });
        self.refresh.invalidate(QueryKey::Students);
        self.refresh.invalidate(QueryKey::FinanceStats);
        self.refresh.invalidate(QueryKey::Transactions);
        self.refresh.invalidate(QueryKey::DashboardStats);
    }
}

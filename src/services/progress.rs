// SPDX-License-Identifier: MIT

//! Per-student course progress tracking.
//!
//! Progress rows are created lazily: the first completion (or lesson
//! navigation) inserts the row, later ones patch it.

use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::progress::{progress_percentage, ProgressRow, StudentProgress};
use crate::refresh::{QueryKey, RefreshBus};
use crate::supabase::Client;

#[derive(Clone)]
pub struct ProgressService {
    db: Client,
    refresh: RefreshBus,
}

impl ProgressService {
    pub fn new(db: Client, refresh: RefreshBus) -> Self {
        Self { db, refresh }
    }

    /// Progress for a user on a course, if any exists yet.
    pub async fn for_user_course(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<StudentProgress>> {
        let row: Option<ProgressRow> = self
            .db
            .from("student_progress")
            .select("*")
            .eq("user_id", user_id)
            .eq("course_id", course_id)
            .fetch_optional()
            .await?;
        Ok(row.map(StudentProgress::from))
    }

    /// Progress for a user on a course, inserting an empty row if absent.
    pub async fn ensure(&self, user_id: Uuid, course_id: Uuid) -> Result<StudentProgress> {
        if let Some(progress) = self.for_user_course(user_id, course_id).await? {
            return Ok(progress);
        }

        let row: ProgressRow = self
            .db
            .from("student_progress")
            .insert(&serde_json::json!({
                "user_id": user_id,
                "course_id": course_id,
            }))
            .await?;
        self.refresh
            .invalidate(QueryKey::Progress { user_id, course_id });
        Ok(row.into())
    }

    /// Mark a lesson complete and recompute the course percentage from the
    /// caller-supplied lesson total. Completing the same lesson twice is a
    /// no-op for the list but still bumps `last_accessed_at`.
    pub async fn complete_lesson(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        lesson_id: Uuid,
        total_lessons: usize,
    ) -> Result<StudentProgress> {
        let current = self.for_user_course(user_id, course_id).await?;

        let mut completed = current
            .as_ref()
            .map(|p| p.completed_lessons.clone())
            .unwrap_or_default();
        if !completed.contains(&lesson_id) {
            completed.push(lesson_id);
        }
        let percentage = progress_percentage(completed.len(), total_lessons);

        let row: ProgressRow = match current {
            Some(progress) => {
                self.db
                    .from("student_progress")
                    .eq("id", progress.id)
                    .update(&serde_json::json!({
                        "completed_lessons": completed,
                        "current_lesson_id": lesson_id,
                        "progress_percentage": percentage,
                        "last_accessed_at": Utc::now(),
                    }))
                    .await?
            }
            None => {
                self.db
                    .from("student_progress")
                    .insert(&serde_json::json!({
                        "user_id": user_id,
                        "course_id": course_id,
                        "completed_lessons": completed,
                        "current_lesson_id": lesson_id,
                        "progress_percentage": percentage,
                    }))
                    .await?
            }
        };

        tracing::debug!(
            user_id = %user_id,
            course_id = %course_id,
            lesson_id = %lesson_id,
            percentage,
            "Lesson completed"
        );
        self.refresh
            .invalidate(QueryKey::Progress { user_id, course_id });
        Ok(row.into())
    }

    /// Remember where the student is in the course.
    pub async fn set_current_lesson(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<StudentProgress> {
        let current = self.for_user_course(user_id, course_id).await?;

        let row: ProgressRow = match current {
            Some(progress) => {
                self.db
                    .from("student_progress")
                    .eq("id", progress.id)
                    .update(&serde_json::json!({
                        "current_lesson_id": lesson_id,
                        "last_accessed_at": Utc::now(),
                    }))
                    .await?
            }
            None => {
                self.db
                    .from("student_progress")
                    .insert(&serde_json::json!({
                        "user_id": user_id,
                        "course_id": course_id,
                        "current_lesson_id": lesson_id,
                    }))
                    .await?
            }
        };

        self.refresh
            .invalidate(QueryKey::Progress { user_id, course_id });
        Ok(row.into())
    }

    /// Accumulate watch time, in seconds.
    pub async fn add_watch_time(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        seconds: i64,
    ) -> Result<StudentProgress> {
        let current = self.ensure(user_id, course_id).await?;

        let row: ProgressRow = self
            .db
            .from("student_progress")
            .eq("id", current.id)
            .update(&serde_json::json!({
                "total_watch_time": current.total_watch_time + seconds,
                "last_accessed_at": Utc::now(),
            }))
            .await?;

        self.refresh
            .invalidate(QueryKey::Progress { user_id, course_id });
        Ok(row.into())
    }
}

// SPDX-License-Identifier: MIT

//! Per-student course progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

use super::enrollment::CourseRef;

/// Raw `student_progress` row.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub completed_lessons: Option<Vec<Uuid>>,
    pub current_lesson_id: Option<Uuid>,
    pub progress_percentage: Option<i32>,
    pub certificate_issued: Option<bool>,
    pub certificate_issued_at: Option<DateTime<Utc>>,
    pub total_watch_time: Option<i64>,
}

/// Application-facing progress record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct StudentProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub completed_lessons: Vec<Uuid>,
    pub current_lesson_id: Option<Uuid>,
    pub progress_percentage: i32,
    pub certificate_issued: bool,
    pub certificate_issued_at: Option<DateTime<Utc>>,
    pub total_watch_time: i64,
}

impl From<ProgressRow> for StudentProgress {
    fn from(row: ProgressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            course_id: row.course_id,
            enrolled_at: row.enrolled_at,
            last_accessed_at: row.last_accessed_at,
            completed_lessons: row.completed_lessons.unwrap_or_default(),
            current_lesson_id: row.current_lesson_id,
            progress_percentage: row.progress_percentage.unwrap_or(0),
            certificate_issued: row.certificate_issued.unwrap_or(false),
            certificate_issued_at: row.certificate_issued_at,
            total_watch_time: row.total_watch_time.unwrap_or(0),
        }
    }
}

impl StudentProgress {
    pub fn is_lesson_completed(&self, lesson_id: Uuid) -> bool {
        self.completed_lessons.contains(&lesson_id)
    }
}

/// Progress row with its course embedded, for the admin student view.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressOverviewRow {
    #[serde(flatten)]
    pub progress: ProgressRow,
    pub courses: Option<CourseRef>,
}

/// Completed-lesson share as an integer percentage, clamped to 100.
pub fn progress_percentage(completed: usize, total_lessons: usize) -> i32 {
    if total_lessons == 0 {
        return 0;
    }
    let pct = (completed as f64 / total_lessons as f64 * 100.0).round() as i32;
    pct.min(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_and_clamps() {
        assert_eq!(progress_percentage(0, 10), 0);
        assert_eq!(progress_percentage(1, 3), 33);
        assert_eq!(progress_percentage(2, 3), 67);
        assert_eq!(progress_percentage(3, 3), 100);
        assert_eq!(progress_percentage(5, 3), 100);
        assert_eq!(progress_percentage(1, 0), 0);
    }

    #[test]
    fn row_mapping_defaults_missing_counters() {
        let raw = serde_json::json!({
            "id": "aa5b0e9e-3a3b-4a1c-bb1e-2c3d4e5f6a7b",
            "user_id": "7f0a2d5e-4a9b-4c6e-9be1-0a9e40d3c111",
            "course_id": "3f6c1f0a-98f3-4f59-a1fa-2b9a2d3f5f10",
            "enrolled_at": null,
            "last_accessed_at": null,
            "completed_lessons": null,
            "current_lesson_id": null,
            "progress_percentage": null,
            "certificate_issued": null,
            "certificate_issued_at": null,
            "total_watch_time": null
        });

        let row: ProgressRow = serde_json::from_value(raw).unwrap();
        let progress: StudentProgress = row.into();
        assert!(progress.completed_lessons.is_empty());
        assert_eq!(progress.progress_percentage, 0);
        assert!(!progress.certificate_issued);
        assert_eq!(progress.total_watch_time, 0);
    }

    #[test]
    fn lesson_completion_lookup() {
        let lesson = Uuid::new_v4();
        let raw = serde_json::json!({
            "id": "aa5b0e9e-3a3b-4a1c-bb1e-2c3d4e5f6a7b",
            "user_id": "7f0a2d5e-4a9b-4c6e-9be1-0a9e40d3c111",
            "course_id": "3f6c1f0a-98f3-4f59-a1fa-2b9a2d3f5f10",
            "enrolled_at": null,
            "last_accessed_at": null,
            "completed_lessons": [lesson.to_string()],
            "current_lesson_id": lesson.to_string(),
            "progress_percentage": 50,
            "certificate_issued": false,
            "certificate_issued_at": null,
            "total_watch_time": 360
        });

        let progress: StudentProgress =
            serde_json::from_value::<ProgressRow>(raw).unwrap().into();
        assert!(progress.is_lesson_completed(lesson));
        assert!(!progress.is_lesson_completed(Uuid::new_v4()));
    }
}

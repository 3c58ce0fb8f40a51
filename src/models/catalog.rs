// SPDX-License-Identifier: MIT

//! Catalog models: courses, modules, and lessons.
//!
//! Courses travel in backend shape end to end. Modules and lessons get an
//! explicit row-to-application mapping (`order_index` becomes `order`, and
//! so on), matching the vocabulary the application uses for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::Validate;

/// Course difficulty. The backend stores Portuguese labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub enum CourseLevel {
    #[serde(rename = "iniciante")]
    Iniciante,
    #[serde(rename = "intermediario")]
    Intermediario,
    #[serde(rename = "avancado")]
    Avancado,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub enum CourseStatus {
    Draft,
    Published,
}

/// A course as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub banner_image: Option<String>,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub status: CourseStatus,
    pub price: Option<f64>,
    pub total_modules: Option<i64>,
    pub total_students: Option<i64>,
    pub total_lessons: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a course.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewCourse {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<CourseLevel>,
    pub status: CourseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// Partial course edit; only present fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CourseUpdate {
    #[validate(length(min = 1, max = 200))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<CourseLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CourseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// Published-course summary for the admin dashboard's top list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct TopCourse {
    pub id: Uuid,
    pub title: String,
    pub cover_image: Option<String>,
    pub total_students: Option<i64>,
    pub total_modules: Option<i64>,
    pub total_lessons: Option<i64>,
}

// ─── Modules ─────────────────────────────────────────────────────────────────

/// Raw `modules` row.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub order_index: Option<i32>,
    pub cover_image: Option<String>,
    pub total_lessons: Option<i64>,
    pub is_locked: Option<bool>,
    pub unlock_condition: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Application-facing course module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct CourseModule {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub order: i32,
    pub cover_image: Option<String>,
    pub total_lessons: i64,
    pub is_locked: bool,
    pub unlock_condition: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ModuleRow> for CourseModule {
    fn from(row: ModuleRow) -> Self {
        Self {
            id: row.id,
            course_id: row.course_id,
            title: row.title,
            description: row.description,
            order: row.order_index.unwrap_or(0),
            cover_image: row.cover_image,
            total_lessons: row.total_lessons.unwrap_or(0),
            is_locked: row.is_locked.unwrap_or(false),
            unlock_condition: row.unlock_condition,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewModule {
    pub course_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub order_index: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub total_lessons: i64,
    pub is_locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_condition: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ModuleUpdate {
    #[validate(length(min = 1, max = 200))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_lessons: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_condition: Option<String>,
}

// ─── Lessons ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub enum LessonKind {
    Video,
    Pdf,
    Text,
    Quiz,
}

/// Raw `lessons` row.
#[derive(Debug, Clone, Deserialize)]
pub struct LessonRow {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: LessonKind,
    pub content_url: Option<String>,
    pub duration: Option<String>,
    pub order_index: Option<i32>,
    pub thumbnail: Option<String>,
    pub is_preview: Option<bool>,
    pub created_at: DateTime<Utc>,
}

/// Application-facing lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct Lesson {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub kind: LessonKind,
    pub content_url: Option<String>,
    pub duration: Option<String>,
    pub order: i32,
    pub thumbnail: Option<String>,
    pub is_preview: bool,
    pub created_at: DateTime<Utc>,
}

impl From<LessonRow> for Lesson {
    fn from(row: LessonRow) -> Self {
        Self {
            id: row.id,
            module_id: row.module_id,
            title: row.title,
            description: row.description,
            kind: row.kind,
            content_url: row.content_url,
            duration: row.duration,
            order: row.order_index.unwrap_or(0),
            thumbnail: row.thumbnail,
            is_preview: row.is_preview.unwrap_or(false),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewLesson {
    pub module_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: LessonKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub order_index: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub is_preview: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LessonUpdate {
    #[validate(length(min = 1, max = 200))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<LessonKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_preview: Option<bool>,
}

// SPDX-License-Identifier: MIT

//! Course catalog queries and admin course CRUD.

use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::models::catalog::{Course, CourseUpdate, NewCourse};
use crate::refresh::{QueryKey, RefreshBus};
use crate::supabase::{Client, Direction};

#[derive(Clone)]
pub struct CourseService {
    db: Client,
    refresh: RefreshBus,
}

impl CourseService {
    pub fn new(db: Client, refresh: RefreshBus) -> Self {
        Self { db, refresh }
    }

    /// Published courses, newest first. The public catalog view.
    pub async fn published(&self) -> Result<Vec<Course>> {
        self.db
            .from("courses")
            .select("*")
            .eq("status", "published")
            .order("created_at", Direction::Desc)
            .fetch()
            .await
    }

    /// Every course regardless of status, newest first. Admin view.
    pub async fn all(&self) -> Result<Vec<Course>> {
        self.db
            .from("courses")
            .select("*")
            .order("created_at", Direction::Desc)
            .fetch()
            .await
    }

    pub async fn by_id(&self, course_id: Uuid) -> Result<Course> {
        self.db
            .from("courses")
            .select("*")
            .eq("id", course_id)
            .fetch_one()
            .await
    }

    pub async fn create(&self, course: NewCourse) -> Result<Course> {
        course.validate()?;
        let created: Course = self.db.from("courses").insert(&course).await?;
        tracing::info!(course_id = %created.id, title = %created.title, "Course created");
        self.refresh.invalidate(QueryKey::Courses);
        self.refresh.invalidate(QueryKey::AllCourses);
        Ok(created)
    }

    pub async fn update(&self, course_id: Uuid, patch: CourseUpdate) -> Result<Course> {
        patch.validate()?;
        let updated: Course = self
            .db
            .from("courses")
            .eq("id", course_id)
            .update(&patch)
            .await?;
        self.refresh.invalidate(QueryKey::Courses);
        self.refresh.invalidate(QueryKey::AllCourses);
        self.refresh.invalidate(QueryKey::Course(course_id));
        Ok(updated)
    }

    pub async fn delete(&self, course_id: Uuid) -> Result<()> {
        self.db.from("courses").eq("id", course_id).delete().await?;
        tracing::info!(course_id = %course_id, "Course deleted");
        self.refresh.invalidate(QueryKey::Courses);
        self.refresh.invalidate(QueryKey::AllCourses);
        self.refresh.invalidate(QueryKey::Course(course_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::catalog::CourseStatus;

    fn offline_service() -> CourseService {
        CourseService::new(Client::new_mock(), RefreshBus::default())
    }

    #[tokio::test]
    async fn create_rejects_invalid_payload_before_touching_the_backend() {
        let service = offline_service();
        let course = NewCourse {
            title: String::new(),
            subtitle: None,
            description: None,
            cover_image: None,
            banner_image: None,
            category: None,
            level: None,
            status: CourseStatus::Draft,
            price: None,
        };

        // An offline client errors on any request; a validation error here
        // proves the payload never went out.
        match service.create(course).await {
            Err(AppError::BadRequest(_)) => {}
            other => panic!("expected validation failure, got {:?}", other.map(|c| c.id)),
        }
    }

    #[tokio::test]
    async fn offline_client_surfaces_database_error() {
        let service = offline_service();
        match service.published().await {
            Err(AppError::Database(msg)) => assert!(msg.contains("offline")),
            other => panic!("expected offline error, got {:?}", other.map(|v| v.len())),
        }
    }
}

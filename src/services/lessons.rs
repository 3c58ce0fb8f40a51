// SPDX-License-Identifier: MIT

//! Lesson management.

use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::models::catalog::{Lesson, LessonRow, LessonUpdate, NewLesson};
use crate::refresh::{QueryKey, RefreshBus};
use crate::supabase::{Client, Direction};

#[derive(Clone)]
pub struct LessonService {
    db: Client,
    refresh: RefreshBus,
}

impl LessonService {
    pub fn new(db: Client, refresh: RefreshBus) -> Self {
        Self { db, refresh }
    }

    /// Lessons of a module in display order.
    pub async fn for_module(&self, module_id: Uuid) -> Result<Vec<Lesson>> {
        let rows: Vec<LessonRow> = self
            .db
            .from("lessons")
            .select("*")
            .eq("module_id", module_id)
            .order("order_index", Direction::Asc)
            .fetch()
            .await?;
        Ok(rows.into_iter().map(Lesson::from).collect())
    }

    pub async fn create(&self, lesson: NewLesson) -> Result<Lesson> {
        lesson.validate()?;
        let created: LessonRow = self.db.from("lessons").insert(&lesson).await?;
        self.refresh.invalidate(QueryKey::Lessons {
            module_id: created.module_id,
        });
        Ok(created.into())
    }

    pub async fn update(&self, lesson_id: Uuid, patch: LessonUpdate) -> Result<Lesson> {
        patch.validate()?;
        let updated: LessonRow = self
            .db
            .from("lessons")
            .eq("id", lesson_id)
            .update(&patch)
            .await?;
        self.refresh.invalidate(QueryKey::Lessons {
            module_id: updated.module_id,
        });
        Ok(updated.into())
    }

    /// Delete a lesson. The module id only routes the refresh signal.
    pub async fn delete(&self, lesson_id: Uuid, module_id: Uuid) -> Result<()> {
        self.db.from("lessons").eq("id", lesson_id).delete().await?;
        self.refresh.invalidate(QueryKey::Lessons { module_id });
        Ok(())
    }
}

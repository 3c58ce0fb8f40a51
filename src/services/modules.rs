// SPDX-License-Identifier: MIT

//! Course module management.

use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::models::catalog::{CourseModule, ModuleRow, ModuleUpdate, NewModule};
use crate::refresh::{QueryKey, RefreshBus};
use crate::supabase::{Client, Direction};

#[derive(Clone)]
pub struct ModuleService {
    db: Client,
    refresh: RefreshBus,
}

impl ModuleService {
    pub fn new(db: Client, refresh: RefreshBus) -> Self {
        Self { db, refresh }
    }

    /// Modules of a course in display order.
    pub async fn for_course(&self, course_id: Uuid) -> Result<Vec<CourseModule>> {
        let rows: Vec<ModuleRow> = self
            .db
            .from("modules")
            .select("*")
            .eq("course_id", course_id)
            .order("order_index", Direction::Asc)
            .fetch()
            .await?;
        Ok(rows.into_iter().map(CourseModule::from).collect())
    }

    pub async fn create(&self, module: NewModule) -> Result<CourseModule> {
        module.validate()?;
        let created: ModuleRow = self.db.from("modules").insert(&module).await?;
        self.refresh.invalidate(QueryKey::Modules {
            course_id: created.course_id,
        });
        Ok(created.into())
    }

    pub async fn update(&self, module_id: Uuid, patch: ModuleUpdate) -> Result<CourseModule> {
        patch.validate()?;
        let updated: ModuleRow = self
            .db
            .from("modules")
            .eq("id", module_id)
            .update(&patch)
            .await?;
        self.refresh.invalidate(QueryKey::Modules {
            course_id: updated.course_id,
        });
        Ok(updated.into())
    }

    /// Delete a module. The course id only routes the refresh signal.
    pub async fn delete(&self, module_id: Uuid, course_id: Uuid) -> Result<()> {
        self.db.from("modules").eq("id", module_id).delete().await?;
        self.refresh.invalidate(QueryKey::Modules { course_id });
        Ok(())
    }
}

// SPDX-License-Identifier: MIT

//! User profile models: the raw backend row and the mapped application user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::Validate;

/// Application role. The backend defaults new profiles to `student`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub enum UserRole {
    Admin,
    #[default]
    Student,
}

impl UserRole {
    pub fn is_admin(self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// Raw `profiles` row as the backend returns it. Gamification counters are
/// nullable there; they pick up defaults when mapped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    pub avatar: Option<String>,
    pub profession: Option<String>,
    pub app_plan: Option<String>,
    pub app_purchase_date: Option<String>,
    pub xp: Option<i64>,
    pub level: Option<i32>,
    pub streak: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Application-facing user, with backend field names mapped to the
/// application's camelCase vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub profession: Option<String>,
    pub app_plan: Option<String>,
    pub app_purchase_date: Option<String>,
    pub xp: i64,
    pub level: i32,
    pub streak: i32,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<ProfileRow> for User {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            name: row.name.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            role: row.role,
            avatar: row.avatar,
            profession: row.profession,
            app_plan: row.app_plan,
            app_purchase_date: row.app_purchase_date,
            xp: row.xp.unwrap_or(0),
            level: row.level.unwrap_or(1),
            streak: row.streak.unwrap_or(0),
            created_at: row.created_at,
            last_login: row.last_login,
        }
    }
}

/// Self-service profile edit (account settings page).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 120))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
}

/// Admin edit of a student record.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StudentUpdate {
    #[validate(length(min = 1, max = 120))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_plan: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: Uuid) -> ProfileRow {
        ProfileRow {
            id,
            name: Some("Ana Silva".to_string()),
            email: Some("ana@example.com".to_string()),
            role: UserRole::Student,
            avatar: None,
            profession: Some("Fisioterapeuta".to_string()),
            app_plan: None,
            app_purchase_date: None,
            xp: None,
            level: None,
            streak: None,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn mapping_applies_gamification_defaults() {
        let user: User = row(Uuid::new_v4()).into();
        assert_eq!(user.xp, 0);
        assert_eq!(user.level, 1);
        assert_eq!(user.streak, 0);
    }

    #[test]
    fn mapping_preserves_identity_fields() {
        let id = Uuid::new_v4();
        let user: User = row(id).into();
        assert_eq!(user.id, id);
        assert_eq!(user.name, "Ana Silva");
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.role, UserRole::Student);
    }

    #[test]
    fn profile_row_deserializes_from_backend_shape() {
        let raw = serde_json::json!({
            "id": "7f0a2d5e-4a9b-4c6e-9be1-0a9e40d3c111",
            "name": "Ana Silva",
            "email": "ana@example.com",
            "role": "admin",
            "avatar": null,
            "profession": null,
            "app_plan": "pro",
            "app_purchase_date": null,
            "xp": 120,
            "level": 3,
            "streak": 7,
            "created_at": "2026-01-15T10:00:00+00:00",
            "last_login": null
        });

        let row: ProfileRow = serde_json::from_value(raw).unwrap();
        assert_eq!(row.role, UserRole::Admin);
        assert_eq!(row.xp, Some(120));

        let user: User = row.into();
        assert!(user.role.is_admin());
        assert_eq!(user.level, 3);
    }

    #[test]
    fn user_serializes_camel_case() {
        let user: User = row(Uuid::new_v4()).into();
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("appPlan").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("app_plan").is_none());
    }

    #[test]
    fn missing_role_defaults_to_student() {
        let raw = serde_json::json!({
            "id": "7f0a2d5e-4a9b-4c6e-9be1-0a9e40d3c111",
            "name": null,
            "email": null,
            "avatar": null,
            "profession": null,
            "app_plan": null,
            "app_purchase_date": null,
            "xp": null,
            "level": null,
            "streak": null,
            "created_at": "2026-01-15T10:00:00+00:00",
            "last_login": null
        });

        let row: ProfileRow = serde_json::from_value(raw).unwrap();
        assert_eq!(row.role, UserRole::Student);
    }
}

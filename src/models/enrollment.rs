// SPDX-License-Identifier: MIT

//! Enrollment models, plus the purchase-side records (product mappings and
//! pending enrollments) the Kiwify webhook works with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub enum EnrollmentStatus {
    Active,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Free,
}

/// An `enrollments` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: EnrollmentStatus,
    pub payment_status: PaymentStatus,
}

/// Insert payload for an enrollment.
#[derive(Debug, Clone, Serialize)]
pub struct NewEnrollment {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub status: EnrollmentStatus,
    pub payment_status: PaymentStatus,
}

impl NewEnrollment {
    /// An active enrollment with the given payment status, the shape every
    /// enrollment writer uses.
    pub fn active(user_id: Uuid, course_id: Uuid, payment_status: PaymentStatus) -> Self {
        Self {
            user_id,
            course_id,
            status: EnrollmentStatus::Active,
            payment_status,
        }
    }
}

/// Embedded course reference on admin enrollment listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRef {
    pub title: String,
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Enrollment with its course embedded, for the admin student view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentEnrollment {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub courses: Option<CourseRef>,
}

/// A purchase whose buyer has no profile yet; granted at signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingEnrollment {
    pub id: Uuid,
    pub email: String,
    pub course_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for a pending enrollment.
#[derive(Debug, Clone, Serialize)]
pub struct NewPendingEnrollment {
    pub email: String,
    pub course_id: Uuid,
}

/// Maps a payment-provider product to a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct ProductMapping {
    pub id: Uuid,
    pub provider: String,
    pub product_id: String,
    pub course_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
    /// Embedded course title on admin listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courses: Option<MappedCourse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct MappedCourse {
    pub title: String,
}

/// Insert payload for a product mapping. The provider is always Kiwify
/// today; it is a column so a second provider does not need a migration.
#[derive(Debug, Clone, Serialize)]
pub struct NewProductMapping {
    pub provider: String,
    pub product_id: String,
    pub course_id: Uuid,
}

impl NewProductMapping {
    pub fn kiwify(product_id: impl Into<String>, course_id: Uuid) -> Self {
        Self {
            provider: "kiwify".to_string(),
            product_id: product_id.into(),
            course_id,
        }
    }
}

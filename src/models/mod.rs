// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod catalog;
pub mod enrollment;
pub mod finance;
pub mod marketing;
pub mod progress;
pub mod session;
pub mod user;

pub use catalog::{Course, CourseModule, CourseStatus, Lesson, LessonKind, TopCourse};
pub use enrollment::{
    Enrollment, EnrollmentStatus, NewEnrollment, NewPendingEnrollment, NewProductMapping,
    PaymentStatus, PendingEnrollment, ProductMapping, StudentEnrollment,
};
pub use finance::{DashboardStats, FinanceStats, RecentActivity, Transaction};
pub use marketing::{BannerEvent, BannerKind, MarketingBanner};
pub use progress::StudentProgress;
pub use session::{AuthEvent, Identity, Session};
pub use user::{ProfileRow, User, UserRole};

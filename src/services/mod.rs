// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod courses;
pub mod dashboard;
pub mod enrollments;
pub mod finance;
pub mod lessons;
pub mod mappings;
pub mod marketing;
pub mod modules;
pub mod profiles;
pub mod progress;
pub mod students;

pub use courses::CourseService;
pub use dashboard::DashboardService;
pub use enrollments::EnrollmentService;
pub use finance::FinanceService;
pub use lessons::LessonService;
pub use mappings::ProductMappingService;
pub use marketing::MarketingService;
pub use modules::ModuleService;
pub use profiles::ProfileService;
pub use progress::ProgressService;
pub use students::StudentService;

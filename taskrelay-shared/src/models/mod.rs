//! Database models for TaskRelay
//!
//! Each module owns one entity: the row struct, its input structs, and the
//! CRUD operations as inherent async functions.
//!
//! ## Entity relationships
//!
//! ```text
//! User ──< Membership >── Project ──< Task
//!   │                                  │
//!   └──────────< Submission >──────────┘
//!
//! AdminAction: append-only audit log (actor = User)
//! ```

pub mod admin_action;
pub mod membership;
pub mod project;
pub mod submission;
pub mod task;
pub mod user;

pub use admin_action::AdminAction;
pub use membership::Membership;
pub use project::Project;
pub use submission::{Submission, SubmissionStatus};
pub use task::Task;
pub use user::{User, UserRole};

//! Taskdeck domain model
//!
//! Plain, serializable records for the project board.
//!
//! # Core Concepts
//!
//! - [`Role`] / [`Permission`]: canonical, case-normalized capability names
//! - [`User`], [`Team`], [`ClientCompany`]: identity records
//! - [`Project`], [`TaskGroup`], [`Task`]: the work hierarchy
//! - [`Label`], [`Comment`], [`TimeLog`]: task satellites
//! - [`Archival`]: soft-archive state shared by archivable records
//! - [`DomainEvent`]: notifications emitted after committed mutations
//!
//! # Example
//!
//! ```rust
//! use taskdeck_model::{Permission, Role};
//!
//! let role: Role = "Team_Leader".parse().unwrap();
//! assert_eq!(role, Role::TeamLeader);
//! assert_eq!(role.as_str(), "team leader");
//!
//! let perm: Permission = "Reorder Task".parse().unwrap();
//! assert_eq!(perm, Permission::ReorderTask);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod archive;
mod entity;
mod error;
mod event;
mod id;
mod input;
mod label;
mod role;

pub use archive::{Archival, ArchiveFilter, RecordStatus};
pub use entity::{
    Attachment, ClientCompany, Comment, Pricing, Project, Task, TaskGroup, Team, TimeLog, User,
};
pub use error::{FieldError, ModelError};
pub use event::{DomainEvent, EventEnvelope};
pub use id::{
    ClientCompanyId, CommentId, LabelId, ProjectId, TaskGroupId, TaskId, TeamId, TimeLogId,
    UserId,
};
pub use input::{NewProject, NewTask, ProjectUpdate, TaskUpdate, MAX_NAME_LEN};
pub use label::{normalize_color, Label, DEFAULT_LABELS};
pub use role::{normalize_name, Permission, Role};

/// Names of the task groups every new project starts with, in display order.
pub const DEFAULT_TASK_GROUPS: [&str; 3] = ["To do", "In progress", "Completed"];

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

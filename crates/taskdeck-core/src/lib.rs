//! Taskdeck Core
//!
//! The service facade of a project/task board. It decides who can see and
//! change which projects, tasks and reports, keeps task order consistent
//! under concurrent drags, and derives report figures from the scoped data.
//!
//! # Core Concepts
//!
//! - **Explicit actor**: every operation takes an [`Actor`] resolved from
//!   the store; there is no ambient "current user"
//! - **Scope before compute**: listings and reports read only what the
//!   actor's [`ProjectScope`] admits
//! - **All-or-nothing mutations**: each mutation runs in one store
//!   transaction under a bounded timeout; locks serialize reorders per group
//!   and grant replacements per project
//! - **Fire-and-forget events**: committed changes are published to an
//!   [`EventSink`]; delivery never affects the result
//!
//! # Example
//!
//! ```rust,ignore
//! use taskdeck_core::prelude::*;
//!
//! # async fn example(store: Arc<MemoryStore>) -> Result<(), DeckError> {
//! let deck = TaskDeck::new(store, DeckConfig::default())?;
//! let actor = deck.actor(UserId(1))?;
//!
//! for summary in deck.list_accessible_projects(&actor, ArchiveFilter::Active)? {
//!     println!("{} {}", summary.project.id, summary.project.name);
//! }
//! deck.reorder_tasks(&actor, TaskGroupId(4), vec![TaskId(9), TaskId(7)], None).await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod access;
pub mod activity;
pub mod config;
pub mod deck;
pub mod error;
pub mod events;
pub mod labels;
pub mod projects;
pub mod report;
pub mod tasks;
pub mod teams;

pub use config::DeckConfig;
pub use deck::{TargetRef, TaskDeck};
pub use error::DeckError;
pub use events::{ChannelSink, EventSink, NullSink};
pub use projects::ProjectSummary;
pub use report::{
    completion_rate, DateRange, PerformanceStatus, Report, ReportKind, ReportRequest, TimeFilters,
};

pub use taskdeck_policy::{AccessBasis, Action, Actor, ProjectScope};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Taskdeck
    pub use crate::{
        Action, Actor, DeckConfig, DeckError, Report, ReportKind, ReportRequest, TargetRef,
        TaskDeck, TimeFilters,
    };
    pub use std::sync::Arc;
    pub use taskdeck_model::{
        ArchiveFilter, NewProject, NewTask, ProjectId, TaskGroupId, TaskId, TaskUpdate, UserId,
    };
    pub use taskdeck_store::MemoryStore;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

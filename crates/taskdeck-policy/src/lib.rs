//! Taskdeck Access Policy Engine
//!
//! Single source of truth for "can user U perform action A on target T".
//!
//! # Core Concepts
//!
//! - [`PermissionTable`]: static role → permission mapping (default or config-loaded)
//! - [`Actor`]: the acting user with resolved roles, teams and permissions,
//!   passed explicitly into every decision
//! - [`AccessFacts`]: read-only view of grants and team membership the
//!   engine decides over
//! - [`AccessPolicy`]: permission check, project access, task rules
//! - [`ProjectScope`]: the one scoping function shared by listings and reports
//!
//! Every decision is a pure function of its inputs; nothing is logged or
//! mutated here.
//!
//! # Example
//!
//! ```rust,ignore
//! use taskdeck_policy::{AccessPolicy, Action, Actor, PermissionTable, Target};
//!
//! let table = PermissionTable::default();
//! let actor = Actor::resolve(&user, teams, &table);
//! let policy = AccessPolicy::default();
//!
//! policy.authorize(&actor, Action::Reorder, Target::Project(&project), &facts)?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod action;
mod actor;
mod error;
mod facts;
mod policy;
mod scope;
mod table;

pub use action::{Action, Target};
pub use actor::{Actor, PermissionSet};
pub use error::{DenyReason, PolicyError};
pub use facts::AccessFacts;
pub use policy::{AccessBasis, AccessPolicy, PolicyConfig, TeamInheritance};
pub use scope::{ProjectScope, TaskVisibility};
pub use table::PermissionTable;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

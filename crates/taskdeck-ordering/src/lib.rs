//! Taskdeck Ordering
//!
//! Maintains the rank of every task inside its group.
//!
//! # Core Concepts
//!
//! - **Full order sets**: callers always send the complete new sequence of a
//!   group, so applying the same request twice gives the same ranks
//! - **Dense ranks**: every write renumbers the touched groups `0..n`
//! - **Serialization**: one async lock per group; a move locks both groups
//!   in ascending id order
//! - **Visibility**: the `*_visible` variants take a task filter; the
//!   caller orders only the tasks it passes and the rest keep their slots
//! - **Versions**: each group carries a counter bumped on every write;
//!   callers holding a stale view can detect it with `expected_version`
//!
//! # Example
//!
//! ```rust,ignore
//! let engine = OrderingEngine::new(Duration::from_secs(5));
//! let change = engine
//!     .reorder(&store, ReorderRequest::new(group, vec![t3, t1, t2]))
//!     .await?;
//! assert_eq!(change.order, vec![t3, t1, t2]);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod engine;
mod error;
mod order_set;

pub use engine::{MoveRequest, OrderChange, OrderingEngine, ReorderRequest, Visible};
pub use error::{OrderError, OrderViolation};
pub use order_set::{
    displacement, insert_at, validate_destination, validate_full_order, with_hidden, without_hidden,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

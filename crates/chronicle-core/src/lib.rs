//! Versioning engine for chronicle.
//!
//! This crate implements the repository layer on top of the object
//! database:
//! - `Repository`: open-or-init, HEAD management, save and restore
//! - `StagingIndex`: pending path changes between disk and HEAD
//! - `history`: path-scoped walk of the commit chain
//! - `diff`: line-level edit scripts between two snapshots

pub mod diff;
pub mod error;
pub mod history;
pub mod repository;
pub mod snapshot;
pub mod stage;

pub use diff::{diff_commits, DiffLine, DiffReport, LineStatus};
pub use error::{TimelineError, TimelineResult};
pub use history::relevant_history;
pub use repository::{Repository, RepositoryConfig};
pub use stage::StagingIndex;

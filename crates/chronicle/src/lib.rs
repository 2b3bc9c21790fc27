//! File timeline service for editing applications.
//!
//! Chronicle snapshots edits to individual tracked files and can bring
//! any earlier snapshot back, recording every save and restore as an
//! append-only entry in a linear commit history.
//!
//! # Example
//!
//! ```no_run
//! use chronicle::{TimelineConfig, TimelineService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = TimelineService::open("/project/root", TimelineConfig::default()).await?;
//!
//! // Snapshot the current state of a file
//! service.save_timeline("notes.md", "Before rewrite").await;
//!
//! // ... edit the file ...
//!
//! // Inspect its history and bring an earlier version back
//! let history = service.history("notes.md").await?;
//! if let Some(entry) = history.last() {
//!     service.recover_timeline("notes.md", entry.id).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod service;

pub use chronicle_core::{DiffLine, DiffReport, LineStatus, TimelineError, TimelineResult};
pub use chronicle_odb::{ObjectId, Provenance, Signature};
pub use chronicle_util::log;
pub use config::TimelineConfig;
pub use service::{HistoryEntry, HistoryView, TimelineService};

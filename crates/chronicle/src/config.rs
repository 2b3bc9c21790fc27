//! Timeline service configuration.

use chronicle_odb::Signature;
use serde::{Deserialize, Serialize};

/// Configuration for the timeline service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Author recorded on every commit.
    pub author: Signature,

    /// Maximum entries returned per relevant-history query.
    pub history_limit: usize,

    /// Whether a fresh repository is seeded with a root commit over the
    /// files already on disk.
    pub seed_on_init: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            author: Signature::new("chronicle", "chronicle@localhost"),
            history_limit: 100,
            seed_on_init: true,
        }
    }
}

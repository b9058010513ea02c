use std::path::PathBuf;
use serde::{Serialize, Deserialize};

/// One slot in the file player's queue.
///
/// `track_id >= 0` refers to a catalog `Track`; `track_id < 0` refers to an
/// ephemeral `Download` registered by the download service and never
/// persisted in the catalog store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedItem {
    pub track_id: i64,
    pub filepath: PathBuf,
}

impl QueuedItem {
    pub fn is_ephemeral(&self) -> bool {
        self.track_id < 0
    }
}

// src/domain/track/entity.rs

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::ids::{ReleaseId, TrackId};

/// A single recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,

    /// Owning release. `None` while the scanner has not attached one.
    pub release_id: Option<ReleaseId>,

    pub name: String,

    pub duration: Duration,

    pub disc_number: Option<u32>,

    pub track_number: Option<u32>,
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

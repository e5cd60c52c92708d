// src/domain/release/entity.rs

use serde::{Deserialize, Serialize};

use crate::domain::ids::ReleaseId;

/// Reserved name of the placeholder release
pub const NONE_RELEASE_NAME: &str = "<None>";

/// An album, EP or single: the unit tracks are grouped under.
///
/// This is owned data read out of one transaction. Relationships
/// (tracks, artists, clusters) are fetched through the release
/// repository with an open transaction; nothing is loaded behind
/// the caller's back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,

    /// Display name, already truncated to the configured maximum
    pub name: String,

    pub year: Option<i32>,

    pub original_year: Option<i32>,

    /// Number of discs, when the tags said so
    pub total_disc: Option<u32>,
}

impl Release {
    pub fn is_none_sentinel(&self) -> bool {
        self.name == NONE_RELEASE_NAME
    }

    /// Release year, or the original release year when `original` is set
    pub fn release_year(&self, original: bool) -> Option<i32> {
        if original {
            self.original_year
        } else {
            self.year
        }
    }

    pub fn is_multi_disc(&self) -> bool {
        matches!(self.total_disc, Some(n) if n > 1)
    }
}

impl std::fmt::Display for Release {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

// src/domain/cluster/entity.rs

use serde::{Deserialize, Serialize};

use crate::domain::ids::{ClusterId, ClusterTypeId};

/// A family of clusters, e.g. "GENRE" or "MOOD"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterType {
    pub id: ClusterTypeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub cluster_type_id: ClusterTypeId,
    pub name: String,
}

impl std::fmt::Display for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

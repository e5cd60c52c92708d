// src/domain/cluster/mod.rs

//! Clusters are tag-like groupings (genre, mood, ...). Each cluster
//! belongs to one cluster type; a release can carry any number of them.

pub mod entity;

pub use entity::{Cluster, ClusterType};

//! Toolbox library for Kubernetes cluster reports
//!
//! This crate provides the core functionality for:
//! - Listing nodes, namespaces, controllers and pods from the control plane
//! - Aggregating workload pod spread across failure zones
//! - Classifying unevenly spread workloads
//! - Composing a restricted ClusterRole from `kubectl api-resources`

pub mod cluster;
pub mod error;
pub mod models;
pub mod rbac;
pub mod spread;

pub use cluster::{ClusterClient, KubeCluster};
pub use error::{ClusterError, RbacError, SpreadError};
pub use models::*;
pub use spread::{spread_by_zone, DisbalanceClassifier, NamespaceFilter, SpreadSettings};

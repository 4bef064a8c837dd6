//! Access to the cluster control plane
//!
//! The spread report only needs four list calls. They are expressed as the
//! [`ClusterClient`] trait so the aggregation can be driven by the real
//! Kubernetes API ([`KubeCluster`]) or by an in-memory fake in tests.

mod kubernetes;

pub use kubernetes::{KubeCluster, DEFAULT_PAGE_SIZE};

use crate::error::ClusterError;
use crate::models::{Controller, Instance, Node};

pub use async_trait::async_trait;

/// Read-only view of the control-plane API consumed by the spread report
///
/// An empty listing is a valid result, not an error. Implementations
/// return an empty sequence when a namespace has no controllers.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// List all nodes in the cluster
    async fn list_nodes(&self) -> Result<Vec<Node>, ClusterError>;

    /// List the names of all namespaces
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError>;

    /// List deployments and stateful sets in a namespace
    async fn list_controllers(&self, namespace: &str) -> Result<Vec<Controller>, ClusterError>;

    /// List pods in a namespace matching a `key=value,...` label selector
    async fn list_instances(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<Instance>, ClusterError>;
}

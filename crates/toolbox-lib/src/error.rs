//! Error types for cluster access, spread aggregation and RBAC composition

use thiserror::Error;

/// Errors raised by a [`crate::cluster::ClusterClient`] implementation
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Kubernetes API request failed (transport, auth, server error)
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Kubeconfig could not be loaded or turned into a client
    #[error("Invalid cluster configuration: {0}")]
    Config(String),

    /// The run was cancelled while the call was in flight
    #[error("Request cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// Errors that abort a spread-by-zone run
#[derive(Debug, Error)]
pub enum SpreadError {
    #[error("Failed to list nodes: {0}")]
    ListNodes(#[source] ClusterError),

    #[error("Failed to list namespaces: {0}")]
    ListNamespaces(#[source] ClusterError),

    #[error("Failed to list controllers in namespace '{namespace}': {source}")]
    ListControllers {
        namespace: String,
        #[source]
        source: ClusterError,
    },

    #[error("Failed to list pods for {namespace}/{controller}: {source}")]
    ListInstances {
        namespace: String,
        controller: String,
        #[source]
        source: ClusterError,
    },

    #[error("Spread aggregation cancelled")]
    Cancelled,
}

impl SpreadError {
    /// Whether the run stopped because of cancellation rather than an API failure
    pub fn is_cancelled(&self) -> bool {
        match self {
            SpreadError::Cancelled => true,
            SpreadError::ListNodes(source) | SpreadError::ListNamespaces(source) => {
                matches!(source, ClusterError::Cancelled)
            }
            SpreadError::ListControllers { source, .. } | SpreadError::ListInstances { source, .. } => {
                matches!(source, ClusterError::Cancelled)
            }
        }
    }
}

/// Errors from the RBAC composer
#[derive(Debug, Error)]
pub enum RbacError {
    #[error("Failed to read api-resources input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse api-resources line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Failed to serialize ClusterRole: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spread_error_names_controller() {
        let err = SpreadError::ListInstances {
            namespace: "payments".to_string(),
            controller: "api".to_string(),
            source: ClusterError::Other("connection reset".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("payments/api"));
        assert!(msg.contains("connection reset"));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_cancelled_source_is_detected() {
        let err = SpreadError::ListControllers {
            namespace: "default".to_string(),
            source: ClusterError::Cancelled,
        };
        assert!(err.is_cancelled());
        assert!(SpreadError::Cancelled.is_cancelled());
    }
}

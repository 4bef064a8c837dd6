//! [`ClusterClient`] backed by the Kubernetes API

use super::ClusterClient;
use crate::error::ClusterError;
use crate::models::{
    Controller, ControllerKind, Instance, LabelRequirement, Node, SelectorOperator,
};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{Namespace, Node as K8sNode, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::ListParams;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info, warn};

/// Page size for list calls
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Cluster client using a `kube::Client`
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
    page_size: u32,
}

impl KubeCluster {
    /// Wrap an existing client
    pub fn new(client: Client) -> Self {
        Self {
            client,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the page size used for list calls
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Build a client from a kubeconfig file and optional context.
    ///
    /// Without a path, the standard inference applies (`KUBECONFIG`,
    /// `~/.kube/config`, then in-cluster service account).
    pub async fn connect(
        kubeconfig: Option<&Path>,
        context: Option<&str>,
    ) -> Result<Self, ClusterError> {
        let options = KubeConfigOptions {
            context: context.map(str::to_string),
            ..Default::default()
        };

        let config = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    ClusterError::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(|e| ClusterError::Config(e.to_string()))?
            }
            None if context.is_some() => Config::from_kubeconfig(&options)
                .await
                .map_err(|e| ClusterError::Config(e.to_string()))?,
            None => Config::infer()
                .await
                .map_err(|e| ClusterError::Config(e.to_string()))?,
        };

        info!(cluster_url = %config.cluster_url, "Connecting to cluster");
        let client = Client::try_from(config)?;
        Ok(Self::new(client))
    }

    /// List every object, following continue tokens
    async fn list_all<K>(&self, api: &Api<K>, mut params: ListParams) -> Result<Vec<K>, kube::Error>
    where
        K: Clone + DeserializeOwned + Debug,
    {
        params.limit = Some(self.page_size);

        let mut items = Vec::new();
        let mut pages = 0;
        loop {
            pages += 1;
            let list = api.list(&params).await?;
            items.extend(list.items);

            match list.metadata.continue_ {
                Some(token) if !token.is_empty() => params.continue_token = Some(token),
                _ => break,
            }
        }

        debug!(pages, items = items.len(), "Completed paginated list");
        Ok(items)
    }
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn list_nodes(&self) -> Result<Vec<Node>, ClusterError> {
        let api: Api<K8sNode> = Api::all(self.client.clone());
        let nodes = self.list_all(&api, ListParams::default()).await?;
        Ok(nodes.iter().map(node_from_k8s).collect())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let namespaces = self.list_all(&api, ListParams::default()).await?;
        Ok(namespaces
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect())
    }

    async fn list_controllers(&self, namespace: &str) -> Result<Vec<Controller>, ClusterError> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let statefulsets: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);

        let mut controllers: Vec<Controller> =
            not_found_as_empty(self.list_all(&deployments, ListParams::default()).await)?
                .iter()
                .filter_map(|d| controller_from_deployment(namespace, d))
                .collect();
        controllers.extend(
            not_found_as_empty(self.list_all(&statefulsets, ListParams::default()).await)?
                .iter()
                .filter_map(|s| controller_from_statefulset(namespace, s)),
        );

        Ok(controllers)
    }

    async fn list_instances(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<Instance>, ClusterError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pods = self
            .list_all(&api, ListParams::default().labels(selector))
            .await?;
        Ok(pods.iter().map(instance_from_pod).collect())
    }
}

/// A namespace deleted between calls lists as empty
fn not_found_as_empty<K>(result: Result<Vec<K>, kube::Error>) -> Result<Vec<K>, ClusterError> {
    match result {
        Ok(items) => Ok(items),
        Err(kube::Error::Api(response)) if response.code == 404 => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn node_from_k8s(node: &K8sNode) -> Node {
    Node {
        name: node.metadata.name.clone().unwrap_or_default(),
        labels: node.metadata.labels.clone().unwrap_or_default(),
    }
}

fn match_labels(selector: &LabelSelector) -> Vec<(String, String)> {
    selector
        .match_labels
        .as_ref()
        .map(|labels| {
            labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn match_expressions(selector: &LabelSelector) -> Vec<LabelRequirement> {
    selector
        .match_expressions
        .iter()
        .flatten()
        .filter_map(|expr| match SelectorOperator::from_name(&expr.operator) {
            Some(operator) => Some(LabelRequirement {
                key: expr.key.clone(),
                operator,
                values: expr.values.clone().unwrap_or_default(),
            }),
            None => {
                warn!(key = %expr.key, operator = %expr.operator, "Ignoring unknown selector operator");
                None
            }
        })
        .collect()
}

// Unset spec.replicas defaults to 1 on the API server.
pub(crate) fn controller_from_deployment(namespace: &str, deployment: &Deployment) -> Option<Controller> {
    let name = deployment.metadata.name.clone()?;
    let spec = deployment.spec.as_ref();
    Some(Controller {
        kind: ControllerKind::Deployment,
        namespace: namespace.to_string(),
        name,
        replicas: spec.map(|s| s.replicas.unwrap_or(1)).unwrap_or(0),
        match_labels: spec.map(|s| match_labels(&s.selector)).unwrap_or_default(),
        match_expressions: spec
            .map(|s| match_expressions(&s.selector))
            .unwrap_or_default(),
    })
}

pub(crate) fn controller_from_statefulset(
    namespace: &str,
    statefulset: &StatefulSet,
) -> Option<Controller> {
    let name = statefulset.metadata.name.clone()?;
    let spec = statefulset.spec.as_ref();
    Some(Controller {
        kind: ControllerKind::StatefulSet,
        namespace: namespace.to_string(),
        name,
        replicas: spec.map(|s| s.replicas.unwrap_or(1)).unwrap_or(0),
        match_labels: spec.map(|s| match_labels(&s.selector)).unwrap_or_default(),
        match_expressions: spec
            .map(|s| match_expressions(&s.selector))
            .unwrap_or_default(),
    })
}

pub(crate) fn instance_from_pod(pod: &Pod) -> Instance {
    Instance {
        name: pod.metadata.name.clone().unwrap_or_default(),
        node_name: pod
            .spec
            .as_ref()
            .and_then(|s| s.node_name.clone())
            .filter(|n| !n.is_empty()),
        phase: pod.status.as_ref().and_then(|s| s.phase.clone()),
    }
}

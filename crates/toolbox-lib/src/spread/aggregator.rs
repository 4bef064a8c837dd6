//! Cluster walk: namespaces -> controllers -> pods

use super::{attribute, controller_selector, normalize, ZoneIndex};
use crate::cluster::ClusterClient;
use crate::error::{ClusterError, SpreadError};
use crate::models::{AggregateResult, Controller, WorkloadSpread, DEFAULT_ZONE_LABEL};
use std::collections::BTreeSet;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Which namespaces a run visits
#[derive(Debug, Clone, Default)]
pub struct NamespaceFilter {
    /// Restrict the walk to this namespace
    pub only: Option<String>,
    /// Namespaces to skip
    pub exclude: Vec<String>,
}

impl NamespaceFilter {
    pub fn allows(&self, namespace: &str) -> bool {
        if let Some(only) = &self.only {
            if only != namespace {
                return false;
            }
        }
        !self.exclude.iter().any(|ns| ns == namespace)
    }

    /// Keep allowed namespaces, preserving order
    pub fn apply(&self, namespaces: Vec<String>) -> Vec<String> {
        namespaces.into_iter().filter(|ns| self.allows(ns)).collect()
    }
}

/// Settings for a full spread-by-zone run
#[derive(Debug, Clone)]
pub struct SpreadSettings {
    /// Node label holding the zone
    pub zone_label: String,
    pub namespaces: NamespaceFilter,
}

impl Default for SpreadSettings {
    fn default() -> Self {
        Self {
            zone_label: DEFAULT_ZONE_LABEL.to_string(),
            namespaces: NamespaceFilter::default(),
        }
    }
}

/// Walks namespaces and controllers, counting pods per zone
///
/// Every collaborator error aborts the walk; no partial result is returned.
pub struct SpreadAggregator<'a, C: ?Sized> {
    client: &'a C,
    index: &'a ZoneIndex,
    cancel: CancellationToken,
}

impl<'a, C> SpreadAggregator<'a, C>
where
    C: ClusterClient + ?Sized,
{
    pub fn new(client: &'a C, index: &'a ZoneIndex) -> Self {
        Self {
            client,
            index,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort at the next cluster call once `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Aggregate sparse per-controller counts over `namespaces`, in order.
    ///
    /// The returned rows are not normalized; `zones` holds the sorted union
    /// of zones seen in any row.
    pub async fn aggregate(&self, namespaces: &[String]) -> Result<AggregateResult, SpreadError> {
        let mut result = AggregateResult::default();
        let mut zones = BTreeSet::new();

        for namespace in namespaces {
            let controllers = cancellable(&self.cancel, self.client.list_controllers(namespace))
                .await
                .map_err(|source| {
                    lift(source, |source| SpreadError::ListControllers {
                        namespace: namespace.clone(),
                        source,
                    })
                })?;
            debug!(namespace = %namespace, controllers = controllers.len(), "Listed controllers");
            result.stats.namespaces_scanned += 1;

            for controller in &controllers {
                if controller.replicas <= 0 {
                    result.stats.skipped_zero_replicas += 1;
                    continue;
                }
                if !controller.has_selector() {
                    warn!(
                        namespace = %namespace,
                        controller = %controller.name,
                        kind = %controller.kind,
                        "Skipping controller with an empty selector"
                    );
                    result.stats.skipped_empty_selector += 1;
                    continue;
                }

                let ws = self.spread_of(controller).await?;
                zones.extend(ws.counts.keys().cloned());
                result.spread.push(ws);
                result.stats.controllers_counted += 1;
            }
        }

        result.zones = zones.into_iter().collect();
        info!(
            namespaces = result.stats.namespaces_scanned,
            controllers = result.stats.controllers_counted,
            zones = result.zones.len(),
            skipped_zero_replicas = result.stats.skipped_zero_replicas,
            "Aggregated workload spread"
        );
        Ok(result)
    }

    async fn spread_of(&self, controller: &Controller) -> Result<WorkloadSpread, SpreadError> {
        let selector =
            controller_selector(&controller.match_labels, &controller.match_expressions);
        let instances = cancellable(
            &self.cancel,
            self.client.list_instances(&controller.namespace, &selector),
        )
        .await
        .map_err(|source| {
            lift(source, |source| SpreadError::ListInstances {
                namespace: controller.namespace.clone(),
                controller: controller.name.clone(),
                source,
            })
        })?;

        let counts = attribute(&instances, self.index);
        debug!(
            namespace = %controller.namespace,
            controller = %controller.name,
            selector = %selector,
            pods = instances.len(),
            "Attributed pods to zones"
        );

        Ok(WorkloadSpread {
            namespace: controller.namespace.clone(),
            controller: controller.name.clone(),
            kind: controller.kind,
            counts,
        })
    }
}

/// Full run: index nodes, list namespaces, aggregate and normalize
pub async fn spread_by_zone<C>(
    client: &C,
    settings: &SpreadSettings,
    cancel: CancellationToken,
) -> Result<AggregateResult, SpreadError>
where
    C: ClusterClient + ?Sized,
{
    let nodes = cancellable(&cancel, client.list_nodes())
        .await
        .map_err(|source| lift(source, SpreadError::ListNodes))?;
    let index = ZoneIndex::build_with_label(&nodes, &settings.zone_label);
    debug!(nodes = index.len(), zone_label = %settings.zone_label, "Built zone index");

    let namespaces = cancellable(&cancel, client.list_namespaces())
        .await
        .map_err(|source| lift(source, SpreadError::ListNamespaces))?;
    let namespaces = settings.namespaces.apply(namespaces);

    let mut result = SpreadAggregator::new(client, &index)
        .with_cancellation(cancel)
        .aggregate(&namespaces)
        .await?;
    normalize(&mut result);
    Ok(result)
}

/// Race a cluster call against cancellation
async fn cancellable<T, F>(cancel: &CancellationToken, call: F) -> Result<T, ClusterError>
where
    F: Future<Output = Result<T, ClusterError>>,
{
    if cancel.is_cancelled() {
        return Err(ClusterError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClusterError::Cancelled),
        result = call => result,
    }
}

fn lift(source: ClusterError, wrap: impl FnOnce(ClusterError) -> SpreadError) -> SpreadError {
    match source {
        ClusterError::Cancelled => SpreadError::Cancelled,
        source => wrap(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_filter_exclude() {
        let filter = NamespaceFilter {
            only: None,
            exclude: vec!["kube-system".to_string()],
        };
        let kept = filter.apply(vec![
            "default".to_string(),
            "kube-system".to_string(),
            "shop".to_string(),
        ]);
        assert_eq!(kept, vec!["default", "shop"]);
    }

    #[test]
    fn test_namespace_filter_only() {
        let filter = NamespaceFilter {
            only: Some("shop".to_string()),
            exclude: Vec::new(),
        };
        assert!(filter.allows("shop"));
        assert!(!filter.allows("default"));
        assert!(NamespaceFilter::default().allows("anything"));
    }

    #[test]
    fn test_lift_maps_cancellation() {
        let err = lift(ClusterError::Cancelled, SpreadError::ListNodes);
        assert!(matches!(err, SpreadError::Cancelled));

        let err = lift(ClusterError::Other("boom".into()), SpreadError::ListNodes);
        assert!(matches!(err, SpreadError::ListNodes(_)));
    }
}

//! ClusterRole composer
//!
//! Builds a `ClusterRole` that grants full access to every API resource
//! listed by `kubectl api-resources`, except a fixed set of sensitive
//! resources. Pods and RBAC objects get explicit, narrower rules instead.

use crate::error::RbacError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// RBAC encoding of the core ("v1") API group
pub const CORE_GROUP: &str = "";

/// Default name of the generated role
pub const DEFAULT_ROLE_NAME: &str = "no-secrets-access";

const RBAC_GROUP: &str = "rbac.authorization.k8s.io";

/// Groups never granted wholesale
pub const SENSITIVE_GROUPS: &[&str] = &[RBAC_GROUP];

/// Core resources never granted wholesale
pub const SENSITIVE_CORE_RESOURCES: &[&str] = &["pods", "secrets"];

/// One row of `kubectl api-resources`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResource {
    pub name: String,
    /// API group, [`CORE_GROUP`] for the core group
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    pub api_groups: Vec<String>,
    pub resources: Vec<String>,
    pub verbs: Vec<String>,
}

impl PolicyRule {
    fn new(group: &str, resources: &[&str], verbs: &[&str]) -> Self {
        Self {
            api_groups: vec![group.to_string()],
            resources: resources.iter().map(|r| r.to_string()).collect(),
            verbs: verbs.iter().map(|v| v.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRole {
    pub kind: String,
    pub api_version: String,
    pub metadata: ObjectMeta,
    pub rules: Vec<PolicyRule>,
}

impl ClusterRole {
    pub fn to_yaml(&self) -> Result<String, RbacError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Parse `kubectl api-resources` output.
///
/// Accepts the output with or without the header and SHORTNAMES column:
/// the NAMESPACED column is found by its `true`/`false` value and the
/// APIVERSION column is the one before it.
pub fn parse_api_resources(input: &str) -> Result<Vec<ApiResource>, RbacError> {
    let mut resources = Vec::new();

    for (idx, line) in input.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() || fields[0] == "NAME" {
            continue;
        }

        let namespaced = fields
            .iter()
            .skip(1)
            .position(|f| *f == "true" || *f == "false")
            .map(|pos| pos + 1)
            .ok_or_else(|| RbacError::Parse {
                line: idx + 1,
                reason: "missing NAMESPACED column".to_string(),
            })?;
        if namespaced < 2 {
            return Err(RbacError::Parse {
                line: idx + 1,
                reason: "missing APIVERSION column".to_string(),
            });
        }

        let api_version = fields[namespaced - 1];
        let group = match api_version.split_once('/') {
            Some((group, _)) => group,
            None => CORE_GROUP,
        };

        resources.push(ApiResource {
            name: fields[0].to_string(),
            group: group.to_string(),
        });
    }

    Ok(resources)
}

/// Composes a ClusterRole from api-resources
#[derive(Debug, Clone)]
pub struct RbacComposer {
    role_name: String,
}

impl Default for RbacComposer {
    fn default() -> Self {
        Self::new(DEFAULT_ROLE_NAME)
    }
}

impl RbacComposer {
    pub fn new(role_name: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
        }
    }

    /// Group resources by API group (first-appearance order), drop the
    /// sensitive ones, then append the fixed pod and RBAC read rules.
    pub fn compose(&self, resources: &[ApiResource]) -> ClusterRole {
        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();

        for resource in resources {
            if SENSITIVE_GROUPS.contains(&resource.group.as_str()) {
                continue;
            }
            if resource.group == CORE_GROUP
                && SENSITIVE_CORE_RESOURCES.contains(&resource.name.as_str())
            {
                continue;
            }

            match groups.iter_mut().find(|(g, _)| *g == resource.group) {
                Some((_, names)) => {
                    if !names.contains(&resource.name.as_str()) {
                        names.push(resource.name.as_str());
                    }
                }
                None => groups.push((resource.group.as_str(), vec![resource.name.as_str()])),
            }
        }

        let mut rules: Vec<PolicyRule> = groups
            .iter()
            .map(|(group, names)| PolicyRule::new(group, names, &["*"]))
            .collect();
        debug!(groups = rules.len(), "Composed wildcard rules");

        rules.push(PolicyRule::new(
            CORE_GROUP,
            &["pods"],
            &["get", "list", "watch", "create", "update", "patch", "delete"],
        ));
        rules.push(PolicyRule::new(
            RBAC_GROUP,
            &["clusterrolebindings", "clusterroles", "rolebindings", "roles"],
            &["get", "list"],
        ));

        ClusterRole {
            kind: "ClusterRole".to_string(),
            api_version: format!("{}/v1", RBAC_GROUP),
            metadata: ObjectMeta {
                name: self.role_name.clone(),
            },
            rules,
        }
    }

    /// Read an api-resources dump from disk and compose the role
    pub fn compose_file(&self, path: &Path) -> Result<ClusterRole, RbacError> {
        let input = std::fs::read_to_string(path)?;
        let resources = parse_api_resources(&input)?;
        Ok(self.compose(&resources))
    }
}

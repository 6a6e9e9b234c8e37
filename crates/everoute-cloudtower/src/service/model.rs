//! `everoute_service` attribute model

use serde::{Deserialize, Serialize};

/// Configuration and state of an everoute service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceModel {
    /// Assigned by Cloudtower on create
    pub id: Option<String>,
    pub name: String,
    /// Unknown after an import until recovered from the cluster architecture
    pub package_id: Option<String>,
    pub controller_configuration: ControllerConfiguration,
    pub associated_cluster: Vec<AssociatedCluster>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfiguration {
    pub cluster_id: String,
    pub subnet_mask: String,
    pub gateway: String,
    pub instance: Vec<ControllerInstance>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerInstance {
    pub vlan_id: String,
    pub ip_addr: String,
}

/// A cluster whose workloads the service protects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociatedCluster {
    pub id: String,
    /// Filled in from Cloudtower
    pub name: Option<String>,
    pub vdses: Vec<AssociatedVds>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociatedVds {
    pub id: String,
    pub name: Option<String>,
}

impl AssociatedCluster {
    pub fn new(id: impl Into<String>, vds_ids: &[&str]) -> Self {
        Self {
            id: id.into(),
            name: None,
            vdses: vds_ids
                .iter()
                .map(|id| AssociatedVds {
                    id: id.to_string(),
                    name: None,
                })
                .collect(),
        }
    }
}

/// `everoute_service` data source: services looked up by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceQuery {
    pub id: Option<String>,
    pub name: String,
    pub services: Vec<ServiceView>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceView {
    pub id: String,
    pub name: String,
    pub version: String,
    pub phase: String,
    pub installed: bool,
    pub global_default_action: String,
    pub global_whitelist_enabled: bool,
    pub controllers: Vec<ControllerInstance>,
    pub associated_clusters: Vec<AssociatedCluster>,
}

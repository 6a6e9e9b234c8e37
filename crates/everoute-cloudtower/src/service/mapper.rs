//! Service state ⇄ Cloudtower records

use super::model::{
    AssociatedCluster, AssociatedVds, ControllerInstance, ServiceModel, ServiceView,
};
use crate::api::{
    self, ControllerTemplateInput, DefaultAction, DeployEffect, DeployInput, ElfVds,
    EverouteCluster, EverouteClusterCreateInput, GlobalWhitelistInput, IdRef,
};
use everoute_provider::Diagnostics;
use std::collections::{HashMap, HashSet};

/// Controller VM sizing used for every deployment
pub const CONTROLLER_VCPU: u32 = 2;
pub const CONTROLLER_MEMORY_GB: u32 = 2;
pub const CONTROLLER_DISK_GB: u32 = 30;

pub fn deploy_input(plan: &ServiceModel, package_id: &str, version: &str) -> DeployInput {
    let controller = &plan.controller_configuration;
    DeployInput {
        data: EverouteClusterCreateInput {
            name: plan.name.clone(),
            version: version.to_string(),
            controller_template: ControllerTemplateInput {
                cluster: controller.cluster_id.clone(),
                vcpu: CONTROLLER_VCPU,
                memory: CONTROLLER_MEMORY_GB,
                size: CONTROLLER_DISK_GB,
                netmask: controller.subnet_mask.clone(),
                gateway: controller.gateway.clone(),
            },
            controller_instances: controller
                .instance
                .iter()
                .map(|i| api::ControllerInstance {
                    ip_addr: i.ip_addr.clone(),
                    vlan: i.vlan_id.clone(),
                })
                .collect(),
            status: serde_json::Map::new(),
            global_default_action: DefaultAction::Allow,
            global_whitelist: GlobalWhitelistInput::default(),
        },
        effect: DeployEffect {
            package: IdRef::new(package_id),
        },
    }
}

/// Group a flat vds list by owning cluster id, keeping remote order
pub fn group_vdses(vdses: &[ElfVds]) -> HashMap<&str, Vec<AssociatedVds>> {
    let mut grouped: HashMap<&str, Vec<AssociatedVds>> = HashMap::new();
    for vds in vdses {
        let Some(cluster) = &vds.cluster else {
            continue;
        };
        grouped
            .entry(cluster.id.as_str())
            .or_default()
            .push(AssociatedVds {
                id: vds.id.clone(),
                name: Some(vds.name.clone()),
            });
    }
    grouped
}

/// Order `remote` vds by `known` first, then whatever else is attached
fn order_vdses(known: &[AssociatedVds], mut remote: Vec<AssociatedVds>) -> Vec<AssociatedVds> {
    let mut ordered = Vec::with_capacity(remote.len());
    for vds in known {
        if let Some(pos) = remote.iter().position(|r| r.id == vds.id) {
            ordered.push(remote.remove(pos));
        }
    }
    ordered.extend(remote);
    ordered
}

/// Refresh `state` from the remote record
///
/// With `adopt_all` (import) every connected cluster is taken over;
/// otherwise clusters keep the state's order and disconnected ones drop out.
pub fn apply_remote(
    remote: &EverouteCluster,
    state: &mut ServiceModel,
    adopt_all: bool,
) -> Diagnostics {
    let mut diags = Diagnostics::new();

    state.id = Some(remote.id.clone());
    state.name = remote.name.clone();

    let controller = &mut state.controller_configuration;
    if let Some(template) = &remote.controller_template {
        controller.cluster_id = template.cluster.clone();
        controller.gateway = template.gateway.clone();
        controller.subnet_mask = template.netmask.clone();
    }

    if controller.instance.is_empty() {
        controller.instance = remote
            .controller_instances
            .iter()
            .map(|i| ControllerInstance {
                vlan_id: i.vlan.clone(),
                ip_addr: i.ip_addr.clone(),
            })
            .collect();
    } else {
        let known: HashSet<&str> = controller
            .instance
            .iter()
            .map(|i| i.ip_addr.as_str())
            .collect();
        let actual: HashSet<&str> = remote
            .controller_instances
            .iter()
            .map(|i| i.ip_addr.as_str())
            .collect();
        if known != actual {
            diags.add_attribute_error(
                "controller_configuration.instance",
                "Failed to read everoute service",
                "Inconsistent controller instance",
            );
        }
    }

    let mut vdses = group_vdses(&remote.agent_elf_vdses);
    let connected: Vec<(&str, &str)> = remote
        .agent_elf_clusters
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let order: Vec<(String, Vec<AssociatedVds>)> = if adopt_all {
        connected
            .iter()
            .map(|(id, _)| (id.to_string(), Vec::new()))
            .collect()
    } else {
        state
            .associated_cluster
            .iter()
            .map(|c| (c.id.clone(), c.vdses.clone()))
            .collect()
    };

    state.associated_cluster = order
        .into_iter()
        .filter_map(|(id, known_vdses)| {
            let (_, name) = connected.iter().find(|(cid, _)| *cid == id)?;
            let remote_vdses = vdses.remove(id.as_str()).unwrap_or_default();
            Some(AssociatedCluster {
                name: Some(name.to_string()),
                vdses: order_vdses(&known_vdses, remote_vdses),
                id,
            })
        })
        .collect();

    diags
}

pub fn service_view(remote: &EverouteCluster) -> ServiceView {
    let mut vdses = group_vdses(&remote.agent_elf_vdses);
    ServiceView {
        id: remote.id.clone(),
        name: remote.name.clone(),
        version: remote.version.clone().unwrap_or_default(),
        phase: remote.phase.clone().unwrap_or_default(),
        installed: remote.installed.unwrap_or_default(),
        global_default_action: remote
            .global_default_action
            .unwrap_or_default()
            .to_string(),
        global_whitelist_enabled: remote
            .global_whitelist
            .as_ref()
            .is_some_and(|w| w.enable),
        controllers: remote
            .controller_instances
            .iter()
            .map(|i| ControllerInstance {
                vlan_id: i.vlan.clone(),
                ip_addr: i.ip_addr.clone(),
            })
            .collect(),
        associated_clusters: remote
            .agent_elf_clusters
            .iter()
            .map(|c| AssociatedCluster {
                id: c.id.clone(),
                name: Some(c.name.clone()),
                vdses: vdses.remove(c.id.as_str()).unwrap_or_default(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn remote() -> EverouteCluster {
        serde_json::from_value(json!({
            "id": "svc-1",
            "name": "er",
            "version": "2.1.0",
            "phase": "Running",
            "installed": true,
            "global_default_action": "ALLOW",
            "global_whitelist": {"enable": false},
            "controller_template": {
                "cluster": "c-ctl", "gateway": "10.0.0.1", "netmask": "255.255.255.0"
            },
            "controller_instances": [
                {"ipAddr": "10.0.0.11", "vlan": "vlan-1"},
                {"ipAddr": "10.0.0.12", "vlan": "vlan-1"},
                {"ipAddr": "10.0.0.13", "vlan": "vlan-1"}
            ],
            "agent_elf_clusters": [
                {"id": "c1", "name": "one"},
                {"id": "c2", "name": "two"}
            ],
            "agent_elf_vdses": [
                {"id": "v2", "name": "vds-2", "cluster": {"id": "c1"}},
                {"id": "v1", "name": "vds-1", "cluster": {"id": "c1"}},
                {"id": "v3", "name": "vds-3", "cluster": {"id": "c2"}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_import_adopts_everything() {
        let mut state = ServiceModel::default();
        let diags = apply_remote(&remote(), &mut state, true);
        assert!(diags.is_empty());
        assert_eq!(state.id.as_deref(), Some("svc-1"));
        assert_eq!(state.controller_configuration.cluster_id, "c-ctl");
        assert_eq!(state.controller_configuration.instance.len(), 3);
        let ids: Vec<_> = state.associated_cluster.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert_eq!(state.associated_cluster[0].name.as_deref(), Some("one"));
        let vds: Vec<_> = state.associated_cluster[0]
            .vdses
            .iter()
            .map(|v| v.id.as_str())
            .collect();
        assert_eq!(vds, vec!["v2", "v1"]);
    }

    #[test]
    fn test_read_keeps_state_order_and_drops_disconnected() {
        let mut state = ServiceModel {
            associated_cluster: vec![
                AssociatedCluster::new("c2", &[]),
                AssociatedCluster::new("gone", &[]),
                AssociatedCluster::new("c1", &["v1", "v2"]),
            ],
            ..Default::default()
        };
        apply_remote(&remote(), &mut state, false);
        let ids: Vec<_> = state.associated_cluster.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
        let vds: Vec<_> = state.associated_cluster[1]
            .vdses
            .iter()
            .map(|v| v.id.as_str())
            .collect();
        assert_eq!(vds, vec!["v1", "v2"]);
        assert_eq!(state.associated_cluster[0].vdses[0].name.as_deref(), Some("vds-3"));
    }

    #[test]
    fn test_inconsistent_instances_are_reported() {
        let mut state = ServiceModel::default();
        state.controller_configuration.instance = vec![ControllerInstance {
            vlan_id: "vlan-1".to_string(),
            ip_addr: "10.0.0.99".to_string(),
        }];
        let diags = apply_remote(&remote(), &mut state, false);
        assert!(diags.has_error());
        assert_eq!(state.controller_configuration.instance.len(), 1);
    }

    #[test]
    fn test_deploy_payload() {
        let mut plan = ServiceModel {
            name: "er".to_string(),
            ..Default::default()
        };
        apply_remote(&remote(), &mut plan, true);
        let payload = serde_json::to_value(deploy_input(&plan, "pkg-1", "2.1.0")).unwrap();
        assert_eq!(payload["effect"]["package"]["id"], "pkg-1");
        assert_eq!(payload["data"]["version"], "2.1.0");
        assert_eq!(payload["data"]["controller_template"]["vcpu"], 2);
        assert_eq!(payload["data"]["controller_template"]["size"], 30);
        assert_eq!(payload["data"]["global_default_action"], "ALLOW");
        assert_eq!(
            payload["data"]["global_whitelist"],
            json!({"enable": false, "ingress": [], "egress": []})
        );
        assert_eq!(
            payload["data"]["controller_instances"][0],
            json!({"ipAddr": "10.0.0.11", "vlan": "vlan-1"})
        );
    }

    #[test]
    fn test_service_view() {
        let view = service_view(&remote());
        assert_eq!(view.version, "2.1.0");
        assert!(view.installed);
        assert_eq!(view.global_default_action, "ALLOW");
        assert_eq!(view.associated_clusters[1].vdses.len(), 1);
    }
}

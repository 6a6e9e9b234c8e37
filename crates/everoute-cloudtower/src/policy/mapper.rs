//! Global security policy state ⇄ Cloudtower records

use super::model::{
    GlobalSecurityPolicyModel, NetworkPolicyRule, PolicyView, PortView, RuleView, SelectorView,
};
use crate::api::{
    self, DefaultAction, EverouteCluster, GlobalPolicyInput, GlobalWhitelistInput,
    NetworkPolicyRuleInput, NetworkPolicyRulePort, PortInput,
};
use crate::convert::split_csv;

const RULE_TYPE_IP_BLOCK: &str = "IP_BLOCK";

/// Project a flat ports list onto per-protocol fields
///
/// No ports at all means every protocol on every port.
fn rule_from_remote(rule: &api::NetworkPolicyRule) -> NetworkPolicyRule {
    let mut mapped = NetworkPolicyRule {
        ip_block: rule.ip_block.clone().unwrap_or_default(),
        except_ip_block: rule.except_ip_block.clone().unwrap_or_default(),
        ..Default::default()
    };

    let ports: &[NetworkPolicyRulePort] = rule.ports.as_deref().unwrap_or_default();
    if ports.is_empty() {
        return mapped;
    }

    mapped.tcp_enabled = false;
    mapped.udp_enabled = false;
    mapped.icmp_enabled = false;
    for port in ports {
        let value = port.port.clone().unwrap_or_default();
        match port.protocol.to_ascii_uppercase().as_str() {
            "TCP" => {
                mapped.tcp_enabled = true;
                mapped.tcp_ports = value;
            }
            "UDP" => {
                mapped.udp_enabled = true;
                mapped.udp_ports = value;
            }
            "ICMP" => mapped.icmp_enabled = true,
            other => tracing::debug!("Ignoring port entry with protocol {}", other),
        }
    }
    mapped
}

fn rule_to_input(rule: &NetworkPolicyRule) -> NetworkPolicyRuleInput {
    let mut ports = Vec::new();
    if rule.tcp_enabled {
        ports.push(PortInput {
            protocol: "TCP",
            port: Some(rule.tcp_ports.clone()),
        });
    }
    if rule.udp_enabled {
        ports.push(PortInput {
            protocol: "UDP",
            port: Some(rule.udp_ports.clone()),
        });
    }
    if rule.icmp_enabled {
        ports.push(PortInput {
            protocol: "ICMP",
            port: None,
        });
    }
    NetworkPolicyRuleInput {
        rule_type: RULE_TYPE_IP_BLOCK,
        ip_block: rule.ip_block.clone(),
        except_ip_block: rule.except_ip_block.clone(),
        ports,
    }
}

/// Refresh `state` from the remote whitelist
pub fn apply_remote(remote: &EverouteCluster, state: &mut GlobalSecurityPolicyModel) {
    let whitelist = remote.global_whitelist.clone().unwrap_or_default();
    state.id = Some(remote.id.clone());
    state.service_id = remote.id.clone();
    state.enable = whitelist.enable;
    state.default_action = remote
        .global_default_action
        .unwrap_or_default()
        .to_string();
    state.ingress = whitelist.ingress.iter().map(rule_from_remote).collect();
    state.egress = whitelist.egress.iter().map(rule_from_remote).collect();
}

/// Mutation payload for a plan. Rules are only sent for an enabled policy.
/// Fails on a default action that is neither ALLOW nor DROP.
pub fn update_input(plan: &GlobalSecurityPolicyModel) -> Result<GlobalPolicyInput, String> {
    let global_default_action = plan.default_action.parse::<DefaultAction>()?;
    let rules = |rules: &[NetworkPolicyRule]| -> Vec<NetworkPolicyRuleInput> {
        if plan.enable {
            rules.iter().map(rule_to_input).collect()
        } else {
            Vec::new()
        }
    };
    Ok(GlobalPolicyInput {
        global_default_action,
        global_whitelist: GlobalWhitelistInput {
            enable: plan.enable,
            ingress: rules(&plan.ingress),
            egress: rules(&plan.egress),
        },
    })
}

/// Payload that returns a service to "allow everything"
pub fn reset_input() -> GlobalPolicyInput {
    GlobalPolicyInput {
        global_default_action: DefaultAction::Allow,
        global_whitelist: GlobalWhitelistInput::default(),
    }
}

fn rule_view(rule: &api::NetworkPolicyRule) -> RuleView {
    RuleView {
        ip_block: rule.ip_block.clone(),
        except_ip_block: rule.except_ip_block.clone().unwrap_or_default(),
        ports: rule
            .ports
            .iter()
            .flatten()
            .map(|p| PortView {
                protocol: p.protocol.to_ascii_uppercase(),
                port: p.port.as_deref().map(split_csv).unwrap_or_default(),
            })
            .collect(),
        selectors: rule
            .selector
            .iter()
            .flatten()
            .map(|l| SelectorView {
                id: l.id.clone(),
                key: l.key.clone(),
                value: l.value.clone(),
            })
            .collect(),
        rule_type: rule.rule_type.clone(),
    }
}

pub fn policy_view(remote: &EverouteCluster) -> PolicyView {
    let whitelist = remote.global_whitelist.clone().unwrap_or_default();
    PolicyView {
        enable: whitelist.enable,
        ingress: whitelist.ingress.iter().map(rule_view).collect(),
        egress: whitelist.egress.iter().map(rule_view).collect(),
    }
}

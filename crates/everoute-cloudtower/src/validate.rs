//! Structural checks on candidate configurations
//!
//! Pure and synchronous. Every violation becomes an error diagnostic on the
//! offending attribute path; an empty result means "valid".

use crate::api::DefaultAction;
use crate::policy::model::{GlobalSecurityPolicyModel, NetworkPolicyRule};
use crate::service::model::{AssociatedCluster, ControllerInstance, ServiceModel};
use everoute_provider::Diagnostics;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static SUBNET_MASK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^((128|192|224|240|248|252|254)\.0\.0\.0|255\.(0|128|192|224|240|248|252|254)\.0\.0|255\.255\.(0|128|192|224|240|248|252|254)\.0|255\.255\.255\.(0|128|192|224|240|248|252|254))$",
    )
    .expect("valid subnet mask pattern")
});

static IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$")
        .expect("valid ipv4 pattern")
});

const CONTROLLER_COUNTS: [usize; 2] = [3, 5];

/// Values that occur more than once, in order of their second occurrence
fn duplicates<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    values
        .into_iter()
        .filter(|v| !seen.insert(*v) && reported.insert(*v))
        .collect()
}

pub fn subnet_mask(value: &str, path: &str) -> Diagnostics {
    let mut diags = Diagnostics::new();
    if !SUBNET_MASK.is_match(value) {
        diags.add_attribute_error(
            path,
            "Invalid subnet mask",
            format!("{value:?} must be a valid subnet mask"),
        );
    }
    diags
}

pub fn ipv4_address(value: &str, path: &str) -> Diagnostics {
    let mut diags = Diagnostics::new();
    if !IPV4.is_match(value) {
        diags.add_attribute_error(
            path,
            "Invalid ip address",
            format!("{value:?} must be a valid ip address"),
        );
    }
    diags
}

pub fn unique_values(values: &[String], path: &str) -> Diagnostics {
    let mut diags = Diagnostics::new();
    let repeated = duplicates(values.iter().map(String::as_str));
    if !repeated.is_empty() {
        diags.add_attribute_error(
            path,
            "Duplicate values",
            format!("values must be unique, but got duplicates {repeated:?}"),
        );
    }
    diags
}

pub fn default_action(value: &str, path: &str) -> Diagnostics {
    let mut diags = Diagnostics::new();
    if let Err(e) = value.parse::<DefaultAction>() {
        diags.add_attribute_error(path, "Invalid default action", e);
    }
    diags
}

/// Exactly 3 or 5 instances, no shared IP address
pub fn controller_instances(instances: &[ControllerInstance]) -> Diagnostics {
    const PATH: &str = "controller_configuration.instance";
    let mut diags = Diagnostics::new();

    if !CONTROLLER_COUNTS.contains(&instances.len()) {
        diags.add_attribute_error(
            PATH,
            "Invalid length of controller instance configuration",
            format!(
                "controller instance count must be 3 or 5, but got {}",
                instances.len()
            ),
        );
    }

    let repeated = duplicates(instances.iter().map(|i| i.ip_addr.as_str()));
    if !repeated.is_empty() {
        diags.add_attribute_error(
            PATH,
            "Invalid ip address of controller instance configuration",
            format!("controller instance ip address must be unique, but got duplicates {repeated:?}"),
        );
    }

    for (idx, instance) in instances.iter().enumerate() {
        diags.append(ipv4_address(
            &instance.ip_addr,
            &format!("{PATH}[{idx}].ip_addr"),
        ));
    }
    diags
}

/// No repeated cluster, no repeated vds within one cluster
pub fn associated_clusters(clusters: &[AssociatedCluster]) -> Diagnostics {
    const PATH: &str = "associated_cluster";
    let mut diags = Diagnostics::new();

    for (idx, cluster) in clusters.iter().enumerate() {
        let repeated = duplicates(cluster.vdses.iter().map(|v| v.id.as_str()));
        if !repeated.is_empty() {
            diags.add_attribute_error(
                format!("{PATH}[{idx}].vdses"),
                "Invalid vds of associated cluster configuration",
                format!(
                    "vds of associated cluster {} must be unique, but got duplicates {repeated:?}",
                    cluster.id
                ),
            );
        }
    }

    let repeated = duplicates(clusters.iter().map(|c| c.id.as_str()));
    if !repeated.is_empty() {
        diags.add_attribute_error(
            PATH,
            "Invalid cluster of associated cluster configuration",
            format!("associated clusters must be unique, but got duplicates {repeated:?}"),
        );
    }
    diags
}

/// At least one protocol enabled; a disabled protocol carries no ports
pub fn network_policy_rule(rule: &NetworkPolicyRule, path: &str) -> Diagnostics {
    const SUMMARY: &str = "Invalid network policy rule";
    let mut diags = Diagnostics::new();

    if !rule.tcp_enabled && !rule.udp_enabled && !rule.icmp_enabled {
        diags.add_attribute_error(
            path,
            SUMMARY,
            "at least one protocol should be enabled, otherwise remove this rule",
        );
    }
    if !rule.tcp_enabled && !rule.tcp_ports.is_empty() {
        diags.add_attribute_error(
            format!("{path}.tcp_ports"),
            SUMMARY,
            "if tcp protocol is disabled, tcp ports must be empty",
        );
    }
    if !rule.udp_enabled && !rule.udp_ports.is_empty() {
        diags.add_attribute_error(
            format!("{path}.udp_ports"),
            SUMMARY,
            "if udp protocol is disabled, udp ports must be empty",
        );
    }
    diags.append(unique_values(
        &rule.except_ip_block,
        &format!("{path}.except_ip_block"),
    ));
    diags
}

pub fn service(config: &ServiceModel) -> Diagnostics {
    let controller = &config.controller_configuration;
    let mut diags = Diagnostics::new();

    if config.name.trim().is_empty() {
        diags.add_attribute_error("name", "Missing name", "service name must not be empty");
    }
    diags.append(subnet_mask(
        &controller.subnet_mask,
        "controller_configuration.subnet_mask",
    ));
    diags.append(ipv4_address(
        &controller.gateway,
        "controller_configuration.gateway",
    ));
    diags.append(controller_instances(&controller.instance));
    diags.append(associated_clusters(&config.associated_cluster));
    diags
}

pub fn global_security_policy(config: &GlobalSecurityPolicyModel) -> Diagnostics {
    let mut diags = default_action(&config.default_action, "default_action");

    let has_rules = !config.ingress.is_empty() || !config.egress.is_empty();
    if config.enable && !has_rules {
        diags.add_attribute_error(
            "enable",
            "Invalid global security policy",
            "an enabled policy needs at least one ingress or egress rule",
        );
    }
    if !config.enable && has_rules {
        diags.add_attribute_error(
            "enable",
            "Invalid global security policy",
            "a disabled policy must not have ingress or egress rules",
        );
    }

    for (direction, rules) in [("ingress", &config.ingress), ("egress", &config.egress)] {
        for (idx, rule) in rules.iter().enumerate() {
            diags.append(network_policy_rule(rule, &format!("{direction}[{idx}]")));
        }
    }
    diags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instances(ips: &[&str]) -> Vec<ControllerInstance> {
        ips.iter()
            .map(|ip| ControllerInstance {
                vlan_id: "vlan-1".to_string(),
                ip_addr: ip.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_controller_count() {
        assert!(controller_instances(&instances(&["10.0.0.1", "10.0.0.2", "10.0.0.3"])).is_empty());
        assert!(
            controller_instances(&instances(&[
                "10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4", "10.0.0.5"
            ]))
            .is_empty()
        );
        for n in [0, 1, 2, 4, 6] {
            let ips: Vec<String> = (1..=n).map(|i| format!("10.0.0.{i}")).collect();
            let ips: Vec<&str> = ips.iter().map(String::as_str).collect();
            assert!(controller_instances(&instances(&ips)).has_error(), "count {n}");
        }
    }

    #[test]
    fn test_controller_ip_must_be_unique() {
        let diags = controller_instances(&instances(&["10.0.0.1", "10.0.0.2", "10.0.0.1"]));
        assert_eq!(diags.len(), 1);
        let diag = diags.iter().next().unwrap();
        assert!(diag.detail.contains("10.0.0.1"));
        assert_eq!(
            diag.attribute.as_deref(),
            Some("controller_configuration.instance")
        );
    }

    #[test]
    fn test_associated_cluster_uniqueness() {
        let ok = vec![
            AssociatedCluster::new("c1", &["v1", "v2"]),
            AssociatedCluster::new("c2", &["v1"]),
        ];
        assert!(associated_clusters(&ok).is_empty());

        let repeated_cluster = vec![
            AssociatedCluster::new("c1", &[]),
            AssociatedCluster::new("c1", &[]),
        ];
        assert!(associated_clusters(&repeated_cluster).has_error());

        let repeated_vds = vec![AssociatedCluster::new("c1", &["v1", "v1"])];
        let diags = associated_clusters(&repeated_vds);
        assert_eq!(
            diags.iter().next().unwrap().attribute.as_deref(),
            Some("associated_cluster[0].vdses")
        );
    }

    #[test]
    fn test_network_policy_rule() {
        let tcp_disabled_with_port = NetworkPolicyRule {
            tcp_enabled: false,
            tcp_ports: "80".to_string(),
            ..Default::default()
        };
        assert!(network_policy_rule(&tcp_disabled_with_port, "ingress[0]").has_error());

        let all_disabled = NetworkPolicyRule {
            tcp_enabled: false,
            udp_enabled: false,
            icmp_enabled: false,
            ..Default::default()
        };
        assert!(network_policy_rule(&all_disabled, "ingress[0]").has_error());

        let udp_only = NetworkPolicyRule {
            tcp_enabled: false,
            icmp_enabled: false,
            udp_ports: "53".to_string(),
            ..Default::default()
        };
        assert!(network_policy_rule(&udp_only, "ingress[0]").is_empty());

        assert!(network_policy_rule(&NetworkPolicyRule::default(), "egress[0]").is_empty());
    }

    #[test]
    fn test_except_ip_block_unique() {
        let rule = NetworkPolicyRule {
            ip_block: "10.0.0.0/8".to_string(),
            except_ip_block: vec!["10.1.0.0/16".to_string(), "10.1.0.0/16".to_string()],
            ..Default::default()
        };
        assert!(network_policy_rule(&rule, "ingress[0]").has_error());
    }

    #[test]
    fn test_address_formats() {
        assert!(subnet_mask("255.255.255.0", "m").is_empty());
        assert!(subnet_mask("255.255.128.0", "m").is_empty());
        assert!(subnet_mask("255.0.255.0", "m").has_error());
        assert!(subnet_mask("255.255.255.255", "m").has_error());
        assert!(ipv4_address("192.168.1.254", "ip").is_empty());
        assert!(ipv4_address("192.168.1.256", "ip").has_error());
        assert!(ipv4_address("192.168.1", "ip").has_error());
        assert!(ipv4_address("192.168.1.1.", "ip").has_error());
    }

    #[test]
    fn test_policy_enable_requires_rules() {
        let enabled_empty = GlobalSecurityPolicyModel {
            service_id: "svc".to_string(),
            enable: true,
            ..Default::default()
        };
        assert!(global_security_policy(&enabled_empty).has_error());

        let disabled_with_rule = GlobalSecurityPolicyModel {
            service_id: "svc".to_string(),
            ingress: vec![NetworkPolicyRule::default()],
            ..Default::default()
        };
        assert!(global_security_policy(&disabled_with_rule).has_error());

        let disabled_empty = GlobalSecurityPolicyModel {
            service_id: "svc".to_string(),
            default_action: "drop".to_string(),
            ..Default::default()
        };
        assert!(global_security_policy(&disabled_empty).is_empty());

        let bad_action = GlobalSecurityPolicyModel {
            default_action: "REJECT".to_string(),
            ..Default::default()
        };
        assert!(global_security_policy(&bad_action).has_error());
    }
}

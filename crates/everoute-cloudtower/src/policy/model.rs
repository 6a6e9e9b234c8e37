//! `everoute_global_security_policy` attribute model

use serde::{Deserialize, Serialize};

/// Global whitelist and default action of one service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSecurityPolicyModel {
    /// Same as `service_id`
    pub id: Option<String>,
    pub service_id: String,
    pub enable: bool,
    /// `ALLOW` or `DROP`
    pub default_action: String,
    pub ingress: Vec<NetworkPolicyRule>,
    pub egress: Vec<NetworkPolicyRule>,
}

impl Default for GlobalSecurityPolicyModel {
    fn default() -> Self {
        Self {
            id: None,
            service_id: String::new(),
            enable: false,
            default_action: "ALLOW".to_string(),
            ingress: Vec::new(),
            egress: Vec::new(),
        }
    }
}

/// One whitelist rule. Unset protocol flags count as enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkPolicyRule {
    pub ip_block: String,
    pub except_ip_block: Vec<String>,
    pub tcp_enabled: bool,
    /// Comma separated, empty means every port
    pub tcp_ports: String,
    pub udp_enabled: bool,
    pub udp_ports: String,
    pub icmp_enabled: bool,
}

impl Default for NetworkPolicyRule {
    fn default() -> Self {
        Self {
            ip_block: String::new(),
            except_ip_block: Vec::new(),
            tcp_enabled: true,
            tcp_ports: String::new(),
            udp_enabled: true,
            udp_ports: String::new(),
            icmp_enabled: true,
        }
    }
}

/// `everoute_global_security_policy` data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyQuery {
    pub id: Option<String>,
    pub service_id: Option<String>,
    pub service_name: Option<String>,
    pub global_security_policy: Option<PolicyView>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyView {
    pub enable: bool,
    pub ingress: Vec<RuleView>,
    pub egress: Vec<RuleView>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleView {
    pub ip_block: Option<String>,
    pub except_ip_block: Vec<String>,
    pub ports: Vec<PortView>,
    pub selectors: Vec<SelectorView>,
    #[serde(rename = "type")]
    pub rule_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortView {
    pub protocol: String,
    pub port: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorView {
    pub id: String,
    pub key: String,
    pub value: Option<String>,
}

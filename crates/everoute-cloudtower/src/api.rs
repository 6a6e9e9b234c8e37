//! Typed Cloudtower records
//!
//! Responses are decoded into these types once, at the client boundary.
//! GraphQL returns `null` for empty relations, so list fields go through
//! [`nullable`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decode `null` as the type's default
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// CPU architecture of a cluster or package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    #[serde(rename = "X86_64")]
    X86_64,
    #[serde(rename = "AARCH64")]
    Aarch64,
}

impl Architecture {
    pub const VALUES: [&'static str; 2] = ["X86_64", "AARCH64"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86_64 => "X86_64",
            Architecture::Aarch64 => "AARCH64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "X86_64" => Ok(Architecture::X86_64),
            "AARCH64" => Ok(Architecture::Aarch64),
            other => Err(format!(
                "unknown architecture {other:?}, expected one of {}",
                Self::VALUES.join(", ")
            )),
        }
    }
}

/// Action applied to traffic no rule matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DefaultAction {
    #[default]
    Allow,
    Drop,
}

impl DefaultAction {
    pub const VALUES: [&'static str; 2] = ["ALLOW", "DROP"];

    pub fn as_str(&self) -> &'static str {
        match self {
            DefaultAction::Allow => "ALLOW",
            DefaultAction::Drop => "DROP",
        }
    }
}

impl fmt::Display for DefaultAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DefaultAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALLOW" => Ok(DefaultAction::Allow),
            "DROP" => Ok(DefaultAction::Drop),
            other => Err(format!(
                "unknown action {other:?}, expected one of {}",
                Self::VALUES.join(", ")
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// GraphQL: everouteClusters
// ---------------------------------------------------------------------------

/// An everoute cluster, called a "service" by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EverouteCluster {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub installed: Option<bool>,
    #[serde(default)]
    pub global_default_action: Option<DefaultAction>,
    #[serde(default)]
    pub global_whitelist: Option<GlobalWhitelist>,
    #[serde(default)]
    pub controller_template: Option<ControllerTemplate>,
    #[serde(default, deserialize_with = "nullable")]
    pub controller_instances: Vec<ControllerInstance>,
    #[serde(default, deserialize_with = "nullable")]
    pub agent_elf_clusters: Vec<ClusterRef>,
    #[serde(default, deserialize_with = "nullable")]
    pub agent_elf_vdses: Vec<ElfVds>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerTemplate {
    #[serde(default, deserialize_with = "nullable")]
    pub cluster: String,
    #[serde(default, deserialize_with = "nullable")]
    pub gateway: String,
    #[serde(default, deserialize_with = "nullable")]
    pub netmask: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerInstance {
    #[serde(rename = "ipAddr")]
    pub ip_addr: String,
    pub vlan: String,
}

/// `{ id name }` reference to a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRef {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
}

/// VDS attached to an everoute cluster, tagged with its owning cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElfVds {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default)]
    pub cluster: Option<ClusterRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalWhitelist {
    #[serde(default, deserialize_with = "nullable")]
    pub enable: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub ingress: Vec<NetworkPolicyRule>,
    #[serde(default, deserialize_with = "nullable")]
    pub egress: Vec<NetworkPolicyRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkPolicyRule {
    #[serde(default)]
    pub ip_block: Option<String>,
    #[serde(default)]
    pub except_ip_block: Option<Vec<String>>,
    /// `None` and `Some([])` both mean "every protocol, every port"
    #[serde(default)]
    pub ports: Option<Vec<NetworkPolicyRulePort>>,
    #[serde(default)]
    pub selector: Option<Vec<Label>>,
    #[serde(default, rename = "type")]
    pub rule_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPolicyRulePort {
    #[serde(default)]
    pub port: Option<String>,
    pub protocol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

// ---------------------------------------------------------------------------
// REST: /v2/api/get-*
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EveroutePackage {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub version: String,
    pub arch: Architecture,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default)]
    pub architecture: Option<Architecture>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vds {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pending,
    Executing,
    Paused,
    Failed,
    Successed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub error_message: Option<String>,
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EverouteClusterWhere {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EverouteClusterWhere {
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackageWhere {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<Architecture>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterWhere {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_in: Option<Vec<String>>,
}

impl ClusterWhere {
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn id_in(ids: Vec<String>) -> Self {
        Self {
            id_in: Some(ids),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VdsWhere {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_in: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterWhere>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VlanWhere {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vds: Option<VdsWhere>,
}

impl VlanWhere {
    /// Every VLAN on any VDS of the given cluster
    pub fn in_cluster(cluster_id: impl Into<String>) -> Self {
        Self {
            vds: Some(VdsWhere {
                cluster: Some(ClusterWhere::id(cluster_id)),
                ..Default::default()
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskWhere {
    pub id: String,
}

// ---------------------------------------------------------------------------
// Mutation inputs
// ---------------------------------------------------------------------------

/// `{ id }` used by connect/disconnect/set relation updates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdRef {
    pub id: String,
}

impl IdRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployInput {
    pub data: EverouteClusterCreateInput,
    pub effect: DeployEffect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EverouteClusterCreateInput {
    pub name: String,
    pub version: String,
    pub controller_template: ControllerTemplateInput,
    pub controller_instances: Vec<ControllerInstance>,
    pub status: serde_json::Map<String, serde_json::Value>,
    pub global_default_action: DefaultAction,
    pub global_whitelist: GlobalWhitelistInput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerTemplateInput {
    pub cluster: String,
    pub vcpu: u32,
    pub memory: u32,
    pub size: u32,
    pub netmask: String,
    pub gateway: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployEffect {
    pub package: IdRef,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalWhitelistInput {
    pub enable: bool,
    pub ingress: Vec<NetworkPolicyRuleInput>,
    pub egress: Vec<NetworkPolicyRuleInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkPolicyRuleInput {
    #[serde(rename = "type")]
    pub rule_type: &'static str,
    pub ip_block: String,
    pub except_ip_block: Vec<String>,
    pub ports: Vec<PortInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInput {
    pub protocol: &'static str,
    /// ICMP carries no port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

/// Association change: clusters connected/disconnected, vds replaced wholesale
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssociationInput {
    pub agent_elf_clusters: ClusterConnection,
    pub agent_elf_vdses: VdsSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterConnection {
    pub connect: Vec<IdRef>,
    pub disconnect: Vec<IdRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VdsSet {
    pub set: Vec<IdRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalPolicyInput {
    pub global_default_action: DefaultAction,
    pub global_whitelist: GlobalWhitelistInput,
}

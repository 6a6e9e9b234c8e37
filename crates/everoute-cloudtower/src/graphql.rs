//! GraphQL documents sent to `/api/`
//!
//! Each document is paired with the operation name Cloudtower expects.

/// A fixed GraphQL document and its operation name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document {
    pub operation_name: &'static str,
    pub query: &'static str,
}

pub const LOGIN: Document = Document {
    operation_name: "login",
    query: r#"
mutation login($data: LoginInput!) {
  login(data: $data) {
    token
  }
}
"#,
};

/// Names only, used for the duplicate-name check
pub const EVEROUTE_CLUSTER_NAMES: Document = Document {
    operation_name: "everouteClusterNames",
    query: r#"
query everouteClusterNames($where: EverouteClusterWhereInput) {
  everouteClusters(where: $where) {
    id
    name
  }
}
"#,
};

pub const EVEROUTE_CLUSTERS: Document = Document {
    operation_name: "everouteClusters",
    query: r#"
query everouteClusters($where: EverouteClusterWhereInput) {
  everouteClusters(where: $where) {
    id
    name
    version
    phase
    installed
    global_default_action
    global_whitelist {
      enable
    }
    controller_template {
      cluster
      gateway
      netmask
    }
    controller_instances {
      ipAddr
      vlan
    }
    agent_elf_clusters {
      id
      name
    }
    agent_elf_vdses {
      id
      name
      cluster {
        id
        name
      }
    }
  }
}
"#,
};

pub const GLOBAL_WHITELIST: Document = Document {
    operation_name: "getEverouteClusters",
    query: r#"
query getEverouteClusters($where: EverouteClusterWhereInput) {
  everouteClusters(where: $where, first: 1) {
    id
    name
    global_default_action
    global_whitelist {
      enable
      ingress {
        ip_block
        except_ip_block
        ports {
          port
          protocol
        }
        selector {
          id
          key
          value
        }
        type
      }
      egress {
        ip_block
        except_ip_block
        ports {
          port
          protocol
        }
        selector {
          id
          key
          value
        }
        type
      }
    }
  }
}
"#,
};

pub const DEPLOY_EVEROUTE_CLUSTER: Document = Document {
    operation_name: "deployEverouteCluster",
    query: r#"
mutation deployEverouteCluster(
  $data: EverouteClusterCreateInput!
  $effect: CreateEverouteClusterEffectInput!
) {
  createEverouteCluster(data: $data, effect: $effect) {
    id
    name
  }
}
"#,
};

pub const UPDATE_ASSOCIATION: Document = Document {
    operation_name: "updateEverouteClusterAssociation",
    query: r#"
mutation updateEverouteClusterAssociation(
  $where: EverouteClusterWhereUniqueInput!
  $data: EverouteClusterUpdateInput!
) {
  updateEverouteCluster(where: $where, data: $data) {
    id
  }
}
"#,
};

pub const UPDATE_GLOBAL_ACTION: Document = Document {
    operation_name: "updateEverouteClusterGlobalAction",
    query: r#"
mutation updateEverouteClusterGlobalAction(
  $where: EverouteClusterWhereUniqueInput!
  $data: EverouteClusterUpdateInput!
) {
  updateEverouteCluster(where: $where, data: $data) {
    id
    global_default_action
  }
}
"#,
};

pub const DELETE_EVEROUTE_CLUSTER: Document = Document {
    operation_name: "deleteEverouteCluster",
    query: r#"
mutation deleteEverouteCluster($where: EverouteClusterWhereUniqueInput!) {
  deleteEverouteCluster(where: $where) {
    id
  }
}
"#,
};

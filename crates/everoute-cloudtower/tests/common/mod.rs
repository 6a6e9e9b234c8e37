use async_trait::async_trait;
use everoute_cloudtower::{
    Cloudtower, CloudtowerApi, CloudtowerError, EverouteProvider, GraphqlRequest,
    GraphqlResponse, Result,
};
use everoute_provider::Registry;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory Cloudtower with a small seeded inventory:
///
/// - clusters `c-ctl` (controller), `c1`, `c2`, `c3`
/// - vds `vds-ctl` on `c-ctl`, `v1` + `v2` on `c1`, `v3` on `c2`, `v4` on `c3`
/// - vlan `vlan-1` on `vds-ctl`
/// - package `pkg-1`, version 2.1.0, X86_64
pub struct FakeCloudtower {
    state: Mutex<FakeState>,
}

#[derive(Default)]
pub struct FakeState {
    pub services: Vec<Value>,
    pub packages: Vec<Value>,
    pub clusters: Vec<Value>,
    /// `{id, name, cluster}` with `cluster` the owning cluster id
    pub vdses: Vec<Value>,
    /// `{id, name, cluster}` with `cluster` the owning cluster id
    pub vlans: Vec<Value>,
    /// Operation name and variables of every mutation, in order
    pub mutations: Vec<(String, Value)>,
    /// Number of REST calls per endpoint
    pub rest_calls: Vec<String>,
    /// Tasks report FAILED with this message
    pub fail_tasks: Option<String>,
    /// GraphQL operation names that fail once, with a GraphQL error
    pub fail_once: Vec<String>,
    next_task: usize,
    next_service: usize,
}

impl FakeCloudtower {
    pub fn seeded() -> Arc<Self> {
        let state = FakeState {
            packages: vec![json!({
                "id": "pkg-1", "name": "everoute-2.1.0", "version": "2.1.0", "arch": "X86_64"
            })],
            clusters: vec![
                json!({"id": "c-ctl", "name": "controller-cluster", "architecture": "X86_64"}),
                json!({"id": "c1", "name": "cluster-one", "architecture": "X86_64"}),
                json!({"id": "c2", "name": "cluster-two", "architecture": "X86_64"}),
                json!({"id": "c3", "name": "cluster-three", "architecture": "AARCH64"}),
            ],
            vdses: vec![
                json!({"id": "vds-ctl", "name": "vds-controller", "cluster": "c-ctl"}),
                json!({"id": "v1", "name": "vds-1", "cluster": "c1"}),
                json!({"id": "v2", "name": "vds-2", "cluster": "c1"}),
                json!({"id": "v3", "name": "vds-3", "cluster": "c2"}),
                json!({"id": "v4", "name": "vds-4", "cluster": "c3"}),
            ],
            vlans: vec![json!({"id": "vlan-1", "name": "mgmt", "cluster": "c-ctl"})],
            ..Default::default()
        };
        Arc::new(Self {
            state: Mutex::new(state),
        })
    }

    pub fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    #[allow(dead_code)]
    pub fn mutation_names(&self) -> Vec<String> {
        self.with_state(|s| s.mutations.iter().map(|(name, _)| name.clone()).collect())
    }

    #[allow(dead_code)]
    pub fn service(&self, id: &str) -> Option<Value> {
        self.with_state(|s| s.services.iter().find(|v| v["id"] == id).cloned())
    }

    /// Insert a service record as Cloudtower would return it
    #[allow(dead_code)]
    pub fn insert_service(&self, record: Value) {
        self.with_state(|s| s.services.push(record));
    }
}

fn str_of(value: &Value) -> &str {
    value.as_str().unwrap_or_default()
}

fn ids(refs: &Value) -> Vec<String> {
    refs.as_array()
        .into_iter()
        .flatten()
        .map(|r| str_of(&r["id"]).to_string())
        .collect()
}

impl FakeState {
    fn task(&mut self) -> String {
        self.next_task += 1;
        format!("task-{}", self.next_task)
    }

    fn cluster_ref(&self, id: &str) -> Value {
        let name = self
            .clusters
            .iter()
            .find(|c| c["id"] == id)
            .map(|c| c["name"].clone())
            .unwrap_or(Value::Null);
        json!({"id": id, "name": name})
    }

    fn find_services(&self, filter: &Value) -> Vec<Value> {
        self.services
            .iter()
            .filter(|s| filter.get("id").is_none_or(|id| s["id"] == *id))
            .filter(|s| filter.get("name").is_none_or(|name| s["name"] == *name))
            .cloned()
            .collect()
    }

    fn service_mut(&mut self, id: &str) -> Result<&mut Value> {
        self.services
            .iter_mut()
            .find(|s| s["id"] == id)
            .ok_or_else(|| CloudtowerError::Graphql(vec![format!("service {id} not found")]))
    }

    fn deploy(&mut self, variables: &Value) -> Value {
        self.next_service += 1;
        let id = format!("svc-{}", self.next_service);
        let data = &variables["data"];
        let template = &data["controller_template"];
        self.services.push(json!({
            "id": id,
            "name": data["name"],
            "version": data["version"],
            "phase": "Running",
            "installed": true,
            "global_default_action": data["global_default_action"],
            "global_whitelist": data["global_whitelist"],
            "controller_template": {
                "cluster": template["cluster"],
                "gateway": template["gateway"],
                "netmask": template["netmask"],
            },
            "controller_instances": data["controller_instances"],
            "agent_elf_clusters": [],
            "agent_elf_vdses": [],
        }));
        json!({"createEverouteCluster": {"id": id, "name": data["name"]}})
    }

    fn associate(&mut self, variables: &Value) -> Result<Value> {
        let id = str_of(&variables["where"]["id"]).to_string();
        let data = &variables["data"];
        let connect = ids(&data["agent_elf_clusters"]["connect"]);
        let disconnect = ids(&data["agent_elf_clusters"]["disconnect"]);
        let set = ids(&data["agent_elf_vdses"]["set"]);

        let connected: Vec<Value> = connect.iter().map(|c| self.cluster_ref(c)).collect();
        let vdses: Vec<Value> = set
            .iter()
            .filter_map(|vid| self.vdses.iter().find(|v| v["id"] == vid.as_str()))
            .map(|v| {
                json!({
                    "id": v["id"],
                    "name": v["name"],
                    "cluster": self.cluster_ref(str_of(&v["cluster"])),
                })
            })
            .collect();

        let service = self.service_mut(&id)?;
        let clusters = service["agent_elf_clusters"]
            .as_array_mut()
            .ok_or_else(|| CloudtowerError::UnexpectedResponse("bad fake record".into()))?;
        clusters.retain(|c| !disconnect.iter().any(|d| c["id"] == d.as_str()));
        for cluster in connected {
            if !clusters.iter().any(|c| c["id"] == cluster["id"]) {
                clusters.push(cluster);
            }
        }
        service["agent_elf_vdses"] = Value::Array(vdses);
        Ok(json!({"updateEverouteCluster": {"id": id}}))
    }

    fn update_global(&mut self, variables: &Value) -> Result<Value> {
        let id = str_of(&variables["where"]["id"]).to_string();
        let data = variables["data"].clone();
        let service = self.service_mut(&id)?;
        service["global_default_action"] = data["global_default_action"].clone();
        service["global_whitelist"] = data["global_whitelist"].clone();
        Ok(json!({"updateEverouteCluster": {"id": id}}))
    }

    fn delete(&mut self, variables: &Value) -> Result<Value> {
        let id = str_of(&variables["where"]["id"]).to_string();
        self.service_mut(&id)?;
        self.services.retain(|s| s["id"] != id.as_str());
        Ok(json!({"deleteEverouteCluster": {"id": id}}))
    }

    fn owned_by(&self, list: &[Value], cluster: Option<&str>) -> Vec<Value> {
        list.iter()
            .filter(|v| cluster.is_none_or(|c| v["cluster"] == c))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CloudtowerApi for FakeCloudtower {
    async fn graphql(&self, request: &GraphqlRequest) -> Result<GraphqlResponse> {
        let variables = &request.variables;
        self.with_state(|s| match request.operation_name {
            "everouteClusters" | "everouteClusterNames" | "getEverouteClusters" => {
                Ok(GraphqlResponse {
                    data: json!({"everouteClusters": s.find_services(&variables["where"])}),
                    task_id: None,
                })
            }
            mutation => {
                if let Some(pos) = s.fail_once.iter().position(|name| name == mutation) {
                    s.fail_once.remove(pos);
                    return Err(CloudtowerError::Graphql(vec![format!(
                        "{mutation} rejected"
                    )]));
                }
                let data = match mutation {
                    "deployEverouteCluster" => s.deploy(variables),
                    "updateEverouteClusterAssociation" => s.associate(variables)?,
                    "updateEverouteClusterGlobalAction" => s.update_global(variables)?,
                    "deleteEverouteCluster" => s.delete(variables)?,
                    other => {
                        return Err(CloudtowerError::Graphql(vec![format!(
                            "unknown operation {other}"
                        )]));
                    }
                };
                s.mutations.push((mutation.to_string(), variables.clone()));
                Ok(GraphqlResponse {
                    data,
                    task_id: Some(s.task()),
                })
            }
        })
    }

    async fn rest(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let filter = &body["where"];
        self.with_state(|s| {
            s.rest_calls.push(endpoint.to_string());
            let result: Vec<Value> = match endpoint {
                "get-everoute-packages" => s
                    .packages
                    .iter()
                    .filter(|p| filter.get("id").is_none_or(|id| p["id"] == *id))
                    .filter(|p| filter.get("arch").is_none_or(|a| p["arch"] == *a))
                    .filter(|p| filter.get("version").is_none_or(|v| p["version"] == *v))
                    .cloned()
                    .collect(),
                "get-clusters" => {
                    let id_in = filter.get("id_in").map(ids_of_strings);
                    s.clusters
                        .iter()
                        .filter(|c| filter.get("id").is_none_or(|id| c["id"] == *id))
                        .filter(|c| {
                            id_in
                                .as_ref()
                                .is_none_or(|ids| ids.iter().any(|id| c["id"] == id.as_str()))
                        })
                        .cloned()
                        .collect()
                }
                "get-vdses" => {
                    let id_in = filter.get("id_in").map(ids_of_strings);
                    s.owned_by(&s.vdses, filter["cluster"]["id"].as_str())
                        .into_iter()
                        .filter(|v| {
                            id_in
                                .as_ref()
                                .is_none_or(|ids| ids.iter().any(|id| v["id"] == id.as_str()))
                        })
                        .collect()
                }
                "get-vlans" => {
                    let cluster = filter["vds"]["cluster"]["id"].as_str();
                    s.owned_by(&s.vlans, cluster)
                }
                "get-tasks" => {
                    let (status, message) = match &s.fail_tasks {
                        Some(message) => ("FAILED", Value::from(message.clone())),
                        None => ("SUCCESSED", Value::Null),
                    };
                    vec![json!({"id": filter["id"], "status": status, "error_message": message})]
                }
                other => {
                    return Err(CloudtowerError::Status {
                        status: 404,
                        body: format!("no endpoint {other}"),
                    });
                }
            };
            Ok(Value::Array(result))
        })
    }
}

fn ids_of_strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .map(|v| str_of(v).to_string())
        .collect()
}

/// Registry over the fake, polling tasks without delay
#[allow(dead_code)]
pub fn registry(fake: &Arc<FakeCloudtower>) -> Registry {
    let tower =
        Cloudtower::new(fake.clone() as Arc<dyn CloudtowerApi>).with_poll_interval(Duration::from_millis(1));
    EverouteProvider::new("test").registry(tower)
}

/// A valid `everoute_service` configuration
#[allow(dead_code)]
pub fn service_config(name: &str) -> Value {
    json!({
        "name": name,
        "package_id": "pkg-1",
        "controller_configuration": {
            "cluster_id": "c-ctl",
            "subnet_mask": "255.255.255.0",
            "gateway": "10.0.0.1",
            "instance": [
                {"vlan_id": "vlan-1", "ip_addr": "10.0.0.11"},
                {"vlan_id": "vlan-1", "ip_addr": "10.0.0.12"},
                {"vlan_id": "vlan-1", "ip_addr": "10.0.0.13"}
            ]
        },
        "associated_cluster": [
            {"id": "c1", "vdses": [{"id": "v1"}]}
        ]
    })
}

//! Typed Cloudtower calls on top of a [`CloudtowerApi`]

use crate::api::{
    AssociationInput, Cluster, ClusterWhere, DeployInput, EveroutePackage, EverouteCluster,
    EverouteClusterWhere, GlobalPolicyInput, PackageWhere, Task, TaskStatus, TaskWhere, Vds,
    VdsWhere, Vlan, VlanWhere,
};
use crate::client::{CloudtowerApi, GraphqlRequest};
use crate::error::{CloudtowerError, Result};
use crate::graphql::{self, Document};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Result of a mutation that may have started a backend task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mutation {
    pub id: Option<String>,
    pub task_id: Option<String>,
}

/// Typed Cloudtower client
#[derive(Clone)]
pub struct Cloudtower {
    api: Arc<dyn CloudtowerApi>,
    poll_interval: Duration,
}

impl Cloudtower {
    pub fn new(api: Arc<dyn CloudtowerApi>) -> Self {
        Self {
            api,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn query<T: DeserializeOwned>(
        &self,
        document: Document,
        filter: &impl Serialize,
    ) -> Result<T> {
        let request = GraphqlRequest::new(document, json!({ "where": filter }));
        let response = self.api.graphql(&request).await?;
        field(response.data, "everouteClusters")
    }

    async fn mutate(&self, document: Document, variables: Value, root: &str) -> Result<Mutation> {
        tracing::info!("Mutation {}", document.operation_name);
        let request = GraphqlRequest::new(document, variables);
        let response = self.api.graphql(&request).await?;
        let id = response
            .data
            .get(root)
            .and_then(|v| v.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Mutation {
            id,
            task_id: response.task_id,
        })
    }

    async fn rest<T: DeserializeOwned>(&self, endpoint: &str, filter: &impl Serialize) -> Result<Vec<T>> {
        let body = json!({ "where": filter });
        let value = self.api.rest(endpoint, &body).await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(value)?)
    }

    // --- everoute clusters (GraphQL) -------------------------------------

    /// Full service records matching the filter
    pub async fn everoute_clusters(
        &self,
        filter: &EverouteClusterWhere,
    ) -> Result<Vec<EverouteCluster>> {
        self.query(graphql::EVEROUTE_CLUSTERS, filter).await
    }

    pub async fn everoute_cluster(&self, id: &str) -> Result<Option<EverouteCluster>> {
        let mut clusters = self
            .everoute_clusters(&EverouteClusterWhere::id(id))
            .await?;
        Ok(if clusters.is_empty() {
            None
        } else {
            Some(clusters.swap_remove(0))
        })
    }

    /// Whether any service already uses `name`
    pub async fn everoute_cluster_name_taken(&self, name: &str) -> Result<bool> {
        let clusters: Vec<Value> = self
            .query(
                graphql::EVEROUTE_CLUSTER_NAMES,
                &EverouteClusterWhere::name(name),
            )
            .await?;
        Ok(!clusters.is_empty())
    }

    /// Service record including the full global whitelist
    pub async fn global_whitelist(
        &self,
        filter: &EverouteClusterWhere,
    ) -> Result<Option<EverouteCluster>> {
        let clusters: Vec<EverouteCluster> =
            self.query(graphql::GLOBAL_WHITELIST, filter).await?;
        Ok(clusters.into_iter().next())
    }

    pub async fn deploy_everoute_cluster(&self, input: &DeployInput) -> Result<Mutation> {
        let mutation = self
            .mutate(
                graphql::DEPLOY_EVEROUTE_CLUSTER,
                serde_json::to_value(input)?,
                "createEverouteCluster",
            )
            .await?;
        if mutation.id.is_none() {
            return Err(CloudtowerError::UnexpectedResponse(
                "createEverouteCluster returned no id".to_string(),
            ));
        }
        Ok(mutation)
    }

    pub async fn update_association(
        &self,
        id: &str,
        input: &AssociationInput,
    ) -> Result<Mutation> {
        self.mutate(
            graphql::UPDATE_ASSOCIATION,
            json!({ "where": { "id": id }, "data": input }),
            "updateEverouteCluster",
        )
        .await
    }

    pub async fn update_global_policy(
        &self,
        id: &str,
        input: &GlobalPolicyInput,
    ) -> Result<Mutation> {
        self.mutate(
            graphql::UPDATE_GLOBAL_ACTION,
            json!({ "where": { "id": id }, "data": input }),
            "updateEverouteCluster",
        )
        .await
    }

    pub async fn delete_everoute_cluster(&self, id: &str) -> Result<Mutation> {
        self.mutate(
            graphql::DELETE_EVEROUTE_CLUSTER,
            json!({ "where": { "id": id } }),
            "deleteEverouteCluster",
        )
        .await
    }

    // --- inventory (REST) -------------------------------------------------

    pub async fn everoute_packages(&self, filter: &PackageWhere) -> Result<Vec<EveroutePackage>> {
        self.rest("get-everoute-packages", filter).await
    }

    pub async fn clusters(&self, filter: &ClusterWhere) -> Result<Vec<Cluster>> {
        self.rest("get-clusters", filter).await
    }

    pub async fn vdses(&self, filter: &VdsWhere) -> Result<Vec<Vds>> {
        self.rest("get-vdses", filter).await
    }

    pub async fn vlans(&self, filter: &VlanWhere) -> Result<Vec<Vlan>> {
        self.rest("get-vlans", filter).await
    }

    pub async fn tasks(&self, filter: &TaskWhere) -> Result<Vec<Task>> {
        self.rest("get-tasks", filter).await
    }

    /// Block until the task reaches a terminal status or `timeout` elapses
    ///
    /// A mutation that started no task has nothing to wait for.
    pub async fn wait_task(&self, task_id: Option<&str>, timeout: Duration) -> Result<()> {
        let Some(id) = task_id.filter(|id| !id.is_empty()) else {
            tracing::debug!("No task id, nothing to wait for");
            return Ok(());
        };

        let deadline = Instant::now() + timeout;
        let filter = TaskWhere { id: id.to_string() };
        loop {
            let task = self.tasks(&filter).await?.into_iter().next();
            match task {
                Some(Task {
                    status: TaskStatus::Successed,
                    ..
                }) => {
                    tracing::debug!("Task {} succeeded", id);
                    return Ok(());
                }
                Some(Task {
                    status: TaskStatus::Failed,
                    error_message,
                    ..
                }) => {
                    let message = error_message.unwrap_or_else(|| "unknown error".to_string());
                    tracing::warn!("Task {} failed: {}", id, message);
                    return Err(CloudtowerError::TaskFailed {
                        id: id.to_string(),
                        message,
                    });
                }
                Some(task) => tracing::debug!("Task {} is {:?}", id, task.status),
                None => tracing::debug!("Task {} not visible yet", id),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(CloudtowerError::TaskTimeout {
                    id: id.to_string(),
                    timeout,
                });
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

/// Decode `data[name]`, treating a missing or null field as an empty list
fn field<T: DeserializeOwned>(data: Value, name: &str) -> Result<T> {
    let value = match data {
        Value::Object(mut map) => map.remove(name).unwrap_or(Value::Null),
        _ => Value::Null,
    };
    let value = if value.is_null() { json!([]) } else { value };
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GraphqlResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers get-tasks with a scripted sequence of statuses
    struct ScriptedTasks {
        statuses: Mutex<Vec<&'static str>>,
        polls: Mutex<usize>,
    }

    impl ScriptedTasks {
        fn new(statuses: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                statuses: Mutex::new(statuses.iter().rev().copied().collect()),
                polls: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl CloudtowerApi for ScriptedTasks {
        async fn graphql(&self, _request: &GraphqlRequest) -> Result<GraphqlResponse> {
            Ok(GraphqlResponse {
                data: json!({ "everouteClusters": null }),
                task_id: None,
            })
        }

        async fn rest(&self, endpoint: &str, body: &Value) -> Result<Value> {
            assert_eq!(endpoint, "get-tasks");
            *self.polls.lock().unwrap() += 1;
            let mut statuses = self.statuses.lock().unwrap();
            let status = if statuses.len() > 1 {
                statuses.pop().unwrap()
            } else {
                statuses[0]
            };
            Ok(json!([{
                "id": body["where"]["id"],
                "status": status,
                "error_message": "disk full",
            }]))
        }
    }

    fn tower(api: Arc<ScriptedTasks>) -> Cloudtower {
        Cloudtower::new(api).with_poll_interval(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_wait_task_polls_until_success() {
        let api = ScriptedTasks::new(&["PENDING", "EXECUTING", "SUCCESSED"]);
        tower(api.clone())
            .wait_task(Some("t-1"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(*api.polls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_wait_task_surfaces_failure() {
        let api = ScriptedTasks::new(&["EXECUTING", "FAILED"]);
        let err = tower(api)
            .wait_task(Some("t-1"), Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            CloudtowerError::TaskFailed { id, message } => {
                assert_eq!(id, "t-1");
                assert_eq!(message, "disk full");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_wait_task_times_out() {
        let api = ScriptedTasks::new(&["EXECUTING"]);
        let err = tower(api)
            .wait_task(Some("t-1"), Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudtowerError::TaskTimeout { .. }));
    }

    #[tokio::test]
    async fn test_wait_without_task_id_returns_immediately() {
        let api = ScriptedTasks::new(&["EXECUTING"]);
        let tower = tower(api.clone());
        tower.wait_task(None, Duration::from_secs(5)).await.unwrap();
        tower.wait_task(Some(""), Duration::from_secs(5)).await.unwrap();
        assert_eq!(*api.polls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_null_result_is_empty_list() {
        let api = ScriptedTasks::new(&["SUCCESSED"]);
        let clusters = tower(api)
            .everoute_clusters(&EverouteClusterWhere::name("x"))
            .await
            .unwrap();
        assert!(clusters.is_empty());
    }
}

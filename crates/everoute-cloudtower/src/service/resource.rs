//! `everoute_service` resource

use super::mapper;
use super::model::{AssociatedCluster, ServiceModel};
use super::reconcile::ReconciliationPlan;
use crate::api::{ClusterWhere, EverouteCluster, PackageWhere, VdsWhere, VlanWhere};
use crate::cloudtower::{Cloudtower, Mutation};
use crate::error::CloudtowerError;
use crate::validate;
use async_trait::async_trait;
use everoute_provider::{Diagnostic, Diagnostics, Operation, Resource, Response};
use std::collections::HashSet;
use std::time::Duration;

/// How long a service mutation may keep its task running
pub const SERVICE_TASK_TIMEOUT: Duration = Duration::from_secs(10);

const CREATE_FAILED: &str = "Create everoute service failed";
const READ_FAILED: &str = "Failed to read everoute service";
const UPDATE_FAILED: &str = "Update everoute service failed";
const DELETE_FAILED: &str = "Delete everoute service failed";

fn remote_error(summary: &str, action: &str, err: &CloudtowerError) -> Diagnostic {
    Diagnostic::error(summary, format!("Unable to {action}, got error: {err}"))
}

/// Everoute cluster lifecycle
pub struct ServiceResource {
    tower: Cloudtower,
}

impl ServiceResource {
    pub fn new(tower: Cloudtower) -> Self {
        Self { tower }
    }

    /// Run a mutation and wait for the task it started
    async fn apply(
        &self,
        summary: &str,
        action: &str,
        mutation: impl Future<Output = crate::Result<Mutation>>,
    ) -> Result<Mutation, Diagnostic> {
        let mutation = mutation
            .await
            .map_err(|e| remote_error(summary, action, &e))?;
        self.tower
            .wait_task(mutation.task_id.as_deref(), SERVICE_TASK_TIMEOUT)
            .await
            .map_err(|e| {
                Diagnostic::error(
                    summary,
                    format!("Task not complete successfully, got error: {e}"),
                )
            })?;
        Ok(mutation)
    }

    /// Checks against Cloudtower inventory before anything is deployed.
    /// Fills cluster and vds names into the plan and returns the package version.
    async fn precheck(&self, plan: &mut ServiceModel) -> Result<String, Diagnostics> {
        let mut diags = Diagnostics::new();

        match self.tower.everoute_cluster_name_taken(&plan.name).await {
            Ok(true) => diags.add_attribute_error(
                "name",
                CREATE_FAILED,
                "Same name everoute service already exists",
            ),
            Ok(false) => {}
            Err(e) => diags.push(remote_error(CREATE_FAILED, "check service name", &e)),
        }

        let mut version = String::new();
        let package_id = plan.package_id.clone().unwrap_or_default();
        if package_id.is_empty() {
            diags.add_attribute_error("package_id", CREATE_FAILED, "package id is required");
        } else {
            let filter = PackageWhere {
                id: Some(package_id.clone()),
                ..Default::default()
            };
            match self.tower.everoute_packages(&filter).await {
                Ok(packages) => match packages.into_iter().next() {
                    Some(package) => version = package.version,
                    None => diags.add_attribute_error(
                        "package_id",
                        CREATE_FAILED,
                        format!("Package id {package_id} not exist"),
                    ),
                },
                Err(e) => diags.push(remote_error(CREATE_FAILED, "check package id", &e)),
            }
        }

        diags.append(self.check_controller_cluster(plan).await);
        diags.append(self.check_associated_clusters(&mut plan.associated_cluster).await);

        if diags.has_error() {
            Err(diags)
        } else {
            Ok(version)
        }
    }

    /// The controller cluster exists and owns every instance VLAN
    async fn check_controller_cluster(&self, plan: &ServiceModel) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let controller = &plan.controller_configuration;

        let cluster = match self
            .tower
            .clusters(&ClusterWhere::id(controller.cluster_id.clone()))
            .await
        {
            Ok(clusters) => clusters.into_iter().next(),
            Err(e) => {
                diags.push(remote_error(CREATE_FAILED, "check cluster id", &e));
                return diags;
            }
        };
        let Some(cluster) = cluster else {
            diags.add_attribute_error(
                "controller_configuration.cluster_id",
                CREATE_FAILED,
                format!("Cluster id {} not exist", controller.cluster_id),
            );
            return diags;
        };

        let vlans = match self.tower.vlans(&VlanWhere::in_cluster(cluster.id.clone())).await {
            Ok(vlans) => vlans,
            Err(e) => {
                diags.push(remote_error(CREATE_FAILED, "check vlan", &e));
                return diags;
            }
        };
        let vlan_ids: HashSet<&str> = vlans.iter().map(|v| v.id.as_str()).collect();
        for (idx, instance) in controller.instance.iter().enumerate() {
            if !vlan_ids.contains(instance.vlan_id.as_str()) {
                diags.add_attribute_error(
                    format!("controller_configuration.instance[{idx}].vlan_id"),
                    CREATE_FAILED,
                    format!(
                        "Vlan id {} not exist or not belongs to cluster {}",
                        instance.vlan_id, cluster.id
                    ),
                );
            }
        }
        diags
    }

    /// Every associated cluster and vds exists; names are copied into the plan
    async fn check_associated_clusters(&self, clusters: &mut [AssociatedCluster]) -> Diagnostics {
        let mut diags = Diagnostics::new();
        if clusters.is_empty() {
            return diags;
        }

        let ids: Vec<String> = clusters.iter().map(|c| c.id.clone()).collect();
        let found = match self.tower.clusters(&ClusterWhere::id_in(ids.clone())).await {
            Ok(found) => found,
            Err(e) => {
                diags.push(remote_error(CREATE_FAILED, "check associated cluster id", &e));
                return diags;
            }
        };

        let missing: Vec<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| !found.iter().any(|c| c.id == *id))
            .collect();
        if !missing.is_empty() {
            diags.add_attribute_error(
                "associated_cluster",
                CREATE_FAILED,
                format!("Some of associated clusters not exist: {missing:?}"),
            );
        }

        for cluster in clusters.iter_mut() {
            let Some(remote) = found.iter().find(|c| c.id == cluster.id) else {
                continue;
            };
            cluster.name = Some(remote.name.clone());
            if cluster.vdses.is_empty() {
                continue;
            }

            let vds_ids: Vec<String> = cluster.vdses.iter().map(|v| v.id.clone()).collect();
            let filter = VdsWhere {
                id_in: Some(vds_ids),
                cluster: Some(ClusterWhere::id(cluster.id.clone())),
            };
            let vdses = match self.tower.vdses(&filter).await {
                Ok(vdses) => vdses,
                Err(e) => {
                    diags.push(remote_error(CREATE_FAILED, "check vds", &e));
                    continue;
                }
            };

            let mut missing = Vec::new();
            for vds in cluster.vdses.iter_mut() {
                match vdses.iter().find(|v| v.id == vds.id) {
                    Some(remote) => vds.name = Some(remote.name.clone()),
                    None => missing.push(vds.id.clone()),
                }
            }
            if !missing.is_empty() {
                diags.add_attribute_error(
                    "associated_cluster",
                    CREATE_FAILED,
                    format!(
                        "Some of associated vds not exist in cluster {}: {missing:?}",
                        cluster.id
                    ),
                );
            }
        }
        diags
    }

    async fn fetch(&self, id: &str) -> Result<EverouteCluster, Diagnostic> {
        match self.tower.everoute_cluster(id).await {
            Ok(Some(remote)) => Ok(remote),
            Ok(None) => Err(Diagnostic::error(
                READ_FAILED,
                format!("Cannot find everoute service {id}"),
            )),
            Err(e) => Err(remote_error(READ_FAILED, "read everoute service", &e)),
        }
    }

    /// Package matching the controller cluster architecture and service
    /// version, or `""` when none does (the package may have been deleted)
    async fn recover_package_id(&self, remote: &EverouteCluster) -> Result<String, Diagnostic> {
        let cluster_id = remote
            .controller_template
            .as_ref()
            .map(|t| t.cluster.clone())
            .unwrap_or_default();
        let cluster = self
            .tower
            .clusters(&ClusterWhere::id(cluster_id))
            .await
            .map_err(|e| remote_error(READ_FAILED, "check cluster architecture", &e))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                Diagnostic::error(
                    READ_FAILED,
                    "Unable to check cluster architecture, got error: Cannot find cluster",
                )
            })?;

        let filter = PackageWhere {
            arch: cluster.architecture,
            version: remote.version.clone(),
            ..Default::default()
        };
        let packages = self
            .tower
            .everoute_packages(&filter)
            .await
            .map_err(|e| remote_error(READ_FAILED, "check everoute package", &e))?;
        Ok(packages.into_iter().next().map(|p| p.id).unwrap_or_default())
    }

    async fn create(&self, mut plan: ServiceModel) -> Response<ServiceModel> {
        let version = match self.precheck(&mut plan).await {
            Ok(version) => version,
            Err(diags) => return Response::failed(diags),
        };
        let package_id = plan.package_id.clone().unwrap_or_default();

        let input = mapper::deploy_input(&plan, &package_id, &version);
        let deployed = match self
            .apply(
                CREATE_FAILED,
                "deploy everoute service",
                self.tower.deploy_everoute_cluster(&input),
            )
            .await
        {
            Ok(deployed) => deployed,
            Err(diag) => return Response::failed(diag),
        };
        let Some(id) = deployed.id else {
            return Response::error(CREATE_FAILED, "deployment returned no service id");
        };
        tracing::info!("Deployed everoute service {} ({})", plan.name, id);
        plan.id = Some(id.clone());

        if !plan.associated_cluster.is_empty() {
            let input = ReconciliationPlan::compute(&plan.associated_cluster, &[]).to_input();
            if let Err(diag) = self
                .apply(
                    CREATE_FAILED,
                    "associate clusters",
                    self.tower.update_association(&id, &input),
                )
                .await
            {
                // The service exists, keep tracking it. None of the clusters
                // count as associated, so the next update connects them again.
                plan.associated_cluster.clear();
                let refreshed = self.refresh(plan.clone(), false).await;
                return Response {
                    state: refreshed.state.or(Some(plan)),
                    diagnostics: diag.into(),
                }
                .with_diagnostics(refreshed.diagnostics);
            }
        }

        self.refresh(plan, false).await
    }

    async fn refresh(&self, mut state: ServiceModel, adopt_all: bool) -> Response<ServiceModel> {
        let Some(id) = state.id.clone().filter(|id| !id.is_empty()) else {
            return Response::error(READ_FAILED, "state has no service id");
        };
        let remote = match self.fetch(&id).await {
            Ok(remote) => remote,
            Err(diag) => return Response::failed(diag),
        };

        let mut diags = mapper::apply_remote(&remote, &mut state, adopt_all);
        if state.package_id.is_none() {
            match self.recover_package_id(&remote).await {
                Ok(package_id) => state.package_id = Some(package_id),
                Err(diag) => {
                    state.package_id = Some(String::new());
                    diags.push(diag);
                }
            }
        }
        Response::ok(state).with_diagnostics(diags)
    }

    async fn update(&self, mut plan: ServiceModel, prior: ServiceModel) -> Response<ServiceModel> {
        let Some(id) = prior.id.clone().filter(|id| !id.is_empty()) else {
            return Response::error(UPDATE_FAILED, "prior state has no service id");
        };

        let reconciliation =
            ReconciliationPlan::compute(&plan.associated_cluster, &prior.associated_cluster);
        if reconciliation.is_membership_unchanged() {
            tracing::info!(
                "Service {}: cluster membership unchanged, setting {} vds",
                id,
                reconciliation.vds.len()
            );
        } else {
            tracing::info!(
                "Service {}: connect {:?}, disconnect {:?}, {} vds",
                id,
                reconciliation.connect,
                reconciliation.disconnect,
                reconciliation.vds.len()
            );
        }

        let input = reconciliation.to_input();
        if let Err(diag) = self
            .apply(
                UPDATE_FAILED,
                "update associated clusters",
                self.tower.update_association(&id, &input),
            )
            .await
        {
            return Response::failed(diag);
        }

        plan.id = Some(id);
        if plan.package_id.is_none() {
            plan.package_id = prior.package_id;
        }
        self.refresh(plan, false).await
    }

    async fn delete(&self, state: ServiceModel) -> Response<ServiceModel> {
        let Some(id) = state.id.filter(|id| !id.is_empty()) else {
            return Response::error(DELETE_FAILED, "state has no service id");
        };

        let remote = match self.tower.everoute_cluster(&id).await {
            Ok(Some(remote)) => remote,
            Ok(None) => {
                return Response::removed().with_diagnostics(
                    Diagnostic::warning(
                        "Everoute service already gone",
                        format!("everoute service {id} no longer exists"),
                    )
                    .into(),
                );
            }
            Err(e) => return Response::failed(remote_error(DELETE_FAILED, "read everoute service", &e)),
        };

        let connected: Vec<AssociatedCluster> = remote
            .agent_elf_clusters
            .iter()
            .map(|c| AssociatedCluster::new(c.id.clone(), &[]))
            .collect();
        let input = ReconciliationPlan::detach_all(&connected).to_input();
        if let Err(diag) = self
            .apply(
                DELETE_FAILED,
                "disassociate clusters",
                self.tower.update_association(&id, &input),
            )
            .await
        {
            return Response::failed(diag);
        }

        if let Err(diag) = self
            .apply(
                DELETE_FAILED,
                "delete everoute service",
                self.tower.delete_everoute_cluster(&id),
            )
            .await
        {
            return Response::failed(diag);
        }

        tracing::info!("Deleted everoute service {}", id);
        Response::removed()
    }
}

#[async_trait]
impl Resource for ServiceResource {
    type Model = ServiceModel;

    fn type_suffix(&self) -> &'static str {
        "service"
    }

    fn description(&self) -> &'static str {
        "Everoute service deployed by Cloudtower"
    }

    fn validate(&self, config: &ServiceModel) -> Diagnostics {
        validate::service(config)
    }

    async fn handle(&self, operation: Operation<ServiceModel>) -> Response<ServiceModel> {
        match operation {
            Operation::Create { plan } => self.create(plan).await,
            Operation::Read { state } => self.refresh(state, false).await,
            Operation::Update { plan, prior } => self.update(plan, prior).await,
            Operation::Delete { state } => self.delete(state).await,
            Operation::Import { id } => {
                let state = ServiceModel {
                    id: Some(id),
                    ..Default::default()
                };
                self.refresh(state, true).await
            }
        }
    }
}

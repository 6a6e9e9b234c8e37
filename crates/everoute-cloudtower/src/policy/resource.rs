//! `everoute_global_security_policy` resource
//!
//! The policy is not a remote object of its own: it is the global
//! whitelist and default action of a service, so its id is the service id.

use super::mapper;
use super::model::GlobalSecurityPolicyModel;
use crate::api::{EverouteClusterWhere, GlobalPolicyInput};
use crate::cloudtower::Cloudtower;
use crate::validate;
use async_trait::async_trait;
use everoute_provider::{Diagnostic, Diagnostics, Operation, Resource, Response};
use std::time::Duration;

/// How long a policy mutation may keep its task running
pub const POLICY_TASK_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_FAILED: &str = "Create global security policy failed";
const READ_FAILED: &str = "Failed to read global security policy";
const UPDATE_FAILED: &str = "Update global security policy failed";
const DELETE_FAILED: &str = "Delete global security policy failed";

pub struct GlobalSecurityPolicyResource {
    tower: Cloudtower,
}

impl GlobalSecurityPolicyResource {
    pub fn new(tower: Cloudtower) -> Self {
        Self { tower }
    }

    async fn push(
        &self,
        summary: &str,
        service_id: &str,
        input: &GlobalPolicyInput,
    ) -> Result<(), Diagnostic> {
        let mutation = self
            .tower
            .update_global_policy(service_id, input)
            .await
            .map_err(|e| {
                Diagnostic::error(
                    summary,
                    format!("Unable to update global security policy, got error: {e}"),
                )
            })?;
        self.tower
            .wait_task(mutation.task_id.as_deref(), POLICY_TASK_TIMEOUT)
            .await
            .map_err(|e| {
                Diagnostic::error(
                    summary,
                    format!("Task not complete successfully, got error: {e}"),
                )
            })
    }

    async fn refresh(&self, mut state: GlobalSecurityPolicyModel) -> Response<GlobalSecurityPolicyModel> {
        let service_id = state
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| state.service_id.clone());
        if service_id.is_empty() {
            return Response::error(READ_FAILED, "state has no service id");
        }

        let remote = match self
            .tower
            .global_whitelist(&EverouteClusterWhere::id(service_id.clone()))
            .await
        {
            Ok(Some(remote)) => remote,
            Ok(None) => {
                return Response::error(
                    READ_FAILED,
                    format!("Cannot find everoute service {service_id}"),
                );
            }
            Err(e) => {
                return Response::error(
                    READ_FAILED,
                    format!("Unable to read global security policy, got error: {e}"),
                );
            }
        };

        mapper::apply_remote(&remote, &mut state);
        Response::ok(state)
    }

    async fn create(&self, plan: GlobalSecurityPolicyModel) -> Response<GlobalSecurityPolicyModel> {
        match self.tower.everoute_cluster(&plan.service_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Response::failed(
                    Diagnostic::error(
                        CREATE_FAILED,
                        format!("Cannot find everoute service {}", plan.service_id),
                    )
                    .at("service_id"),
                );
            }
            Err(e) => {
                return Response::error(
                    CREATE_FAILED,
                    format!("Unable to check everoute service, got error: {e}"),
                );
            }
        }

        let service_id = plan.service_id.clone();
        let input = match mapper::update_input(&plan) {
            Ok(input) => input,
            Err(e) => {
                return Response::failed(Diagnostic::error(CREATE_FAILED, e).at("default_action"));
            }
        };
        if let Err(diag) = self.push(CREATE_FAILED, &service_id, &input).await {
            return Response::failed(diag);
        }
        tracing::info!("Applied global security policy to service {}", service_id);

        self.refresh(GlobalSecurityPolicyModel {
            id: Some(service_id),
            ..plan
        })
        .await
    }

    async fn update(
        &self,
        plan: GlobalSecurityPolicyModel,
        prior: GlobalSecurityPolicyModel,
    ) -> Response<GlobalSecurityPolicyModel> {
        let service_id = prior
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or(prior.service_id);
        let input = match mapper::update_input(&plan) {
            Ok(input) => input,
            Err(e) => {
                return Response::failed(Diagnostic::error(UPDATE_FAILED, e).at("default_action"));
            }
        };
        if let Err(diag) = self.push(UPDATE_FAILED, &service_id, &input).await {
            return Response::failed(diag);
        }
        self.refresh(GlobalSecurityPolicyModel {
            id: Some(service_id),
            ..plan
        })
        .await
    }

    async fn delete(&self, state: GlobalSecurityPolicyModel) -> Response<GlobalSecurityPolicyModel> {
        let service_id = state
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or(state.service_id);
        if let Err(diag) = self
            .push(DELETE_FAILED, &service_id, &mapper::reset_input())
            .await
        {
            return Response::failed(diag);
        }
        tracing::info!("Reset global security policy of service {}", service_id);
        Response::removed()
    }
}

#[async_trait]
impl Resource for GlobalSecurityPolicyResource {
    type Model = GlobalSecurityPolicyModel;

    fn type_suffix(&self) -> &'static str {
        "global_security_policy"
    }

    fn description(&self) -> &'static str {
        "Global whitelist and default action of an everoute service"
    }

    fn validate(&self, config: &GlobalSecurityPolicyModel) -> Diagnostics {
        validate::global_security_policy(config)
    }

    async fn handle(
        &self,
        operation: Operation<GlobalSecurityPolicyModel>,
    ) -> Response<GlobalSecurityPolicyModel> {
        match operation {
            Operation::Create { plan } => self.create(plan).await,
            Operation::Read { state } => self.refresh(state).await,
            Operation::Update { plan, prior } => self.update(plan, prior).await,
            Operation::Delete { state } => self.delete(state).await,
            Operation::Import { id } => {
                self.refresh(GlobalSecurityPolicyModel {
                    id: Some(id.clone()),
                    service_id: id,
                    ..Default::default()
                })
                .await
            }
        }
    }
}

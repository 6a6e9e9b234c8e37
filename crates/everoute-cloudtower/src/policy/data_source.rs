//! `everoute_global_security_policy` data source

use super::mapper::policy_view;
use super::model::PolicyQuery;
use crate::api::EverouteClusterWhere;
use crate::cloudtower::Cloudtower;
use crate::convert::timestamp_id;
use async_trait::async_trait;
use everoute_provider::{DataSource, Diagnostics, Response};

const READ_FAILED: &str = "Failed to read global security policy";

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}

/// Global whitelist of a service, looked up by id or name
pub struct GlobalSecurityPolicyDataSource {
    tower: Cloudtower,
}

impl GlobalSecurityPolicyDataSource {
    pub fn new(tower: Cloudtower) -> Self {
        Self { tower }
    }
}

#[async_trait]
impl DataSource for GlobalSecurityPolicyDataSource {
    type Model = PolicyQuery;

    fn type_suffix(&self) -> &'static str {
        "global_security_policy"
    }

    fn description(&self) -> &'static str {
        "Global security policy of an everoute service"
    }

    fn validate(&self, config: &PolicyQuery) -> Diagnostics {
        let mut diags = Diagnostics::new();
        if non_empty(&config.service_id).is_none() && non_empty(&config.service_name).is_none() {
            diags.add_error(
                "Missing service",
                "one of service_id or service_name is required",
            );
        }
        diags
    }

    async fn read(&self, mut config: PolicyQuery) -> Response<PolicyQuery> {
        let filter = EverouteClusterWhere {
            id: non_empty(&config.service_id),
            name: non_empty(&config.service_name),
        };
        let remote = match self.tower.global_whitelist(&filter).await {
            Ok(Some(remote)) => remote,
            Ok(None) => {
                return Response::error(
                    READ_FAILED,
                    "Cannot find everoute service with the given id or name",
                );
            }
            Err(e) => {
                return Response::error(
                    READ_FAILED,
                    format!("Unable to read global security policy, got error: {e}"),
                );
            }
        };

        config.service_id = Some(remote.id.clone());
        config.service_name = Some(remote.name.clone());
        config.global_security_policy = Some(policy_view(&remote));
        config.id = Some(timestamp_id());
        Response::ok(config)
    }
}

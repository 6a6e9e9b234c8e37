//! `everoute_service` data source

use super::mapper::service_view;
use super::model::ServiceQuery;
use crate::api::EverouteClusterWhere;
use crate::cloudtower::Cloudtower;
use crate::convert::timestamp_id;
use async_trait::async_trait;
use everoute_provider::{DataSource, Diagnostics, Response};

const READ_FAILED: &str = "Failed to read everoute service";

/// Looks services up by name
pub struct ServiceDataSource {
    tower: Cloudtower,
}

impl ServiceDataSource {
    pub fn new(tower: Cloudtower) -> Self {
        Self { tower }
    }
}

#[async_trait]
impl DataSource for ServiceDataSource {
    type Model = ServiceQuery;

    fn type_suffix(&self) -> &'static str {
        "service"
    }

    fn description(&self) -> &'static str {
        "Everoute services with the given name"
    }

    fn validate(&self, config: &ServiceQuery) -> Diagnostics {
        let mut diags = Diagnostics::new();
        if config.name.trim().is_empty() {
            diags.add_attribute_error("name", "Missing name", "service name must not be empty");
        }
        diags
    }

    async fn read(&self, mut config: ServiceQuery) -> Response<ServiceQuery> {
        let filter = EverouteClusterWhere::name(config.name.clone());
        let services = match self.tower.everoute_clusters(&filter).await {
            Ok(services) => services,
            Err(e) => {
                return Response::error(
                    READ_FAILED,
                    format!("Unable to read everoute service, got error: {e}"),
                );
            }
        };
        if services.is_empty() {
            return Response::error(
                READ_FAILED,
                format!("Cannot find everoute service named {}", config.name),
            );
        }

        config.services = services.iter().map(service_view).collect();
        config.id = Some(timestamp_id());
        Response::ok(config)
    }
}

//! Provider entry point: settings → client → registry

use crate::client::{CloudtowerApi, GraphqlRequest, GraphqlResponse, HttpCloudtower};
use crate::cloudtower::Cloudtower;
use crate::error::{CloudtowerError, Result};
use crate::package::PackageDataSource;
use crate::policy::{GlobalSecurityPolicyDataSource, GlobalSecurityPolicyResource};
use crate::service::{ServiceDataSource, ServiceResource};
use async_trait::async_trait;
use everoute_config::ProviderSettings;
use everoute_provider::{Diagnostic, Diagnostics, Registry};
use serde_json::Value;
use std::sync::Arc;

/// Prefix of every resource and data source type name
pub const PROVIDER_TYPE: &str = "everoute";

#[derive(Debug, Clone)]
pub struct EverouteProvider {
    version: String,
}

impl EverouteProvider {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Resolve settings and connect, logging in unless a token is configured
    pub async fn connect(&self, settings: &ProviderSettings) -> Result<Cloudtower> {
        let config = everoute_config::resolve(settings)?;
        tracing::debug!("Connecting to {}", config.base_url());
        let api = HttpCloudtower::connect(&config).await?;
        Ok(Cloudtower::new(Arc::new(api)))
    }

    /// Configure the provider and return every handler bound to the client
    pub async fn configure(
        &self,
        settings: &ProviderSettings,
    ) -> std::result::Result<Registry, Diagnostics> {
        match self.connect(settings).await {
            Ok(tower) => Ok(self.registry(tower)),
            Err(CloudtowerError::Config(e)) => Err(Diagnostic::error(
                "Invalid provider configuration",
                e.to_string(),
            )
            .into()),
            Err(e) => Err(Diagnostic::error(
                "Unable to create everoute client",
                format!("An unexpected error occurred when creating the everoute client: {e}"),
            )
            .into()),
        }
    }

    /// Registry for discovery and config validation. Any remote call fails.
    pub fn detached_registry(&self) -> Registry {
        self.registry(Cloudtower::new(Arc::new(Detached)))
    }

    /// Registry over an existing client
    pub fn registry(&self, tower: Cloudtower) -> Registry {
        let mut registry = Registry::new(PROVIDER_TYPE);
        registry
            .register_resource(ServiceResource::new(tower.clone()))
            .register_resource(GlobalSecurityPolicyResource::new(tower.clone()))
            .register_data_source(PackageDataSource::new(tower.clone()))
            .register_data_source(ServiceDataSource::new(tower.clone()))
            .register_data_source(GlobalSecurityPolicyDataSource::new(tower));
        registry
    }
}

/// Stand-in API for a provider that has not been configured
struct Detached;

#[async_trait]
impl CloudtowerApi for Detached {
    async fn graphql(&self, request: &GraphqlRequest) -> Result<GraphqlResponse> {
        Err(CloudtowerError::UnexpectedResponse(format!(
            "provider is not configured, cannot run {}",
            request.operation_name
        )))
    }

    async fn rest(&self, endpoint: &str, _body: &Value) -> Result<Value> {
        Err(CloudtowerError::UnexpectedResponse(format!(
            "provider is not configured, cannot call {endpoint}"
        )))
    }
}

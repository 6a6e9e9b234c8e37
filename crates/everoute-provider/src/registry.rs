//! Type name → handler routing

use crate::diagnostic::Diagnostics;
use crate::error::{ProviderError, Result};
use crate::provider::{DynDataSource, DynResource, ResourceRequest, ResourceResponse};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Which table a type name lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Resource,
    DataSource,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Resource => write!(f, "resource"),
            Kind::DataSource => write!(f, "data source"),
        }
    }
}

/// Registered resources and data sources of one provider
pub struct Registry {
    provider_type: String,
    resources: BTreeMap<String, Arc<dyn DynResource>>,
    data_sources: BTreeMap<String, Arc<dyn DynDataSource>>,
}

impl Registry {
    pub fn new(provider_type: impl Into<String>) -> Self {
        Self {
            provider_type: provider_type.into(),
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        }
    }

    /// Full type name for a suffix, e.g. `everoute` + `service` → `everoute_service`
    pub fn type_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.provider_type, suffix)
    }

    pub fn register_resource<R>(&mut self, resource: R) -> &mut Self
    where
        R: DynResource + 'static,
    {
        let name = self.type_name(resource.type_suffix());
        tracing::debug!("Registered resource {}", name);
        self.resources.insert(name, Arc::new(resource));
        self
    }

    pub fn register_data_source<D>(&mut self, data_source: D) -> &mut Self
    where
        D: DynDataSource + 'static,
    {
        let name = self.type_name(data_source.type_suffix());
        tracing::debug!("Registered data source {}", name);
        self.data_sources.insert(name, Arc::new(data_source));
        self
    }

    pub fn resource(&self, type_name: &str) -> Result<Arc<dyn DynResource>> {
        self.resources
            .get(type_name)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    pub fn data_source(&self, type_name: &str) -> Result<Arc<dyn DynDataSource>> {
        self.data_sources
            .get(type_name)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownDataSource(type_name.to_string()))
    }

    /// `(kind, type name, description)` for every registered handler, sorted by name
    pub fn entries(&self) -> Vec<(Kind, &str, &'static str)> {
        let resources = self
            .resources
            .iter()
            .map(|(name, r)| (Kind::Resource, name.as_str(), r.description()));
        let data_sources = self
            .data_sources
            .iter()
            .map(|(name, d)| (Kind::DataSource, name.as_str(), d.description()));
        resources.chain(data_sources).collect()
    }

    pub async fn handle_resource(
        &self,
        type_name: &str,
        request: ResourceRequest,
    ) -> Result<ResourceResponse> {
        let resource = self.resource(type_name)?;
        tracing::info!(
            "{} {}",
            request
                .operation
                .map(|op| op.to_string())
                .unwrap_or_else(|| "read".to_string()),
            type_name
        );
        resource.handle_json(request).await
    }

    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: serde_json::Value,
    ) -> Result<ResourceResponse> {
        let data_source = self.data_source(type_name)?;
        tracing::info!("read data source {}", type_name);
        data_source.read_json(config).await
    }

    /// Config validation only, no remote calls
    pub fn validate(
        &self,
        kind: Kind,
        type_name: &str,
        config: serde_json::Value,
    ) -> Result<Diagnostics> {
        match kind {
            Kind::Resource => Ok(self.resource(type_name)?.validate_json(config)),
            Kind::DataSource => Ok(self.data_source(type_name)?.validate_json(config)),
        }
    }
}

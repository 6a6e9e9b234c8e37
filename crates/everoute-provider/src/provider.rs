//! Resource and data source traits
//!
//! Implementations work on their own typed model. The JSON boundary is
//! handled once by the blanket [`DynResource`] / [`DynDataSource`] impls,
//! which decode snapshots, run config validation before create/update and
//! encode the resulting state.

use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::error::{ProviderError, Result};
use crate::operation::{Operation, OperationKind, Response};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A managed object with a full Create/Read/Update/Delete/Import lifecycle
#[async_trait]
pub trait Resource: Send + Sync {
    type Model: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Appended to the provider type name, e.g. `service` → `everoute_service`
    fn type_suffix(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Structural checks on a candidate configuration. Must not touch the network.
    fn validate(&self, _config: &Self::Model) -> Diagnostics {
        Diagnostics::new()
    }

    async fn handle(&self, operation: Operation<Self::Model>) -> Response<Self::Model>;
}

/// A read-only query
#[async_trait]
pub trait DataSource: Send + Sync {
    type Model: Serialize + DeserializeOwned + Send + Sync + 'static;

    fn type_suffix(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn validate(&self, _config: &Self::Model) -> Diagnostics {
        Diagnostics::new()
    }

    async fn read(&self, config: Self::Model) -> Response<Self::Model>;
}

/// JSON request for a resource lifecycle call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRequest {
    pub operation: Option<OperationKind>,
    pub config: Option<serde_json::Value>,
    pub plan: Option<serde_json::Value>,
    pub prior_state: Option<serde_json::Value>,
    pub import_id: Option<String>,
}

/// JSON response of a lifecycle or data source call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceResponse {
    pub state: Option<serde_json::Value>,
    #[serde(default)]
    pub diagnostics: Diagnostics,
}

impl ResourceResponse {
    fn from_diagnostics(diagnostics: Diagnostics) -> Self {
        Self {
            state: None,
            diagnostics,
        }
    }
}

/// Object-safe view of a [`Resource`]
#[async_trait]
pub trait DynResource: Send + Sync {
    fn type_suffix(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn validate_json(&self, config: serde_json::Value) -> Diagnostics;

    async fn handle_json(&self, request: ResourceRequest) -> Result<ResourceResponse>;
}

/// Object-safe view of a [`DataSource`]
#[async_trait]
pub trait DynDataSource: Send + Sync {
    fn type_suffix(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn validate_json(&self, config: serde_json::Value) -> Diagnostics;

    async fn read_json(&self, config: serde_json::Value) -> Result<ResourceResponse>;
}

fn decode<M: DeserializeOwned>(
    value: serde_json::Value,
    what: &str,
) -> std::result::Result<M, Diagnostics> {
    serde_json::from_value(value).map_err(|e| {
        Diagnostic::error(
            "Invalid configuration",
            format!("unable to decode {what}: {e}"),
        )
        .into()
    })
}

fn require(
    value: Option<serde_json::Value>,
    operation: OperationKind,
    field: &'static str,
) -> Result<serde_json::Value> {
    value.ok_or_else(|| ProviderError::MissingInput {
        operation: operation.to_string(),
        field,
    })
}

fn encode<M: Serialize>(response: Response<M>) -> Result<ResourceResponse> {
    let state = response
        .state
        .map(serde_json::to_value)
        .transpose()?;
    Ok(ResourceResponse {
        state,
        diagnostics: response.diagnostics,
    })
}

#[async_trait]
impl<R> DynResource for R
where
    R: Resource,
{
    fn type_suffix(&self) -> &'static str {
        Resource::type_suffix(self)
    }

    fn description(&self) -> &'static str {
        Resource::description(self)
    }

    fn validate_json(&self, config: serde_json::Value) -> Diagnostics {
        match decode::<R::Model>(config, "configuration") {
            Ok(model) => Resource::validate(self, &model),
            Err(diags) => diags,
        }
    }

    async fn handle_json(&self, request: ResourceRequest) -> Result<ResourceResponse> {
        let kind = request.operation.unwrap_or(OperationKind::Read);

        let operation = match kind {
            OperationKind::Create | OperationKind::Update => {
                // A plan falls back to the raw configuration when the host sends none
                let plan = require(request.plan.or(request.config), kind, "plan")?;
                let plan: R::Model = match decode(plan, "plan") {
                    Ok(plan) => plan,
                    Err(diags) => return Ok(ResourceResponse::from_diagnostics(diags)),
                };
                let diags = Resource::validate(self, &plan);
                if diags.has_error() {
                    tracing::debug!(
                        "{} {}: config validation failed with {} diagnostics",
                        Resource::type_suffix(self),
                        kind,
                        diags.len()
                    );
                    return Ok(ResourceResponse::from_diagnostics(diags));
                }
                if kind == OperationKind::Create {
                    Operation::Create { plan }
                } else {
                    let prior = require(request.prior_state, kind, "prior_state")?;
                    match decode(prior, "prior state") {
                        Ok(prior) => Operation::Update { plan, prior },
                        Err(diags) => return Ok(ResourceResponse::from_diagnostics(diags)),
                    }
                }
            }
            OperationKind::Read | OperationKind::Delete => {
                let state = require(request.prior_state, kind, "prior_state")?;
                let state: R::Model = match decode(state, "prior state") {
                    Ok(state) => state,
                    Err(diags) => return Ok(ResourceResponse::from_diagnostics(diags)),
                };
                if kind == OperationKind::Read {
                    Operation::Read { state }
                } else {
                    Operation::Delete { state }
                }
            }
            OperationKind::Import => {
                let id = request
                    .import_id
                    .filter(|id| !id.is_empty())
                    .ok_or(ProviderError::MissingInput {
                        operation: kind.to_string(),
                        field: "import_id",
                    })?;
                Operation::Import { id }
            }
        };

        encode(self.handle(operation).await)
    }
}

#[async_trait]
impl<D> DynDataSource for D
where
    D: DataSource,
{
    fn type_suffix(&self) -> &'static str {
        DataSource::type_suffix(self)
    }

    fn description(&self) -> &'static str {
        DataSource::description(self)
    }

    fn validate_json(&self, config: serde_json::Value) -> Diagnostics {
        match decode::<D::Model>(config, "configuration") {
            Ok(model) => DataSource::validate(self, &model),
            Err(diags) => diags,
        }
    }

    async fn read_json(&self, config: serde_json::Value) -> Result<ResourceResponse> {
        let config: D::Model = match decode(config, "configuration") {
            Ok(config) => config,
            Err(diags) => return Ok(ResourceResponse::from_diagnostics(diags)),
        };
        let diags = DataSource::validate(self, &config);
        if diags.has_error() {
            return Ok(ResourceResponse::from_diagnostics(diags));
        }
        encode(self.read(config).await)
    }
}

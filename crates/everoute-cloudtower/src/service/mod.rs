//! Everoute service: resource, data source and the pieces they share

pub mod data_source;
pub mod mapper;
pub mod model;
pub mod reconcile;
pub mod resource;

pub use data_source::ServiceDataSource;
pub use model::{
    AssociatedCluster, AssociatedVds, ControllerConfiguration, ControllerInstance, ServiceModel,
    ServiceQuery, ServiceView,
};
pub use reconcile::ReconciliationPlan;
pub use resource::{SERVICE_TASK_TIMEOUT, ServiceResource};

//! Global security policy: resource and data source

pub mod data_source;
pub mod mapper;
pub mod model;
pub mod resource;

pub use data_source::GlobalSecurityPolicyDataSource;
pub use model::{GlobalSecurityPolicyModel, NetworkPolicyRule, PolicyQuery, PolicyView};
pub use resource::{GlobalSecurityPolicyResource, POLICY_TASK_TIMEOUT};

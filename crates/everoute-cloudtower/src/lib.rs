//! Everoute on Cloudtower
//!
//! Resources and data sources of the Everoute provider, backed by the
//! Cloudtower GraphQL and REST APIs.
//!
//! | kind        | type name                         |
//! |-------------|-----------------------------------|
//! | resource    | `everoute_service`                |
//! | resource    | `everoute_global_security_policy` |
//! | data source | `everoute_package`                |
//! | data source | `everoute_service`                |
//! | data source | `everoute_global_security_policy` |
//!
//! Remote calls go through the [`CloudtowerApi`] seam. Mutations that start
//! a backend task are followed by [`Cloudtower::wait_task`].

pub mod api;
pub mod client;
pub mod cloudtower;
pub mod convert;
pub mod error;
pub mod graphql;
pub mod package;
pub mod policy;
pub mod provider;
pub mod service;
pub mod validate;

pub use client::{CloudtowerApi, GraphqlRequest, GraphqlResponse, HttpCloudtower};
pub use cloudtower::{Cloudtower, Mutation};
pub use error::{CloudtowerError, Result};
pub use package::PackageDataSource;
pub use policy::{GlobalSecurityPolicyDataSource, GlobalSecurityPolicyResource};
pub use provider::{EverouteProvider, PROVIDER_TYPE};
pub use service::{ReconciliationPlan, ServiceDataSource, ServiceResource};

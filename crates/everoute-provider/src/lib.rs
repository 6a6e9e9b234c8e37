//! Everoute provider framework
//!
//! Lifecycle abstraction shared by every resource and data source of the
//! Everoute provider. A host (the `everoute` binary, or a plugin shim)
//! hands JSON snapshots to the [`Registry`], which routes them to a typed
//! handler through the object-safe [`DynResource`] / [`DynDataSource`]
//! views.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                      host                        │
//! │        (JSON request → JSON response)            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               everoute-provider                  │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  Registry: type name → handler           │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────────────┐    │
//! │  │  Operation   │  │  Diagnostics          │    │
//! │  └──────────────┘  └──────────────────────┘    │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼──────────────┐
//! │  everoute-cloudtower │
//! │  resources + data    │
//! │  sources             │
//! └──────────────────────┘
//! ```

pub mod diagnostic;
pub mod error;
pub mod operation;
pub mod provider;
pub mod registry;

// Re-exports
pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use error::{ProviderError, Result};
pub use operation::{Operation, OperationKind, Response};
pub use provider::{
    DataSource, DynDataSource, DynResource, Resource, ResourceRequest, ResourceResponse,
};
pub use registry::{Kind, Registry};

//! Lifecycle operation types

use crate::diagnostic::{Diagnostic, Diagnostics};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tag of a lifecycle operation, as it travels over the JSON boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Create => write!(f, "create"),
            OperationKind::Read => write!(f, "read"),
            OperationKind::Update => write!(f, "update"),
            OperationKind::Delete => write!(f, "delete"),
            OperationKind::Import => write!(f, "import"),
        }
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(OperationKind::Create),
            "read" => Ok(OperationKind::Read),
            "update" => Ok(OperationKind::Update),
            "delete" => Ok(OperationKind::Delete),
            "import" => Ok(OperationKind::Import),
            other => Err(format!("unknown operation: {other}")),
        }
    }
}

/// A lifecycle operation together with the snapshots it operates on
#[derive(Debug, Clone, PartialEq)]
pub enum Operation<M> {
    /// Create the remote object described by the plan
    Create { plan: M },
    /// Refresh the state from the remote object
    Read { state: M },
    /// Converge the remote object from `prior` to `plan`
    Update { plan: M, prior: M },
    /// Remove the remote object
    Delete { state: M },
    /// Adopt an existing remote object by id
    Import { id: String },
}

/// Result of a lifecycle call: the new snapshot (if any) plus diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct Response<M> {
    /// New state. `None` after a delete, or when the call failed before
    /// producing a state.
    pub state: Option<M>,
    pub diagnostics: Diagnostics,
}

impl<M> Response<M> {
    pub fn ok(state: M) -> Self {
        Self {
            state: Some(state),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Successful call that leaves no state behind
    pub fn removed() -> Self {
        Self {
            state: None,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn failed(diagnostics: impl Into<Diagnostics>) -> Self {
        Self {
            state: None,
            diagnostics: diagnostics.into(),
        }
    }

    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::failed(Diagnostic::error(summary, detail))
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics.append(diagnostics);
        self
    }

    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }

    pub fn map<N>(self, f: impl FnOnce(M) -> N) -> Response<N> {
        Response {
            state: self.state.map(f),
            diagnostics: self.diagnostics,
        }
    }
}

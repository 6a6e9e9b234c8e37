//! Request documents read from a file or stdin
//!
//! ```json
//! {
//!   "provider": { "cloudtower_server": "tower.local", "token": "..." },
//!   "operation": "update",
//!   "plan": { ... },
//!   "prior_state": { ... }
//! }
//! ```

use anyhow::{Context, Result};
use everoute_config::ProviderSettings;
use everoute_provider::ResourceRequest;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RequestDocument {
    /// Provider block, overridden by command line flags
    pub provider: ProviderSettings,
    #[serde(flatten)]
    pub request: ResourceRequest,
}

impl RequestDocument {
    /// Read from `path`, or stdin when no path (or `-`) is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let raw = match path {
            Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            _ => {
                let mut raw = String::new();
                std::io::stdin()
                    .read_to_string(&mut raw)
                    .context("failed to read request from stdin")?;
                raw
            }
        };
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).context("request is not a valid JSON document")
    }

    /// Configuration for data sources and validation: `config`, else `plan`
    pub fn config(&self) -> serde_json::Value {
        self.request
            .config
            .clone()
            .or_else(|| self.request.plan.clone())
            .unwrap_or_else(|| serde_json::json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use everoute_provider::OperationKind;

    #[test]
    fn test_parse_full_document() {
        let doc = RequestDocument::parse(
            r#"{
                "provider": {"cloudtower_server": "tower.local", "token": "t"},
                "operation": "import",
                "import_id": "svc-1"
            }"#,
        )
        .unwrap();
        assert_eq!(doc.provider.token.as_deref(), Some("t"));
        assert_eq!(doc.request.operation, Some(OperationKind::Import));
        assert_eq!(doc.request.import_id.as_deref(), Some("svc-1"));
    }

    #[test]
    fn test_empty_document() {
        let doc = RequestDocument::parse("  ").unwrap();
        assert_eq!(doc.provider, ProviderSettings::default());
        assert_eq!(doc.config(), serde_json::json!({}));
    }

    #[test]
    fn test_config_falls_back_to_plan() {
        let doc = RequestDocument::parse(r#"{"plan": {"name": "er"}}"#).unwrap();
        assert_eq!(doc.config()["name"], "er");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(RequestDocument::parse("{not json").is_err());
    }
}

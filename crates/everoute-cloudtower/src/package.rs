//! `everoute_package` data source

use crate::api::{Architecture, PackageWhere};
use crate::cloudtower::Cloudtower;
use crate::convert::timestamp_id;
use async_trait::async_trait;
use everoute_provider::{DataSource, Diagnostics, Response};
use serde::{Deserialize, Serialize};

const READ_FAILED: &str = "Failed to read everoute package";

/// Packages of one version built for one architecture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageQuery {
    pub id: Option<String>,
    pub version: String,
    /// `X86_64` or `AARCH64`, any case
    pub architecture: String,
    pub packages: Vec<PackageView>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageView {
    pub id: String,
    pub name: String,
    pub version: String,
    pub architecture: String,
}

pub struct PackageDataSource {
    tower: Cloudtower,
}

impl PackageDataSource {
    pub fn new(tower: Cloudtower) -> Self {
        Self { tower }
    }
}

#[async_trait]
impl DataSource for PackageDataSource {
    type Model = PackageQuery;

    fn type_suffix(&self) -> &'static str {
        "package"
    }

    fn description(&self) -> &'static str {
        "Everoute packages uploaded to Cloudtower"
    }

    fn validate(&self, config: &PackageQuery) -> Diagnostics {
        let mut diags = Diagnostics::new();
        if config.version.trim().is_empty() {
            diags.add_attribute_error("version", "Missing version", "package version is required");
        }
        if let Err(e) = config.architecture.parse::<Architecture>() {
            diags.add_attribute_error("architecture", "Invalid architecture", e);
        }
        diags
    }

    async fn read(&self, mut config: PackageQuery) -> Response<PackageQuery> {
        let arch = match config.architecture.parse::<Architecture>() {
            Ok(arch) => arch,
            Err(e) => return Response::error(READ_FAILED, e),
        };
        let filter = PackageWhere {
            arch: Some(arch),
            version: Some(config.version.clone()),
            ..Default::default()
        };
        let packages = match self.tower.everoute_packages(&filter).await {
            Ok(packages) => packages,
            Err(e) => {
                return Response::error(
                    READ_FAILED,
                    format!("Unable to read everoute package, got error: {e}"),
                );
            }
        };
        if packages.is_empty() {
            return Response::error(
                READ_FAILED,
                format!(
                    "Cannot find everoute package {} for {}",
                    config.version, arch
                ),
            );
        }

        config.architecture = arch.to_string();
        config.packages = packages
            .into_iter()
            .map(|p| PackageView {
                id: p.id,
                name: p.name,
                version: p.version,
                architecture: p.arch.to_string(),
            })
            .collect();
        config.id = Some(timestamp_id());
        Response::ok(config)
    }
}

//! Associated cluster reconciliation
//!
//! Clusters are matched by id, never by position. VDS membership is not
//! diffed: the union of every desired cluster's vds replaces the remote
//! set in one `set` operation.

use super::model::AssociatedCluster;
use crate::api::{AssociationInput, ClusterConnection, IdRef, VdsSet};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Minimal membership change between two snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub connect: BTreeSet<String>,
    pub disconnect: BTreeSet<String>,
    pub vds: BTreeSet<String>,
}

impl ReconciliationPlan {
    pub fn compute(desired: &[AssociatedCluster], prior: &[AssociatedCluster]) -> Self {
        let mut remaining: HashMap<&str, &AssociatedCluster> =
            prior.iter().map(|c| (c.id.as_str(), c)).collect();
        let mut seen = HashSet::new();
        let mut plan = Self::default();

        for cluster in desired {
            plan.vds.extend(cluster.vdses.iter().map(|v| v.id.clone()));
            if !seen.insert(cluster.id.as_str()) {
                continue;
            }
            if remaining.remove(cluster.id.as_str()).is_none() {
                plan.connect.insert(cluster.id.clone());
            }
        }

        // Whatever was not claimed by a desired cluster goes away
        plan.disconnect = remaining.into_keys().map(str::to_string).collect();
        plan
    }

    /// Plan that detaches everything in `prior`
    pub fn detach_all(prior: &[AssociatedCluster]) -> Self {
        Self::compute(&[], prior)
    }

    pub fn is_membership_unchanged(&self) -> bool {
        self.connect.is_empty() && self.disconnect.is_empty()
    }

    pub fn to_input(&self) -> AssociationInput {
        let refs = |ids: &BTreeSet<String>| ids.iter().map(IdRef::new).collect::<Vec<_>>();
        AssociationInput {
            agent_elf_clusters: ClusterConnection {
                connect: refs(&self.connect),
                disconnect: refs(&self.disconnect),
            },
            agent_elf_vdses: VdsSet {
                set: refs(&self.vds),
            },
        }
    }
}

//! Discovery of the clusters known to the Slurm database.

use std::collections::BTreeMap;

use slurm_types::{ClusterInfo, ClusterSet, LOCAL_CLUSTER};
use tracing::{debug, info, warn};

use crate::parser::lines;
use crate::CommandRunner;

/// A requested cluster name that discovery did not turn up.
#[derive(Debug, thiserror::Error)]
#[error("unknown cluster '{name}' specified, available clusters: {available}")]
pub struct UnknownCluster {
    pub name: String,
    pub available: String,
}

/// Every cluster this process could report on, keyed by name.
#[derive(Clone, Debug)]
pub struct KnownClusters(BTreeMap<String, ClusterInfo>);

impl Default for KnownClusters {
    fn default() -> Self {
        Self(BTreeMap::from([(LOCAL_CLUSTER.to_string(), ClusterInfo::local())]))
    }
}

impl KnownClusters {
    pub fn insert(&mut self, cluster: ClusterInfo) {
        self.0.insert(cluster.name.clone(), cluster);
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    /// Maps requested names onto known clusters, keeping the requested order.
    /// Blank entries and repeats are dropped.
    pub fn resolve<S: AsRef<str>>(&self, requested: &[S]) -> Result<ClusterSet, UnknownCluster> {
        let mut selected: Vec<ClusterInfo> = Vec::new();

        for name in requested.iter().map(|s| s.as_ref().trim()) {
            if name.is_empty() || selected.iter().any(|c| c.name == name) {
                continue;
            }
            match self.0.get(name) {
                Some(cluster) => selected.push(cluster.clone()),
                None => {
                    return Err(UnknownCluster {
                        name: name.to_string(),
                        available: self.names().join(","),
                    })
                }
            }
        }

        Ok(ClusterSet::new(selected))
    }
}

/// Lists clusters with `sacctmgr` and keeps those that answer an
/// `sshare -M <name>` probe. `local` is always known.
pub async fn discover(runner: &dyn CommandRunner) -> KnownClusters {
    let mut known = KnownClusters::default();

    let listArgs: Vec<String> = ["list", "cluster", "format=Cluster", "-n", "-P"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let output = match runner.execute("sacctmgr", &listArgs).await {
        Ok(out) => out,
        Err(e) => {
            warn!("cluster discovery failed, only '{LOCAL_CLUSTER}' is available: {e}");
            return known;
        }
    };

    for line in lines(&output) {
        let name = line.trim();
        if name.is_empty() {
            continue;
        }

        let candidate = ClusterInfo::remote(name);
        match runner.execute("sshare", &candidate.cmdargs).await {
            Ok(_) => known.insert(candidate),
            Err(e) => debug!("dropping cluster '{name}': {e}"),
        }
    }

    info!("available clusters: {}", known.names().join(","));
    known
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeRunner;

    #[tokio::test]
    async fn test_discover_keeps_probed_clusters() {
        let fake = FakeRunner::new()
            .reply("sacctmgr", &[], "virgo\nkronos\n\n")
            .fail("sshare", &["kronos"]);

        let known = discover(&fake).await;
        assert_eq!(known.names(), vec!["local", "virgo"]);
    }

    #[tokio::test]
    async fn test_discover_without_sacctmgr() {
        let fake = FakeRunner::new().fail("sacctmgr", &[]);
        let known = discover(&fake).await;
        assert_eq!(known.names(), vec!["local"]);
    }

    #[test]
    fn test_resolve_keeps_requested_order() {
        let mut known = KnownClusters::default();
        known.insert(ClusterInfo::remote("virgo"));

        let set = known.resolve(&["virgo", " local", "virgo", ""]).unwrap();
        assert_eq!(set.names(), vec!["virgo", "local"]);
        assert_eq!(set.iter().next().unwrap().cmdargs, vec!["-M", "virgo"]);
    }

    #[test]
    fn test_resolve_unknown_cluster_lists_valid_set() {
        let mut known = KnownClusters::default();
        known.insert(ClusterInfo::remote("virgo"));

        let err = known.resolve(&["local", "nowhere"]).unwrap_err();
        assert_eq!(err.name, "nowhere");
        assert_eq!(err.available, "local,virgo");
        assert!(err.to_string().contains("local,virgo"));
    }
}

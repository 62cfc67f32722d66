use serde::Serialize;

/// Name of the implicit cluster the local Slurm configuration points at.
pub const LOCAL_CLUSTER: &str = "local";

/// One logical Slurm cluster and the arguments that select it.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ClusterInfo {
    pub name: String,
    /// Prepended to every command run for this cluster, e.g. `-M <name>`.
    pub cmdargs: Vec<String>,
}

impl ClusterInfo {
    pub fn local() -> Self {
        Self {
            name: LOCAL_CLUSTER.into(),
            cmdargs: Vec::new(),
        }
    }

    /// A federated cluster addressed with `-M <name>`.
    pub fn remote(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            cmdargs: vec!["-M".into(), name.clone()],
            name,
        }
    }

    pub fn is_local(&self) -> bool {
        self.cmdargs.is_empty()
    }

    /// Builds the argument list for one invocation: cluster selector first,
    /// then the command's own arguments.
    pub fn args<I, S>(&self, extra: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmdargs
            .iter()
            .cloned()
            .chain(extra.into_iter().map(Into::into))
            .collect()
    }
}

/// The clusters this process reports on. Fixed at startup.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ClusterSet(Vec<ClusterInfo>);

impl ClusterSet {
    pub fn new(clusters: Vec<ClusterInfo>) -> Self {
        Self(clusters)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClusterInfo> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.name.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a ClusterSet {
    type Item = &'a ClusterInfo;
    type IntoIter = std::slice::Iter<'a, ClusterInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

use std::collections::BTreeMap;

use slurm_types::{ClusterInfo, JobOwnerMetrics};

use crate::parser::{lines, parse_count};
use crate::{CommandRunner, Result};

/// Which `squeue` column jobs are grouped by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobOwner {
    Account,
    User,
}

impl JobOwner {
    fn format(self) -> &'static str {
        match self {
            JobOwner::Account => "%A|%a|%T|%C",
            JobOwner::User => "%A|%u|%T|%C",
        }
    }
}

pub async fn collect(
    runner: &dyn CommandRunner,
    cluster: &ClusterInfo,
    owner: JobOwner,
) -> Result<BTreeMap<String, JobOwnerMetrics>> {
    let output = runner
        .execute("squeue", &cluster.args(["-a", "-r", "-h", "-o", owner.format()]))
        .await?;
    Ok(parse_jobs_by_owner(&output))
}

/// Groups `jobid|owner|state|cpus` lines by owner.
pub fn parse_jobs_by_owner(raw: &[u8]) -> BTreeMap<String, JobOwnerMetrics> {
    let mut owners: BTreeMap<String, JobOwnerMetrics> = BTreeMap::new();

    for line in lines(raw) {
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() < 4 {
            continue;
        }

        let jm = owners.entry(fields[1].trim().to_string()).or_default();
        let state = fields[2].trim().to_lowercase();
        if state.starts_with("pending") {
            jm.jobs_pending += 1.0;
        } else if state.starts_with("running") {
            jm.jobs_running += 1.0;
            jm.cpus_running += parse_count(fields[3]);
        } else if state.starts_with("suspended") {
            jm.jobs_suspended += 1.0;
        }
    }

    owners
}

use std::collections::BTreeMap;

use slurm_types::{ClusterInfo, PartitionMetrics};

use crate::parser::{lines, parse_cpu_states};
use crate::{CommandRunner, Result};

pub async fn collect(
    runner: &dyn CommandRunner,
    cluster: &ClusterInfo,
) -> Result<BTreeMap<String, PartitionMetrics>> {
    let cpusOutput = runner
        .execute("sinfo", &cluster.args(["-h", "-o", "%R,%C"]))
        .await?;
    let pendingOutput = runner
        .execute(
            "squeue",
            &cluster.args(["-a", "-r", "-h", "-o", "%P", "--states=PENDING"]),
        )
        .await?;

    let mut partitions = parse_partition_cpus(&cpusOutput);
    count_pending_jobs(&mut partitions, &pendingOutput);
    Ok(partitions)
}

/// Reads `partition,alloc/idle/other/total` lines.
pub fn parse_partition_cpus(raw: &[u8]) -> BTreeMap<String, PartitionMetrics> {
    let mut partitions = BTreeMap::new();

    for line in lines(raw) {
        let Some((name, states)) = line.split_once(',') else {
            continue;
        };
        let [allocated, idle, other, total] = parse_cpu_states(states);
        partitions.insert(
            name.trim().to_string(),
            PartitionMetrics {
                cpus_allocated: allocated,
                cpus_idle: idle,
                cpus_other: other,
                cpus_total: total,
                jobs_pending: 0.0,
            },
        );
    }

    partitions
}

/// Adds one pending job per line to each partition the job was submitted to.
/// Partitions `sinfo` did not report are ignored.
pub fn count_pending_jobs(partitions: &mut BTreeMap<String, PartitionMetrics>, raw: &[u8]) {
    for line in lines(raw) {
        for name in line.split(',') {
            if let Some(partition) = partitions.get_mut(name.trim()) {
                partition.jobs_pending += 1.0;
            }
        }
    }
}

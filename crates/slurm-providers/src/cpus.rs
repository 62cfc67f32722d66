use slurm_types::{ClusterInfo, CpusMetrics};

use crate::parser::{lines, parse_cpu_states};
use crate::{CommandRunner, Result};

pub async fn collect(runner: &dyn CommandRunner, cluster: &ClusterInfo) -> Result<CpusMetrics> {
    let output = runner
        .execute("sinfo", &cluster.args(["-h", "-o", "%C"]))
        .await?;
    Ok(parse_cpus(&output))
}

/// Reads the first `alloc/idle/other/total` line. Cluster headers that
/// `sinfo -M` prints are skipped.
pub fn parse_cpus(raw: &[u8]) -> CpusMetrics {
    let Some(line) = lines(raw).into_iter().find(|l| l.contains('/')) else {
        return CpusMetrics::default();
    };

    let [alloc, idle, other, total] = parse_cpu_states(&line);
    CpusMetrics {
        alloc,
        idle,
        other,
        total,
    }
}

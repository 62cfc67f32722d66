use slurm_types::{ClusterInfo, QueueMetrics};

use crate::parser::lines;
use crate::{CommandRunner, Result};

pub async fn collect(runner: &dyn CommandRunner, cluster: &ClusterInfo) -> Result<QueueMetrics> {
    let output = runner
        .execute(
            "squeue",
            &cluster.args(["-a", "-r", "-h", "-o", "%A,%T,%r", "--states=all"]),
        )
        .await?;
    Ok(parse_queue(&output))
}

/// Counts `jobid,state,reason` lines per job state. Pending jobs waiting on
/// a dependency are counted both as pending and as pending on a dependency.
pub fn parse_queue(raw: &[u8]) -> QueueMetrics {
    let mut qm = QueueMetrics::default();

    for line in lines(raw) {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 2 {
            continue;
        }

        let slot = match fields[1].trim() {
            "PENDING" => {
                if fields.get(2).map(|r| r.trim()) == Some("Dependency") {
                    qm.pending_dependency += 1.0;
                }
                &mut qm.pending
            }
            "RUNNING" => &mut qm.running,
            "SUSPENDED" => &mut qm.suspended,
            "CANCELLED" => &mut qm.cancelled,
            "COMPLETING" => &mut qm.completing,
            "COMPLETED" => &mut qm.completed,
            "CONFIGURING" => &mut qm.configuring,
            "FAILED" => &mut qm.failed,
            "TIMEOUT" => &mut qm.timeout,
            "PREEMPTED" => &mut qm.preempted,
            "NODE_FAIL" => &mut qm.node_fail,
            _ => continue,
        };
        *slot += 1.0;
    }

    qm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_queue() {
        let raw = b"\
101,RUNNING,None
102,RUNNING,None
103,PENDING,Resources
104,PENDING,Dependency
105,COMPLETING,None
106,FAILED,NonZeroExitCode
107,NODE_FAIL,NodeDown
108,BOOT_FAIL,None
";
        let qm = parse_queue(raw);
        assert_eq!(qm.running, 2.0);
        assert_eq!(qm.pending, 2.0);
        assert_eq!(qm.pending_dependency, 1.0);
        assert_eq!(qm.completing, 1.0);
        assert_eq!(qm.failed, 1.0);
        assert_eq!(qm.node_fail, 1.0);
        assert_eq!(qm.completed, 0.0);
    }

    #[test]
    fn test_parse_queue_empty() {
        assert_eq!(parse_queue(b""), QueueMetrics::default());
    }
}

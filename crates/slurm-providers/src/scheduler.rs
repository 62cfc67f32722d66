use slurm_types::{ClusterInfo, SchedulerMetrics};

use crate::parser::{lines, parse_count};
use crate::{CommandRunner, Result};

pub async fn collect(runner: &dyn CommandRunner, cluster: &ClusterInfo) -> Result<SchedulerMetrics> {
    let output = runner.execute("sdiag", &cluster.cmdargs).await?;
    Ok(parse_sdiag(&output))
}

/// Picks the scheduler statistics out of `sdiag` text.
///
/// `Last cycle` and `Mean cycle` appear twice: first in the main scheduler
/// section, then in the backfill section.
pub fn parse_sdiag(raw: &[u8]) -> SchedulerMetrics {
    let mut sm = SchedulerMetrics::default();
    let mut lastCycleSeen = false;
    let mut meanCycleSeen = false;

    for line in lines(raw) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = parse_count(value);

        match key.trim() {
            "Server thread count" => sm.threads = value,
            "Agent queue size" => sm.queue_size = value,
            "DBD Agent queue size" => sm.dbd_queue_size = value,
            "Last cycle" if !lastCycleSeen => {
                sm.last_cycle = value;
                lastCycleSeen = true;
            }
            "Last cycle" => sm.backfill_last_cycle = value,
            "Mean cycle" if !meanCycleSeen => {
                sm.mean_cycle = value;
                meanCycleSeen = true;
            }
            "Mean cycle" => sm.backfill_mean_cycle = value,
            "Cycles per minute" => sm.cycle_per_minute = value,
            "Depth Mean" => sm.backfill_depth_mean = value,
            "Total backfilled jobs (since last slurm start)" => {
                sm.total_backfilled_jobs_since_start = value
            }
            "Total backfilled jobs (since last stats cycle start)" => {
                sm.total_backfilled_jobs_since_cycle = value
            }
            "Total backfilled heterogeneous job components" => {
                sm.total_backfilled_heterogeneous = value
            }
            _ => {}
        }
    }

    sm
}

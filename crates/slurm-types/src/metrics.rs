use std::collections::BTreeMap;

/// Accumulated value per device or board type, e.g. `{"a100": 12.0}`.
pub type DimensionBreakdown = BTreeMap<String, f64>;

/// Ratio of `part` to `whole`, reported as 0 when there is nothing to divide.
pub fn ratio(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole
    } else {
        0.0
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GpusMetrics {
    pub alloc: f64,
    pub idle: f64,
    pub total: f64,
    pub utilization: f64,
    pub alloc_by_type: DimensionBreakdown,
    pub total_by_type: DimensionBreakdown,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CpusMetrics {
    pub alloc: f64,
    pub idle: f64,
    pub other: f64,
    pub total: f64,
}

/// Node counts per Slurm node state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodesMetrics {
    pub alloc: f64,
    pub comp: f64,
    pub down: f64,
    pub drain: f64,
    pub err: f64,
    pub fail: f64,
    pub idle: f64,
    pub maint: f64,
    pub mix: f64,
    pub resv: f64,
}

/// Resources of a single compute node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeMetrics {
    pub name: String,
    pub status: String,
    pub cpu_alloc: f64,
    pub cpu_idle: f64,
    pub cpu_other: f64,
    pub cpu_total: f64,
    pub mem_alloc: f64,
    pub mem_total: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartitionMetrics {
    pub cpus_allocated: f64,
    pub cpus_idle: f64,
    pub cpus_other: f64,
    pub cpus_total: f64,
    pub jobs_pending: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueueMetrics {
    pub pending: f64,
    pub pending_dependency: f64,
    pub running: f64,
    pub suspended: f64,
    pub cancelled: f64,
    pub completing: f64,
    pub completed: f64,
    pub configuring: f64,
    pub failed: f64,
    pub timeout: f64,
    pub preempted: f64,
    pub node_fail: f64,
}

/// Job counts for one account or user.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobOwnerMetrics {
    pub jobs_pending: f64,
    pub jobs_running: f64,
    pub cpus_running: f64,
    pub jobs_suspended: f64,
}

/// Scheduler statistics as reported by `sdiag`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchedulerMetrics {
    pub threads: f64,
    pub queue_size: f64,
    pub dbd_queue_size: f64,
    pub last_cycle: f64,
    pub mean_cycle: f64,
    pub cycle_per_minute: f64,
    pub backfill_last_cycle: f64,
    pub backfill_mean_cycle: f64,
    pub backfill_depth_mean: f64,
    pub total_backfilled_jobs_since_start: f64,
    pub total_backfilled_jobs_since_cycle: f64,
    pub total_backfilled_heterogeneous: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_guards_zero_total() {
        assert_eq!(ratio(4.0, 8.0), 0.5);
        assert_eq!(ratio(0.0, 0.0), 0.0);
        assert_eq!(ratio(3.0, 0.0), 0.0);
    }
}

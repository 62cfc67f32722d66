//! Gauge tables for every resource domain and the mapping from provider
//! snapshots onto them.

use async_trait::async_trait;
use slurm_providers::jobs::JobOwner;
use slurm_providers::{
    cpus, fairshare, gpus, jobs, node, nodes, partitions, queue, scheduler, CommandRunner,
    ProviderError,
};
use slurm_types::ClusterInfo;

use crate::collector::{GaugeSpec, MetricSource, Sample};

type SampleResult = Result<Vec<Sample>, ProviderError>;

pub struct CpusSource;

const CPUS_GAUGES: &[GaugeSpec] = &[
    GaugeSpec::new("slurm_cpus_alloc", "Allocated CPUs"),
    GaugeSpec::new("slurm_cpus_idle", "Idle CPUs"),
    GaugeSpec::new("slurm_cpus_other", "Mix CPUs"),
    GaugeSpec::new("slurm_cpus_total", "Total CPUs"),
];

#[async_trait]
impl MetricSource for CpusSource {
    fn domain(&self) -> &'static str {
        "cpus"
    }

    fn gauges(&self) -> &'static [GaugeSpec] {
        CPUS_GAUGES
    }

    async fn sample(&self, runner: &dyn CommandRunner, cluster: &ClusterInfo) -> SampleResult {
        let cm = cpus::collect(runner, cluster).await?;
        Ok(vec![
            Sample::new("slurm_cpus_alloc", cm.alloc),
            Sample::new("slurm_cpus_idle", cm.idle),
            Sample::new("slurm_cpus_other", cm.other),
            Sample::new("slurm_cpus_total", cm.total),
        ])
    }
}

pub struct NodesSource;

const NODES_GAUGES: &[GaugeSpec] = &[
    GaugeSpec::new("slurm_nodes_alloc", "Allocated nodes"),
    GaugeSpec::new("slurm_nodes_comp", "Completing nodes"),
    GaugeSpec::new("slurm_nodes_down", "Down nodes"),
    GaugeSpec::new("slurm_nodes_drain", "Drain nodes"),
    GaugeSpec::new("slurm_nodes_err", "Error nodes"),
    GaugeSpec::new("slurm_nodes_fail", "Fail nodes"),
    GaugeSpec::new("slurm_nodes_idle", "Idle nodes"),
    GaugeSpec::new("slurm_nodes_maint", "Maint nodes"),
    GaugeSpec::new("slurm_nodes_mix", "Mix nodes"),
    GaugeSpec::new("slurm_nodes_resv", "Reserved nodes"),
];

#[async_trait]
impl MetricSource for NodesSource {
    fn domain(&self) -> &'static str {
        "nodes"
    }

    fn gauges(&self) -> &'static [GaugeSpec] {
        NODES_GAUGES
    }

    async fn sample(&self, runner: &dyn CommandRunner, cluster: &ClusterInfo) -> SampleResult {
        let nm = nodes::collect(runner, cluster).await?;
        Ok(vec![
            Sample::new("slurm_nodes_alloc", nm.alloc),
            Sample::new("slurm_nodes_comp", nm.comp),
            Sample::new("slurm_nodes_down", nm.down),
            Sample::new("slurm_nodes_drain", nm.drain),
            Sample::new("slurm_nodes_err", nm.err),
            Sample::new("slurm_nodes_fail", nm.fail),
            Sample::new("slurm_nodes_idle", nm.idle),
            Sample::new("slurm_nodes_maint", nm.maint),
            Sample::new("slurm_nodes_mix", nm.mix),
            Sample::new("slurm_nodes_resv", nm.resv),
        ])
    }
}

pub struct NodeSource;

const NODE_LABELS: &[&str] = &["node", "status"];

const NODE_GAUGES: &[GaugeSpec] = &[
    GaugeSpec::labelled("slurm_node_cpu_alloc", "Allocated CPUs per node", NODE_LABELS),
    GaugeSpec::labelled("slurm_node_cpu_idle", "Idle CPUs per node", NODE_LABELS),
    GaugeSpec::labelled("slurm_node_cpu_other", "Other CPUs per node", NODE_LABELS),
    GaugeSpec::labelled("slurm_node_cpu_total", "Total CPUs per node", NODE_LABELS),
    GaugeSpec::labelled("slurm_node_mem_alloc", "Allocated memory per node", NODE_LABELS),
    GaugeSpec::labelled("slurm_node_mem_total", "Total memory per node", NODE_LABELS),
];

#[async_trait]
impl MetricSource for NodeSource {
    fn domain(&self) -> &'static str {
        "node"
    }

    fn gauges(&self) -> &'static [GaugeSpec] {
        NODE_GAUGES
    }

    async fn sample(&self, runner: &dyn CommandRunner, cluster: &ClusterInfo) -> SampleResult {
        let nodeList = node::collect(runner, cluster).await?;
        let mut samples = Vec::with_capacity(nodeList.len() * NODE_GAUGES.len());

        for n in nodeList {
            let labels = vec![n.name.clone(), n.status.clone()];
            samples.extend([
                Sample::labelled("slurm_node_cpu_alloc", labels.clone(), n.cpu_alloc),
                Sample::labelled("slurm_node_cpu_idle", labels.clone(), n.cpu_idle),
                Sample::labelled("slurm_node_cpu_other", labels.clone(), n.cpu_other),
                Sample::labelled("slurm_node_cpu_total", labels.clone(), n.cpu_total),
                Sample::labelled("slurm_node_mem_alloc", labels.clone(), n.mem_alloc),
                Sample::labelled("slurm_node_mem_total", labels, n.mem_total),
            ]);
        }

        Ok(samples)
    }
}

pub struct GpusSource;

const TYPE_LABEL: &[&str] = &["type"];

const GPUS_GAUGES: &[GaugeSpec] = &[
    GaugeSpec::new("slurm_gpus_alloc", "Allocated GPUs"),
    GaugeSpec::new("slurm_gpus_idle", "Idle GPUs"),
    GaugeSpec::new("slurm_gpus_total", "Total GPUs"),
    GaugeSpec::new("slurm_gpus_utilization", "Total GPU utilization"),
    GaugeSpec::labelled("slurm_gpus_type_alloc", "Allocated GPUs per board type", TYPE_LABEL),
    GaugeSpec::labelled("slurm_gpus_type_total", "Total GPUs per board type", TYPE_LABEL),
];

#[async_trait]
impl MetricSource for GpusSource {
    fn domain(&self) -> &'static str {
        "gpus"
    }

    fn gauges(&self) -> &'static [GaugeSpec] {
        GPUS_GAUGES
    }

    async fn sample(&self, runner: &dyn CommandRunner, cluster: &ClusterInfo) -> SampleResult {
        let gm = gpus::collect(runner, cluster).await?;
        let mut samples = vec![
            Sample::new("slurm_gpus_alloc", gm.alloc),
            Sample::new("slurm_gpus_idle", gm.idle),
            Sample::new("slurm_gpus_total", gm.total),
            Sample::new("slurm_gpus_utilization", gm.utilization),
        ];

        for (boardType, count) in gm.alloc_by_type {
            samples.push(Sample::labelled("slurm_gpus_type_alloc", vec![boardType], count));
        }
        for (boardType, count) in gm.total_by_type {
            samples.push(Sample::labelled("slurm_gpus_type_total", vec![boardType], count));
        }

        Ok(samples)
    }
}

pub struct PartitionsSource;

const PARTITION_LABEL: &[&str] = &["partition"];

const PARTITIONS_GAUGES: &[GaugeSpec] = &[
    GaugeSpec::labelled("slurm_partition_cpus_allocated", "Allocated CPUs for partition", PARTITION_LABEL),
    GaugeSpec::labelled("slurm_partition_cpus_idle", "Idle CPUs for partition", PARTITION_LABEL),
    GaugeSpec::labelled("slurm_partition_cpus_other", "Other CPUs for partition", PARTITION_LABEL),
    GaugeSpec::labelled("slurm_partition_cpus_total", "Total CPUs for partition", PARTITION_LABEL),
    GaugeSpec::labelled("slurm_partition_jobs_pending", "Pending jobs for partition", PARTITION_LABEL),
];

#[async_trait]
impl MetricSource for PartitionsSource {
    fn domain(&self) -> &'static str {
        "partitions"
    }

    fn gauges(&self) -> &'static [GaugeSpec] {
        PARTITIONS_GAUGES
    }

    async fn sample(&self, runner: &dyn CommandRunner, cluster: &ClusterInfo) -> SampleResult {
        let partitionMap = partitions::collect(runner, cluster).await?;
        let mut samples = Vec::new();

        for (name, pm) in partitionMap {
            let labels = vec![name];
            samples.extend([
                Sample::labelled("slurm_partition_cpus_allocated", labels.clone(), pm.cpus_allocated),
                Sample::labelled("slurm_partition_cpus_idle", labels.clone(), pm.cpus_idle),
                Sample::labelled("slurm_partition_cpus_other", labels.clone(), pm.cpus_other),
                Sample::labelled("slurm_partition_cpus_total", labels.clone(), pm.cpus_total),
                Sample::labelled("slurm_partition_jobs_pending", labels, pm.jobs_pending),
            ]);
        }

        Ok(samples)
    }
}

pub struct QueueSource;

const QUEUE_GAUGES: &[GaugeSpec] = &[
    GaugeSpec::new("slurm_queue_pending", "Pending jobs in queue"),
    GaugeSpec::new("slurm_queue_pending_dependency", "Pending jobs because of dependency in queue"),
    GaugeSpec::new("slurm_queue_running", "Running jobs in the cluster"),
    GaugeSpec::new("slurm_queue_suspended", "Suspended jobs in the cluster"),
    GaugeSpec::new("slurm_queue_cancelled", "Cancelled jobs in the cluster"),
    GaugeSpec::new("slurm_queue_completing", "Completing jobs in the cluster"),
    GaugeSpec::new("slurm_queue_completed", "Completed jobs in the cluster"),
    GaugeSpec::new("slurm_queue_configuring", "Configuring jobs in the cluster"),
    GaugeSpec::new("slurm_queue_failed", "Number of failed jobs"),
    GaugeSpec::new("slurm_queue_timeout", "Jobs stopped by timeout"),
    GaugeSpec::new("slurm_queue_preempted", "Number of preempted jobs"),
    GaugeSpec::new("slurm_queue_node_fail", "Number of jobs stopped due to node fail"),
];

#[async_trait]
impl MetricSource for QueueSource {
    fn domain(&self) -> &'static str {
        "queue"
    }

    fn gauges(&self) -> &'static [GaugeSpec] {
        QUEUE_GAUGES
    }

    async fn sample(&self, runner: &dyn CommandRunner, cluster: &ClusterInfo) -> SampleResult {
        let qm = queue::collect(runner, cluster).await?;
        Ok(vec![
            Sample::new("slurm_queue_pending", qm.pending),
            Sample::new("slurm_queue_pending_dependency", qm.pending_dependency),
            Sample::new("slurm_queue_running", qm.running),
            Sample::new("slurm_queue_suspended", qm.suspended),
            Sample::new("slurm_queue_cancelled", qm.cancelled),
            Sample::new("slurm_queue_completing", qm.completing),
            Sample::new("slurm_queue_completed", qm.completed),
            Sample::new("slurm_queue_configuring", qm.configuring),
            Sample::new("slurm_queue_failed", qm.failed),
            Sample::new("slurm_queue_timeout", qm.timeout),
            Sample::new("slurm_queue_preempted", qm.preempted),
            Sample::new("slurm_queue_node_fail", qm.node_fail),
        ])
    }
}

/// Jobs grouped by account or by user. Both share one shape and differ only
/// in the grouping column and metric names.
pub struct JobOwnerSource(JobOwner);

impl JobOwnerSource {
    pub fn accounts() -> Self {
        Self(JobOwner::Account)
    }

    pub fn users() -> Self {
        Self(JobOwner::User)
    }
}

const ACCOUNT_GAUGES: &[GaugeSpec] = &[
    GaugeSpec::labelled("slurm_account_jobs_pending", "Pending jobs for account", &["account"]),
    GaugeSpec::labelled("slurm_account_jobs_running", "Running jobs for account", &["account"]),
    GaugeSpec::labelled("slurm_account_cpus_running", "Running cpus for account", &["account"]),
    GaugeSpec::labelled("slurm_account_jobs_suspended", "Suspended jobs for account", &["account"]),
];

const USER_GAUGES: &[GaugeSpec] = &[
    GaugeSpec::labelled("slurm_user_jobs_pending", "Pending jobs for user", &["user"]),
    GaugeSpec::labelled("slurm_user_jobs_running", "Running jobs for user", &["user"]),
    GaugeSpec::labelled("slurm_user_cpus_running", "Running cpus for user", &["user"]),
    GaugeSpec::labelled("slurm_user_jobs_suspended", "Suspended jobs for user", &["user"]),
];

#[async_trait]
impl MetricSource for JobOwnerSource {
    fn domain(&self) -> &'static str {
        match self.0 {
            JobOwner::Account => "accounts",
            JobOwner::User => "users",
        }
    }

    fn gauges(&self) -> &'static [GaugeSpec] {
        match self.0 {
            JobOwner::Account => ACCOUNT_GAUGES,
            JobOwner::User => USER_GAUGES,
        }
    }

    async fn sample(&self, runner: &dyn CommandRunner, cluster: &ClusterInfo) -> SampleResult {
        let owners = jobs::collect(runner, cluster, self.0).await?;
        let [pending, running, cpusRunning, suspended] = self.gauges() else {
            return Ok(Vec::new());
        };

        let mut samples = Vec::new();
        for (owner, jm) in owners {
            let labels = vec![owner];
            samples.extend([
                Sample::labelled(pending.name, labels.clone(), jm.jobs_pending),
                Sample::labelled(running.name, labels.clone(), jm.jobs_running),
                Sample::labelled(cpusRunning.name, labels.clone(), jm.cpus_running),
                Sample::labelled(suspended.name, labels, jm.jobs_suspended),
            ]);
        }

        Ok(samples)
    }
}

pub struct SchedulerSource;

const SCHEDULER_GAUGES: &[GaugeSpec] = &[
    GaugeSpec::new("slurm_scheduler_threads", "Information provided by the Slurm sdiag command, number of scheduler threads"),
    GaugeSpec::new("slurm_scheduler_queue_size", "Information provided by the Slurm sdiag command, length of the scheduler queue"),
    GaugeSpec::new("slurm_scheduler_dbd_queue_size", "Information provided by the Slurm sdiag command, length of the DBD agent queue"),
    GaugeSpec::new("slurm_scheduler_last_cycle", "Information provided by the Slurm sdiag command, scheduler last cycle time in (microseconds)"),
    GaugeSpec::new("slurm_scheduler_mean_cycle", "Information provided by the Slurm sdiag command, scheduler mean cycle time in (microseconds)"),
    GaugeSpec::new("slurm_scheduler_cycle_per_minute", "Information provided by the Slurm sdiag command, number scheduler cycles per minute"),
    GaugeSpec::new("slurm_scheduler_backfill_last_cycle", "Information provided by the Slurm sdiag command, scheduler backfill last cycle time in (microseconds)"),
    GaugeSpec::new("slurm_scheduler_backfill_mean_cycle", "Information provided by the Slurm sdiag command, scheduler backfill mean cycle time in (microseconds)"),
    GaugeSpec::new("slurm_scheduler_backfill_depth_mean", "Information provided by the Slurm sdiag command, scheduler backfill mean depth"),
    GaugeSpec::new("slurm_scheduler_backfilled_jobs_since_start", "Information provided by the Slurm sdiag command, number of jobs started thanks to backfilling since last slurm start"),
    GaugeSpec::new("slurm_scheduler_backfilled_jobs_since_cycle", "Information provided by the Slurm sdiag command, number of jobs started thanks to backfilling since last time stats where reset"),
    GaugeSpec::new("slurm_scheduler_backfilled_heterogeneous", "Information provided by the Slurm sdiag command, number of heterogeneous job components started thanks to backfilling since last Slurm start"),
];

#[async_trait]
impl MetricSource for SchedulerSource {
    fn domain(&self) -> &'static str {
        "scheduler"
    }

    fn gauges(&self) -> &'static [GaugeSpec] {
        SCHEDULER_GAUGES
    }

    async fn sample(&self, runner: &dyn CommandRunner, cluster: &ClusterInfo) -> SampleResult {
        let sm = scheduler::collect(runner, cluster).await?;
        Ok(vec![
            Sample::new("slurm_scheduler_threads", sm.threads),
            Sample::new("slurm_scheduler_queue_size", sm.queue_size),
            Sample::new("slurm_scheduler_dbd_queue_size", sm.dbd_queue_size),
            Sample::new("slurm_scheduler_last_cycle", sm.last_cycle),
            Sample::new("slurm_scheduler_mean_cycle", sm.mean_cycle),
            Sample::new("slurm_scheduler_cycle_per_minute", sm.cycle_per_minute),
            Sample::new("slurm_scheduler_backfill_last_cycle", sm.backfill_last_cycle),
            Sample::new("slurm_scheduler_backfill_mean_cycle", sm.backfill_mean_cycle),
            Sample::new("slurm_scheduler_backfill_depth_mean", sm.backfill_depth_mean),
            Sample::new("slurm_scheduler_backfilled_jobs_since_start", sm.total_backfilled_jobs_since_start),
            Sample::new("slurm_scheduler_backfilled_jobs_since_cycle", sm.total_backfilled_jobs_since_cycle),
            Sample::new("slurm_scheduler_backfilled_heterogeneous", sm.total_backfilled_heterogeneous),
        ])
    }
}

pub struct FairShareSource;

const FAIRSHARE_GAUGES: &[GaugeSpec] = &[GaugeSpec::labelled(
    "slurm_account_fairshare",
    "FairShare for account",
    &["account"],
)];

#[async_trait]
impl MetricSource for FairShareSource {
    fn domain(&self) -> &'static str {
        "fairshare"
    }

    fn gauges(&self) -> &'static [GaugeSpec] {
        FAIRSHARE_GAUGES
    }

    async fn sample(&self, runner: &dyn CommandRunner, cluster: &ClusterInfo) -> SampleResult {
        let accounts = fairshare::collect(runner, cluster).await?;
        Ok(accounts
            .into_iter()
            .map(|(account, value)| Sample::labelled("slurm_account_fairshare", vec![account], value))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slurm_providers::fake::FakeRunner;

    #[tokio::test]
    async fn test_gpus_samples_include_breakdown() {
        let fake = FakeRunner::new()
            .reply("sacct", &[], "board:a100:2\nboard:a100:1\n")
            .reply("sinfo", &[], "n1 board:a100:4\nn2 board:v100:2\n");

        let samples = GpusSource.sample(&fake, &ClusterInfo::local()).await.unwrap();
        assert!(samples.contains(&Sample::new("slurm_gpus_alloc", 3.0)));
        assert!(samples.contains(&Sample::new("slurm_gpus_total", 6.0)));
        assert!(samples.contains(&Sample::new("slurm_gpus_utilization", 0.5)));
        assert!(samples.contains(&Sample::labelled("slurm_gpus_type_total", vec!["v100".into()], 2.0)));
        assert!(samples.contains(&Sample::labelled("slurm_gpus_type_alloc", vec!["a100".into()], 3.0)));
    }

    #[tokio::test]
    async fn test_job_owner_sources_use_their_own_names() {
        let fake = FakeRunner::new()
            .reply("squeue", &["%A|%a|%T|%C"], "1|physics|RUNNING|8\n")
            .reply("squeue", &["%A|%u|%T|%C"], "1|alice|RUNNING|8\n");

        let accounts = JobOwnerSource::accounts()
            .sample(&fake, &ClusterInfo::local())
            .await
            .unwrap();
        assert!(accounts.contains(&Sample::labelled("slurm_account_cpus_running", vec!["physics".into()], 8.0)));

        let users = JobOwnerSource::users()
            .sample(&fake, &ClusterInfo::local())
            .await
            .unwrap();
        assert!(users.contains(&Sample::labelled("slurm_user_jobs_running", vec!["alice".into()], 1.0)));
    }

    #[test]
    fn test_metric_names_are_unique() {
        let tables: &[&[GaugeSpec]] = &[
            CPUS_GAUGES,
            NODES_GAUGES,
            NODE_GAUGES,
            GPUS_GAUGES,
            PARTITIONS_GAUGES,
            QUEUE_GAUGES,
            ACCOUNT_GAUGES,
            USER_GAUGES,
            SCHEDULER_GAUGES,
            FAIRSHARE_GAUGES,
        ];
        let mut names: Vec<&str> = tables.iter().flat_map(|t| t.iter().map(|g| g.name)).collect();
        let count = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), count, "metric names must be unique across domains");
    }
}

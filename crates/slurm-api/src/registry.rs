use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::join_all;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Deserialize;
use slurm_providers::CommandRunner;
use slurm_types::ClusterSet;
use tracing::{debug, info, warn};

use crate::collector::Collector;
use crate::{ExporterError, ScrapeError};

/// What a scrape does when an external command fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Fail the scrape; the server terminates the process.
    #[default]
    Exit,
    /// Leave out the failing collector's metrics for this scrape.
    Skip,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exit" => Ok(FailurePolicy::Exit),
            "skip" => Ok(FailurePolicy::Skip),
            other => Err(format!("unknown failure policy '{other}', expected 'exit' or 'skip'")),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Exit => f.write_str("exit"),
            FailurePolicy::Skip => f.write_str("skip"),
        }
    }
}

/// All collectors this process exports, the clusters they report on and
/// the runner they share. Built once at startup.
pub struct ScrapeRegistry {
    runner: Arc<dyn CommandRunner>,
    clusters: ClusterSet,
    policy: FailurePolicy,
    collectors: Vec<Box<dyn Collector>>,
    metricNames: HashSet<String>,
}

impl ScrapeRegistry {
    pub fn new(runner: Arc<dyn CommandRunner>, clusters: ClusterSet, policy: FailurePolicy) -> Self {
        Self {
            runner,
            clusters,
            policy,
            collectors: Vec::new(),
            metricNames: HashSet::new(),
        }
    }

    /// Adds a collector after checking its descriptors against those
    /// already registered.
    pub fn register(&mut self, collector: Box<dyn Collector>) -> Result<(), ExporterError> {
        let names: Vec<&str> = collector
            .describe()
            .iter()
            .map(|d| d.fq_name.as_str())
            .collect();

        if let Some(taken) = names.iter().find(|n| self.metricNames.contains(**n)) {
            return Err(ExporterError::DuplicateMetric(taken.to_string()));
        }

        self.metricNames.extend(names.iter().map(|n| n.to_string()));
        debug!("registered {} collector with {} gauges", collector.domain(), names.len());
        self.collectors.push(collector);
        Ok(())
    }

    pub fn clusters(&self) -> &ClusterSet {
        &self.clusters
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn domains(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.domain()).collect()
    }

    /// Runs every collector, concurrently with each other, and renders the
    /// result in the Prometheus text format.
    pub async fn gather(&self) -> Result<String, ScrapeError> {
        let runner = self.runner.as_ref();
        let results = join_all(
            self.collectors
                .iter()
                .map(|c| async move { (c.domain(), c.collect(runner, &self.clusters).await) }),
        )
        .await;

        let scrape = Registry::new();
        for (domain, result) in results {
            match result {
                Ok(gauges) => {
                    for gauge in gauges {
                        scrape.register(Box::new(gauge))?;
                    }
                }
                Err(e) if self.policy == FailurePolicy::Skip => {
                    warn!("skipping {domain} metrics for this scrape: {e}");
                }
                Err(e) => return Err(e),
            }
        }

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&scrape.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ScrapeError::Encode(e.to_string()))
    }
}

/// Registers every collector the exporter ships. GPU accounting is opt-in.
pub fn build_registry(
    runner: Arc<dyn CommandRunner>,
    clusters: ClusterSet,
    policy: FailurePolicy,
    gpusAcct: bool,
) -> Result<ScrapeRegistry, ExporterError> {
    use crate::collector::SourceCollector;
    use crate::sources::*;

    let mut registry = ScrapeRegistry::new(runner, clusters, policy);
    registry.register(Box::new(SourceCollector::new(JobOwnerSource::accounts())?))?;
    registry.register(Box::new(SourceCollector::new(CpusSource)?))?;
    registry.register(Box::new(SourceCollector::new(NodesSource)?))?;
    registry.register(Box::new(SourceCollector::new(NodeSource)?))?;
    registry.register(Box::new(SourceCollector::new(PartitionsSource)?))?;
    registry.register(Box::new(SourceCollector::new(QueueSource)?))?;
    registry.register(Box::new(SourceCollector::new(SchedulerSource)?))?;
    registry.register(Box::new(SourceCollector::new(FairShareSource)?))?;
    registry.register(Box::new(SourceCollector::new(JobOwnerSource::users())?))?;

    if gpusAcct {
        registry.register(Box::new(SourceCollector::new(GpusSource)?))?;
    }

    info!("collectors: {}", registry.domains().join(","));
    Ok(registry)
}

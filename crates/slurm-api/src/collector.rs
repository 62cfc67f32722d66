use std::collections::HashMap;

use async_trait::async_trait;
use prometheus::core::Desc;
use prometheus::{GaugeVec, Opts};
use slurm_providers::{CommandRunner, ProviderError};
use slurm_types::{ClusterInfo, ClusterSet};

use crate::ScrapeError;

/// Every gauge carries this label first.
pub const CLUSTER_LABEL: &str = "cluster";

/// Static description of one exported gauge.
#[derive(Clone, Copy, Debug)]
pub struct GaugeSpec {
    pub name: &'static str,
    pub help: &'static str,
    /// Labels besides `cluster`.
    pub labels: &'static [&'static str],
}

impl GaugeSpec {
    pub const fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            labels: &[],
        }
    }

    pub const fn labelled(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self { name, help, labels }
    }

    fn label_names(&self) -> Vec<&'static str> {
        std::iter::once(CLUSTER_LABEL)
            .chain(self.labels.iter().copied())
            .collect()
    }
}

/// One value read from a snapshot, before the cluster label is attached.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub name: &'static str,
    pub labels: Vec<String>,
    pub value: f64,
}

impl Sample {
    pub fn new(name: &'static str, value: f64) -> Self {
        Self {
            name,
            labels: Vec::new(),
            value,
        }
    }

    pub fn labelled(name: &'static str, labels: Vec<String>, value: f64) -> Self {
        Self {
            name,
            labels,
            value,
        }
    }
}

/// A resource domain: which gauges it exports and how to read them for one cluster.
#[async_trait]
pub trait MetricSource: Send + Sync {
    fn domain(&self) -> &'static str;

    fn gauges(&self) -> &'static [GaugeSpec];

    async fn sample(
        &self,
        runner: &dyn CommandRunner,
        cluster: &ClusterInfo,
    ) -> Result<Vec<Sample>, ProviderError>;
}

/// What the registry needs from a collector.
#[async_trait]
pub trait Collector: Send + Sync {
    fn domain(&self) -> &'static str;

    /// Fixed descriptors. No I/O.
    fn describe(&self) -> &[Desc];

    /// Queries every cluster in order and returns the filled gauges.
    async fn collect(
        &self,
        runner: &dyn CommandRunner,
        clusters: &ClusterSet,
    ) -> Result<Vec<GaugeVec>, ScrapeError>;
}

/// Adapts any [`MetricSource`] to the collector protocol.
pub struct SourceCollector<S> {
    source: S,
    descs: Vec<Desc>,
}

impl<S: MetricSource> SourceCollector<S> {
    pub fn new(source: S) -> prometheus::Result<Self> {
        let descs = source
            .gauges()
            .iter()
            .map(|spec| {
                Desc::new(
                    spec.name.to_string(),
                    spec.help.to_string(),
                    spec.label_names().iter().map(|l| l.to_string()).collect(),
                    HashMap::new(),
                )
            })
            .collect::<prometheus::Result<Vec<_>>>()?;

        Ok(Self { source, descs })
    }

    fn new_gauges(&self) -> prometheus::Result<Vec<GaugeVec>> {
        self.source
            .gauges()
            .iter()
            .map(|spec| GaugeVec::new(Opts::new(spec.name, spec.help), &spec.label_names()))
            .collect()
    }
}

#[async_trait]
impl<S: MetricSource> Collector for SourceCollector<S> {
    fn domain(&self) -> &'static str {
        self.source.domain()
    }

    fn describe(&self) -> &[Desc] {
        &self.descs
    }

    async fn collect(
        &self,
        runner: &dyn CommandRunner,
        clusters: &ClusterSet,
    ) -> Result<Vec<GaugeVec>, ScrapeError> {
        let specs = self.source.gauges();
        let gauges = self.new_gauges()?;

        for cluster in clusters {
            let samples = self.source.sample(runner, cluster).await?;

            for sample in samples {
                let Some(index) = specs.iter().position(|s| s.name == sample.name) else {
                    return Err(ScrapeError::UndeclaredGauge(sample.name));
                };

                let mut values: Vec<&str> = Vec::with_capacity(sample.labels.len() + 1);
                values.push(&cluster.name);
                values.extend(sample.labels.iter().map(String::as_str));

                gauges[index]
                    .get_metric_with_label_values(values.as_slice())?
                    .set(sample.value);
            }
        }

        Ok(gauges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slurm_providers::fake::FakeRunner;

    struct Fixed;

    const FIXED_GAUGES: &[GaugeSpec] = &[
        GaugeSpec::new("test_fixed_value", "A fixed value"),
        GaugeSpec::labelled("test_fixed_by_kind", "A fixed value per kind", &["kind"]),
    ];

    #[async_trait]
    impl MetricSource for Fixed {
        fn domain(&self) -> &'static str {
            "fixed"
        }

        fn gauges(&self) -> &'static [GaugeSpec] {
            FIXED_GAUGES
        }

        async fn sample(
            &self,
            _runner: &dyn CommandRunner,
            cluster: &ClusterInfo,
        ) -> Result<Vec<Sample>, ProviderError> {
            let value = if cluster.is_local() { 1.0 } else { 2.0 };
            Ok(vec![
                Sample::new("test_fixed_value", value),
                Sample::labelled("test_fixed_by_kind", vec!["a".into()], value * 10.0),
            ])
        }
    }

    struct Undeclared;

    #[async_trait]
    impl MetricSource for Undeclared {
        fn domain(&self) -> &'static str {
            "undeclared"
        }

        fn gauges(&self) -> &'static [GaugeSpec] {
            FIXED_GAUGES
        }

        async fn sample(
            &self,
            _runner: &dyn CommandRunner,
            _cluster: &ClusterInfo,
        ) -> Result<Vec<Sample>, ProviderError> {
            Ok(vec![Sample::new("test_not_declared", 1.0)])
        }
    }

    fn clusters() -> ClusterSet {
        ClusterSet::new(vec![ClusterInfo::local(), ClusterInfo::remote("virgo")])
    }

    #[test]
    fn test_describe_has_cluster_label() {
        let collector = SourceCollector::new(Fixed).unwrap();
        let descs = collector.describe();
        assert_eq!(descs.len(), 2);
        assert_eq!(descs[0].fq_name, "test_fixed_value");
        assert_eq!(descs[0].variable_labels, vec!["cluster".to_string()]);
        assert_eq!(descs[1].variable_labels, vec!["cluster".to_string(), "kind".to_string()]);
    }

    #[tokio::test]
    async fn test_collect_labels_each_cluster() {
        let collector = SourceCollector::new(Fixed).unwrap();
        let gauges = collector.collect(&FakeRunner::new(), &clusters()).await.unwrap();

        assert_eq!(gauges[0].with_label_values(&["local"]).get(), 1.0);
        assert_eq!(gauges[0].with_label_values(&["virgo"]).get(), 2.0);
        assert_eq!(gauges[1].with_label_values(&["virgo", "a"]).get(), 20.0);
    }

    #[tokio::test]
    async fn test_collect_twice_gives_same_values() {
        let collector = SourceCollector::new(Fixed).unwrap();
        let first = collector.collect(&FakeRunner::new(), &clusters()).await.unwrap();
        let second = collector.collect(&FakeRunner::new(), &clusters()).await.unwrap();
        assert_eq!(
            first[0].with_label_values(&["virgo"]).get(),
            second[0].with_label_values(&["virgo"]).get()
        );
    }

    #[tokio::test]
    async fn test_undeclared_gauge_is_an_error() {
        let collector = SourceCollector::new(Undeclared).unwrap();
        let result = collector.collect(&FakeRunner::new(), &clusters()).await;
        let Err(err) = result else {
            panic!("undeclared gauge was accepted");
        };
        assert!(matches!(err, ScrapeError::UndeclaredGauge("test_not_declared")));
    }
}

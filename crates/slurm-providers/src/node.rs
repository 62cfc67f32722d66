use std::collections::BTreeMap;

use slurm_types::{ClusterInfo, NodeMetrics};

use crate::parser::{lines, parse_count, parse_cpu_states};
use crate::{CommandRunner, Result};

pub async fn collect(runner: &dyn CommandRunner, cluster: &ClusterInfo) -> Result<Vec<NodeMetrics>> {
    let output = runner
        .execute(
            "sinfo",
            &cluster.args([
                "-h",
                "-N",
                "-O",
                "NodeList,AllocMem,Memory,CPUsState,StateLong",
            ]),
        )
        .await?;
    Ok(parse_node_list(&output))
}

/// One entry per node, sorted by name. A node listed under several
/// partitions is reported once.
pub fn parse_node_list(raw: &[u8]) -> Vec<NodeMetrics> {
    let mut nodes: BTreeMap<String, NodeMetrics> = BTreeMap::new();

    for line in lines(raw) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 {
            continue;
        }

        let name = fields[0].to_string();
        if nodes.contains_key(&name) {
            continue;
        }

        let [cpuAlloc, cpuIdle, cpuOther, cpuTotal] = parse_cpu_states(fields[3]);
        nodes.insert(
            name.clone(),
            NodeMetrics {
                name,
                status: fields[4].to_string(),
                cpu_alloc: cpuAlloc,
                cpu_idle: cpuIdle,
                cpu_other: cpuOther,
                cpu_total: cpuTotal,
                mem_alloc: parse_count(fields[1]),
                mem_total: parse_count(fields[2]),
            },
        );
    }

    nodes.into_values().collect()
}

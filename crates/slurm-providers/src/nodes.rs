use std::collections::BTreeSet;

use slurm_types::{ClusterInfo, NodesMetrics};

use crate::parser::{lines, parse_count};
use crate::{CommandRunner, Result};

pub async fn collect(runner: &dyn CommandRunner, cluster: &ClusterInfo) -> Result<NodesMetrics> {
    let output = runner
        .execute("sinfo", &cluster.args(["-h", "-o", "%D,%T"]))
        .await?;
    Ok(parse_nodes(&output))
}

/// Sums `count,state` lines. `sinfo` repeats a line for every partition
/// a group of nodes belongs to, so identical lines are counted once.
pub fn parse_nodes(raw: &[u8]) -> NodesMetrics {
    let mut nm = NodesMetrics::default();
    let unique: BTreeSet<String> = lines(raw).into_iter().collect();

    for line in &unique {
        let Some((count, state)) = line.split_once(',') else {
            continue;
        };
        let count = parse_count(count);

        // States carry suffixes like `*`, `~` or `+drain`, so match on prefixes.
        let slot = match state.trim() {
            s if s.starts_with("alloc") => &mut nm.alloc,
            s if s.starts_with("comp") => &mut nm.comp,
            s if s.starts_with("down") => &mut nm.down,
            s if s.starts_with("drain") => &mut nm.drain,
            s if s.starts_with("fail") => &mut nm.fail,
            s if s.starts_with("err") => &mut nm.err,
            s if s.starts_with("idle") => &mut nm.idle,
            s if s.starts_with("maint") => &mut nm.maint,
            s if s.starts_with("mix") => &mut nm.mix,
            s if s.starts_with("res") => &mut nm.resv,
            _ => continue,
        };
        *slot += count;
    }

    nm
}

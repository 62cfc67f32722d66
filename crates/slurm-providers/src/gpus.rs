use slurm_types::{ratio, ClusterInfo, GpusMetrics};

use crate::parser::{DeviceParser, FieldLayout, Tally, BOARD_PREFIX};
use crate::{CommandRunner, Result};

/// `sacct` prints one `board:<type>:<count>` allocation per running job.
const ALLOCATED: DeviceParser = DeviceParser::new(BOARD_PREFIX, FieldLayout::Line);
/// `sinfo` prints `<node> board:<type>:<count>` per node.
const INSTALLED: DeviceParser = DeviceParser::new(BOARD_PREFIX, FieldLayout::Column(1));

pub async fn collect(runner: &dyn CommandRunner, cluster: &ClusterInfo) -> Result<GpusMetrics> {
    let totalOutput = runner
        .execute("sinfo", &cluster.args(["-h", "-o", "%n %G"]))
        .await?;
    let allocOutput = runner
        .execute(
            "sacct",
            &cluster.args([
                "-a",
                "-X",
                "--format=AllocTRES",
                "--state=RUNNING",
                "--noheader",
                "--parsable2",
            ]),
        )
        .await?;

    Ok(from_tallies(
        parse_total(&totalOutput),
        parse_allocated(&allocOutput),
    ))
}

pub fn parse_allocated(raw: &[u8]) -> Tally {
    ALLOCATED.parse(raw)
}

pub fn parse_total(raw: &[u8]) -> Tally {
    INSTALLED.parse(raw)
}

pub fn from_tallies(total: Tally, allocated: Tally) -> GpusMetrics {
    GpusMetrics {
        alloc: allocated.total,
        idle: total.total - allocated.total,
        total: total.total,
        utilization: ratio(allocated.total, total.total),
        alloc_by_type: allocated.by_type,
        total_by_type: total.by_type,
    }
}

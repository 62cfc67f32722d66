use std::collections::BTreeMap;

use slurm_types::ClusterInfo;

use crate::parser::{lines, parse_count};
use crate::{CommandRunner, Result};

pub async fn collect(
    runner: &dyn CommandRunner,
    cluster: &ClusterInfo,
) -> Result<BTreeMap<String, f64>> {
    let output = runner
        .execute("sshare", &cluster.args(["-n", "-P", "-o", "account,fairshare"]))
        .await?;
    Ok(parse_fairshare(&output))
}

/// Fair-share factor per account from `account|fairshare` lines. User rows
/// are indented below their account and skipped.
pub fn parse_fairshare(raw: &[u8]) -> BTreeMap<String, f64> {
    let mut accounts = BTreeMap::new();

    for line in lines(raw) {
        if line.starts_with("  ") {
            continue;
        }
        let Some((account, fairshare)) = line.split_once('|') else {
            continue;
        };
        accounts.insert(account.trim().to_string(), parse_count(fairshare));
    }

    accounts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fairshare() {
        let raw = b"root|0.500000\n physics|0.250000\n  alice|0.125000\n chemistry|\n";
        let accounts = parse_fairshare(raw);
        assert_eq!(accounts.len(), 3);
        assert_eq!(accounts["root"], 0.5);
        assert_eq!(accounts["physics"], 0.25);
        assert_eq!(accounts["chemistry"], 0.0);
        assert!(!accounts.contains_key("alice"));
    }
}

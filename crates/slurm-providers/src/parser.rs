//! Shared helpers for the loosely structured text Slurm commands print.

use slurm_types::DimensionBreakdown;

/// Prefix Slurm puts in front of generic resources of board type.
pub const BOARD_PREFIX: &str = "board:";

/// Parse a count the way Slurm output tolerates it: anything unreadable is 0.
pub fn parse_count(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Split an `alloc/idle/other/total` CPU state field.
/// Missing or malformed parts read as 0.
pub fn parse_cpu_states(raw: &str) -> [f64; 4] {
    let mut states = [0.0; 4];
    for (slot, part) in states.iter_mut().zip(raw.trim().split('/')) {
        *slot = parse_count(part);
    }
    states
}

/// Output text with one record per line, quote characters around each line removed.
pub fn lines(raw: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(raw)
        .lines()
        .map(|l| l.trim_matches('"').to_string())
        .collect()
}

/// Where on a line the device descriptor lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldLayout {
    /// The whole line is the descriptor (accounting records).
    Line,
    /// The n-th whitespace-separated field (inventory records).
    Column(usize),
}

/// Per-type breakdown plus the grand total of one command's output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tally {
    pub by_type: DimensionBreakdown,
    pub total: f64,
}

impl Tally {
    fn add(&mut self, deviceType: &str, count: f64) {
        *self.by_type.entry(deviceType.to_string()).or_insert(0.0) += count;
        self.total += count;
    }
}

/// Sums `<prefix><type>:<count>` descriptors found on each line.
#[derive(Clone, Copy, Debug)]
pub struct DeviceParser {
    prefix: &'static str,
    layout: FieldLayout,
}

impl DeviceParser {
    pub const fn new(prefix: &'static str, layout: FieldLayout) -> Self {
        Self { prefix, layout }
    }

    pub fn parse(&self, raw: &[u8]) -> Tally {
        let mut tally = Tally::default();

        for line in lines(raw) {
            let Some(field) = self.select(&line) else {
                continue;
            };
            let field = field.trim_matches('"');
            if !field.starts_with(self.prefix) {
                continue;
            }

            let mut parts = field.split(':');
            let deviceType = parts.nth(1).unwrap_or_default();
            let count = parse_count(parts.next().unwrap_or_default());
            tally.add(deviceType, count);
        }

        tally
    }

    fn select<'a>(&self, line: &'a str) -> Option<&'a str> {
        match self.layout {
            FieldLayout::Line => Some(line),
            FieldLayout::Column(index) => line.split_whitespace().nth(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNTING: DeviceParser = DeviceParser::new(BOARD_PREFIX, FieldLayout::Line);
    const INVENTORY: DeviceParser = DeviceParser::new(BOARD_PREFIX, FieldLayout::Column(1));

    #[test]
    fn test_empty_output_is_zero() {
        assert_eq!(ACCOUNTING.parse(b""), Tally::default());
        assert_eq!(INVENTORY.parse(b""), Tally::default());
    }

    #[test]
    fn test_repeated_types_accumulate() {
        let tally = ACCOUNTING.parse(b"board:A100:2\nboard:A100:3\n");
        assert_eq!(tally.by_type.get("A100"), Some(&5.0));
        assert_eq!(tally.total, 5.0);
    }

    #[test]
    fn test_malformed_count_does_not_stop_parsing() {
        let tally = ACCOUNTING.parse(b"board:v100:abc\nboard:v100:4\nboard:a100\nboard:a100:1\n");
        assert_eq!(tally.by_type.get("v100"), Some(&4.0));
        assert_eq!(tally.by_type.get("a100"), Some(&1.0));
        assert_eq!(tally.total, 5.0);
    }

    #[test]
    fn test_quotes_and_foreign_lines_are_ignored() {
        let tally = ACCOUNTING.parse(b"\"board:gpu:4\"\nbilling=4,cpu=4\n\n");
        assert_eq!(tally.total, 4.0);
        assert_eq!(tally.by_type.len(), 1);
    }

    #[test]
    fn test_inventory_reads_second_column() {
        let raw = b"node1 board:gpu:8\"\nnode2 board:gpu:8\nnode3 (null)\nboard:gpu:99\n";
        let tally = INVENTORY.parse(raw);
        assert_eq!(tally.by_type.get("gpu"), Some(&16.0));
        assert_eq!(tally.total, 16.0);
    }

    #[test]
    fn test_parse_is_repeatable() {
        let raw = b"node1 board:a100:4\nnode2 board:v100:2\n";
        assert_eq!(INVENTORY.parse(raw), INVENTORY.parse(raw));
    }

    #[test]
    fn test_parse_cpu_states() {
        assert_eq!(parse_cpu_states("10/20/1/31"), [10.0, 20.0, 1.0, 31.0]);
        assert_eq!(parse_cpu_states(" 4/x/0 "), [4.0, 0.0, 0.0, 0.0]);
        assert_eq!(parse_cpu_states(""), [0.0; 4]);
    }

    #[test]
    fn test_parse_count_rejects_non_finite() {
        assert_eq!(parse_count("NaN"), 0.0);
        assert_eq!(parse_count("inf"), 0.0);
        assert_eq!(parse_count(" 2.5 "), 2.5);
    }
}

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Coverage {
    pub statements: CoverageMetric,
    pub branches: CoverageMetric,
    pub functions: CoverageMetric,
    pub lines: CoverageMetric,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageMetric {
    pub total: u64,
    pub covered: u64,
    /// Percent, two decimals. 100 when nothing is coverable.
    pub pct: f64,
}

impl CoverageMetric {
    fn add(&mut self, total: u64, covered: u64) {
        self.total += total;
        self.covered += covered;
    }

    fn finish(&mut self) {
        self.pct = if self.total == 0 {
            100.0
        } else {
            (self.covered as f64 * 10_000.0 / self.total as f64).round() / 100.0
        };
    }
}

impl Coverage {
    /// Summarise an istanbul coverage map (`{ "<file>": FileCoverage, ... }`).
    /// Returns None when the value has no recognizable file entries.
    pub fn from_istanbul(map: &Value) -> Option<Self> {
        // Some reporters wrap the map as `{ "data": {...} }` per file.
        let files = map.as_object()?;
        let mut coverage = Coverage::default();
        let mut seen = 0usize;

        for entry in files.values() {
            let file = entry.get("data").unwrap_or(entry);
            let Some(file) = file.as_object() else {
                continue;
            };
            if !file.contains_key("s") {
                continue;
            }
            seen += 1;

            let (total, covered) = count_hits(file.get("s"));
            coverage.statements.add(total, covered);

            let (total, covered) = count_hits(file.get("f"));
            coverage.functions.add(total, covered);

            if let Some(branches) = file.get("b").and_then(Value::as_object) {
                for arms in branches.values().filter_map(Value::as_array) {
                    let hit = arms.iter().filter(|n| n.as_u64().unwrap_or(0) > 0).count();
                    coverage.branches.add(arms.len() as u64, hit as u64);
                }
            }

            let (total, covered) = count_lines(file);
            coverage.lines.add(total, covered);
        }

        if seen == 0 {
            return None;
        }
        coverage.statements.finish();
        coverage.branches.finish();
        coverage.functions.finish();
        coverage.lines.finish();
        Some(coverage)
    }
}

fn count_hits(counts: Option<&Value>) -> (u64, u64) {
    let Some(counts) = counts.and_then(Value::as_object) else {
        return (0, 0);
    };
    let covered = counts
        .values()
        .filter(|n| n.as_u64().unwrap_or(0) > 0)
        .count();
    (counts.len() as u64, covered as u64)
}

/// A line is covered when any statement starting on it ran.
fn count_lines(file: &serde_json::Map<String, Value>) -> (u64, u64) {
    let (Some(map), Some(hits)) = (
        file.get("statementMap").and_then(Value::as_object),
        file.get("s").and_then(Value::as_object),
    ) else {
        return (0, 0);
    };

    let mut lines = BTreeSet::new();
    let mut covered = BTreeSet::new();
    for (id, location) in map {
        let Some(line) = location.pointer("/start/line").and_then(Value::as_u64) else {
            continue;
        };
        lines.insert(line);
        if hits.get(id).and_then(Value::as_u64).unwrap_or(0) > 0 {
            covered.insert(line);
        }
    }
    (lines.len() as u64, covered.len() as u64)
}

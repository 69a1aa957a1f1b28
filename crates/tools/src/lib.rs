use std::collections::BTreeMap;
use std::fmt;

use formats::{GridSnapshot, TopologySnapshot};
use scene::{GridRecord, HitIndexSet};
use serde::Serialize;

/// Web Mercator's usable extent, `[west, south, east, north]`.
pub const WORLD_BBOX: [f64; 4] = [-180.0, -85.051_128_78, 180.0, 85.051_128_78];

/// Human-oriented overview of a decoded payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    pub cells: usize,
    pub ids: usize,
    pub deleted: usize,
    /// Cell count per level, ascending by level.
    pub per_level: BTreeMap<u8, usize>,
    pub min_id: Option<u32>,
    pub max_id: Option<u32>,
}

impl SnapshotSummary {
    pub fn of(snapshot: &GridSnapshot) -> Self {
        let mut per_level = BTreeMap::new();
        for &level in &snapshot.levels {
            *per_level.entry(level).or_insert(0) += 1;
        }
        Self {
            cells: snapshot.levels.len(),
            ids: snapshot.global_ids.len(),
            deleted: 0,
            per_level,
            min_id: snapshot.global_ids.iter().copied().min(),
            max_id: snapshot.global_ids.iter().copied().max(),
        }
    }

    pub fn of_topology(topology: &TopologySnapshot) -> Self {
        Self {
            deleted: topology.deleted_count(),
            ..Self::of(&topology.to_grid_snapshot())
        }
    }
}

impl fmt::Display for SnapshotSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cells:   {}", self.cells)?;
        writeln!(f, "ids:     {}", self.ids)?;
        if self.deleted > 0 {
            writeln!(f, "deleted: {}", self.deleted)?;
        }
        if let (Some(min), Some(max)) = (self.min_id, self.max_id) {
            writeln!(f, "id range: {min}..={max}")?;
        }
        if self.cells != self.ids {
            writeln!(f, "warning: level and id counts differ")?;
        }
        for (level, count) in &self.per_level {
            writeln!(f, "  level {level:>3}: {count}")?;
        }
        Ok(())
    }
}

/// Hit set over a snapshot's ordinals with every `deleted` cell marked.
pub fn deleted_hits(topology: &TopologySnapshot) -> HitIndexSet {
    let capacity = u32::try_from(topology.len()).unwrap_or(u32::MAX);
    let mut hits = HitIndexSet::new(capacity);
    hits.replace_all(
        (0..capacity).filter(|&ordinal| topology.is_deleted(ordinal as usize)),
    );
    hits
}

/// Parses a subdivision rule written as `COLSxROWS`, e.g. `2x2`.
pub fn parse_rule(s: &str) -> Result<[u32; 2], String> {
    let (cols, rows) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected COLSxROWS, got {s:?}"))?;
    let parse = |v: &str| v.trim().parse::<u32>().map_err(|e| format!("{v:?}: {e}"));
    Ok([parse(cols)?, parse(rows)?])
}

/// Where a cell sits in the grid hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellReport {
    pub level: u8,
    pub global_id: u32,
    pub local_id: Option<u32>,
    pub parent: Option<u32>,
    pub children: Option<Vec<u32>>,
}

impl CellReport {
    pub fn of(record: &GridRecord, level: u8, global_id: u32) -> Self {
        Self {
            level,
            global_id,
            local_id: record.local_id(level, global_id),
            parent: record.parent_global_id(level, global_id),
            children: record.children(level, global_id),
        }
    }
}

impl fmt::Display for CellReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cell:     ({}, {})", self.level, self.global_id)?;
        match self.local_id {
            Some(local) => writeln!(f, "local id: {local}")?,
            None => writeln!(f, "level {} is not in the grid", self.level)?,
        }
        if let Some(parent) = self.parent {
            writeln!(f, "parent:   ({}, {parent})", self.level - 1)?;
        }
        if let Some(children) = &self.children {
            writeln!(f, "children: {children:?}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CellReport, SnapshotSummary, WORLD_BBOX, deleted_hits, parse_rule};
    use formats::{GridSnapshot, TopologySnapshot};
    use scene::{GridContext, GridRecord};

    #[test]
    fn summary_counts_levels_and_id_range() {
        let snap = GridSnapshot::new(vec![2, 1, 2, 2], vec![40, 3, 41, 42]);
        let summary = SnapshotSummary::of(&snap);
        assert_eq!(summary.cells, 4);
        assert_eq!(summary.per_level.get(&2), Some(&3));
        assert_eq!(summary.per_level.get(&1), Some(&1));
        assert_eq!((summary.min_id, summary.max_id), (Some(3), Some(42)));

        let text = summary.to_string();
        assert!(text.contains("id range: 3..=42"));
        assert!(!text.contains("warning"));
    }

    #[test]
    fn summary_flags_ragged_payloads() {
        let summary = SnapshotSummary::of(&GridSnapshot::new(vec![1, 2, 3, 4, 5], vec![10, 11]));
        assert!(summary.to_string().contains("warning: level and id counts differ"));
    }

    #[test]
    fn empty_summary_has_no_range() {
        let summary = SnapshotSummary::of(&GridSnapshot::default());
        assert_eq!(summary.min_id, None);
        assert!(!summary.to_string().contains("id range"));
    }

    #[test]
    fn deleted_cells_become_hits() {
        let topo = TopologySnapshot::combine(
            GridSnapshot::new(vec![1, 1], vec![0, 1]),
            GridSnapshot::new(vec![2, 2], vec![8, 9]),
        );
        let hits = deleted_hits(&topo);
        assert_eq!(hits.snapshot(), vec![2, 3]);
        assert_eq!(SnapshotSummary::of_topology(&topo).deleted, 2);
    }

    #[test]
    fn rules_parse_from_cols_by_rows() {
        assert_eq!(parse_rule("2x3"), Ok([2, 3]));
        assert_eq!(parse_rule("4X4"), Ok([4, 4]));
        assert!(parse_rule("4").is_err());
        assert!(parse_rule("ax2").is_err());
    }

    #[test]
    fn cell_report_walks_the_hierarchy() {
        let record = GridRecord::new(GridContext::new(WORLD_BBOX, vec![[2, 2], [2, 2], [1, 1]])).unwrap();
        let report = CellReport::of(&record, 1, 3);
        assert_eq!(report.local_id, Some(3));
        assert_eq!(report.parent, Some(0));
        assert_eq!(report.children, Some(vec![10, 11, 14, 15]));

        let text = report.to_string();
        assert!(text.contains("parent:   (0, 0)"));
        assert!(text.contains("children: [10, 11, 14, 15]"));

        let root = CellReport::of(&record, 0, 0);
        assert_eq!(root.parent, None);
        assert!(!root.to_string().contains("parent"));
    }
}

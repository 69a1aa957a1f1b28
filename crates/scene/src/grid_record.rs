//! Client-side registry of the grid cells currently held by a layer.
//!
//! Cells are addressed three ways:
//! - `(level, global_id)`: the server's identity for a cell
//! - storage ordinal: dense slot index shared by GPU buffers and `HitIndexSet`
//! - `local_id`: position of a cell among its parent's children
//!
//! Ordinals are assigned in decode order and kept dense. Removing a cell
//! moves the last cell into the freed slot, so at most one other ordinal
//! changes per removal.

use std::collections::HashMap;

use formats::TopologySnapshot;
use foundation::math::{MercatorCoordinate, Vec2};
use thiserror::Error;

use crate::camera::PrecisionCameraTransform;

/// Grid extent and subdivision rules.
///
/// `rules[l]` is `[columns, rows]`: how many children a level-`l` cell splits
/// into along x and y. Level 0 is a single root cell covering `bbox`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridContext {
    /// `[west, south, east, north]` in degrees.
    pub bbox: [f64; 4],
    pub rules: Vec<[u32; 2]>,
}

impl GridContext {
    pub fn new(bbox: [f64; 4], rules: Vec<[u32; 2]>) -> Self {
        Self { bbox, rules }
    }

    /// Mercator center of the bbox, the natural camera-relative origin.
    pub fn mercator_center(&self) -> Vec2 {
        let [west, south, east, north] = self.bbox;
        let sw = MercatorCoordinate::from_lng_lat(west, south, 0.0);
        let ne = MercatorCoordinate::from_lng_lat(east, north, 0.0);
        Vec2::new((sw.x + ne.x) * 0.5, (sw.y + ne.y) * 0.5)
    }
}

/// Cells per row and column at one level.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LevelInfo {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridRecordError {
    #[error("grid needs at least one subdivision rule")]
    NoRules,
    #[error("rule for level {level} has a zero dimension: {rule:?}")]
    EmptyRule { level: usize, rule: [u32; 2] },
    #[error("level {level} has more cells than a u32 global id can address")]
    LevelTooWide { level: usize },
    #[error("snapshot has {levels} levels, {ids} ids and {flags} deleted flags")]
    RaggedSnapshot {
        levels: usize,
        ids: usize,
        flags: usize,
    },
    #[error("cell ({level}, {global_id}) is outside the grid")]
    OutOfGrid { level: u8, global_id: u32 },
    #[error("cell ({level}, {global_id}) is already registered at ordinal {ordinal}")]
    Duplicate {
        level: u8,
        global_id: u32,
        ordinal: u32,
    },
}

/// Everything known about one registered cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GridInfo {
    pub ordinal: u32,
    pub level: u8,
    pub global_id: u32,
    pub local_id: u32,
    pub deleted: bool,
}

/// Result of `GridRecord::remove`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Removal {
    pub level: u8,
    pub global_id: u32,
    /// Ordinal of the cell that was moved into the freed slot, if any.
    /// After the call that cell lives at the removed ordinal.
    pub moved_from: Option<u32>,
}

/// Camera-relative corners of a cell, ordered top-left, top-right,
/// bottom-left, bottom-right.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct CellVertices {
    pub high: [[f32; 2]; 4],
    pub low: [[f32; 2]; 4],
}

#[derive(Debug, Clone)]
pub struct GridRecord {
    context: GridContext,
    level_infos: Vec<LevelInfo>,
    levels: Vec<u8>,
    global_ids: Vec<u32>,
    deleted: Vec<bool>,
    ordinals: HashMap<(u8, u32), u32>,
}

impl GridRecord {
    pub fn new(context: GridContext) -> Result<Self, GridRecordError> {
        let level_infos = level_infos(&context.rules)?;
        Ok(Self {
            context,
            level_infos,
            levels: Vec::new(),
            global_ids: Vec::new(),
            deleted: Vec::new(),
            ordinals: HashMap::new(),
        })
    }

    pub fn from_topology(
        context: GridContext,
        topology: &TopologySnapshot,
    ) -> Result<Self, GridRecordError> {
        let mut record = Self::new(context)?;
        record.add_topology(topology)?;
        Ok(record)
    }

    pub fn context(&self) -> &GridContext {
        &self.context
    }

    pub fn level_info(&self, level: u8) -> Option<LevelInfo> {
        self.level_infos.get(level as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Appends every cell of `topology`. Returns the ordinal of the first new
    /// cell. Nothing is added if any cell is rejected.
    pub fn add_topology(&mut self, topology: &TopologySnapshot) -> Result<u32, GridRecordError> {
        let (levels, ids, flags) = (
            topology.levels.len(),
            topology.global_ids.len(),
            topology.deleted.len(),
        );
        if levels != ids || levels != flags {
            return Err(GridRecordError::RaggedSnapshot { levels, ids, flags });
        }

        let first = self.len() as u32;
        let mut batch = HashMap::with_capacity(levels);
        let cells = topology.levels.iter().zip(&topology.global_ids);
        for (i, (&level, &global_id)) in cells.enumerate() {
            self.check_in_grid(level, global_id)?;
            let ordinal = first + i as u32;
            let existing = self
                .ordinals
                .get(&(level, global_id))
                .copied()
                .or_else(|| batch.insert((level, global_id), ordinal));
            if let Some(existing) = existing {
                return Err(GridRecordError::Duplicate {
                    level,
                    global_id,
                    ordinal: existing,
                });
            }
        }

        self.ordinals.extend(batch);
        self.levels.extend_from_slice(&topology.levels);
        self.global_ids.extend_from_slice(&topology.global_ids);
        self.deleted.extend((0..levels).map(|i| topology.is_deleted(i)));
        Ok(first)
    }

    /// Swap-removes the cell at `ordinal`.
    pub fn remove(&mut self, ordinal: u32) -> Option<Removal> {
        let index = ordinal as usize;
        if index >= self.len() {
            return None;
        }
        let last = self.len() - 1;

        let level = self.levels.swap_remove(index);
        let global_id = self.global_ids.swap_remove(index);
        self.deleted.swap_remove(index);
        self.ordinals.remove(&(level, global_id));

        let moved_from = (index != last).then(|| {
            self.ordinals
                .insert((self.levels[index], self.global_ids[index]), ordinal);
            last as u32
        });
        Some(Removal {
            level,
            global_id,
            moved_from,
        })
    }

    pub fn ordinal_of(&self, level: u8, global_id: u32) -> Option<u32> {
        self.ordinals.get(&(level, global_id)).copied()
    }

    /// `(level, global_id)` stored at `ordinal`.
    pub fn cell(&self, ordinal: u32) -> Option<(u8, u32)> {
        let i = ordinal as usize;
        Some((*self.levels.get(i)?, *self.global_ids.get(i)?))
    }

    pub fn is_deleted(&self, ordinal: u32) -> bool {
        self.deleted.get(ordinal as usize).copied().unwrap_or(false)
    }

    /// Flags a cell deleted or recovered. Returns `false` for unknown ordinals.
    pub fn set_deleted(&mut self, ordinal: u32, deleted: bool) -> bool {
        match self.deleted.get_mut(ordinal as usize) {
            Some(flag) => {
                *flag = deleted;
                true
            }
            None => false,
        }
    }

    pub fn info(&self, ordinal: u32) -> Option<GridInfo> {
        let (level, global_id) = self.cell(ordinal)?;
        Some(GridInfo {
            ordinal,
            level,
            global_id,
            local_id: self.local_id(level, global_id)?,
            deleted: self.is_deleted(ordinal),
        })
    }

    /// Global ids of the children of a cell, row by row from the parent's
    /// first column. `None` at the deepest level or outside the grid.
    pub fn children(&self, level: u8, global_id: u32) -> Option<Vec<u32>> {
        let (u, v) = self.uv(level, global_id)?;
        let child = self.level_info(level.checked_add(1)?)?;
        let [sub_w, sub_h] = self.context.rules[level as usize];
        let mut out = Vec::with_capacity((sub_w * sub_h) as usize);
        for sub_v in 0..sub_h {
            for sub_u in 0..sub_w {
                out.push((v * sub_h + sub_v) * child.width + u * sub_w + sub_u);
            }
        }
        Some(out)
    }

    /// Global id of the parent at `level - 1`. `None` for the root level.
    pub fn parent_global_id(&self, level: u8, global_id: u32) -> Option<u32> {
        let (u, v) = self.uv(level, global_id)?;
        let parent = self.level_info(level.checked_sub(1)?)?;
        let [sub_w, sub_h] = self.context.rules[level as usize - 1];
        Some((v / sub_h) * parent.width + u / sub_w)
    }

    /// Index of a cell among its siblings, matching the order of `children`.
    pub fn local_id(&self, level: u8, global_id: u32) -> Option<u32> {
        let (u, v) = self.uv(level, global_id)?;
        if level == 0 {
            return Some(0);
        }
        let [sub_w, sub_h] = self.context.rules[level as usize - 1];
        Some((v % sub_h) * sub_w + u % sub_w)
    }

    /// Corners of the cell at `ordinal`, encoded against the camera's current
    /// center.
    pub fn cell_vertices(
        &self,
        ordinal: u32,
        camera: &PrecisionCameraTransform,
    ) -> Option<CellVertices> {
        let (level, global_id) = self.cell(ordinal)?;
        let info = self.level_info(level)?;
        let [west, south, east, north] = self.context.bbox;
        let (u, v) = (global_id % info.width, global_id / info.width);

        let lng = |step: u32| lerp(west, east, step as f64 / info.width as f64);
        let lat = |step: u32| lerp(south, north, step as f64 / info.height as f64);
        let (x_min, x_max) = (lng(u), lng(u + 1));
        let (y_min, y_max) = (lat(v), lat(v + 1));

        let mut out = CellVertices::default();
        let corners = [(x_min, y_max), (x_max, y_max), (x_min, y_min), (x_max, y_min)];
        for (i, (lng, lat)) in corners.into_iter().enumerate() {
            let m = MercatorCoordinate::from_lng_lat(lng, lat, 0.0);
            let (high, low) = camera.encode_vertex(Vec2::new(m.x, m.y));
            out.high[i] = high;
            out.low[i] = low;
        }
        Some(out)
    }

    /// Column and row of a cell within its level.
    fn uv(&self, level: u8, global_id: u32) -> Option<(u32, u32)> {
        let info = self.level_info(level)?;
        (global_id < info.width * info.height)
            .then(|| (global_id % info.width, global_id / info.width))
    }

    fn check_in_grid(&self, level: u8, global_id: u32) -> Result<(), GridRecordError> {
        self.uv(level, global_id)
            .map(|_| ())
            .ok_or(GridRecordError::OutOfGrid { level, global_id })
    }
}

fn level_infos(rules: &[[u32; 2]]) -> Result<Vec<LevelInfo>, GridRecordError> {
    if rules.is_empty() {
        return Err(GridRecordError::NoRules);
    }
    // Level ids are u8.
    if rules.len() > u8::MAX as usize + 1 {
        return Err(GridRecordError::LevelTooWide { level: u8::MAX as usize + 1 });
    }
    let empty = rules.iter().position(|r| r[0] == 0 || r[1] == 0);
    if let Some(level) = empty {
        return Err(GridRecordError::EmptyRule {
            level,
            rule: rules[level],
        });
    }

    // One level per rule. The last rule only matters to a deeper level that
    // is not addressable, so it never produces a level of its own.
    let mut infos = Vec::with_capacity(rules.len());
    infos.push(LevelInfo {
        width: 1,
        height: 1,
    });
    for (level, &rule) in rules.iter().enumerate().take(rules.len() - 1) {
        let prev = infos[level];
        let next = prev
            .width
            .checked_mul(rule[0])
            .zip(prev.height.checked_mul(rule[1]))
            .filter(|(w, h)| w.checked_mul(*h).is_some())
            .ok_or(GridRecordError::LevelTooWide { level: level + 1 })?;
        infos.push(LevelInfo {
            width: next.0,
            height: next.1,
        });
    }
    Ok(infos)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

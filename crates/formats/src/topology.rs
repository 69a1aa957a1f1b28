use serde::{Deserialize, Serialize};

use crate::grid_binary::GridSnapshot;

pub const UNDELETED_FLAG: u8 = 0;
pub const DELETED_FLAG: u8 = 1;

/// Active and deleted cells of an editing session, with a per-cell flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub levels: Vec<u8>,
    pub global_ids: Vec<u32>,
    /// `DELETED_FLAG` or `UNDELETED_FLAG`, one per level.
    pub deleted: Vec<u8>,
}

impl TopologySnapshot {
    /// Every cell of `active` marked undeleted.
    pub fn from_active(active: GridSnapshot) -> Self {
        let deleted = vec![UNDELETED_FLAG; active.levels.len()];
        Self {
            levels: active.levels,
            global_ids: active.global_ids,
            deleted,
        }
    }

    /// Active cells first (undeleted), then deleted cells.
    pub fn combine(active: GridSnapshot, deleted: GridSnapshot) -> Self {
        let mut levels = Vec::with_capacity(active.levels.len() + deleted.levels.len());
        levels.extend_from_slice(&active.levels);
        levels.extend_from_slice(&deleted.levels);

        let mut global_ids =
            Vec::with_capacity(active.global_ids.len() + deleted.global_ids.len());
        global_ids.extend_from_slice(&active.global_ids);
        global_ids.extend_from_slice(&deleted.global_ids);

        let mut flags = vec![UNDELETED_FLAG; levels.len()];
        flags[active.levels.len()..].fill(DELETED_FLAG);

        Self {
            levels,
            global_ids,
            deleted: flags,
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn is_deleted(&self, ordinal: usize) -> bool {
        self.deleted.get(ordinal) == Some(&DELETED_FLAG)
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted.iter().filter(|&&f| f == DELETED_FLAG).count()
    }

    /// Cells with the flag stripped, e.g. for re-encoding to the wire format.
    pub fn to_grid_snapshot(&self) -> GridSnapshot {
        GridSnapshot::new(self.levels.clone(), self.global_ids.clone())
    }
}

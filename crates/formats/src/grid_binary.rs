//! Grid snapshot wire format.
//!
//! Little-endian throughout:
//!
//! ```text
//! offset 0        u32      N, number of level bytes
//! offset 4        u8[N]    level per cell
//! offset 4+N      pad      zero bytes up to the next 4-byte boundary
//! offset aligned  u32[..]  global ids, to the end of the buffer
//! ```
//!
//! The id array carries no length of its own; it is whatever follows the
//! aligned offset.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size of the `N` prefix.
pub const HEADER_LEN: usize = 4;

/// Decoded cells of one payload. Both arrays share the cell ordinal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub levels: Vec<u8>,
    pub global_ids: Vec<u32>,
}

impl GridSnapshot {
    pub fn new(levels: Vec<u8>, global_ids: Vec<u32>) -> Self {
        Self { levels, global_ids }
    }

    /// Number of cells, as declared by the level array.
    ///
    /// Ids past the last level are carried in `global_ids` but are not
    /// cells, so a zero-count payload with trailing ids has length 0.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// `len() == 0`. Check `global_ids` directly for trailing ids.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// `(level, global_id)` pairs, up to the shorter of the two arrays.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.levels
            .iter()
            .copied()
            .zip(self.global_ids.iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Malformation {
    #[error("{len} bytes is shorter than the 4-byte header")]
    TooShort { len: usize },
    #[error("{count} levels align to offset {aligned_offset}, past the {len}-byte buffer")]
    LevelsOutOfBounds {
        count: u32,
        aligned_offset: u64,
        len: usize,
    },
    #[error("{remaining} id bytes after the aligned offset are not a multiple of 4")]
    MisalignedIds { remaining: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridCodecError {
    #[error("malformed grid payload: {0}")]
    MalformedPayload(Malformation),
    #[error("grid snapshot has {count} cells, more than a u32 count can describe")]
    TooManyCells { count: usize },
}

impl From<Malformation> for GridCodecError {
    fn from(m: Malformation) -> Self {
        GridCodecError::MalformedPayload(m)
    }
}

/// Zero bytes written after `n` level bytes: `(4 - (n % 4 || 4)) % 4`.
///
/// The inner `|| 4` maps a zero remainder to 4, so `n = 0` pads 0 bytes,
/// like every other multiple of 4.
pub fn padding(n: u32) -> usize {
    let rem = match n % 4 {
        0 => 4,
        r => r,
    };
    ((4 - rem) % 4) as usize
}

/// Byte offset of the id array for `n` levels, or `None` when it does not
/// fit in `usize`.
pub fn aligned_offset(n: u32) -> Option<usize> {
    usize::try_from(n)
        .ok()?
        .checked_add(HEADER_LEN + padding(n))
}

fn wire_offset(n: u32) -> u64 {
    HEADER_LEN as u64 + u64::from(n) + padding(n) as u64
}

pub fn decode(bytes: &[u8]) -> Result<GridSnapshot, GridCodecError> {
    if bytes.len() < HEADER_LEN {
        return Err(Malformation::TooShort { len: bytes.len() }.into());
    }

    let count = read_u32_le(bytes, 0);
    let offset = aligned_offset(count)
        .filter(|&offset| offset <= bytes.len())
        .ok_or(Malformation::LevelsOutOfBounds {
            count,
            aligned_offset: wire_offset(count),
            len: bytes.len(),
        })?;

    let id_bytes = &bytes[offset..];
    if id_bytes.len() % 4 != 0 {
        return Err(Malformation::MisalignedIds {
            remaining: id_bytes.len(),
        }
        .into());
    }

    // offset >= HEADER_LEN + count, and offset is in bounds.
    let levels = bytes[HEADER_LEN..offset - padding(count)].to_vec();
    let global_ids = id_bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    Ok(GridSnapshot { levels, global_ids })
}

/// Like `decode`, but a body too short to hold the header is an empty
/// snapshot ("no data") rather than an error.
pub fn decode_or_empty(bytes: &[u8]) -> Result<GridSnapshot, GridCodecError> {
    if bytes.len() < HEADER_LEN {
        return Ok(GridSnapshot::default());
    }
    decode(bytes)
}

pub fn encode(snapshot: &GridSnapshot) -> Result<Vec<u8>, GridCodecError> {
    let count = u32::try_from(snapshot.levels.len()).map_err(|_| GridCodecError::TooManyCells {
        count: snapshot.levels.len(),
    })?;

    let too_many = || GridCodecError::TooManyCells {
        count: snapshot.levels.len(),
    };
    let offset = aligned_offset(count).ok_or_else(too_many)?;
    let total = snapshot
        .global_ids
        .len()
        .checked_mul(4)
        .and_then(|ids| ids.checked_add(offset))
        .ok_or_else(too_many)?;
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&snapshot.levels);
    out.resize(offset, 0);
    for id in &snapshot.global_ids {
        out.extend_from_slice(&id.to_le_bytes());
    }
    Ok(out)
}

fn read_u32_le(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

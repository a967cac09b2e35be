//! Static table of the nine rotatable regions.
//!
//! The 15x15 interior is tiled by 5x5 squares, numbered 1..=9 in row-major
//! order. Outer-ring cells belong to no region.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::maze::Coords;

/// Side length of every region.
pub const REGION_SIZE: i32 = 5;

/// Regions per row and per column.
const REGIONS_PER_SIDE: i32 = 3;

/// Region identifier, 1..=9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(u8);

impl RegionId {
    pub const ALL: [RegionId; 9] = [
        RegionId(1),
        RegionId(2),
        RegionId(3),
        RegionId(4),
        RegionId(5),
        RegionId(6),
        RegionId(7),
        RegionId(8),
        RegionId(9),
    ];

    pub fn new(id: u8) -> Option<RegionId> {
        (1..=9).contains(&id).then_some(RegionId(id))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// (column, row) of the region in the 3x3 region layout.
    fn slot(self) -> (i32, i32) {
        let index = self.0 as i32 - 1;
        (index % REGIONS_PER_SIDE, index / REGIONS_PER_SIDE)
    }

    fn from_slot(column: i32, row: i32) -> Option<RegionId> {
        if (0..REGIONS_PER_SIDE).contains(&column) && (0..REGIONS_PER_SIDE).contains(&row) {
            RegionId::new((row * REGIONS_PER_SIDE + column + 1) as u8)
        } else {
            None
        }
    }

    /// Top-left cell of the region.
    pub fn origin(self) -> Coords {
        let (column, row) = self.slot();
        Coords::new(1 + column * REGION_SIZE, 1 + row * REGION_SIZE)
    }

    pub fn contains(self, pos: Coords) -> bool {
        let origin = self.origin();
        (origin.x..origin.x + REGION_SIZE).contains(&pos.x)
            && (origin.y..origin.y + REGION_SIZE).contains(&pos.y)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region {}", self.0)
    }
}

/// Region covering `pos`, if any.
pub fn region_of(pos: Coords) -> Option<RegionId> {
    if pos.x < 1 || pos.y < 1 {
        return None;
    }
    let column = (pos.x - 1) / REGION_SIZE;
    let row = (pos.y - 1) / REGION_SIZE;
    RegionId::from_slot(column, row)
}

/// The region lying halfway between two regions that are two slots apart
/// along a row, a column or a diagonal.
pub fn between(a: RegionId, b: RegionId) -> Option<RegionId> {
    let (ac, ar) = a.slot();
    let (bc, br) = b.slot();
    let (dc, dr) = ((bc - ac).abs(), (br - ar).abs());
    if (dc, dr) != (2, 0) && (dc, dr) != (0, 2) && (dc, dr) != (2, 2) {
        return None;
    }
    RegionId::from_slot((ac + bc) / 2, (ar + br) / 2)
}

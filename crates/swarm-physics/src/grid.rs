//! Square grid layout backing the particle buffers
//!
//! Particles live in an `S x S` table so they can be addressed by a 2D
//! coordinate. The mapping `index = row * S + col` is fixed at creation and is
//! shared by every buffer.

/// Smallest power-of-two side `S >= 2` with `S * S >= count`.
///
/// The search starts at 2 and doubles while the square is too small, so a
/// single particle still gets a 2x2 grid.
pub fn grid_side(count: u32) -> u32 {
    let count = u64::from(count);
    let mut side: u64 = 2;
    while side * side < count {
        side *= 2;
    }
    side as u32
}

/// Grid cell of a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCoord {
    pub row: u32,
    pub col: u32,
}

/// Population size plus the grid that stores it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    count: u32,
    side: u32,
}

impl GridLayout {
    pub fn new(count: u32) -> Self {
        Self {
            count,
            side: grid_side(count),
        }
    }

    /// Number of live particles `N`
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Grid side `S`
    pub fn side(&self) -> u32 {
        self.side
    }

    /// Number of records in each buffer, `S * S`
    pub fn capacity(&self) -> usize {
        self.side as usize * self.side as usize
    }

    pub fn is_active(&self, index: usize) -> bool {
        index < self.count as usize
    }

    pub fn coord(&self, index: u32) -> GridCoord {
        GridCoord {
            row: index / self.side,
            col: index % self.side,
        }
    }

    pub fn index(&self, coord: GridCoord) -> u32 {
        coord.row * self.side + coord.col
    }

    /// Workgroups per axis for a square `workgroup_size x workgroup_size` dispatch
    pub fn workgroups(&self, workgroup_size: u32) -> u32 {
        self.side.div_ceil(workgroup_size)
    }
}

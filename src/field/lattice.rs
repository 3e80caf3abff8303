/// Hexagonal-prism lattice geometry.
///
/// Cells are addressed by axial in-plane coordinates `(i, j)` plus a layer
/// index `k`. Each cell has six in-plane neighbors and two vertical ones.
/// Buffers are flat with `x` varying fastest: `idx = (k * Y + j) * X + i`.
use crate::constants::SQRT_3;
use crate::error::{Result, SimError};
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Axial offsets of the in-plane ring, counter-clockwise starting at 30 degrees.
pub const IN_PLANE_OFFSETS: [(i64, i64); 6] = [(1, 0), (0, 1), (-1, 1), (-1, 0), (0, -1), (1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    InPlane(usize),
    Up,
    Down,
}

pub const DIRECTIONS: [Direction; 8] = [
    Direction::InPlane(0),
    Direction::InPlane(1),
    Direction::InPlane(2),
    Direction::InPlane(3),
    Direction::InPlane(4),
    Direction::InPlane(5),
    Direction::Up,
    Direction::Down,
];

impl Direction {
    pub fn offset(self) -> (i64, i64, i64) {
        match self {
            Direction::InPlane(n) => {
                let (di, dj) = IN_PLANE_OFFSETS[n];
                (di, dj, 0)
            }
            Direction::Up => (0, 0, 1),
            Direction::Down => (0, 0, -1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::InPlane(n) => Direction::InPlane((n + 3) % 6),
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }
}

/// Voxel counts along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Dimensions {
    pub fn new(x: usize, y: usize, z: usize) -> Result<Self> {
        if x == 0 || y == 0 || z == 0 {
            return Err(SimError::validation(format!(
                "grid dimensions must be positive, got {}x{}x{}",
                x, y, z
            )));
        }
        Ok(Self { x, y, z })
    }

    pub fn cell_count(&self) -> usize {
        self.x * self.y * self.z
    }

    /// Number of cells in one horizontal layer.
    pub fn layer_len(&self) -> usize {
        self.x * self.y
    }

    /// Seed centre; the mesh and cartesian sampling are relative to it.
    pub fn centre(&self) -> (usize, usize, usize) {
        (self.x / 2, self.y / 2, self.z / 2)
    }

    pub fn contains(&self, x: i64, y: i64, z: i64) -> bool {
        x >= 0 && y >= 0 && z >= 0 && (x as usize) < self.x && (y as usize) < self.y && (z as usize) < self.z
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.y + y) * self.x + x
    }

    pub fn checked_index(&self, x: i64, y: i64, z: i64) -> Result<usize> {
        if !self.contains(x, y, z) {
            return Err(SimError::Bounds {
                x,
                y,
                z,
                nx: self.x,
                ny: self.y,
                nz: self.z,
            });
        }
        Ok(self.index(x as usize, y as usize, z as usize))
    }

    #[inline]
    pub fn coords(&self, idx: usize) -> (usize, usize, usize) {
        let x = idx % self.x;
        let rest = idx / self.x;
        (x, rest % self.y, rest / self.y)
    }

    /// Flat index of the neighbor in `dir`, or `None` past the lattice edge.
    #[inline]
    pub fn neighbor(&self, x: usize, y: usize, z: usize, dir: Direction) -> Option<usize> {
        let (dx, dy, dz) = dir.offset();
        let (nx, ny, nz) = (x as i64 + dx, y as i64 + dy, z as i64 + dz);
        if self.contains(nx, ny, nz) {
            Some(self.index(nx as usize, ny as usize, nz as usize))
        } else {
            None
        }
    }
}

/// Hexagonal distance of an axial offset from the origin.
pub fn hex_distance(di: i64, dj: i64) -> i64 {
    di.abs().max(dj.abs()).max((di + dj).abs())
}

/// Cartesian position of a (possibly fractional) lattice coordinate.
pub fn axial_to_cartesian(i: f64, j: f64, k: f64) -> DVec3 {
    DVec3::new(SQRT_3 / 2.0 * i, j + 0.5 * i, k)
}

/// Nearest lattice cell to a cartesian point, using cube-coordinate rounding.
pub fn cartesian_to_axial(p: DVec3) -> (i64, i64, i64) {
    let i = p.x * 2.0 / SQRT_3;
    let j = p.y - 0.5 * i;
    let h = -(i + j);

    let mut ri = i.round();
    let mut rj = j.round();
    let rh = h.round();

    let frac_i = (ri - i).abs();
    let frac_j = (rj - j).abs();
    let frac_h = (rh - h).abs();

    if frac_i > frac_j && frac_i > frac_h {
        ri = -(rj + rh);
    } else if frac_j > frac_h {
        rj = -(ri + rh);
    }

    (ri as i64, rj as i64, p.z.round() as i64)
}

/// Corner `n` of the hexagon around axial `(i, j)`, in thirds of an axial unit.
///
/// Corner `n` sits between in-plane neighbors `n` and `n + 1`, at the centroid
/// of the three cells, so every corner shared by adjacent hexagons maps to the
/// same integer key.
pub fn hex_corner_key(i: i64, j: i64, n: usize) -> (i64, i64) {
    let (ai, aj) = IN_PLANE_OFFSETS[n % 6];
    let (bi, bj) = IN_PLANE_OFFSETS[(n + 1) % 6];
    (3 * i + ai + bi, 3 * j + aj + bj)
}

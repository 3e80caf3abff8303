use crate::constants::{DEFAULT_SEED_RADIUS, DEFAULT_SEED_THICKNESS};
use crate::error::{Result, SimError};
use crate::field::lattice::{hex_distance, Dimensions};
use crate::field::VoxelField;
use serde::{Deserialize, Serialize};

/// Hexagonal plate of ice placed at the centre of the field at time zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedCrystal {
    /// In-plane hex radius; radius 2 is a 19-cell hexagon.
    pub radius: u32,
    /// Layers spanned, centred on the middle layer; even thicknesses reach one layer lower.
    pub thickness: u32,
}

impl Default for SeedCrystal {
    fn default() -> Self {
        Self {
            radius: DEFAULT_SEED_RADIUS,
            thickness: DEFAULT_SEED_THICKNESS,
        }
    }
}

impl SeedCrystal {
    pub fn new(radius: u32, thickness: u32) -> Self {
        Self { radius, thickness }
    }

    /// Vertical offsets from the centre layer covered by the seed: `[-t/2, t - t/2)`.
    pub fn layer_range(&self) -> std::ops::Range<i64> {
        let t = self.thickness as i64;
        -(t / 2)..(t - t / 2)
    }

    /// Number of cells per layer of the seed hexagon.
    pub fn cells_per_layer(&self) -> usize {
        let r = self.radius as usize;
        3 * r * (r + 1) + 1
    }

    pub fn cell_count(&self) -> usize {
        self.cells_per_layer() * self.thickness as usize
    }

    /// True if a cell at this offset from the field centre belongs to the seed.
    pub fn contains_offset(&self, di: i64, dj: i64, dk: i64) -> bool {
        hex_distance(di, dj) <= self.radius as i64 && self.layer_range().contains(&dk)
    }

    pub fn validate(&self, dims: &Dimensions) -> Result<()> {
        if self.radius == 0 {
            return Err(SimError::validation("seed radius must be at least 1"));
        }
        if self.thickness == 0 {
            return Err(SimError::validation("seed thickness must be at least 1"));
        }
        // Keep at least one free cell between the seed and every lattice edge.
        let (cx, cy, cz) = dims.centre();
        let free_reach = |centre: usize, len: usize| (centre as i64 - 1).min(len as i64 - centre as i64 - 2);
        let max_radius = free_reach(cx, dims.x).min(free_reach(cy, dims.y));
        if self.radius as i64 > max_radius {
            return Err(SimError::validation(format!(
                "seed radius {} does not fit a {}x{} layer (max {})",
                self.radius,
                dims.x,
                dims.y,
                max_radius.max(0)
            )));
        }
        let layers = self.layer_range();
        if cz as i64 + layers.start < 1 || cz as i64 + layers.end > dims.z as i64 - 1 {
            return Err(SimError::validation(format!(
                "seed thickness {} leaves no free layer in a grid {} layers deep",
                self.thickness, dims.z
            )));
        }
        Ok(())
    }

    /// Freeze the seed cells of `field`; the sole write to occupancy outside the stepper.
    pub fn plant(&self, field: &mut VoxelField) -> Result<usize> {
        let dims = field.dims();
        self.validate(&dims)?;
        let (cx, cy, cz) = dims.centre();
        let r = self.radius as i64;

        let mut planted = 0;
        for dk in self.layer_range() {
            for dj in -r..=r {
                for di in -r..=r {
                    if !self.contains_offset(di, dj, dk) {
                        continue;
                    }
                    let idx = dims.checked_index(cx as i64 + di, cy as i64 + dj, cz as i64 + dk)?;
                    field.freeze_cell(idx);
                    planted += 1;
                }
            }
        }
        Ok(planted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plants_exactly_the_hexagon() {
        let dims = Dimensions::new(16, 16, 8).unwrap();
        let mut field = VoxelField::new(dims, 0.1);
        let seed = SeedCrystal::new(2, 1);
        let planted = seed.plant(&mut field).unwrap();
        assert_eq!(planted, 19);
        assert_eq!(field.occupied_count(), 19);

        let (cx, cy, cz) = dims.centre();
        for idx in 0..dims.cell_count() {
            let (x, y, z) = dims.coords(idx);
            let expected = seed.contains_offset(
                x as i64 - cx as i64,
                y as i64 - cy as i64,
                z as i64 - cz as i64,
            );
            assert_eq!(field.occupancy()[idx], expected, "cell ({}, {}, {})", x, y, z);
        }
    }

    #[test]
    fn thickness_is_centred_on_middle_layer() {
        assert_eq!(SeedCrystal::new(1, 1).layer_range(), 0..1);
        assert_eq!(SeedCrystal::new(1, 2).layer_range(), -1..1);
        assert_eq!(SeedCrystal::new(1, 3).layer_range(), -1..2);
        assert_eq!(SeedCrystal::new(1, 3).cell_count(), 21);
    }

    #[test]
    fn rejects_degenerate_geometry() {
        let dims = Dimensions::new(16, 16, 8).unwrap();
        assert!(SeedCrystal::new(0, 1).validate(&dims).is_err());
        assert!(SeedCrystal::new(2, 0).validate(&dims).is_err());
        assert!(SeedCrystal::new(7, 1).validate(&dims).is_err());
        assert!(SeedCrystal::new(6, 1).validate(&dims).is_ok());
        assert!(SeedCrystal::new(2, 6).validate(&dims).is_ok());
        assert!(SeedCrystal::new(2, 7).validate(&dims).is_err());

        let tiny = Dimensions::new(1, 1, 1).unwrap();
        assert!(SeedCrystal::new(1, 1).validate(&tiny).is_err());
    }
}

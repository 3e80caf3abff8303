use super::Mesh;
use crate::constants::SQRT_3;
use crate::field::lattice::{hex_corner_key, Dimensions, Direction};
use crate::field::VoxelField;
use glam::Vec3;
use std::collections::HashMap;

/// Corner position in exact integer units: thirds of an axial step in-plane,
/// half layers vertically.
type CornerKey = (i64, i64, i64);

/// Face-culling mesher over hexagonal prisms.
///
/// Every ice cell contributes the faces it shares with free space: a quad
/// (two triangles) per open side and a hexagon fan (four triangles) per open
/// top or bottom. Faces on the lattice edge count as open. Corners are welded
/// through their integer keys, so the surface is closed by construction.
/// Coordinates are centred on the seed.
pub struct HexPrismMesher {
    dims: Dimensions,
    centre: (i64, i64, i64),
    keys: HashMap<CornerKey, u32>,
    mesh: Mesh,
}

impl HexPrismMesher {
    pub fn new(dims: Dimensions) -> Self {
        let (cx, cy, cz) = dims.centre();
        Self {
            dims,
            centre: (cx as i64, cy as i64, cz as i64),
            keys: HashMap::new(),
            mesh: Mesh::new(),
        }
    }

    pub fn mesh_field(field: &VoxelField) -> Mesh {
        Self::new(field.dims()).build(field.occupancy())
    }

    pub fn build(mut self, occupancy: &[bool]) -> Mesh {
        let dims = self.dims;
        for (idx, _) in occupancy.iter().enumerate().filter(|(_, ice)| **ice) {
            let (x, y, z) = dims.coords(idx);
            let open = |dir: Direction| match dims.neighbor(x, y, z, dir) {
                Some(n) => !occupancy[n],
                None => true,
            };

            let i = x as i64 - self.centre.0;
            let j = y as i64 - self.centre.1;
            let k = z as i64 - self.centre.2;

            for side in 0..6 {
                if open(Direction::InPlane(side)) {
                    self.side_face(i, j, k, side);
                }
            }
            if open(Direction::Up) {
                self.cap(i, j, 2 * k + 1, true);
            }
            if open(Direction::Down) {
                self.cap(i, j, 2 * k - 1, false);
            }
        }
        log::debug!(
            "meshed {} ice cells into {} triangles",
            occupancy.iter().filter(|&&ice| ice).count(),
            self.mesh.triangle_count()
        );
        self.mesh
    }

    /// Quad between corners `side - 1` and `side`, the two corners bordering neighbor `side`.
    fn side_face(&mut self, i: i64, j: i64, k: i64, side: usize) {
        let (ai, aj) = hex_corner_key(i, j, (side + 5) % 6);
        let (bi, bj) = hex_corner_key(i, j, side);
        let p0b = self.vertex((ai, aj, 2 * k - 1));
        let p1b = self.vertex((bi, bj, 2 * k - 1));
        let p1t = self.vertex((bi, bj, 2 * k + 1));
        let p0t = self.vertex((ai, aj, 2 * k + 1));
        self.mesh.triangles.push([p0b, p1b, p1t]);
        self.mesh.triangles.push([p0b, p1t, p0t]);
    }

    /// Hexagon at half-layer height `hz`; corners run counter-clockwise seen from above.
    fn cap(&mut self, i: i64, j: i64, hz: i64, upward: bool) {
        let mut ring = [0u32; 6];
        for (n, slot) in ring.iter_mut().enumerate() {
            let (ci, cj) = hex_corner_key(i, j, n);
            *slot = self.vertex((ci, cj, hz));
        }
        for fan in 1..5 {
            if upward {
                self.mesh.triangles.push([ring[0], ring[fan], ring[fan + 1]]);
            } else {
                self.mesh.triangles.push([ring[0], ring[fan + 1], ring[fan]]);
            }
        }
    }

    fn vertex(&mut self, key: CornerKey) -> u32 {
        if let Some(&idx) = self.keys.get(&key) {
            return idx;
        }
        let idx = self.mesh.vertices.len() as u32;
        self.mesh.vertices.push(corner_position(key));
        self.keys.insert(key, idx);
        idx
    }
}

fn corner_position((ti, tj, hz): CornerKey) -> Vec3 {
    let i = ti as f64 / 3.0;
    let j = tj as f64 / 3.0;
    Vec3::new(
        (SQRT_3 / 2.0 * i) as f32,
        (j + 0.5 * i) as f32,
        (hz as f64 / 2.0) as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CELL_VOLUME;
    use approx::assert_relative_eq;

    fn occupancy_with(dims: Dimensions, cells: &[(usize, usize, usize)]) -> Vec<bool> {
        let mut occupancy = vec![false; dims.cell_count()];
        for &(x, y, z) in cells {
            occupancy[dims.index(x, y, z)] = true;
        }
        occupancy
    }

    #[test]
    fn single_prism() {
        let dims = Dimensions::new(5, 5, 5).unwrap();
        let mesh = HexPrismMesher::new(dims).build(&occupancy_with(dims, &[(2, 2, 2)]));
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.triangle_count(), 6 * 2 + 2 * 4);
        assert!(mesh.is_manifold());
        assert_relative_eq!(mesh.volume(), CELL_VOLUME, max_relative = 1e-5);
        assert_relative_eq!(mesh.surface_area(), 3.0 * 3f64.sqrt(), max_relative = 1e-5);
        for t in 0..mesh.triangle_count() {
            assert!(mesh.normal(t).length() > 0.99);
        }
    }

    #[test]
    fn shared_faces_are_culled() {
        let dims = Dimensions::new(5, 5, 5).unwrap();
        let mesh = HexPrismMesher::new(dims).build(&occupancy_with(dims, &[(2, 2, 2), (3, 2, 2), (2, 2, 3)]));
        // three prisms lose two side quads and one top/bottom pair
        assert_eq!(mesh.triangle_count(), 3 * 20 - 2 * 2 - 2 * 4);
        assert!(mesh.is_closed());
        assert_relative_eq!(mesh.volume(), 3.0 * CELL_VOLUME, max_relative = 1e-5);
    }

    #[test]
    fn edge_contact_is_closed_but_not_manifold() {
        let dims = Dimensions::new(6, 6, 4).unwrap();
        let side_by_side = HexPrismMesher::new(dims).build(&occupancy_with(dims, &[(2, 2, 1), (3, 2, 1)]));
        assert!(side_by_side.is_manifold());

        // one layer up and one step along the ring: the prisms meet on a single edge
        let diagonal = HexPrismMesher::new(dims).build(&occupancy_with(dims, &[(2, 2, 1), (3, 2, 2)]));
        assert_eq!(diagonal.triangle_count(), 2 * 20);
        assert!(diagonal.is_closed());
        assert!(!diagonal.is_manifold());
        assert_relative_eq!(diagonal.volume(), 2.0 * CELL_VOLUME, max_relative = 1e-5);
    }

    #[test]
    fn cells_on_the_lattice_edge_are_capped() {
        let dims = Dimensions::new(3, 3, 2).unwrap();
        let occupancy = vec![true; dims.cell_count()];
        let mesh = HexPrismMesher::new(dims).build(&occupancy);
        assert!(mesh.is_closed());
        assert_relative_eq!(mesh.volume(), 18.0 * CELL_VOLUME, max_relative = 1e-5);
    }

    #[test]
    fn empty_field_gives_empty_mesh() {
        let dims = Dimensions::new(4, 4, 4).unwrap();
        let mesh = HexPrismMesher::new(dims).build(&vec![false; dims.cell_count()]);
        assert!(mesh.is_empty());
        assert_eq!(mesh.volume(), 0.0);
    }
}

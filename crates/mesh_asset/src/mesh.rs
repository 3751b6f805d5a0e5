//! Static mesh built from a finished terrain buffer set.

use glam::{Vec2, Vec3};
use procgen::TerrainBuildContext;
use terrain_core::{GridSpec, Rgb8, TerrainError, TerrainResult};

use crate::vertex::MeshVertex;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn from_points(points: &[Vec3]) -> Self {
        let (min, max) = points.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        );
        Self { min, max }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Immutable terrain mesh: interleaved vertices, indices and the grid they
/// were laid out on. Heights are stored in `position[2]`.
#[derive(Debug, Clone)]
pub struct StaticMesh {
    pub name: String,
    pub spec: GridSpec,
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub bounds: Bounds,
}

impl StaticMesh {
    /// Materialize a finished build.
    pub fn from_build(name: impl Into<String>, ctx: &TerrainBuildContext) -> TerrainResult<Self> {
        Self::from_buffers(
            name,
            ctx.spec(),
            &ctx.vertices(),
            ctx.uvs(),
            ctx.indices(),
            Some(ctx.colors()),
        )
    }

    /// Materialize raw buffers. All per-vertex buffers must match the grid's
    /// vertex count and every index must reference an existing vertex.
    pub fn from_buffers(
        name: impl Into<String>,
        spec: GridSpec,
        positions: &[Vec3],
        uvs: &[Vec2],
        indices: &[u32],
        colors: Option<&[Rgb8]>,
    ) -> TerrainResult<Self> {
        spec.validate()?;
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TerrainError::invalid_buffers("mesh name must not be empty"));
        }

        let count = spec.vertex_count();
        if positions.len() != count || uvs.len() != count {
            return Err(TerrainError::invalid_buffers(format!(
                "expected {} vertices, got {} positions and {} uvs",
                count,
                positions.len(),
                uvs.len()
            )));
        }
        if let Some(colors) = colors {
            if colors.len() != count {
                return Err(TerrainError::invalid_buffers(format!(
                    "expected {} colors, got {}",
                    count,
                    colors.len()
                )));
            }
        }
        if indices.len() != spec.index_count() {
            return Err(TerrainError::invalid_buffers(format!(
                "expected {} indices, got {}",
                spec.index_count(),
                indices.len()
            )));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= count) {
            return Err(TerrainError::invalid_buffers(format!(
                "index {} out of range for {} vertices",
                bad, count
            )));
        }

        let normals = calculate_normals(positions, indices);
        let vertices = positions
            .iter()
            .zip(uvs)
            .zip(&normals)
            .enumerate()
            .map(|(i, ((p, uv), n))| {
                let color = colors.map_or([1.0, 1.0, 1.0, 1.0], |c| c[i].to_rgba_f32());
                MeshVertex::with_color(p.to_array(), n.to_array(), uv.to_array(), color)
            })
            .collect();

        let bounds = Bounds::from_points(positions);
        log::debug!(
            "Materialized mesh '{}': {} vertices, bounds {} .. {}",
            name,
            count,
            bounds.min,
            bounds.max
        );

        Ok(Self {
            name,
            spec,
            vertices,
            indices: indices.to_vec(),
            bounds,
        })
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaved vertex data, ready for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Height at a world-space `(x, y)`, clamped to the terrain.
    ///
    /// Interpolates over the same triangles the mesh uses, so the result lies
    /// exactly on the rendered surface.
    pub fn sample_height(&self, x: f32, y: f32) -> f32 {
        let size = self.spec.size as usize;
        let side = self.spec.side();
        let gx = x / self.spec.spacing;
        let gy = y / self.spec.spacing;

        let x0 = (gx.floor().max(0.0) as usize).min(size - 1);
        let y0 = (gy.floor().max(0.0) as usize).min(size - 1);
        let fx = (gx - x0 as f32).clamp(0.0, 1.0);
        let fy = (gy - y0 as f32).clamp(0.0, 1.0);

        let h = |cx: usize, cy: usize| self.vertices[cx * side + cy].position[2];
        let ha = h(x0, y0);
        let hb = h(x0, y0 + 1);
        let hc = h(x0 + 1, y0);
        let hd = h(x0 + 1, y0 + 1);

        // The cell diagonal runs from B (x0, y0+1) to C (x0+1, y0).
        // Triangle A-B-C when fx + fy <= 1, B-D-C otherwise.
        if fx + fy <= 1.0 {
            ha + fx * (hc - ha) + fy * (hb - ha)
        } else {
            hd + (1.0 - fx) * (hb - hd) + (1.0 - fy) * (hc - hd)
        }
    }

    /// Height of the vertex at grid coordinate `(x, y)`.
    pub fn vertex_height(&self, x: usize, y: usize) -> Option<f32> {
        let side = self.spec.side();
        (x < side && y < side).then(|| self.vertices[x * side + y].position[2])
    }
}

/// Smooth vertex normals, oriented towards +Z for an upward-facing
/// heightfield. Face normals are summed unnormalized so each face counts in
/// proportion to its area.
fn calculate_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let (va, vb, vc) = (positions[a], positions[b], positions[c]);
        // Grid triangles wind clockwise seen from +Z.
        let n = (vc - va).cross(vb - va);
        normals[a] += n;
        normals[b] += n;
        normals[c] += n;
    }

    for n in &mut normals {
        *n = n.try_normalize().unwrap_or(Vec3::Z);
    }
    normals
}

#[cfg(test)]
mod tests {
    use super::*;
    use procgen::{ColorRamp, FeatureSet, GaussianSpots, GridMesh, Spot};

    fn flat(size: u32, spacing: f32) -> (GridSpec, GridMesh) {
        let spec = GridSpec::new(size, spacing);
        (spec, GridMesh::build(spec).unwrap())
    }

    #[test]
    fn flat_grid_normals_point_up() {
        let (spec, grid) = flat(3, 1.0);
        let mesh =
            StaticMesh::from_buffers("flat", spec, &grid.positions, &grid.uvs, &grid.indices, None)
                .unwrap();
        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
            assert_eq!(v.color, [1.0; 4]);
        }
        assert_eq!(mesh.bounds.size(), Vec3::new(3.0, 3.0, 0.0));
        assert_eq!(mesh.vertex_bytes().len(), 16 * MeshVertex::STRIDE);
        assert_eq!(mesh.index_bytes().len(), 54 * 4);
    }

    #[test]
    fn larger_faces_dominate_shared_normals() {
        let positions = [
            Vec3::ZERO,
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        // Area 50 facing +Z, area 0.5 facing +X, both touching vertex 0.
        let indices = [0, 1, 2, 0, 4, 3];
        let normals = calculate_normals(&positions, &indices);
        assert!(normals[0].z > 0.99, "{:?}", normals[0]);
        assert!(normals[0].x > 0.0 && normals[0].x < 0.05, "{:?}", normals[0]);
        assert!((normals[3].x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sample_height_matches_vertices_and_triangles() {
        let (spec, grid) = flat(2, 2.0);
        let mut positions = grid.positions.clone();
        for (i, p) in positions.iter_mut().enumerate() {
            p.z = i as f32;
        }
        let mesh =
            StaticMesh::from_buffers("ramp", spec, &positions, &grid.uvs, &grid.indices, None)
                .unwrap();

        for x in 0..3 {
            for y in 0..3 {
                let expected = (x * 3 + y) as f32;
                let sampled = mesh.sample_height(x as f32 * 2.0, y as f32 * 2.0);
                assert!((sampled - expected).abs() < 1e-5, "({x},{y}): {sampled}");
                assert_eq!(mesh.vertex_height(x, y), Some(expected));
            }
        }
        // Midpoint of the B-C diagonal of cell (0, 0): average of vertices 1 and 3.
        assert!((mesh.sample_height(1.0, 1.0) - 2.0).abs() < 1e-5);
        // Outside the terrain clamps to the edge.
        assert!((mesh.sample_height(-10.0, -10.0) - 0.0).abs() < 1e-5);
        assert_eq!(mesh.vertex_height(3, 0), None);
    }

    #[test]
    fn rejects_mismatched_buffers() {
        let (spec, grid) = flat(2, 1.0);
        let short = &grid.positions[..5];
        assert!(StaticMesh::from_buffers("m", spec, short, &grid.uvs, &grid.indices, None).is_err());

        let mut bad_indices = grid.indices.clone();
        bad_indices[0] = 99;
        assert!(
            StaticMesh::from_buffers("m", spec, &grid.positions, &grid.uvs, &bad_indices, None)
                .is_err()
        );

        let colors = vec![Rgb8::RED; 3];
        assert!(StaticMesh::from_buffers(
            "m",
            spec,
            &grid.positions,
            &grid.uvs,
            &grid.indices,
            Some(colors.as_slice())
        )
        .is_err());

        assert!(
            StaticMesh::from_buffers(" ", spec, &grid.positions, &grid.uvs, &grid.indices, None)
                .is_err()
        );
    }

    #[test]
    fn from_build_carries_heights_and_colors() {
        let spots = GaussianSpots::new(
            vec![Spot {
                center: Vec2::new(0.5, 0.5),
                height: 1.0,
            }],
            1.0,
            4.0,
        );
        let ctx = TerrainBuildContext::from_features(
            GridSpec::new(4, 1.0),
            FeatureSet::GaussianSpots(spots),
            None,
            &ColorRamp::RedGreen,
        )
        .unwrap();
        let mesh = StaticMesh::from_build("hill", &ctx).unwrap();

        assert_eq!(mesh.vertex_count(), 25);
        assert_eq!(mesh.triangle_count(), 32);
        let top = mesh.vertex_height(2, 2).unwrap();
        assert!((top - 4.0).abs() < 1e-5);
        assert!((mesh.bounds.max.z - 4.0).abs() < 1e-5);
        assert_eq!(mesh.vertices[12].color, Rgb8::GREEN.to_rgba_f32());
        // The summit of a symmetric hill has an upright normal.
        let n = mesh.vertices[12].normal;
        assert!(n[0].abs() < 1e-5 && n[1].abs() < 1e-5 && n[2] > 0.99);
    }
}

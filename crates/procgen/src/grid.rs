//! Fixed-topology grid mesh: positions, UVs and triangle indices.
//!
//! Vertices are laid out with X as the outer loop and Y as the inner loop, so
//! vertex `(x, y)` lives at `x * (size + 1) + y`. Every other buffer in a build
//! (heights, colors, erosion trace) uses the same indexing.

use glam::{Vec2, Vec3};
use terrain_core::{GridSpec, TerrainResult};

/// Dimensions of a vertex lattice: `columns` along X, `rows` along Y.
///
/// Terrain grids are square (`columns == rows == size + 1`); erosion also runs
/// on arbitrary rectangles, which keeps small synthetic cases easy to set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    pub columns: usize,
    pub rows: usize,
}

impl GridDims {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self { columns, rows }
    }

    /// Square lattice for a terrain grid.
    pub fn from_spec(spec: &GridSpec) -> Self {
        Self::new(spec.side(), spec.side())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns * self.rows
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        x * self.rows + y
    }

    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index / self.rows, index % self.rows)
    }

    /// Axis-aligned neighbors in the fixed order left, right, down, up
    /// (`x-1`, `x+1`, `y-1`, `y+1`). Neighbors outside the lattice are `None`.
    #[inline]
    pub fn neighbors(&self, x: usize, y: usize) -> [Option<usize>; 4] {
        [
            (x > 0).then(|| self.index(x - 1, y)),
            (x + 1 < self.columns).then(|| self.index(x + 1, y)),
            (y > 0).then(|| self.index(x, y - 1)),
            (y + 1 < self.rows).then(|| self.index(x, y + 1)),
        ]
    }
}

/// Flat grid geometry for one terrain build. Heights are stored separately in
/// a [`crate::HeightField`]; `positions` always have `z = 0`.
#[derive(Debug, Clone)]
pub struct GridMesh {
    pub spec: GridSpec,
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl GridMesh {
    /// Build the `(size + 1)^2` vertex grid and its `6 * size^2` indices.
    ///
    /// Each cell `(x, y)` with corners `A = x*(size+1)+y`, `B = A+1`,
    /// `C = A+size+1`, `D = C+1` is split into triangles (A, B, C) and (B, D, C).
    pub fn build(spec: GridSpec) -> TerrainResult<Self> {
        spec.validate()?;

        let size = spec.size as usize;
        let side = spec.side();
        let mut positions = Vec::with_capacity(spec.vertex_count());
        let mut uvs = Vec::with_capacity(spec.vertex_count());
        let mut indices = Vec::with_capacity(spec.index_count());

        for x in 0..side {
            for y in 0..side {
                positions.push(Vec3::new(
                    x as f32 * spec.spacing,
                    y as f32 * spec.spacing,
                    0.0,
                ));
                uvs.push(Vec2::new(x as f32 / size as f32, y as f32 / size as f32));

                if x < size && y < size {
                    let a = (x * side + y) as u32;
                    let b = a + 1;
                    let c = a + side as u32;
                    let d = c + 1;

                    indices.extend([a, b, c]);
                    indices.extend([b, d, c]);
                }
            }
        }

        log::debug!(
            "Built {}x{} grid: {} vertices, {} triangles",
            size,
            size,
            positions.len(),
            indices.len() / 3
        );

        Ok(Self {
            spec,
            positions,
            uvs,
            indices,
        })
    }

    pub fn dims(&self) -> GridDims {
        GridDims::from_spec(&self.spec)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex index of grid coordinate `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        self.dims().index(x, y)
    }

    /// Grid coordinate of a vertex index.
    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        self.dims().coords(index)
    }

    /// Iterate triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }
}

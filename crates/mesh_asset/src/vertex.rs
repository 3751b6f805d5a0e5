//! Interleaved vertex layout handed to the host mesh layer.

use bytemuck::{Pod, Zeroable};

/// Terrain vertex with position, normal, UV coordinates, and color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

/// What a vertex attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Position,
    Normal,
    TexCoords,
    Color,
}

/// One attribute in the interleaved layout: `components` floats at `offset`
/// bytes from the start of each vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub kind: AttributeKind,
    pub offset: usize,
    pub components: usize,
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }

    pub fn with_color(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2], color: [f32; 4]) -> Self {
        Self { position, normal, tex_coords, color }
    }

    /// Byte stride between vertices.
    pub const STRIDE: usize = std::mem::size_of::<MeshVertex>();

    pub const ATTRIBUTES: [VertexAttribute; 4] = [
        VertexAttribute {
            kind: AttributeKind::Position,
            offset: 0,
            components: 3,
        },
        VertexAttribute {
            kind: AttributeKind::Normal,
            offset: std::mem::size_of::<[f32; 3]>(),
            components: 3,
        },
        VertexAttribute {
            kind: AttributeKind::TexCoords,
            offset: std::mem::size_of::<[f32; 6]>(),
            components: 2,
        },
        VertexAttribute {
            kind: AttributeKind::Color,
            offset: std::mem::size_of::<[f32; 8]>(),
            components: 4,
        },
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_tightly_packed() {
        assert_eq!(MeshVertex::STRIDE, 48);
        let last = MeshVertex::ATTRIBUTES[3];
        assert_eq!(last.offset + last.components * 4, MeshVertex::STRIDE);
    }

    #[test]
    fn casts_to_bytes() {
        let v = [MeshVertex::new([1.0, 2.0, 3.0], [0.0, 0.0, 1.0], [0.5, 0.5])];
        let bytes: &[u8] = bytemuck::cast_slice(&v);
        assert_eq!(bytes.len(), MeshVertex::STRIDE);
        assert_eq!(&bytes[0..4], &1.0f32.to_ne_bytes());
    }
}

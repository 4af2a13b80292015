//! Vertex record layout and attribute descriptions

use crate::backend::VertexAttribute;
use crate::layout::MeshLayout;

pub const POSITION_COMPONENTS: usize = 3;
pub const NORMAL_COMPONENTS: usize = 3;
pub const TEX_COORD_COMPONENTS: usize = 2;

/// Elements in a vertex record without texture coordinates
pub const BASE_STRIDE: usize = POSITION_COMPONENTS + NORMAL_COMPONENTS;

pub const VERTEX_ELEMENT_BYTES: usize = std::mem::size_of::<f32>();
pub const INDEX_BYTES: usize = std::mem::size_of::<u16>();

pub const POSITION_LOCATION: u32 = 0;
pub const NORMAL_LOCATION: u32 = 1;
pub const TEX_COORD_LOCATION: u32 = 2;

/// Attribute pointers for one packed mesh. Texture coordinates are only
/// described for textured meshes.
pub fn mesh_attributes(layout: &MeshLayout) -> Vec<VertexAttribute> {
    let stride_bytes = layout.stride_bytes();
    let mut attributes = vec![
        VertexAttribute {
            location: POSITION_LOCATION,
            components: POSITION_COMPONENTS as u32,
            stride_bytes,
            offset_bytes: layout.positions_offset * VERTEX_ELEMENT_BYTES,
        },
        VertexAttribute {
            location: NORMAL_LOCATION,
            components: NORMAL_COMPONENTS as u32,
            stride_bytes,
            offset_bytes: layout.normals_offset * VERTEX_ELEMENT_BYTES,
        },
    ];

    if let Some(offset) = layout.tex_coords_offset {
        attributes.push(VertexAttribute {
            location: TEX_COORD_LOCATION,
            components: TEX_COORD_COMPONENTS as u32,
            stride_bytes,
            offset_bytes: offset * VERTEX_ELEMENT_BYTES,
        });
    }

    attributes
}

/// Position-only attribute, as used by the sky box
pub fn position_attribute() -> VertexAttribute {
    VertexAttribute {
        location: POSITION_LOCATION,
        components: POSITION_COMPONENTS as u32,
        stride_bytes: POSITION_COMPONENTS * VERTEX_ELEMENT_BYTES,
        offset_bytes: 0,
    }
}

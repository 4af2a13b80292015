//! Size and layout pass
//!
//! Walks the meshes once, in declaration order, to size the shared buffers
//! and decide where each mesh lives in them. The write pass must visit the
//! meshes in the same order.

use scenepack_assets::SceneDescription;
use serde::Serialize;

use crate::vertex::{BASE_STRIDE, INDEX_BYTES, TEX_COORD_COMPONENTS, VERTEX_ELEMENT_BYTES};

/// Where one mesh's data sits in the shared buffers.
///
/// Vertex offsets and the stride are counted in `f32` elements, index
/// offsets in `u16` elements unless suffixed `_byte_`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeshLayout {
    /// Elements per interleaved vertex record: 6, or 8 when textured
    pub stride: usize,
    pub has_texture: bool,
    pub has_indices: bool,
    pub vertex_count: usize,
    pub positions_offset: usize,
    pub normals_offset: usize,
    pub tex_coords_offset: Option<usize>,
    pub indices_offset: Option<usize>,
    pub indices_byte_offset: Option<usize>,
    pub index_count: usize,
}

/// Total element counts of the shared buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BufferSizes {
    pub vertex_elements: usize,
    pub index_elements: usize,
}

impl MeshLayout {
    /// Number of `f32` elements this mesh occupies in the vertex buffer
    pub fn vertex_elements(&self) -> usize {
        self.stride * self.vertex_count
    }

    /// Byte stride between consecutive vertex records
    pub fn stride_bytes(&self) -> usize {
        self.stride * VERTEX_ELEMENT_BYTES
    }

    /// Elements of the vertex buffer covered by this mesh
    pub fn vertex_range(&self) -> std::ops::Range<usize> {
        self.positions_offset..self.positions_offset + self.vertex_elements()
    }

    /// Elements of the index buffer covered by this mesh, if indexed
    pub fn index_range(&self) -> Option<std::ops::Range<usize>> {
        self.indices_offset
            .map(|offset| offset..offset + self.index_count)
    }
}

impl BufferSizes {
    pub fn vertex_bytes(&self) -> usize {
        self.vertex_elements * VERTEX_ELEMENT_BYTES
    }

    pub fn index_bytes(&self) -> usize {
        self.index_elements * INDEX_BYTES
    }
}

/// Compute every mesh's layout and the total sizes of the shared buffers.
///
/// A mesh is laid out with texture coordinates only when its texcoord
/// channel 0 is non-empty and its material names a diffuse texture.
pub fn compute_layouts(scene: &SceneDescription) -> (Vec<MeshLayout>, BufferSizes) {
    let mut sizes = BufferSizes::default();

    let layouts = scene
        .meshes
        .iter()
        .map(|mesh| {
            let start = sizes.vertex_elements;
            let mut stride = BASE_STRIDE;
            sizes.vertex_elements += mesh.vertex_positions.len() + mesh.vertex_normals.len();

            let tex_coords = scene
                .mesh_texture(mesh)
                .and_then(|_| mesh.tex_coords());
            let has_texture = tex_coords.is_some();
            if let Some(coords) = tex_coords {
                sizes.vertex_elements += coords.len();
                stride += TEX_COORD_COMPONENTS;
            }

            let index_count = mesh.indices.len();
            let has_indices = index_count > 0;
            let indices_offset = has_indices.then_some(sizes.index_elements);
            sizes.index_elements += index_count;

            MeshLayout {
                stride,
                has_texture,
                has_indices,
                vertex_count: mesh.vertex_count(),
                positions_offset: start,
                normals_offset: start + 3,
                tex_coords_offset: has_texture.then_some(start + 6),
                indices_offset,
                indices_byte_offset: indices_offset.map(|offset| offset * INDEX_BYTES),
                index_count,
            }
        })
        .collect();

    (layouts, sizes)
}

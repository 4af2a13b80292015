//! Interleave and write pass

use glam::{Vec2, Vec3};
use scenepack_assets::SceneDescription;
use tracing::debug;

use crate::error::RenderError;
use crate::layout::{compute_layouts, BufferSizes, MeshLayout};
use crate::vertex::{NORMAL_COMPONENTS, POSITION_COMPONENTS, TEX_COORD_COMPONENTS};

/// The shared vertex and index buffers of a scene, with each mesh's layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackedGeometry {
    /// Interleaved `[pos.xyz, nrm.xyz, (uv)]` records, mesh after mesh
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
    pub layouts: Vec<MeshLayout>,
}

/// One vertex read back out of the interleaved buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackedVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coord: Option<Vec2>,
}

impl PackedGeometry {
    pub fn sizes(&self) -> BufferSizes {
        BufferSizes {
            vertex_elements: self.vertices.len(),
            index_elements: self.indices.len(),
        }
    }

    /// Read vertex `vertex` of mesh `mesh` back through its layout offsets.
    pub fn vertex(&self, mesh: usize, vertex: usize) -> Option<PackedVertex> {
        let layout = self.layouts.get(mesh)?;
        if vertex >= layout.vertex_count {
            return None;
        }

        let base = vertex * layout.stride;
        let read3 = |offset: usize| Vec3::from_slice(&self.vertices[offset + base..]);
        Some(PackedVertex {
            position: read3(layout.positions_offset),
            normal: read3(layout.normals_offset),
            tex_coord: layout
                .tex_coords_offset
                .map(|offset| Vec2::from_slice(&self.vertices[offset + base..])),
        })
    }

    /// The interleaved vertex records of one mesh
    pub fn mesh_vertices(&self, mesh: usize) -> Option<&[f32]> {
        let layout = self.layouts.get(mesh)?;
        self.vertices.get(layout.vertex_range())
    }

    /// The index run of one mesh, if it is indexed
    pub fn mesh_indices(&self, mesh: usize) -> Option<&[u16]> {
        let range = self.layouts.get(mesh)?.index_range()?;
        self.indices.get(range)
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Validate `scene`, lay it out, and write its geometry.
pub fn pack(scene: &SceneDescription) -> Result<PackedGeometry, RenderError> {
    scene.validate()?;
    let (layouts, sizes) = compute_layouts(scene);
    write_geometry(scene, layouts, sizes)
}

/// Write every mesh into buffers allocated once at `sizes`.
///
/// `layouts` must come from [`compute_layouts`] on the same scene. Every
/// mesh must fill exactly `stride * vertex_count` elements starting at its
/// `positions_offset`, and the write cursor must end at the vertex total.
pub fn write_geometry(
    scene: &SceneDescription,
    layouts: Vec<MeshLayout>,
    sizes: BufferSizes,
) -> Result<PackedGeometry, RenderError> {
    if layouts.len() != scene.meshes.len() {
        return Err(RenderError::LayoutMismatch(format!(
            "{} layouts for {} meshes",
            layouts.len(),
            scene.meshes.len()
        )));
    }

    let mut vertices = vec![0.0_f32; sizes.vertex_elements];
    let mut indices = vec![0_u16; sizes.index_elements];
    let mut cursor = 0;

    for (index, (mesh, layout)) in scene.meshes.iter().zip(&layouts).enumerate() {
        if cursor != layout.positions_offset {
            return Err(RenderError::LayoutMismatch(format!(
                "mesh {} expected at element {}, cursor is at {}",
                index, layout.positions_offset, cursor
            )));
        }

        let tex_coords = if layout.has_texture {
            Some(mesh.tex_coords().ok_or_else(|| {
                RenderError::LayoutMismatch(format!("mesh {} has no texture coordinates", index))
            })?)
        } else {
            None
        };

        let start = cursor;
        for vertex in 0..layout.vertex_count {
            let p = vertex * POSITION_COMPONENTS;
            write_run(&mut vertices, &mut cursor, &mesh.vertex_positions, p, POSITION_COMPONENTS)?;

            let n = vertex * NORMAL_COMPONENTS;
            write_run(&mut vertices, &mut cursor, &mesh.vertex_normals, n, NORMAL_COMPONENTS)?;

            if let Some(coords) = tex_coords {
                let t = vertex * TEX_COORD_COMPONENTS;
                write_run(&mut vertices, &mut cursor, coords, t, TEX_COORD_COMPONENTS)?;
            }
        }

        if cursor - start != layout.vertex_elements() {
            return Err(RenderError::LayoutMismatch(format!(
                "mesh {} wrote {} elements, layout expects {}",
                index,
                cursor - start,
                layout.vertex_elements()
            )));
        }

        if let Some(range) = layout.index_range() {
            let target = indices.get_mut(range.clone()).ok_or_else(|| {
                RenderError::LayoutMismatch(format!(
                    "mesh {} index range {:?} exceeds {} indices",
                    index, range, sizes.index_elements
                ))
            })?;
            for (slot, &value) in target.iter_mut().zip(&mesh.indices) {
                *slot = u16::try_from(value).map_err(|_| RenderError::IndexOverflow(value))?;
            }
        }
    }

    if cursor != sizes.vertex_elements {
        return Err(RenderError::LayoutMismatch(format!(
            "wrote {} vertex elements, buffer holds {}",
            cursor, sizes.vertex_elements
        )));
    }

    debug!(
        "Packed {} meshes: {} vertex elements, {} indices",
        layouts.len(),
        vertices.len(),
        indices.len()
    );

    Ok(PackedGeometry {
        vertices,
        indices,
        layouts,
    })
}

/// Copy `len` elements of `source` starting at `from` to the write cursor.
fn write_run(
    target: &mut [f32],
    cursor: &mut usize,
    source: &[f32],
    from: usize,
    len: usize,
) -> Result<(), RenderError> {
    let capacity = target.len();
    let src = source.get(from..from + len).ok_or_else(|| {
        RenderError::LayoutMismatch(format!(
            "attribute data ends at {}, need {} elements from {}",
            source.len(),
            len,
            from
        ))
    })?;
    let dst = target.get_mut(*cursor..*cursor + len).ok_or_else(|| {
        RenderError::LayoutMismatch(format!(
            "write at element {} overflows vertex buffer of {}",
            cursor, capacity
        ))
    })?;
    dst.copy_from_slice(src);
    *cursor += len;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenepack_assets::{MaterialDescription, MeshDescription, SceneDescription};

    fn textured_material() -> MaterialDescription {
        MaterialDescription {
            diffuse_texture: vec!["crate.png".into()],
            ..Default::default()
        }
    }

    fn two_mesh_scene() -> SceneDescription {
        SceneDescription {
            meshes: vec![
                MeshDescription {
                    vertex_positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                    vertex_normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
                    vertex_tex_coordinates: vec![vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]],
                    indices: vec![0, 1, 2],
                    material_index: 1,
                },
                MeshDescription {
                    vertex_positions: vec![5.0, 5.0, 5.0, 6.0, 5.0, 5.0],
                    vertex_normals: vec![0.0, 1.0, 0.0, 0.0, -1.0, 0.0],
                    vertex_tex_coordinates: vec![vec![0.5, 0.5, 0.25, 0.25]],
                    indices: vec![1, 0],
                    material_index: 0,
                },
            ],
            materials: vec![MaterialDescription::default(), textured_material()],
            nodes: vec![],
        }
    }

    #[test]
    fn test_interleaves_records_in_fixed_order() {
        let packed = pack(&two_mesh_scene()).unwrap();

        assert_eq!(
            packed.mesh_vertices(0).unwrap(),
            &[
                0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0,
            ]
        );
        // Second mesh's material is untextured, so its coordinates are dropped.
        assert_eq!(
            packed.mesh_vertices(1).unwrap(),
            &[5.0, 5.0, 5.0, 0.0, 1.0, 0.0, 6.0, 5.0, 5.0, 0.0, -1.0, 0.0]
        );
    }

    #[test]
    fn test_written_elements_fill_buffer_exactly() {
        let packed = pack(&two_mesh_scene()).unwrap();
        let per_mesh: usize = packed.layouts.iter().map(|l| l.stride * l.vertex_count).sum();
        assert_eq!(per_mesh, packed.vertices.len());
        assert_eq!(packed.sizes().vertex_elements, 24 + 12);
    }

    #[test]
    fn test_indices_written_at_offsets() {
        let packed = pack(&two_mesh_scene()).unwrap();
        assert_eq!(packed.indices, vec![0, 1, 2, 1, 0]);
        assert_eq!(packed.mesh_indices(0), Some(&[0, 1, 2][..]));
        assert_eq!(packed.mesh_indices(1), Some(&[1, 0][..]));
        assert_eq!(packed.layouts[1].indices_byte_offset, Some(6));
        assert_eq!(packed.index_bytes().len(), 10);
    }

    #[test]
    fn test_vertices_read_back_through_offsets() {
        let scene = two_mesh_scene();
        let packed = pack(&scene).unwrap();

        for (m, mesh) in scene.meshes.iter().enumerate() {
            let layout = packed.layouts[m];
            for k in 0..mesh.vertex_count() {
                let vertex = packed.vertex(m, k).unwrap();
                assert_eq!(vertex.position, Vec3::from_slice(&mesh.vertex_positions[k * 3..]));
                assert_eq!(vertex.normal, Vec3::from_slice(&mesh.vertex_normals[k * 3..]));
                if layout.has_texture {
                    let coords = mesh.tex_coords().unwrap();
                    assert_eq!(vertex.tex_coord, Some(Vec2::from_slice(&coords[k * 2..])));
                } else {
                    assert_eq!(vertex.tex_coord, None);
                }
            }
        }
        assert!(packed.vertex(0, 3).is_none());
        assert!(packed.vertex(2, 0).is_none());
    }

    #[test]
    fn test_mesh_without_indices_has_no_index_run() {
        let mut scene = two_mesh_scene();
        scene.meshes[0].indices.clear();
        let packed = pack(&scene).unwrap();
        assert_eq!(packed.mesh_indices(0), None);
        assert_eq!(packed.layouts[1].indices_offset, Some(0));
        assert_eq!(packed.indices, vec![1, 0]);
    }

    #[test]
    fn test_malformed_scene_fails_before_writing() {
        let mut scene = two_mesh_scene();
        scene.meshes[1].vertex_normals.pop();
        assert!(matches!(pack(&scene), Err(RenderError::Asset(_))));
    }

    #[test]
    fn test_foreign_layouts_are_rejected() {
        let scene = two_mesh_scene();
        let (mut layouts, sizes) = compute_layouts(&scene);
        layouts[1].positions_offset += 1;
        assert!(matches!(
            write_geometry(&scene, layouts, sizes),
            Err(RenderError::LayoutMismatch(_))
        ));

        let (layouts, _) = compute_layouts(&scene);
        assert!(matches!(
            write_geometry(&scene, layouts[..1].to_vec(), sizes),
            Err(RenderError::LayoutMismatch(_))
        ));
    }

    #[test]
    fn test_undersized_buffer_is_rejected() {
        let scene = two_mesh_scene();
        let (layouts, mut sizes) = compute_layouts(&scene);
        sizes.vertex_elements -= 1;
        assert!(write_geometry(&scene, layouts, sizes).is_err());
    }

    #[test]
    fn test_empty_scene_packs_to_nothing() {
        let packed = pack(&SceneDescription::default()).unwrap();
        assert!(packed.vertices.is_empty());
        assert!(packed.indices.is_empty());
        assert!(packed.layouts.is_empty());
    }
}

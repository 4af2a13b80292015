use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;

use glam::Mat4;
use tracing::{debug, warn};

use crate::description::{MaterialDescription, MeshDescription, NodeDescription, SceneDescription};
use crate::error::AssetError;

/// Import a glTF 2.0 file (.gltf or .glb) as a scene description.
///
/// Every triangle primitive becomes one mesh. Every node that carries a mesh
/// in the default scene becomes one node referencing that mesh's primitives,
/// with its parent transforms folded into the model matrix. Image data is
/// never decoded; textures are kept as their URIs.
pub fn load_gltf(path: &Path) -> Result<SceneDescription, AssetError> {
    let failed = |reason: String| AssetError::GltfLoadFailed(path.to_path_buf(), reason);

    let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(|e| failed(e.to_string()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("./"));
    let buffers =
        gltf::import_buffers(&document, Some(base), blob).map_err(|e| failed(e.to_string()))?;

    let mut scene = SceneDescription {
        materials: document.materials().map(convert_material).collect(),
        ..Default::default()
    };

    // Primitives without a material use the glTF default material, appended lazily.
    let mut default_material = None;

    // json mesh index -> range of converted meshes
    let mut mesh_ranges: HashMap<usize, Range<usize>> = HashMap::new();

    for mesh in document.meshes() {
        let start = scene.meshes.len();

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                warn!(
                    "Skipping non-triangle primitive {} of mesh {}",
                    primitive.index(),
                    mesh.index()
                );
                continue;
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let vertex_positions: Vec<f32> = reader
                .read_positions()
                .ok_or_else(|| failed(format!("mesh {} has a primitive without positions", mesh.index())))?
                .flatten()
                .collect();

            let vertex_normals: Vec<f32> = match reader.read_normals() {
                Some(normals) => normals.flatten().collect(),
                None => vec![0.0; vertex_positions.len()],
            };

            let vertex_tex_coordinates: Vec<Vec<f32>> = reader
                .read_tex_coords(0)
                .map(|tc| tc.into_f32().flatten().collect())
                .into_iter()
                .collect();

            let indices: Vec<u32> = reader
                .read_indices()
                .map(|idx| idx.into_u32().collect())
                .unwrap_or_default();

            let material_index = match primitive.material().index() {
                Some(index) => index,
                None => *default_material.get_or_insert_with(|| {
                    scene.materials.push(MaterialDescription::default());
                    scene.materials.len() - 1
                }),
            };

            scene.meshes.push(MeshDescription {
                vertex_positions,
                vertex_normals,
                vertex_tex_coordinates,
                indices,
                material_index,
            });
        }

        mesh_ranges.insert(mesh.index(), start..scene.meshes.len());
    }

    let default_scene = document.default_scene().or_else(|| document.scenes().next());
    if let Some(default_scene) = default_scene {
        for node in default_scene.nodes() {
            collect_nodes(node, Mat4::IDENTITY, &mesh_ranges, &mut scene.nodes);
        }
    }

    debug!(
        "glTF '{}': {} meshes, {} materials, {} nodes",
        path.display(),
        scene.meshes.len(),
        scene.materials.len(),
        scene.nodes.len()
    );

    scene.validate()?;
    Ok(scene)
}

fn convert_material(material: gltf::Material<'_>) -> MaterialDescription {
    let pbr = material.pbr_metallic_roughness();
    let diffuse_texture = pbr
        .base_color_texture()
        .and_then(|info| match info.texture().source().source() {
            gltf::image::Source::Uri { uri, .. } => Some(uri.to_string()),
            gltf::image::Source::View { .. } => None,
        })
        .into_iter()
        .collect();

    MaterialDescription {
        diffuse_texture,
        diffuse_reflectance: pbr.base_color_factor(),
    }
}

fn collect_nodes(
    node: gltf::Node<'_>,
    parent: Mat4,
    mesh_ranges: &HashMap<usize, Range<usize>>,
    nodes: &mut Vec<NodeDescription>,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    let range = node
        .mesh()
        .and_then(|mesh| mesh_ranges.get(&mesh.index()))
        .filter(|range| !range.is_empty());
    if let Some(range) = range {
        nodes.push(NodeDescription::new(world, range.clone().collect()));
    }

    for child in node.children() {
        collect_nodes(child, world, mesh_ranges, nodes);
    }
}

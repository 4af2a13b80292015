//! Parsed scene description
//!
//! These types mirror the JSON scene document one to one. Nothing derived
//! from them (layouts, normal matrices, extents) is stored here; the render
//! crate keeps that in side tables indexed by mesh or node position.

use glam::Mat4;
use scenepack_core::Color;
use serde::{Deserialize, Serialize};

use crate::error::AssetError;

/// A flat collection of meshes, the materials they reference, and the nodes
/// that instance them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub meshes: Vec<MeshDescription>,
    #[serde(default)]
    pub materials: Vec<MaterialDescription>,
    pub nodes: Vec<NodeDescription>,
}

/// Raw geometry of one mesh. Attribute arrays are flat: three elements per
/// position or normal, two per texture coordinate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshDescription {
    pub vertex_positions: Vec<f32>,
    pub vertex_normals: Vec<f32>,
    /// Texture coordinate channels; only channel 0 is ever used
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vertex_tex_coordinates: Vec<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indices: Vec<u32>,
    pub material_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDescription {
    #[serde(default)]
    pub diffuse_texture: Vec<String>,
    #[serde(default = "default_reflectance")]
    pub diffuse_reflectance: [f32; 4],
}

/// An instance of one or more meshes under a world transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescription {
    /// Column-major 4x4 world transform
    pub model_matrix: [f32; 16],
    #[serde(default)]
    pub mesh_indices: Vec<usize>,
}

fn default_reflectance() -> [f32; 4] {
    Color::WHITE.to_array()
}

impl MeshDescription {
    pub fn vertex_count(&self) -> usize {
        self.vertex_positions.len() / 3
    }

    /// Texture coordinates of channel 0, if present and non-empty.
    pub fn tex_coords(&self) -> Option<&[f32]> {
        self.vertex_tex_coordinates
            .first()
            .map(Vec::as_slice)
            .filter(|coords| !coords.is_empty())
    }

    pub fn indices(&self) -> Option<&[u32]> {
        (!self.indices.is_empty()).then_some(self.indices.as_slice())
    }
}

impl MaterialDescription {
    /// The diffuse texture reference, if one is set.
    pub fn diffuse_texture(&self) -> Option<&str> {
        self.diffuse_texture
            .first()
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    pub fn diffuse_color(&self) -> Color {
        Color::from_array(self.diffuse_reflectance)
    }
}

impl Default for MaterialDescription {
    fn default() -> Self {
        Self {
            diffuse_texture: Vec::new(),
            diffuse_reflectance: default_reflectance(),
        }
    }
}

impl NodeDescription {
    pub fn new(model_matrix: Mat4, mesh_indices: Vec<usize>) -> Self {
        Self {
            model_matrix: model_matrix.to_cols_array(),
            mesh_indices,
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_cols_array(&self.model_matrix)
    }
}

impl SceneDescription {
    /// Parse a JSON scene document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, AssetError> {
        let scene: Self = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn material(&self, mesh: &MeshDescription) -> Option<&MaterialDescription> {
        self.materials.get(mesh.material_index)
    }

    /// Texture used by `mesh`, if it is drawn textured.
    ///
    /// A mesh is textured only when it carries channel 0 texture coordinates
    /// and its material references a diffuse texture. Coordinates on a mesh
    /// with an untextured material are ignored.
    pub fn mesh_texture(&self, mesh: &MeshDescription) -> Option<&str> {
        mesh.tex_coords()?;
        self.material(mesh)?.diffuse_texture()
    }

    /// Check the description is consistent enough to pack.
    pub fn validate(&self) -> Result<(), AssetError> {
        for (index, mesh) in self.meshes.iter().enumerate() {
            self.validate_mesh(index, mesh)?;
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(&mesh) = node.mesh_indices.iter().find(|&&m| m >= self.meshes.len()) {
                return Err(AssetError::MalformedNode {
                    node: index,
                    reason: format!(
                        "mesh index {} out of range ({} meshes)",
                        mesh,
                        self.meshes.len()
                    ),
                });
            }
            if node.model_matrix.iter().any(|v| !v.is_finite()) {
                return Err(AssetError::MalformedNode {
                    node: index,
                    reason: "model matrix has non-finite elements".into(),
                });
            }
        }

        Ok(())
    }

    fn validate_mesh(&self, index: usize, mesh: &MeshDescription) -> Result<(), AssetError> {
        let malformed = |reason: String| AssetError::MalformedMesh {
            mesh: index,
            reason,
        };

        let positions = mesh.vertex_positions.len();
        if positions % 3 != 0 {
            return Err(malformed(format!(
                "{} position elements is not a multiple of 3",
                positions
            )));
        }
        if mesh.vertex_normals.len() != positions {
            return Err(malformed(format!(
                "{} normal elements for {} position elements",
                mesh.vertex_normals.len(),
                positions
            )));
        }
        if mesh.material_index >= self.materials.len() {
            return Err(malformed(format!(
                "material index {} out of range ({} materials)",
                mesh.material_index,
                self.materials.len()
            )));
        }

        let vertex_count = mesh.vertex_count();
        if self.mesh_texture(mesh).is_some() {
            let coords = mesh.tex_coords().map_or(0, <[f32]>::len);
            if coords != vertex_count * 2 {
                return Err(malformed(format!(
                    "{} texture coordinate elements for {} vertices",
                    coords, vertex_count
                )));
            }
        }

        if let Some(&bad) = mesh.indices.iter().find(|&&i| i > u32::from(u16::MAX)) {
            return Err(malformed(format!("index {} does not fit 16 bits", bad)));
        }
        if let Some(&bad) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(malformed(format!(
                "index {} out of range ({} vertices)",
                bad, vertex_count
            )));
        }

        Ok(())
    }
}

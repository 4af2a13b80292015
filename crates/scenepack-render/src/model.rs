//! Packed scene model

use glam::{Mat4, Vec3};
use scenepack_assets::SceneDescription;
use scenepack_core::{normal_matrix, Extents, ExtentsBuilder};
use tracing::{debug, info, warn};

use crate::backend::{BufferId, BufferTarget, DrawCall, GraphicsBackend};
use crate::error::RenderError;
use crate::layout::MeshLayout;
use crate::packer::{pack, PackedGeometry};
use crate::renderable::Renderable;
use crate::uniforms::FrameUniforms;
use crate::vertex::{
    mesh_attributes, NORMAL_LOCATION, POSITION_LOCATION, TEX_COORD_LOCATION,
    VERTEX_ELEMENT_BYTES,
};

/// Compute `transpose(inverse(model_matrix))` for every node, in node order.
pub fn compute_normal_matrices(scene: &SceneDescription) -> Result<Vec<Mat4>, RenderError> {
    scene
        .nodes
        .iter()
        .enumerate()
        .map(|(node, description)| {
            normal_matrix(description.model_matrix())
                .map_err(|source| RenderError::NormalMatrix { node, source })
        })
        .collect()
}

/// World-space extents of every mesh instance in the scene.
///
/// Each node transforms the raw positions of the meshes it references. A
/// scene without nodes, or whose nodes reference no vertices, has
/// [`Extents::EMPTY`].
pub fn compute_extents(scene: &SceneDescription) -> Extents {
    scan_instances(scene).finish()
}

fn scan_instances(scene: &SceneDescription) -> ExtentsBuilder {
    let mut builder = ExtentsBuilder::new();

    for node in &scene.nodes {
        let transform = node.model_matrix();
        for mesh in node.mesh_indices.iter().filter_map(|&m| scene.meshes.get(m)) {
            for position in mesh.vertex_positions.chunks_exact(3) {
                builder.include_transformed(&transform, Vec3::from_slice(position));
            }
        }
    }

    builder
}

/// Best-effort cleanup after a failed upload; deleting also unbinds.
pub(crate) fn discard_buffers(backend: &mut dyn GraphicsBackend, buffers: &[BufferId]) {
    for &buffer in buffers {
        if let Err(e) = backend.delete_buffer(buffer) {
            warn!("Failed to delete buffer {:?}: {}", buffer, e);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ModelBuffers {
    vertices: BufferId,
    indices: Option<BufferId>,
}

/// A scene description together with everything derived from it: packed
/// buffers, per-mesh layouts, per-node normal matrices, and extents.
///
/// The derived data is computed once by [`Model::new`] and never changes.
/// Backend buffers exist between [`Renderable::initialize`] and
/// [`Renderable::release`].
#[derive(Debug)]
pub struct Model {
    description: SceneDescription,
    packed: PackedGeometry,
    normal_matrices: Vec<Mat4>,
    extents: Extents,
    instanced_vertices: usize,
    buffers: Option<ModelBuffers>,
}

impl Model {
    /// Validate and pack `description`, then derive normal matrices and extents.
    pub fn new(description: SceneDescription) -> Result<Self, RenderError> {
        let packed = pack(&description)?;
        let normal_matrices = compute_normal_matrices(&description)?;
        let scan = scan_instances(&description);
        let instanced_vertices = scan.points();
        let extents = scan.finish();

        info!(
            "Model ready: {} meshes, {} nodes, {} vertex elements, {} indices, diagonal {:.3}",
            description.meshes.len(),
            description.nodes.len(),
            packed.vertices.len(),
            packed.indices.len(),
            extents.diagonal
        );

        Ok(Self {
            description,
            packed,
            normal_matrices,
            extents,
            instanced_vertices,
            buffers: None,
        })
    }

    /// Parse a JSON scene document and build a model from it.
    pub fn from_json_str(json: &str) -> Result<Self, RenderError> {
        Self::new(SceneDescription::from_json_str(json)?)
    }

    pub fn description(&self) -> &SceneDescription {
        &self.description
    }

    pub fn packed(&self) -> &PackedGeometry {
        &self.packed
    }

    pub fn layouts(&self) -> &[MeshLayout] {
        &self.packed.layouts
    }

    /// Normal matrices, indexed like the description's nodes
    pub fn normal_matrices(&self) -> &[Mat4] {
        &self.normal_matrices
    }

    pub fn extents(&self) -> Extents {
        self.extents
    }

    /// Vertices scanned for the extents, counted once per node instance.
    /// Zero means the extents are [`Extents::EMPTY`] for lack of geometry.
    pub fn instanced_vertices(&self) -> usize {
        self.instanced_vertices
    }

    pub fn vertex_buffer(&self) -> Option<BufferId> {
        self.buffers.map(|buffers| buffers.vertices)
    }

    pub fn index_buffer(&self) -> Option<BufferId> {
        self.buffers.and_then(|buffers| buffers.indices)
    }

    /// Allocate each shared buffer once at its full size, then fill it mesh by mesh.
    ///
    /// On failure every buffer created so far is deleted again.
    fn upload(&self, backend: &mut dyn GraphicsBackend) -> Result<ModelBuffers, RenderError> {
        let sizes = self.packed.sizes();

        let vertices = backend.create_buffer("model vertices");
        if let Err(e) = self.fill_vertices(backend, vertices) {
            discard_buffers(backend, &[vertices]);
            return Err(e);
        }

        let indices = if sizes.index_elements > 0 {
            let indices = backend.create_buffer("model indices");
            if let Err(e) = self.fill_indices(backend, indices) {
                discard_buffers(backend, &[vertices, indices]);
                return Err(e);
            }
            Some(indices)
        } else {
            None
        };

        debug!(
            "Uploaded {} vertex bytes, {} index bytes",
            sizes.vertex_bytes(),
            sizes.index_bytes()
        );

        Ok(ModelBuffers { vertices, indices })
    }

    fn fill_vertices(
        &self,
        backend: &mut dyn GraphicsBackend,
        buffer: BufferId,
    ) -> Result<(), RenderError> {
        backend.bind_buffer(BufferTarget::Vertex, Some(buffer))?;
        backend.allocate(BufferTarget::Vertex, self.packed.sizes().vertex_bytes())?;
        for (mesh, layout) in self.packed.layouts.iter().enumerate() {
            let data = self.packed.mesh_vertices(mesh).unwrap_or_default();
            backend.write_sub_range(
                BufferTarget::Vertex,
                layout.positions_offset * VERTEX_ELEMENT_BYTES,
                bytemuck::cast_slice(data),
            )?;
        }
        backend.bind_buffer(BufferTarget::Vertex, None)
    }

    fn fill_indices(
        &self,
        backend: &mut dyn GraphicsBackend,
        buffer: BufferId,
    ) -> Result<(), RenderError> {
        backend.bind_buffer(BufferTarget::Index, Some(buffer))?;
        backend.allocate(BufferTarget::Index, self.packed.sizes().index_bytes())?;
        for (mesh, layout) in self.packed.layouts.iter().enumerate() {
            if let (Some(byte_offset), Some(data)) =
                (layout.indices_byte_offset, self.packed.mesh_indices(mesh))
            {
                backend.write_sub_range(BufferTarget::Index, byte_offset, bytemuck::cast_slice(data))?;
            }
        }
        backend.bind_buffer(BufferTarget::Index, None)
    }

    fn draw_mesh(
        &self,
        backend: &mut dyn GraphicsBackend,
        mesh_index: usize,
    ) -> Result<(), RenderError> {
        let (mesh, layout) = self
            .description
            .meshes
            .get(mesh_index)
            .zip(self.packed.layouts.get(mesh_index))
            .ok_or_else(|| RenderError::LayoutMismatch(format!("no mesh {}", mesh_index)))?;
        if layout.vertex_count == 0 {
            return Ok(());
        }

        let color = self
            .description
            .material(mesh)
            .map(|material| material.diffuse_color())
            .unwrap_or_default();
        backend.set_uniform_vec4("diffuseColor", color.into());

        let texture = if layout.has_texture {
            self.description.mesh_texture(mesh)
        } else {
            None
        };
        backend.bind_texture(0, texture);

        if !layout.has_texture {
            backend.disable_attribute(TEX_COORD_LOCATION);
        }
        for attribute in mesh_attributes(layout) {
            backend.enable_attribute(attribute);
        }

        let call = match layout.indices_byte_offset {
            Some(byte_offset) => DrawCall::Indexed {
                count: layout.index_count,
                byte_offset,
            },
            None => DrawCall::Arrays {
                first: 0,
                count: layout.vertex_count,
            },
        };
        backend.draw(call)
    }
}

impl Renderable for Model {
    fn initialize(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), RenderError> {
        if self.buffers.is_some() {
            debug!("Model already initialized");
            return Ok(());
        }
        self.buffers = Some(self.upload(backend)?);
        Ok(())
    }

    fn render(
        &self,
        backend: &mut dyn GraphicsBackend,
        uniforms: &FrameUniforms,
    ) -> Result<(), RenderError> {
        let buffers = self.buffers.ok_or(RenderError::NotInitialized("model"))?;

        backend.set_uniform_mat4("viewMatrix", &uniforms.view);
        backend.set_uniform_mat4("projectionMatrix", &uniforms.projection);
        backend.bind_buffer(BufferTarget::Vertex, Some(buffers.vertices))?;
        backend.bind_buffer(BufferTarget::Index, buffers.indices)?;

        for (node, normal_matrix) in self.description.nodes.iter().zip(&self.normal_matrices) {
            backend.set_uniform_mat4("modelMatrix", &node.model_matrix());
            backend.set_uniform_mat4("normalMatrix", normal_matrix);
            for &mesh_index in &node.mesh_indices {
                self.draw_mesh(backend, mesh_index)?;
            }
        }

        for location in [POSITION_LOCATION, NORMAL_LOCATION, TEX_COORD_LOCATION] {
            backend.disable_attribute(location);
        }
        backend.bind_texture(0, None);
        backend.bind_buffer(BufferTarget::Index, None)?;
        backend.bind_buffer(BufferTarget::Vertex, None)?;
        Ok(())
    }

    fn release(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), RenderError> {
        if let Some(buffers) = self.buffers.take() {
            backend.delete_buffer(buffers.vertices)?;
            if let Some(indices) = buffers.indices {
                backend.delete_buffer(indices)?;
            }
        }
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.buffers.is_some()
    }
}

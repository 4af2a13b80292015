//! Built-in renderables: a textured floor plane and a sky box

use glam::Mat4;
use scenepack_assets::{MaterialDescription, MeshDescription, NodeDescription, SceneDescription};
use scenepack_core::Color;

use crate::backend::{BufferId, BufferTarget, DrawCall, GraphicsBackend};
use crate::error::RenderError;
use crate::model::{discard_buffers, Model};
use crate::renderable::Renderable;
use crate::uniforms::FrameUniforms;
use crate::vertex::{position_attribute, POSITION_LOCATION, VERTEX_ELEMENT_BYTES};

/// Largest grid whose `(s + 1)^2` vertices are all addressable by 16-bit indices
pub const MAX_FLOOR_SUBDIVISIONS: u32 = 255;

/// Generate a flat grid on y = 0 centered at the origin, facing +Y, with
/// texture coordinates spanning 0..1 across the grid.
///
/// Zero subdivisions is treated as one cell. Grids finer than
/// [`MAX_FLOOR_SUBDIVISIONS`] are rejected before any vertex is generated.
pub fn plane_mesh(size: f32, subdivisions: u32) -> Result<MeshDescription, RenderError> {
    if subdivisions > MAX_FLOOR_SUBDIVISIONS {
        return Err(RenderError::TooManySubdivisions {
            subdivisions,
            max: MAX_FLOOR_SUBDIVISIONS,
        });
    }

    let subdivisions = subdivisions.max(1);
    let mut mesh = MeshDescription::default();
    let mut tex_coords = Vec::new();

    let half_size = size / 2.0;
    let step = size / subdivisions as f32;

    for z in 0..=subdivisions {
        for x in 0..=subdivisions {
            let px = -half_size + x as f32 * step;
            let pz = -half_size + z as f32 * step;

            mesh.vertex_positions.extend([px, 0.0, pz]);
            mesh.vertex_normals.extend([0.0, 1.0, 0.0]);
            tex_coords.extend([
                x as f32 / subdivisions as f32,
                z as f32 / subdivisions as f32,
            ]);
        }
    }

    for z in 0..subdivisions {
        for x in 0..subdivisions {
            let current = z * (subdivisions + 1) + x;
            let next = current + subdivisions + 1;

            mesh.indices
                .extend([current, next, current + 1, current + 1, next, next + 1]);
        }
    }

    mesh.vertex_tex_coordinates.push(tex_coords);
    Ok(mesh)
}

/// A ground plane drawn through the same packing path as scene models.
#[derive(Debug)]
pub struct Floor {
    model: Model,
}

impl Floor {
    /// An untextured floor of edge length `size` split into `subdivisions`
    /// cells per side.
    pub fn new(size: f32, subdivisions: u32, color: Color) -> Result<Self, RenderError> {
        Self::build(size, subdivisions, color, None)
    }

    pub fn textured(
        size: f32,
        subdivisions: u32,
        texture: impl Into<String>,
    ) -> Result<Self, RenderError> {
        Self::build(size, subdivisions, Color::WHITE, Some(texture.into()))
    }

    fn build(
        size: f32,
        subdivisions: u32,
        color: Color,
        texture: Option<String>,
    ) -> Result<Self, RenderError> {
        let scene = SceneDescription {
            meshes: vec![plane_mesh(size, subdivisions)?],
            materials: vec![MaterialDescription {
                diffuse_texture: texture.into_iter().collect(),
                diffuse_reflectance: color.to_array(),
            }],
            nodes: vec![NodeDescription::new(Mat4::IDENTITY, vec![0])],
        };
        Ok(Self {
            model: Model::new(scene)?,
        })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }
}

impl Renderable for Floor {
    fn initialize(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), RenderError> {
        self.model.initialize(backend)
    }

    fn render(
        &self,
        backend: &mut dyn GraphicsBackend,
        uniforms: &FrameUniforms,
    ) -> Result<(), RenderError> {
        self.model.render(backend, uniforms)
    }

    fn release(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), RenderError> {
        self.model.release(backend)
    }

    fn is_initialized(&self) -> bool {
        self.model.is_initialized()
    }
}

// Unit cube corners, indexed by bit pattern: x = bit 0, y = bit 1, z = bit 2.
const CUBE_CORNERS: [[f32; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
];

// Quads wound counter-clockwise seen from outside.
const CUBE_FACES: [[usize; 4]; 6] = [
    [1, 3, 7, 5], // +x
    [4, 6, 2, 0], // -x
    [2, 6, 7, 3], // +y
    [0, 1, 5, 4], // -y
    [5, 7, 6, 4], // +z
    [0, 2, 3, 1], // -z
];

pub const SKY_BOX_VERTICES: usize = 36;

/// Unwound triangle list of the inward-facing unit cube
pub fn sky_box_positions() -> Vec<f32> {
    // Triangles are emitted with reversed winding to face the camera inside.
    CUBE_FACES
        .iter()
        .flat_map(|&[a, b, c, d]| [a, c, b, a, d, c])
        .flat_map(|corner| CUBE_CORNERS[corner])
        .collect()
}

fn fill_vertex_buffer(
    backend: &mut dyn GraphicsBackend,
    buffer: BufferId,
    positions: &[f32],
) -> Result<(), RenderError> {
    backend.bind_buffer(BufferTarget::Vertex, Some(buffer))?;
    backend.allocate(BufferTarget::Vertex, positions.len() * VERTEX_ELEMENT_BYTES)?;
    backend.write_sub_range(BufferTarget::Vertex, 0, bytemuck::cast_slice(positions))?;
    backend.bind_buffer(BufferTarget::Vertex, None)
}

/// Camera-centered cube textured with a cube map.
#[derive(Debug)]
pub struct SkyBox {
    cube_map: String,
    buffer: Option<BufferId>,
}

impl SkyBox {
    /// `cube_map` names the cube map texture the backend binds while drawing.
    pub fn new(cube_map: impl Into<String>) -> Self {
        Self {
            cube_map: cube_map.into(),
            buffer: None,
        }
    }

    pub fn cube_map(&self) -> &str {
        &self.cube_map
    }

    pub fn vertex_buffer(&self) -> Option<BufferId> {
        self.buffer
    }
}

impl Renderable for SkyBox {
    fn initialize(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), RenderError> {
        if self.buffer.is_some() {
            return Ok(());
        }

        let positions = sky_box_positions();
        let buffer = backend.create_buffer("sky box");
        let filled = fill_vertex_buffer(backend, buffer, &positions);
        if let Err(e) = filled {
            discard_buffers(backend, &[buffer]);
            return Err(e);
        }

        self.buffer = Some(buffer);
        Ok(())
    }

    fn render(
        &self,
        backend: &mut dyn GraphicsBackend,
        uniforms: &FrameUniforms,
    ) -> Result<(), RenderError> {
        let buffer = self.buffer.ok_or(RenderError::NotInitialized("sky box"))?;

        backend.set_depth_write(false);
        backend.set_uniform_mat4("viewMatrix", &uniforms.sky_view());
        backend.set_uniform_mat4("projectionMatrix", &uniforms.projection);
        backend.bind_buffer(BufferTarget::Vertex, Some(buffer))?;
        backend.enable_attribute(position_attribute());
        backend.bind_texture(0, Some(&self.cube_map));

        let drawn = backend.draw(DrawCall::Arrays {
            first: 0,
            count: SKY_BOX_VERTICES,
        });

        backend.bind_texture(0, None);
        backend.disable_attribute(POSITION_LOCATION);
        backend.bind_buffer(BufferTarget::Vertex, None)?;
        backend.set_depth_write(true);
        drawn
    }

    fn release(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), RenderError> {
        if let Some(buffer) = self.buffer.take() {
            backend.delete_buffer(buffer)?;
        }
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.buffer.is_some()
    }
}

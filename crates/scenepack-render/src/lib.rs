//! scenepack render - Geometry packing and renderables
//!
//! Turns a scene description into one interleaved vertex buffer and one
//! 16-bit index buffer with per-mesh offsets, computes per-node normal
//! matrices and world-space extents, and draws the result through a small
//! backend-agnostic graphics capability.

pub mod backend;
pub mod error;
pub mod layout;
pub mod model;
pub mod packer;
pub mod primitives;
pub mod renderable;
pub mod uniforms;
pub mod vertex;

pub use backend::{
    BufferId, BufferTarget, DrawCall, GraphicsBackend, HeadlessBackend, HeadlessBuffer,
    RecordedDraw, VertexAttribute,
};
pub use error::RenderError;
pub use layout::{compute_layouts, BufferSizes, MeshLayout};
pub use model::{compute_extents, compute_normal_matrices, Model};
pub use packer::{pack, write_geometry, PackedGeometry, PackedVertex};
pub use primitives::{Floor, SkyBox};
pub use renderable::Renderable;
pub use uniforms::FrameUniforms;

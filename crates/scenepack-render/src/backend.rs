//! Graphics backend capability
//!
//! Renderables only ever talk to the graphics API through
//! [`GraphicsBackend`]. [`HeadlessBackend`] implements it in memory, which is
//! what the command line tool and the tests run against.

use std::collections::{BTreeMap, HashMap};

use glam::{Mat4, Vec4};
use tracing::debug;

use crate::error::RenderError;

/// Backend-assigned buffer name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Binding point a buffer is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
}

/// A vertex attribute pointer into the bound vertex buffer. Stride and
/// offset are in bytes; components are 32-bit floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: u32,
    pub stride_bytes: usize,
    pub offset_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    /// Draw `count` vertices starting at vertex `first`
    Arrays { first: usize, count: usize },
    /// Draw `count` 16-bit indices starting `byte_offset` into the index buffer
    Indexed { count: usize, byte_offset: usize },
}

/// The subset of a graphics API the renderables need.
pub trait GraphicsBackend {
    fn create_buffer(&mut self, label: &str) -> BufferId;

    /// Attach `buffer` to `target`, or detach with `None`.
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>)
        -> Result<(), RenderError>;

    /// Reserve storage for the buffer bound to `target`. Storage is sized once.
    fn allocate(&mut self, target: BufferTarget, byte_len: usize) -> Result<(), RenderError>;

    fn write_sub_range(
        &mut self,
        target: BufferTarget,
        byte_offset: usize,
        data: &[u8],
    ) -> Result<(), RenderError>;

    fn delete_buffer(&mut self, buffer: BufferId) -> Result<(), RenderError>;

    fn enable_attribute(&mut self, attribute: VertexAttribute);

    fn disable_attribute(&mut self, location: u32);

    fn set_uniform_mat4(&mut self, name: &str, value: &Mat4);

    fn set_uniform_vec4(&mut self, name: &str, value: Vec4);

    /// Bind a texture by reference to `unit`, or unbind with `None`.
    fn bind_texture(&mut self, unit: u32, texture: Option<&str>);

    fn set_depth_write(&mut self, enabled: bool);

    fn draw(&mut self, call: DrawCall) -> Result<(), RenderError>;
}

/// Storage of one headless buffer.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBuffer {
    pub label: String,
    pub data: Vec<u8>,
    pub allocated: bool,
}

/// State captured at the time of a draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub call: DrawCall,
    pub vertex_buffer: Option<BufferId>,
    pub index_buffer: Option<BufferId>,
    pub attributes: Vec<VertexAttribute>,
    pub model_matrix: Option<Mat4>,
    pub texture: Option<String>,
    pub depth_write: bool,
}

/// In-memory backend with bounds-checked buffers and a log of draws.
#[derive(Debug)]
pub struct HeadlessBackend {
    next_id: u32,
    buffers: HashMap<BufferId, HeadlessBuffer>,
    bound: HashMap<BufferTarget, BufferId>,
    attributes: BTreeMap<u32, VertexAttribute>,
    mat4_uniforms: HashMap<String, Mat4>,
    vec4_uniforms: HashMap<String, Vec4>,
    textures: HashMap<u32, String>,
    depth_write: bool,
    draws: Vec<RecordedDraw>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            buffers: HashMap::new(),
            bound: HashMap::new(),
            attributes: BTreeMap::new(),
            mat4_uniforms: HashMap::new(),
            vec4_uniforms: HashMap::new(),
            textures: HashMap::new(),
            depth_write: true,
            draws: Vec::new(),
        }
    }

    pub fn buffer(&self, id: BufferId) -> Option<&HeadlessBuffer> {
        self.buffers.get(&id)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn bound(&self, target: BufferTarget) -> Option<BufferId> {
        self.bound.get(&target).copied()
    }

    pub fn enabled_attributes(&self) -> impl Iterator<Item = &VertexAttribute> {
        self.attributes.values()
    }

    pub fn uniform_mat4(&self, name: &str) -> Option<Mat4> {
        self.mat4_uniforms.get(name).copied()
    }

    pub fn uniform_vec4(&self, name: &str) -> Option<Vec4> {
        self.vec4_uniforms.get(name).copied()
    }

    pub fn texture(&self, unit: u32) -> Option<&str> {
        self.textures.get(&unit).map(String::as_str)
    }

    pub fn depth_write(&self) -> bool {
        self.depth_write
    }

    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    fn bound_buffer_mut(
        &mut self,
        target: BufferTarget,
    ) -> Result<(BufferId, &mut HeadlessBuffer), RenderError> {
        let id = self
            .bound
            .get(&target)
            .copied()
            .ok_or(RenderError::NoBufferBound(target))?;
        let buffer = self
            .buffers
            .get_mut(&id)
            .ok_or(RenderError::UnknownBuffer(id))?;
        Ok((id, buffer))
    }

    fn bound_len(&self, target: BufferTarget) -> Result<usize, RenderError> {
        let id = self.bound(target).ok_or(RenderError::NoBufferBound(target))?;
        self.buffers
            .get(&id)
            .map(|buffer| buffer.data.len())
            .ok_or(RenderError::UnknownBuffer(id))
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn create_buffer(&mut self, label: &str) -> BufferId {
        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.buffers.insert(
            id,
            HeadlessBuffer {
                label: label.to_string(),
                ..Default::default()
            },
        );
        id
    }

    fn bind_buffer(
        &mut self,
        target: BufferTarget,
        buffer: Option<BufferId>,
    ) -> Result<(), RenderError> {
        match buffer {
            Some(id) if !self.buffers.contains_key(&id) => Err(RenderError::UnknownBuffer(id)),
            Some(id) => {
                self.bound.insert(target, id);
                Ok(())
            }
            None => {
                self.bound.remove(&target);
                Ok(())
            }
        }
    }

    fn allocate(&mut self, target: BufferTarget, byte_len: usize) -> Result<(), RenderError> {
        let (id, buffer) = self.bound_buffer_mut(target)?;
        if buffer.allocated {
            return Err(RenderError::AlreadyAllocated(id));
        }
        buffer.data = vec![0; byte_len];
        buffer.allocated = true;
        debug!("Allocated {} bytes for '{}'", byte_len, buffer.label);
        Ok(())
    }

    fn write_sub_range(
        &mut self,
        target: BufferTarget,
        byte_offset: usize,
        data: &[u8],
    ) -> Result<(), RenderError> {
        let (_, buffer) = self.bound_buffer_mut(target)?;
        let capacity = buffer.data.len();
        let dst = buffer
            .data
            .get_mut(byte_offset..byte_offset + data.len())
            .ok_or(RenderError::BufferOverflow {
                offset: byte_offset,
                len: data.len(),
                capacity,
            })?;
        dst.copy_from_slice(data);
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) -> Result<(), RenderError> {
        self.buffers
            .remove(&buffer)
            .ok_or(RenderError::UnknownBuffer(buffer))?;
        self.bound.retain(|_, bound| *bound != buffer);
        Ok(())
    }

    fn enable_attribute(&mut self, attribute: VertexAttribute) {
        self.attributes.insert(attribute.location, attribute);
    }

    fn disable_attribute(&mut self, location: u32) {
        self.attributes.remove(&location);
    }

    fn set_uniform_mat4(&mut self, name: &str, value: &Mat4) {
        self.mat4_uniforms.insert(name.to_string(), *value);
    }

    fn set_uniform_vec4(&mut self, name: &str, value: Vec4) {
        self.vec4_uniforms.insert(name.to_string(), value);
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<&str>) {
        match texture {
            Some(name) => self.textures.insert(unit, name.to_string()),
            None => self.textures.remove(&unit),
        };
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    fn draw(&mut self, call: DrawCall) -> Result<(), RenderError> {
        let vertex_buffer = self.bound(BufferTarget::Vertex);
        if vertex_buffer.is_none() {
            return Err(RenderError::NoBufferBound(BufferTarget::Vertex));
        }

        if let DrawCall::Indexed { count, byte_offset } = call {
            let capacity = self.bound_len(BufferTarget::Index)?;
            let len = count * std::mem::size_of::<u16>();
            if byte_offset + len > capacity {
                return Err(RenderError::BufferOverflow {
                    offset: byte_offset,
                    len,
                    capacity,
                });
            }
        }

        self.draws.push(RecordedDraw {
            call,
            vertex_buffer,
            index_buffer: self.bound(BufferTarget::Index),
            attributes: self.attributes.values().copied().collect(),
            model_matrix: self.uniform_mat4("modelMatrix"),
            texture: self.texture(0).map(str::to_string),
            depth_write: self.depth_write,
        });
        Ok(())
    }
}

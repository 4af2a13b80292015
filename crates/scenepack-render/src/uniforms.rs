//! Per-frame uniforms shared by all renderables

use glam::{Mat3, Mat4};

/// Camera matrices for one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameUniforms {
    /// View matrix (camera)
    pub view: Mat4,
    /// Projection matrix
    pub projection: Mat4,
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

impl FrameUniforms {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view, projection }
    }

    /// View matrix with its translation removed, so geometry drawn with it
    /// stays centered on the camera.
    pub fn sky_view(&self) -> Mat4 {
        Mat4::from_mat3(Mat3::from_mat4(self.view))
    }
}

use crate::backend::GraphicsBackend;
use crate::error::RenderError;
use crate::uniforms::FrameUniforms;

/// Something that owns backend resources and can draw itself.
///
/// The lifecycle is `initialize` once, `render` any number of times, then
/// `release`. Rendering before `initialize` or after `release` fails with
/// [`RenderError::NotInitialized`].
pub trait Renderable {
    /// Create and fill the backend resources.
    fn initialize(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), RenderError>;

    /// Bind, configure, draw, unbind.
    fn render(
        &self,
        backend: &mut dyn GraphicsBackend,
        uniforms: &FrameUniforms,
    ) -> Result<(), RenderError>;

    /// Delete the backend resources.
    fn release(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), RenderError>;

    fn is_initialized(&self) -> bool;
}

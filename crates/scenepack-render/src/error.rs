use scenepack_assets::AssetError;
use scenepack_core::CoreError;

use crate::backend::{BufferId, BufferTarget};

/// Errors raised while packing geometry or talking to a graphics backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("normal matrix for node {node}: {source}")]
    NormalMatrix {
        node: usize,
        #[source]
        source: CoreError,
    },

    #[error("layout mismatch: {0}")]
    LayoutMismatch(String),

    #[error("index {0} does not fit 16 bits")]
    IndexOverflow(u32),

    #[error("{subdivisions} subdivisions exceed the {max} a 16-bit index buffer can address")]
    TooManySubdivisions { subdivisions: u32, max: u32 },

    #[error("{0} has not been initialized")]
    NotInitialized(&'static str),

    #[error("unknown buffer {0:?}")]
    UnknownBuffer(BufferId),

    #[error("no buffer bound to the {0:?} target")]
    NoBufferBound(BufferTarget),

    #[error("buffer {0:?} is already allocated")]
    AlreadyAllocated(BufferId),

    #[error("{len} bytes at offset {offset} overflow a buffer of {capacity} bytes")]
    BufferOverflow {
        offset: usize,
        len: usize,
        capacity: usize,
    },
}

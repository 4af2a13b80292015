use std::path::PathBuf;

/// Errors that can occur while loading or validating a scene description.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error loading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse scene description: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to load glTF file '{0}': {1}")]
    GltfLoadFailed(PathBuf, String),

    #[error("unsupported scene format in '{0}'")]
    UnsupportedFormat(PathBuf),

    #[error("malformed mesh {mesh}: {reason}")]
    MalformedMesh { mesh: usize, reason: String },

    #[error("malformed node {node}: {reason}")]
    MalformedNode { node: usize, reason: String },
}

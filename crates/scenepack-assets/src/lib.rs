//! scenepack assets - Scene description loading
//!
//! Provides the parsed scene description (meshes, materials, nodes), a JSON
//! loader that validates it up front, a glTF 2.0 importer producing the same
//! description, and a small registry that caches loaded scenes by path.

mod description;
mod error;
mod gltf_loader;
mod scene_loader;
mod server;

pub use description::{MaterialDescription, MeshDescription, NodeDescription, SceneDescription};
pub use error::AssetError;
pub use gltf_loader::load_gltf;
pub use scene_loader::load_scene;
pub use server::{AssetServer, SceneHandle};

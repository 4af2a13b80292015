use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::description::SceneDescription;
use crate::error::AssetError;
use crate::{gltf_loader, scene_loader};

/// Identifies a scene loaded into an [`AssetServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneHandle(u64);

impl SceneHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Scene registry. Loads scene descriptions by path and caches them so that
/// repeated loads of the same file share one parsed description.
pub struct AssetServer {
    base_path: PathBuf,
    next_id: u64,
    scenes: HashMap<SceneHandle, SceneDescription>,
    path_to_scene: HashMap<PathBuf, SceneHandle>,
}

impl AssetServer {
    /// Create a new AssetServer rooted at the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        info!("AssetServer created with base path: {}", base_path.display());
        Self {
            base_path,
            next_id: 1,
            scenes: HashMap::new(),
            path_to_scene: HashMap::new(),
        }
    }

    /// Resolve a relative asset path against the base path.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    /// Load a scene description, choosing the loader from the file extension
    /// (`json`, or `gltf`/`glb`). Subsequent loads of the same path return
    /// the cached handle.
    pub fn load_scene(&mut self, path: &Path) -> Result<SceneHandle, AssetError> {
        let full_path = self.resolve(path);

        if let Some(&handle) = self.path_to_scene.get(&full_path) {
            return Ok(handle);
        }

        if !full_path.exists() {
            return Err(AssetError::NotFound(full_path));
        }

        let extension = full_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let scene = match extension.as_deref() {
            Some("json") => scene_loader::load_scene(&full_path)?,
            Some("gltf" | "glb") => gltf_loader::load_gltf(&full_path)?,
            _ => return Err(AssetError::UnsupportedFormat(full_path)),
        };

        let handle = SceneHandle(self.next_id);
        self.next_id += 1;
        self.scenes.insert(handle, scene);
        self.path_to_scene.insert(full_path, handle);

        Ok(handle)
    }

    /// Get a reference to a loaded scene by its handle.
    pub fn get_scene(&self, handle: SceneHandle) -> Option<&SceneDescription> {
        self.scenes.get(&handle)
    }

    /// Remove a scene from the registry, returning its description.
    pub fn take_scene(&mut self, handle: SceneHandle) -> Option<SceneDescription> {
        self.path_to_scene.retain(|_, h| *h != handle);
        self.scenes.remove(&handle)
    }

    pub fn is_loaded(&self, handle: SceneHandle) -> bool {
        self.scenes.contains_key(&handle)
    }
}

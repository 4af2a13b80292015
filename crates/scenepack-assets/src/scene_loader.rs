use std::fs;
use std::path::Path;

use tracing::debug;

use crate::description::SceneDescription;
use crate::error::AssetError;

/// Load a JSON scene description from disk and validate it.
pub fn load_scene(path: &Path) -> Result<SceneDescription, AssetError> {
    if !path.exists() {
        return Err(AssetError::NotFound(path.to_path_buf()));
    }

    let json = fs::read_to_string(path).map_err(|e| AssetError::Io(path.to_path_buf(), e))?;
    let scene = SceneDescription::from_json_str(&json)?;

    debug!(
        "Scene '{}': {} meshes, {} materials, {} nodes",
        path.display(),
        scene.meshes.len(),
        scene.materials.len(),
        scene.nodes.len()
    );

    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_fixture(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("scenepack-scene-loader");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_valid_scene() {
        let path = write_fixture(
            "quad.json",
            r#"{
                "meshes": [{
                    "vertexPositions": [0, 0, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0],
                    "vertexNormals": [0, 0, 1, 0, 0, 1, 0, 0, 1, 0, 0, 1],
                    "indices": [0, 1, 2, 0, 2, 3],
                    "materialIndex": 0
                }],
                "materials": [{"diffuseReflectance": [1, 0, 0, 1]}],
                "nodes": [{
                    "modelMatrix": [1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1],
                    "meshIndices": [0]
                }]
            }"#,
        );

        let scene = load_scene(&path).unwrap();
        assert_eq!(scene.meshes[0].vertex_count(), 4);
        assert_eq!(scene.meshes[0].indices.len(), 6);
    }

    #[test]
    fn missing_file_returns_not_found() {
        match load_scene(Path::new("/nonexistent/scene.json")) {
            Err(AssetError::NotFound(path)) => {
                assert_eq!(path, PathBuf::from("/nonexistent/scene.json"))
            }
            other => panic!("expected NotFound, got: {:?}", other),
        }
    }

    #[test]
    fn invalid_json_returns_parse_error() {
        let path = write_fixture("broken.json", "{ \"meshes\": [");
        assert!(matches!(load_scene(&path), Err(AssetError::Parse(_))));
    }

    #[test]
    fn malformed_scene_is_rejected_on_load() {
        let path = write_fixture(
            "malformed.json",
            r#"{
                "meshes": [{"vertexPositions": [0, 0], "vertexNormals": [0, 0], "materialIndex": 0}],
                "materials": [{}],
                "nodes": []
            }"#,
        );
        assert!(matches!(
            load_scene(&path),
            Err(AssetError::MalformedMesh { mesh: 0, .. })
        ));
    }
}

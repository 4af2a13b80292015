//! scenepack - packs scene descriptions into GPU-ready vertex and index buffers
//!
//! Usage: `scenepack <scene.json|scene.gltf|scene.glb> [output-dir]`

mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::FmtSubscriber;

use scenepack_assets::AssetServer;
use scenepack_core::{Color, Extents};
use scenepack_render::{
    BufferSizes, Floor, FrameUniforms, HeadlessBackend, MeshLayout, Model, Renderable,
};

use settings::{PackSettings, SettingsSource};

/// Everything a consumer needs to bind the written blobs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LayoutReport<'a> {
    source: &'a Path,
    sizes: BufferSizes,
    meshes: &'a [MeshLayout],
    normal_matrices: &'a [Mat4],
    extents: Extents,
}

/// Place the camera on the +Z side of the model, far enough back to see
/// the whole diagonal.
fn framing(extents: &Extents) -> FrameUniforms {
    let radius = (extents.diagonal * 0.5).max(1.0);
    let eye = extents.center + Vec3::new(0.0, radius * 0.5, radius * 2.5);
    let view = Mat4::look_at_rh(eye, extents.center, Vec3::Y);
    let projection = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, radius * 10.0);
    FrameUniforms::new(view, projection)
}

fn write_outputs(model: &Model, source: &Path, directory: &Path) -> Result<()> {
    fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create output directory {:?}", directory))?;

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scene");

    let packed = model.packed();
    let vertices_path = directory.join(format!("{stem}.vertices.bin"));
    fs::write(&vertices_path, packed.vertex_bytes())
        .with_context(|| format!("Failed to write {:?}", vertices_path))?;

    if !packed.indices.is_empty() {
        let indices_path = directory.join(format!("{stem}.indices.bin"));
        fs::write(&indices_path, packed.index_bytes())
            .with_context(|| format!("Failed to write {:?}", indices_path))?;
    }

    let report = LayoutReport {
        source,
        sizes: packed.sizes(),
        meshes: model.layouts(),
        normal_matrices: model.normal_matrices(),
        extents: model.extents(),
    };
    let report_path = directory.join(format!("{stem}.layout.json"));
    fs::write(&report_path, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("Failed to write {:?}", report_path))?;

    info!("Wrote packed buffers to {:?}", directory);
    Ok(())
}

fn main() -> Result<()> {
    let (settings, source) = PackSettings::load();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.logging.max_level())
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    source.log();
    if let SettingsSource::Missing(_) = source {
        // Leave a template behind for the user to edit.
        if let Err(e) = settings.save() {
            warn!("Failed to write default settings: {}", e);
        }
    }

    let mut args = std::env::args().skip(1);
    let Some(scene_arg) = args.next() else {
        anyhow::bail!("usage: scenepack <scene.json|scene.gltf|scene.glb> [output-dir]");
    };
    let scene_path = PathBuf::from(scene_arg);
    let output_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.output.directory.clone());

    let mut assets = AssetServer::new(std::env::current_dir()?);
    let handle = assets
        .load_scene(&scene_path)
        .with_context(|| format!("Failed to load scene {:?}", scene_path))?;
    let description = assets
        .take_scene(handle)
        .context("Loaded scene vanished from the asset server")?;
    info!("Loaded scene {} from {:?}", handle.id(), scene_path);

    let mut model = Model::new(description).context("Failed to pack scene")?;
    let sizes = model.packed().sizes();
    info!(
        "Packed {} meshes across {} nodes: {} vertex bytes, {} index bytes",
        model.layouts().len(),
        model.description().nodes.len(),
        sizes.vertex_bytes(),
        sizes.index_bytes()
    );

    let extents = model.extents();
    if model.instanced_vertices() == 0 {
        warn!("Scene has no instanced geometry");
    } else {
        info!(
            "Extents: min {:?}, max {:?}, center {:?}",
            extents.min, extents.max, extents.center
        );
    }

    let mut renderables: Vec<Box<dyn Renderable>> = Vec::new();
    if settings.floor.enabled() {
        let floor = Floor::new(
            settings.floor.size,
            settings.floor.subdivisions,
            Color::rgb(0.5, 0.5, 0.5),
        )
        .context("Failed to build floor")?;
        renderables.push(Box::new(floor));
    }

    // Dry-run the upload and draw path so layout problems surface here.
    let mut backend = HeadlessBackend::new();
    let uniforms = framing(&extents);
    model.initialize(&mut backend)?;
    model.render(&mut backend, &uniforms)?;
    for renderable in &mut renderables {
        renderable.initialize(&mut backend)?;
        renderable.render(&mut backend, &uniforms)?;
    }
    info!("Recorded {} draw calls", backend.draws().len());
    for draw in backend.draws() {
        debug!("{:?}", draw.call);
    }

    if settings.output.write_buffers {
        write_outputs(&model, &scene_path, &output_dir)?;
    }

    for renderable in &mut renderables {
        renderable.release(&mut backend)?;
    }
    model.release(&mut backend)?;
    Ok(())
}


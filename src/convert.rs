//! The GLB to OBJ flow: import, bake, re-material, check, export.

use std::path::Path;

use crate::{
    bake::{self, BakeOutcome},
    data_structures::{model::DEFAULT_COLOR_LAYER, scene::Scene},
    error::Result,
    printability::{self, PrintabilityReport},
    resources::{
        self,
        obj::{self, ObjExportOptions, ObjStats},
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Name of the vertex-color layer to bake into and export.
    pub layer_name: String,
    pub export: ObjExportOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            layer_name: DEFAULT_COLOR_LAYER.to_string(),
            export: ObjExportOptions::default(),
        }
    }
}

impl ConvertOptions {
    fn export_options(&self) -> ObjExportOptions {
        ObjExportOptions {
            color_layer: self.layer_name.clone(),
            ..self.export.clone()
        }
    }
}

/// Per-object results of a conversion.
#[derive(Clone, Debug, Default)]
pub struct ConvertSummary {
    pub bakes: Vec<(String, BakeOutcome)>,
    pub reports: Vec<PrintabilityReport>,
    pub export: ObjStats,
}

impl ConvertSummary {
    pub fn baked_count(&self) -> usize {
        self.bakes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, BakeOutcome::Baked { .. }))
            .count()
    }

    pub fn non_manifold(&self) -> impl Iterator<Item = &PrintabilityReport> {
        self.reports.iter().filter(|r| !r.is_manifold)
    }
}

/// Bake, re-material and check every mesh object of an already loaded scene.
///
/// The texture is sampled before the material is replaced, so the bake still
/// sees the imported image texture. Every mesh object ends up selected.
pub fn process_scene(scene: &mut Scene, layer_name: &str) -> ConvertSummary {
    let mut summary = ConvertSummary::default();
    scene.select_all(false);
    for index in scene.mesh_indices() {
        let object = &mut scene.objects[index];
        object.selected = true;

        let outcome = bake::bake_texture_to_vertex_colors(object, layer_name);
        summary.bakes.push((object.name.clone(), outcome));
        bake::assign_vertex_color_material(object, layer_name);
        if let Some(report) = printability::check_3d_printability(object) {
            summary.reports.push(report);
        }
    }
    summary
}

/// Convert `input` (GLB/glTF) to `output` (OBJ) with baked vertex colors.
pub fn convert(input: &Path, output: &Path, options: &ConvertOptions) -> Result<ConvertSummary> {
    let mut scene = resources::import_glb(input)?;

    let mut summary = process_scene(&mut scene, &options.layer_name);
    summary.export = obj::export_obj(&scene, output, &options.export_options())?;
    log::info!(
        "Converted {} to {}: {} of {} objects baked",
        input.display(),
        output.display(),
        summary.baked_count(),
        summary.bakes.len()
    );
    Ok(summary)
}

/// Bake only the active object (the first mesh, or the one named `object_name`)
/// and export the scene.
///
/// An unknown `object_name` bakes nothing, but the scene is still exported.
pub fn bake_and_export(
    input: &Path,
    output: &Path,
    object_name: Option<&str>,
    options: &ConvertOptions,
) -> Result<Option<BakeOutcome>> {
    let mut scene = resources::import_glb(input)?;
    let found = match object_name {
        Some(name) => match scene.find(name) {
            Some(index) => scene.set_active(index),
            None => {
                log::warn!("No object named {name:?} in {}. Nothing to bake.", input.display());
                false
            }
        },
        None => true,
    };
    let outcome = if found {
        bake::bake_active_object(&mut scene, &options.layer_name)
    } else {
        None
    };
    scene.select_all(false);
    for index in scene.mesh_indices() {
        scene.objects[index].selected = true;
    }
    obj::export_obj(&scene, output, &options.export_options())?;
    Ok(outcome)
}

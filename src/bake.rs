//! Texture to vertex-color baking.
//!
//! The active material's image texture is sampled once per face loop with
//! nearest-neighbor lookup, and the result is stored in a per-loop color layer.

use std::sync::Arc;

use crate::data_structures::{
    material::{BASE_COLOR_SOCKET, COLOR_SOCKET, Material, NodeKind},
    scene::{Object, ObjectKind, Scene},
    texture::Image,
};

/// Why an object was left untouched.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NotAMesh,
    NoMaterial,
    NoImageTexture,
    NoUvLayer,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            SkipReason::NotAMesh => "is not a mesh",
            SkipReason::NoMaterial => "has no active material",
            SkipReason::NoImageTexture => "has no image texture",
            SkipReason::NoUvLayer => "has no UV layer",
        };
        f.write_str(reason)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BakeOutcome {
    /// Number of loops written.
    Baked { loops: usize },
    Skipped(SkipReason),
}

/**
 * Nearest-neighbor lookup with wrap-around.
 *
 * `x = trunc(u * (width - 1)) mod width` and likewise for `y`. The modulo is
 * floored so negative coordinates wrap to the far edge. Alpha is always 1.0.
 */
pub fn sample_nearest(image: &Image, uv: [f32; 2]) -> [f32; 4] {
    let (width, height) = image.size();
    let x = wrap(uv[0], width);
    let y = wrap(uv[1], height);
    let index = (y as usize * width as usize + x as usize) * Image::CHANNELS;
    let p = image.pixels();
    [p[index], p[index + 1], p[index + 2], 1.0]
}

fn wrap(coord: f32, size: u32) -> u32 {
    let size = i64::from(size.max(1));
    // `as` saturates and maps NaN to 0
    let scaled = (coord * (size - 1) as f32).trunc() as i64;
    scaled.rem_euclid(size) as u32
}

/// First image-texture node in the material that holds an image.
pub fn find_image_texture(material: &Material) -> Option<&Arc<Image>> {
    material.node_tree.first_image()
}

/// Bake the active material's image texture into the named color layer.
///
/// Skips (and logs) objects that are not meshes, have no material, no image
/// texture, or no UV layer. The color layer is created if missing.
pub fn bake_texture_to_vertex_colors(object: &mut Object, layer_name: &str) -> BakeOutcome {
    let name = object.name.clone();
    let ObjectKind::Mesh { mesh, materials } = &mut object.kind else {
        log::info!("Object {name} is not a mesh. Skipping.");
        return BakeOutcome::Skipped(SkipReason::NotAMesh);
    };
    let Some(material) = materials.first() else {
        log::warn!("No active material found for {name}. Skipping.");
        return BakeOutcome::Skipped(SkipReason::NoMaterial);
    };
    let Some(image) = find_image_texture(material).cloned() else {
        log::warn!("No image texture found for {name}. Skipping.");
        return BakeOutcome::Skipped(SkipReason::NoImageTexture);
    };
    let Some(uv_layer) = mesh.active_uv_layer() else {
        log::warn!("No UV layer found for {name}. Skipping.");
        return BakeOutcome::Skipped(SkipReason::NoUvLayer);
    };

    let colors: Vec<[f32; 4]> = uv_layer
        .uvs
        .iter()
        .map(|&uv| sample_nearest(&image, uv))
        .collect();
    let loops = colors.len();
    mesh.color_layer_or_insert(layer_name).colors = colors;

    log::info!(
        "Baked texture {:?} ({}x{}) to vertex colors for {name} ({loops} loops).",
        image.name,
        image.width(),
        image.height()
    );
    BakeOutcome::Baked { loops }
}

/// Bake only the scene's active object.
pub fn bake_active_object(scene: &mut Scene, layer_name: &str) -> Option<BakeOutcome> {
    let Some(object) = scene.active_object_mut() else {
        log::warn!("The scene has no active object.");
        return None;
    };
    let outcome = bake_texture_to_vertex_colors(object, layer_name);
    if matches!(outcome, BakeOutcome::Baked { .. }) {
        log::info!("Texture successfully baked to vertex colors!");
    }
    Some(outcome)
}

/**
 * Give the object a fresh material that shows the baked colors.
 *
 * The material is named `<object>_VertexColorMaterial`, and its vertex-color
 * node reads `layer_name` and feeds the BSDF's base color. It replaces material
 * slot 0, or becomes slot 0 if the object has no materials. Returns `false` for
 * non-mesh objects.
 */
pub fn assign_vertex_color_material(object: &mut Object, layer_name: &str) -> bool {
    let name = object.name.clone();
    let ObjectKind::Mesh { materials, .. } = &mut object.kind else {
        log::info!("Object {name} is not a mesh. Skipping.");
        return false;
    };

    let mut material = Material::new(&format!("{name}_VertexColorMaterial"));
    let tree = &mut material.node_tree;
    if let Some(bsdf) = tree.node(Material::PRINCIPLED_BSDF) {
        let vcol = tree.add_node(
            Material::VERTEX_COLOR,
            NodeKind::VertexColor {
                layer_name: layer_name.to_string(),
            },
        );
        tree.link(vcol, COLOR_SOCKET, bsdf, BASE_COLOR_SOCKET);
    }

    let material = Arc::new(material);
    match materials.first_mut() {
        Some(slot) => *slot = material,
        None => materials.push(material),
    }
    log::info!("Assigned vertex color material to {name}.");
    true
}

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    data_structures::{
        material::Material,
        scene::{Object, ObjectKind, Scene},
        texture::Image,
    },
    error::{BakeError, Result},
};

/**
 * This module contains all logic for reading scenes from and writing them to
 * external files.
 */
pub mod mesh;
pub mod obj;
pub mod texture;

/// Input and output formats, picked from the file extension.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MeshFormat {
    Gltf,
    Obj,
}

impl MeshFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "glb" | "gltf" => Some(Self::Gltf),
            "obj" => Some(Self::Obj),
            _ => None,
        }
    }

    pub(crate) fn require(path: &Path) -> Result<Self> {
        Self::from_path(path).ok_or_else(|| BakeError::UnsupportedFormat {
            extension: path
                .extension()
                .map(|e| e.to_string_lossy().into_owned()),
        })
    }
}

pub fn load_binary(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| BakeError::io(path, source))
}

/// Load any supported scene file, dispatching on its extension.
pub fn load_scene(path: &Path) -> Result<Scene> {
    match MeshFormat::require(path)? {
        MeshFormat::Gltf => import_glb(path),
        MeshFormat::Obj => obj::load_obj(path),
    }
}

/**
 * Import a `.glb` (or `.gltf`) file into a new scene.
 *
 * Each node of the default scene becomes one object with its world transform.
 * Nodes with a mesh become mesh objects whose material slots reference one
 * material per glTF material; the material's base-color texture is decoded into
 * an image-texture node. Textures that fail to load are logged and left empty.
 */
pub fn import_glb(path: &Path) -> Result<Scene> {
    let bytes = load_binary(path)?;
    let gltf = gltf::Gltf::from_slice(&bytes).map_err(|source| BakeError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);
    let document = gltf.document;
    let buffers =
        gltf::import_buffers(&document, Some(&base), gltf.blob).map_err(|source| {
            BakeError::Gltf {
                path: path.to_path_buf(),
                source,
            }
        })?;

    // Load materials
    let mut loader = texture::ImageLoader::new(&document, &buffers, path, &base);
    let mut images: HashMap<usize, Option<Arc<Image>>> = HashMap::new();
    let mut materials = Vec::new();
    for material in document.materials() {
        let name = material.name().map_or_else(
            || format!("Material_{}", material.index().unwrap_or(materials.len())),
            str::to_string,
        );
        let pbr = material.pbr_metallic_roughness();
        let mut mat = match pbr.base_color_texture() {
            Some(info) => {
                let source = info.texture().source();
                let image = images
                    .entry(source.index())
                    .or_insert_with(|| {
                        match loader.load(&source) {
                            Ok(image) => image,
                            Err(e) => {
                                log::warn!("Texture of material {name:?} could not be loaded: {e}");
                                None
                            }
                        }
                    })
                    .clone();
                if info.tex_coord() != 0 {
                    log::warn!(
                        "Material {name:?} samples UV set {}, baking will use the active UV layer.",
                        info.tex_coord()
                    );
                }
                Material::with_base_color_texture(&name, image)
            }
            None => Material::new(&name),
        };
        mat.set_base_color(pbr.base_color_factor());
        materials.push(Arc::new(mat));
    }

    let mut scene = Scene::new();
    let Some(gltf_scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        log::warn!("{} contains no scene.", path.display());
        return Ok(scene);
    };
    for node in gltf_scene.nodes() {
        add_node(&mut scene, &node, Matrix4::identity(), &buffers, &materials);
    }
    log::info!(
        "Imported {}: {} objects, {} materials",
        path.display(),
        scene.objects.len(),
        materials.len()
    );
    Ok(scene)
}

fn add_node(
    scene: &mut Scene,
    node: &gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    materials: &[Arc<Material>],
) {
    let world = parent * Matrix4::from(node.transform().matrix());
    let kind = match (node.mesh(), node.camera()) {
        (Some(gltf_mesh), _) => {
            let mut slots = Vec::new();
            let mesh = mesh::load_mesh(&gltf_mesh, buffers, &mut slots);
            let materials = slots
                .into_iter()
                .filter_map(|i| materials.get(i).cloned())
                .collect();
            ObjectKind::Mesh { mesh, materials }
        }
        (None, Some(_)) => ObjectKind::Camera,
        (None, None) => ObjectKind::Empty,
    };
    let name = node
        .name()
        .map(str::to_string)
        .or_else(|| node.mesh().and_then(|m| m.name().map(str::to_string)))
        .unwrap_or_else(|| format!("Node_{}", node.index()));
    let mut object = Object::new(&unique_name(scene, &name), kind);
    object.world = world;
    scene.add(object);

    for child in node.children() {
        add_node(scene, &child, world, buffers, materials);
    }
}

/// `name`, or `name.001`, `name.002`, ... if already taken.
fn unique_name(scene: &Scene, name: &str) -> String {
    if scene.find(name).is_none() {
        return name.to_string();
    }
    (1..)
        .map(|n| format!("{name}.{n:03}"))
        .find(|candidate| scene.find(candidate).is_none())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::model::Mesh;

    #[test]
    fn format_detection() {
        assert_eq!(MeshFormat::from_path(Path::new("a.glb")), Some(MeshFormat::Gltf));
        assert_eq!(MeshFormat::from_path(Path::new("a.GLTF")), Some(MeshFormat::Gltf));
        assert_eq!(MeshFormat::from_path(Path::new("a.obj")), Some(MeshFormat::Obj));
        assert_eq!(MeshFormat::from_path(Path::new("a.stl")), None);
        assert_eq!(MeshFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = load_scene(Path::new("model.fbx")).unwrap_err();
        assert!(matches!(
            err,
            BakeError::UnsupportedFormat { extension: Some(ref e) } if e == "fbx"
        ));
    }

    #[test]
    fn duplicate_names_get_a_suffix() {
        let mut scene = Scene::new();
        scene.add(Object::new_mesh("Cube", Mesh::new("Cube"), Vec::new()));
        assert_eq!(unique_name(&scene, "Cube"), "Cube.001");
        scene.add(Object::new("Cube.001", ObjectKind::Empty));
        assert_eq!(unique_name(&scene, "Cube"), "Cube.002");
        assert_eq!(unique_name(&scene, "Sphere"), "Sphere");
    }
}

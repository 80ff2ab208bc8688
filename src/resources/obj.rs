//! Wavefront OBJ export and read-back.
//!
//! Export writes world-space geometry of mesh objects with per-vertex colors as
//! the widely supported `v x y z r g b` extension. Reading goes through `tobj`.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::Arc,
};

use crate::{
    data_structures::{
        material::Material,
        model::{DEFAULT_COLOR_LAYER, Mesh, Vertex},
        scene::{Object, Scene},
    },
    error::{BakeError, Result},
    resources::MeshFormat,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjExportOptions {
    /// Only write objects whose `selected` flag is set.
    pub selected_only: bool,
    /// Write a companion `.mtl` file and `usemtl` records.
    pub write_materials: bool,
    /// Append RGB from `color_layer` to every `v` record.
    pub write_colors: bool,
    pub write_normals: bool,
    pub write_uvs: bool,
    pub color_layer: String,
}

impl Default for ObjExportOptions {
    fn default() -> Self {
        Self {
            selected_only: true,
            write_materials: true,
            write_colors: true,
            write_normals: false,
            write_uvs: true,
            color_layer: DEFAULT_COLOR_LAYER.to_string(),
        }
    }
}

/// What an export wrote.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjStats {
    pub objects: usize,
    pub vertices: usize,
    pub faces: usize,
    pub materials: usize,
}

/// Write the scene's mesh objects to `path`, plus `<stem>.mtl` next to it if
/// materials are enabled.
pub fn export_obj(scene: &Scene, path: &Path, options: &ObjExportOptions) -> Result<ObjStats> {
    if MeshFormat::require(path)? != MeshFormat::Obj {
        return Err(BakeError::UnsupportedFormat {
            extension: path
                .extension()
                .map(|e| e.to_string_lossy().into_owned()),
        });
    }
    let mtl_path = path.with_extension("mtl");
    let mtl_name = mtl_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());

    let file = File::create(path).map_err(|e| BakeError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let mtllib = if options.write_materials {
        mtl_name.as_deref()
    } else {
        None
    };
    let (mut stats, materials) =
        write_obj(scene, &mut writer, mtllib, options).map_err(|e| BakeError::io(path, e))?;
    writer.flush().map_err(|e| BakeError::io(path, e))?;

    if options.write_materials {
        let file = File::create(&mtl_path).map_err(|e| BakeError::io(&mtl_path, e))?;
        let mut writer = BufWriter::new(file);
        write_mtl(&materials, &mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| BakeError::io(&mtl_path, e))?;
        stats.materials = materials.len();
    }

    log::info!(
        "Exported {} objects ({} vertices, {} faces) to {}",
        stats.objects,
        stats.vertices,
        stats.faces,
        path.display()
    );
    Ok(stats)
}

/// OBJ material names cannot contain whitespace.
fn obj_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

fn exported_objects<'a>(
    scene: &'a Scene,
    options: &'a ObjExportOptions,
) -> impl Iterator<Item = (&'a Object, &'a Mesh)> + 'a {
    scene
        .objects
        .iter()
        .filter(move |o| !options.selected_only || o.selected)
        .filter_map(|o| o.mesh().map(|m| (o, m)))
}

/// Write the OBJ body and return the materials it referenced, in first-use order.
pub fn write_obj<W: Write>(
    scene: &Scene,
    w: &mut W,
    mtllib: Option<&str>,
    options: &ObjExportOptions,
) -> std::io::Result<(ObjStats, Vec<Arc<Material>>)> {
    let mut stats = ObjStats::default();
    let mut used: Vec<Arc<Material>> = Vec::new();

    writeln!(w, "# {} {} OBJ File", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
    if let Some(mtllib) = mtllib {
        writeln!(w, "mtllib {mtllib}")?;
    }

    let (mut v_base, mut vt_base, mut vn_base) = (1usize, 1usize, 1usize);
    for (object, mesh) in exported_objects(scene, options) {
        writeln!(w, "o {}", obj_name(&object.name))?;

        let colors = if options.write_colors {
            mesh.vertex_colors(&options.color_layer)
        } else {
            None
        };
        for (i, vertex) in mesh.vertices.iter().enumerate() {
            let [x, y, z] = object.world_position(vertex.position);
            match colors.as_ref().and_then(|c| c.get(i)) {
                Some([r, g, b, _]) => {
                    writeln!(w, "v {x:.6} {y:.6} {z:.6} {r:.4} {g:.4} {b:.4}")?
                }
                None => writeln!(w, "v {x:.6} {y:.6} {z:.6}")?,
            }
        }

        // One `vt` per distinct UV within the object
        let mut uv_indices = Vec::new();
        let mut vt_count = 0;
        if options.write_uvs {
            if let Some(layer) = mesh.active_uv_layer() {
                let mut seen: HashMap<[u32; 2], usize> = HashMap::new();
                for uv in &layer.uvs {
                    let key = [uv[0].to_bits(), uv[1].to_bits()];
                    let index = match seen.get(&key) {
                        Some(&index) => index,
                        None => {
                            writeln!(w, "vt {:.6} {:.6}", uv[0], uv[1])?;
                            seen.insert(key, vt_count);
                            vt_count += 1;
                            vt_count - 1
                        }
                    };
                    uv_indices.push(index);
                }
            }
        }

        let normals = options.write_normals
            && !mesh.vertices.is_empty()
            && mesh.vertices.iter().all(|v| v.normal.is_some());
        if normals {
            for Vertex { normal, .. } in &mesh.vertices {
                let [x, y, z] = object.world_normal(normal.unwrap_or([0.0, 0.0, 1.0]));
                writeln!(w, "vn {x:.4} {y:.4} {z:.4}")?;
            }
        }

        let materials = object.materials();
        let mut current_material: Option<usize> = None;
        if !materials.is_empty() && mtllib.is_some() {
            writeln!(w, "s off")?;
        }
        for (face_index, face) in mesh.faces.iter().enumerate() {
            if mtllib.is_some() && current_material != Some(face.material_index) {
                if let Some(material) = materials.get(face.material_index) {
                    let written = obj_name(&material.name);
                    writeln!(w, "usemtl {written}")?;
                    if !used.iter().any(|m| obj_name(&m.name) == written) {
                        used.push(material.clone());
                    }
                }
                current_material = Some(face.material_index);
            }
            write!(w, "f")?;
            for (corner, &vertex) in face.vertices.iter().enumerate() {
                let v = v_base + vertex as usize;
                let vt = uv_indices
                    .get(face_index * 3 + corner)
                    .map(|i| vt_base + i);
                let vn = normals.then_some(vn_base + vertex as usize);
                match (vt, vn) {
                    (Some(vt), Some(vn)) => write!(w, " {v}/{vt}/{vn}")?,
                    (Some(vt), None) => write!(w, " {v}/{vt}")?,
                    (None, Some(vn)) => write!(w, " {v}//{vn}")?,
                    (None, None) => write!(w, " {v}")?,
                }
            }
            writeln!(w)?;
        }

        v_base += mesh.vertices.len();
        vt_base += vt_count;
        if normals {
            vn_base += mesh.vertices.len();
        }
        stats.objects += 1;
        stats.vertices += mesh.vertices.len();
        stats.faces += mesh.faces.len();
    }

    Ok((stats, used))
}

pub fn write_mtl<W: Write>(materials: &[Arc<Material>], w: &mut W) -> std::io::Result<()> {
    writeln!(w, "# {} {} MTL File", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
    writeln!(w, "# Material Count: {}", materials.len())?;
    for material in materials {
        let [r, g, b, a] = material.base_color();
        writeln!(w)?;
        writeln!(w, "newmtl {}", obj_name(&material.name))?;
        writeln!(w, "Ns 250.000000")?;
        writeln!(w, "Ka 1.000000 1.000000 1.000000")?;
        writeln!(w, "Kd {r:.6} {g:.6} {b:.6}")?;
        writeln!(w, "Ks 0.500000 0.500000 0.500000")?;
        writeln!(w, "Ke 0.000000 0.000000 0.000000")?;
        writeln!(w, "Ni 1.450000")?;
        writeln!(w, "d {a:.6}")?;
        writeln!(w, "illum 2")?;
    }
    Ok(())
}

/// Read an OBJ file into a scene: one mesh object per OBJ object/group.
///
/// Vertex colors, if present, land in a `"Col"` loop layer; texture coordinates
/// in the active UV layer. A missing `.mtl` only drops the materials.
pub fn load_obj(path: &Path) -> Result<Scene> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: false,
            ..Default::default()
        },
    )
    .map_err(|source| BakeError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let materials: Vec<Arc<Material>> = match materials {
        Ok(materials) => materials
            .into_iter()
            .map(|m| {
                let mut material = Material::new(&m.name);
                if let Some([r, g, b]) = m.diffuse {
                    material.set_base_color([r, g, b, m.dissolve.unwrap_or(1.0)]);
                }
                Arc::new(material)
            })
            .collect(),
        Err(e) => {
            log::warn!("Materials of {} could not be loaded: {e}", path.display());
            Vec::new()
        }
    };

    let mut scene = Scene::new();
    for model in models {
        let m = &model.mesh;
        let mut mesh = Mesh::new(&model.name);
        mesh.vertices = m
            .positions
            .chunks_exact(3)
            .map(|p| Vertex::new([p[0], p[1], p[2]]))
            .collect();
        let has_uvs = !m.texcoord_indices.is_empty() && !m.texcoords.is_empty();
        if has_uvs {
            mesh.new_uv_layer(&Mesh::uv_layer_name(0));
        }
        for tri in m.indices.chunks_exact(3) {
            mesh.push_face([tri[0], tri[1], tri[2]], 0);
        }

        if has_uvs {
            let layer = &mut mesh.uv_layers_mut()[0];
            for (loop_index, &ti) in m.texcoord_indices.iter().enumerate() {
                let ti = ti as usize;
                if let (Some(slot), Some(uv)) = (
                    layer.uvs.get_mut(loop_index),
                    m.texcoords.get(ti * 2..ti * 2 + 2),
                ) {
                    *slot = [uv[0], uv[1]];
                }
            }
        }

        if !m.vertex_color.is_empty() {
            let loops: Vec<(usize, u32)> = mesh.loops().map(|l| (l.index, l.vertex)).collect();
            let layer = mesh.color_layer_or_insert(DEFAULT_COLOR_LAYER);
            for (loop_index, vertex) in loops {
                let v = vertex as usize;
                if let Some(c) = m.vertex_color.get(v * 3..v * 3 + 3) {
                    layer.colors[loop_index] = [c[0], c[1], c[2], 1.0];
                }
            }
        }

        let slots = m
            .material_id
            .and_then(|id| materials.get(id).cloned())
            .into_iter()
            .collect();
        let name = if model.name.is_empty() {
            format!("Object_{}", scene.objects.len())
        } else {
            model.name.clone()
        };
        scene.add(Object::new_mesh(&name, mesh, slots));
    }
    log::info!("Loaded {} objects from {}", scene.objects.len(), path.display());
    Ok(scene)
}

use crate::data_structures::model::{self, Mesh, Vertex};

/**
 * Merges all primitives of a glTF mesh into one triangle mesh.
 *
 * Every distinct primitive material gets one slot; `slots` receives the glTF
 * material index of each slot in order. Faces of primitives without a material
 * use slot 0. UVs are flipped to a bottom-left origin.
 */
pub fn load_mesh(
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    slots: &mut Vec<usize>,
) -> Mesh {
    let name = mesh.name().map_or_else(|| format!("Mesh_{}", mesh.index()), str::to_string);
    let mut out = Mesh::new(&name);

    let uv_sets = mesh
        .primitives()
        .map(|primitive| {
            let reader = primitive.reader(|buffer| Some(buffers[buffer.index()].0.as_slice()));
            (0..).take_while(|set| reader.read_tex_coords(*set).is_some()).count()
        })
        .max()
        .unwrap_or(0);
    for set in 0..uv_sets {
        out.new_uv_layer(&Mesh::uv_layer_name(set));
    }

    for primitive in mesh.primitives() {
        let Some(triangles) = Triangulation::from_mode(primitive.mode()) else {
            log::warn!(
                "Skipping {:?} primitive {} of mesh {:?}: only triangle primitives are supported.",
                primitive.mode(),
                primitive.index(),
                name
            );
            continue;
        };

        let reader = primitive.reader(|buffer| Some(buffers[buffer.index()].0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            log::warn!("Primitive {} of mesh {:?} has no positions.", primitive.index(), name);
            continue;
        };

        let base = out.vertices.len() as u32;
        out.vertices.extend(positions.map(Vertex::new));
        let count = out.vertices.len() - base as usize;

        if let Some(normals) = reader.read_normals() {
            for (vertex, normal) in out.vertices[base as usize..].iter_mut().zip(normals) {
                vertex.normal = Some(normal);
            }
        }

        let mut tex_coords = Vec::with_capacity(uv_sets);
        for set in 0..uv_sets {
            let coords: Vec<[f32; 2]> = reader
                .read_tex_coords(set as u32)
                .map(|tc| tc.into_f32().map(|[u, v]| [u, 1.0 - v]).collect())
                .unwrap_or_default();
            tex_coords.push(coords);
        }

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..count as u32).collect(),
        };

        let material_index = match primitive.material().index() {
            Some(gltf_index) => match slots.iter().position(|&s| s == gltf_index) {
                Some(slot) => slot,
                None => {
                    slots.push(gltf_index);
                    slots.len() - 1
                }
            },
            None => 0,
        };

        for tri in triangles.triangles(&indices) {
            if tri.iter().any(|&i| i as usize >= count) {
                log::warn!("Mesh {:?} references a vertex out of range; face dropped.", name);
                continue;
            }
            let face = out.push_face(tri.map(|i| base + i), material_index);
            for (set, coords) in tex_coords.iter().enumerate() {
                let layer = &mut out.uv_layers_mut()[set];
                for (corner, &i) in tri.iter().enumerate() {
                    if let Some(uv) = coords.get(i as usize) {
                        layer.uvs[face * model::LOOPS_PER_FACE + corner] = *uv;
                    }
                }
            }
        }
    }

    out
}

/// How a primitive's index list forms triangles.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Triangulation {
    List,
    Strip,
    Fan,
}

impl Triangulation {
    fn from_mode(mode: gltf::mesh::Mode) -> Option<Self> {
        match mode {
            gltf::mesh::Mode::Triangles => Some(Self::List),
            gltf::mesh::Mode::TriangleStrip => Some(Self::Strip),
            gltf::mesh::Mode::TriangleFan => Some(Self::Fan),
            _ => None,
        }
    }

    fn triangles(self, indices: &[u32]) -> Vec<[u32; 3]> {
        match self {
            Self::List => indices
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect(),
            // Every other strip triangle is flipped to keep the winding consistent
            Self::Strip => indices
                .windows(3)
                .enumerate()
                .map(|(i, w)| {
                    if i % 2 == 0 {
                        [w[0], w[1], w[2]]
                    } else {
                        [w[1], w[0], w[2]]
                    }
                })
                .collect(),
            Self::Fan => match indices.split_first() {
                Some((&center, rest)) => rest
                    .windows(2)
                    .map(|w| [center, w[0], w[1]])
                    .collect(),
                None => Vec::new(),
            },
        }
    }
}

//! Triangle meshes with per-loop attribute layers.
//!
//! A [`Mesh`] stores shared vertices and triangular faces. Every face has three
//! loops (face corners); loop `3 * face + corner` indexes into the per-loop
//! layers. UVs and vertex colors live on loops, not vertices, so a seam can
//! carry two different values for the same vertex.

/// Name given to the vertex-color layer when none is specified.
pub const DEFAULT_COLOR_LAYER: &str = "Col";

/// Name of the first UV layer; later layers get a numeric suffix.
pub const DEFAULT_UV_LAYER: &str = "UVMap";

/// Loops per face. Faces are always triangles.
pub const LOOPS_PER_FACE: usize = 3;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: Option<[f32; 3]>,
}

impl Vertex {
    pub fn new(position: [f32; 3]) -> Self {
        Self {
            position,
            normal: None,
        }
    }
}

/// A triangle with the material slot it is drawn with.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Face {
    pub vertices: [u32; 3],
    pub material_index: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UvLayer {
    pub name: String,
    pub uvs: Vec<[f32; 2]>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColorLayer {
    pub name: String,
    pub colors: Vec<[f32; 4]>,
}

/// One loop of a face, as handed out by [`Mesh::loops`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Loop {
    pub index: usize,
    pub face: usize,
    pub vertex: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
    uv_layers: Vec<UvLayer>,
    active_uv: Option<usize>,
    color_layers: Vec<ColorLayer>,
}

impl Mesh {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn loop_count(&self) -> usize {
        self.faces.len() * LOOPS_PER_FACE
    }

    /// Iterate over every loop of every face, in face order.
    pub fn loops(&self) -> impl Iterator<Item = Loop> + '_ {
        self.faces.iter().enumerate().flat_map(|(face, f)| {
            f.vertices
                .iter()
                .enumerate()
                .map(move |(corner, &vertex)| Loop {
                    index: face * LOOPS_PER_FACE + corner,
                    face,
                    vertex,
                })
        })
    }

    /// Append a face and grow every existing layer with a default value.
    pub fn push_face(&mut self, vertices: [u32; 3], material_index: usize) -> usize {
        self.faces.push(Face {
            vertices,
            material_index,
        });
        let loops = self.loop_count();
        for layer in &mut self.uv_layers {
            layer.uvs.resize(loops, [0.0, 0.0]);
        }
        for layer in &mut self.color_layers {
            layer.colors.resize(loops, [1.0, 1.0, 1.0, 1.0]);
        }
        self.faces.len() - 1
    }

    pub fn uv_layers(&self) -> &[UvLayer] {
        &self.uv_layers
    }

    pub fn uv_layers_mut(&mut self) -> &mut [UvLayer] {
        &mut self.uv_layers
    }

    pub fn uv_layer_mut(&mut self, name: &str) -> Option<&mut UvLayer> {
        self.uv_layers.iter_mut().find(|l| l.name == name)
    }

    /// Add a zero-filled UV layer. The first layer added becomes active.
    pub fn new_uv_layer(&mut self, name: &str) -> &mut UvLayer {
        let index = self.uv_layers.len();
        self.uv_layers.push(UvLayer {
            name: name.to_string(),
            uvs: vec![[0.0, 0.0]; self.loop_count()],
        });
        if self.active_uv.is_none() {
            self.active_uv = Some(index);
        }
        &mut self.uv_layers[index]
    }

    pub fn active_uv_layer(&self) -> Option<&UvLayer> {
        self.active_uv.and_then(|i| self.uv_layers.get(i))
    }

    pub fn set_active_uv_layer(&mut self, name: &str) -> bool {
        match self.uv_layers.iter().position(|l| l.name == name) {
            Some(index) => {
                self.active_uv = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn color_layers(&self) -> &[ColorLayer] {
        &self.color_layers
    }

    pub fn color_layer(&self, name: &str) -> Option<&ColorLayer> {
        self.color_layers.iter().find(|l| l.name == name)
    }

    /// Fetch the named color layer, creating a white one if it does not exist yet.
    pub fn color_layer_or_insert(&mut self, name: &str) -> &mut ColorLayer {
        let index = match self.color_layers.iter().position(|l| l.name == name) {
            Some(index) => index,
            None => {
                log::debug!("Creating color layer {name:?} on mesh {:?}", self.name);
                self.color_layers.push(ColorLayer {
                    name: name.to_string(),
                    colors: vec![[1.0, 1.0, 1.0, 1.0]; self.loop_count()],
                });
                self.color_layers.len() - 1
            }
        };
        &mut self.color_layers[index]
    }

    /// Per-vertex colors from a loop layer: the mean of all loops that use the vertex.
    ///
    /// Vertices not referenced by any face keep white.
    pub fn vertex_colors(&self, layer: &str) -> Option<Vec<[f32; 4]>> {
        let layer = self.color_layer(layer)?;
        let mut sums = vec![[0.0f32; 4]; self.vertices.len()];
        let mut counts = vec![0u32; self.vertices.len()];
        for l in self.loops() {
            let v = l.vertex as usize;
            let Some(color) = layer.colors.get(l.index) else {
                continue;
            };
            if v >= sums.len() {
                continue;
            }
            for c in 0..4 {
                sums[v][c] += color[c];
            }
            counts[v] += 1;
        }
        Some(
            sums.into_iter()
                .zip(counts)
                .map(|(sum, n)| {
                    if n == 0 {
                        [1.0; 4]
                    } else {
                        let n = n as f32;
                        [sum[0] / n, sum[1] / n, sum[2] / n, sum[3] / n]
                    }
                })
                .collect(),
        )
    }

    /// Name for the `n`-th UV layer: `UVMap`, `UVMap.001`, ...
    pub fn uv_layer_name(n: usize) -> String {
        if n == 0 {
            DEFAULT_UV_LAYER.to_string()
        } else {
            format!("{DEFAULT_UV_LAYER}.{n:03}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        let mut mesh = Mesh::new("quad");
        for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]] {
            mesh.vertices.push(Vertex::new(p));
        }
        mesh.push_face([0, 1, 2], 0);
        mesh.push_face([0, 2, 3], 0);
        mesh
    }

    #[test]
    fn loops_follow_face_order() {
        let mesh = quad();
        let loops: Vec<_> = mesh.loops().map(|l| (l.index, l.face, l.vertex)).collect();
        assert_eq!(
            loops,
            vec![(0, 0, 0), (1, 0, 1), (2, 0, 2), (3, 1, 0), (4, 1, 2), (5, 1, 3)]
        );
    }

    #[test]
    fn first_uv_layer_becomes_active() {
        let mut mesh = quad();
        mesh.new_uv_layer(&Mesh::uv_layer_name(0));
        mesh.new_uv_layer(&Mesh::uv_layer_name(1));
        assert_eq!(mesh.active_uv_layer().map(|l| l.name.as_str()), Some("UVMap"));
        assert!(mesh.set_active_uv_layer("UVMap.001"));
        assert_eq!(
            mesh.active_uv_layer().map(|l| l.name.as_str()),
            Some("UVMap.001")
        );
        assert!(!mesh.set_active_uv_layer("missing"));
    }

    #[test]
    fn color_layer_is_created_once() {
        let mut mesh = quad();
        mesh.color_layer_or_insert(DEFAULT_COLOR_LAYER).colors[0] = [0.5, 0.5, 0.5, 1.0];
        let layer = mesh.color_layer_or_insert(DEFAULT_COLOR_LAYER);
        assert_eq!(layer.colors.len(), 6);
        assert_eq!(layer.colors[0], [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(mesh.color_layers().len(), 1);
    }

    #[test]
    fn vertex_colors_average_shared_loops() {
        let mut mesh = quad();
        let layer = mesh.color_layer_or_insert("Col");
        layer.colors[0] = [1.0, 0.0, 0.0, 1.0];
        layer.colors[3] = [0.0, 0.0, 1.0, 1.0];
        let colors = mesh.vertex_colors("Col").unwrap();
        assert_eq!(colors[0], [0.5, 0.0, 0.5, 1.0]);
        assert_eq!(colors[1], [1.0, 1.0, 1.0, 1.0]);
        assert!(mesh.vertex_colors("missing").is_none());
    }

    #[test]
    fn layers_grow_with_new_faces() {
        let mut mesh = quad();
        mesh.new_uv_layer("UVMap");
        mesh.color_layer_or_insert("Col");
        mesh.push_face([1, 2, 3], 0);
        assert_eq!(mesh.uv_layers()[0].uvs.len(), 9);
        assert_eq!(mesh.color_layers()[0].colors.len(), 9);
    }
}

//! Scene and object containers.
//!
//! A [`Scene`] is a flat, ordered list of [`Object`]s. Hierarchy from the source
//! file is baked into each object's world matrix at import time.

use std::sync::Arc;

use cgmath::{Matrix, Matrix3, Matrix4, SquareMatrix, Transform, Vector3};

use crate::data_structures::{material::Material, model::Mesh};

#[derive(Clone, Debug, PartialEq)]
pub enum ObjectKind {
    /// Geometry plus ordered material slots; slot 0 is the active material.
    Mesh {
        mesh: Mesh,
        materials: Vec<Arc<Material>>,
    },
    Empty,
    Camera,
}

impl ObjectKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectKind::Mesh { .. } => "MESH",
            ObjectKind::Empty => "EMPTY",
            ObjectKind::Camera => "CAMERA",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    pub name: String,
    pub kind: ObjectKind,
    pub world: Matrix4<f32>,
    pub selected: bool,
}

impl Object {
    pub fn new(name: &str, kind: ObjectKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            world: Matrix4::identity(),
            selected: false,
        }
    }

    pub fn new_mesh(name: &str, mesh: Mesh, materials: Vec<Arc<Material>>) -> Self {
        Self::new(name, ObjectKind::Mesh { mesh, materials })
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, ObjectKind::Mesh { .. })
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            ObjectKind::Mesh { mesh, .. } => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            ObjectKind::Mesh { mesh, .. } => Some(mesh),
            _ => None,
        }
    }

    pub fn materials(&self) -> &[Arc<Material>] {
        match &self.kind {
            ObjectKind::Mesh { materials, .. } => materials,
            _ => &[],
        }
    }

    pub fn active_material(&self) -> Option<&Arc<Material>> {
        self.materials().first()
    }

    /// Position transformed into world space.
    pub fn world_position(&self, p: [f32; 3]) -> [f32; 3] {
        self.world
            .transform_point(cgmath::Point3::new(p[0], p[1], p[2]))
            .into()
    }

    /// Normal transformed by the inverse-transpose of the world matrix, renormalized.
    pub fn world_normal(&self, n: [f32; 3]) -> [f32; 3] {
        let linear = Matrix3::from_cols(
            self.world.x.truncate(),
            self.world.y.truncate(),
            self.world.z.truncate(),
        );
        let normal_matrix = linear
            .invert()
            .map(|m| m.transpose())
            .unwrap_or(linear);
        let v = normal_matrix * Vector3::from(n);
        let len = (v.x * v.x + v.y * v.y + v.z * v.z).sqrt();
        if len > f32::EPSILON {
            [v.x / len, v.y / len, v.z / len]
        } else {
            n
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub objects: Vec<Object>,
    active: Option<usize>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every object.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.active = None;
    }

    pub fn add(&mut self, object: Object) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.name == name)
    }

    pub fn set_active(&mut self, index: usize) -> bool {
        if index < self.objects.len() {
            self.active = Some(index);
            true
        } else {
            false
        }
    }

    /// The explicitly activated object, or else the first mesh object.
    pub fn active_index(&self) -> Option<usize> {
        self.active
            .or_else(|| self.objects.iter().position(Object::is_mesh))
    }

    pub fn active_object_mut(&mut self) -> Option<&mut Object> {
        let index = self.active_index()?;
        self.objects.get_mut(index)
    }

    pub fn mesh_indices(&self) -> Vec<usize> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_mesh())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn select_all(&mut self, selected: bool) {
        for object in &mut self.objects {
            object.selected = selected;
        }
    }
}

//! Scene data structures: objects, meshes, materials and images.
//!
//! - `scene` holds the object list and the active/selected state
//! - `model` contains triangle meshes with per-loop UV and color layers
//! - `material` models materials as small shader node graphs
//! - `texture` contains the CPU pixel buffer that baking samples from

pub mod material;
pub mod model;
pub mod scene;
pub mod texture;

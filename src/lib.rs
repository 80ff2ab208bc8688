//! vcol-bake
//!
//! Bakes the base-color texture of glTF meshes into per-loop vertex colors and
//! converts GLB files into OBJ files that carry those colors, checking along the
//! way whether each mesh is manifold enough to be 3D printed.
//!
//! High-level modules
//! - `data_structures`: scene, mesh, material node graph and image types
//! - `resources`: GLB import, OBJ export and OBJ read-back
//! - `bake`: nearest-neighbor texture sampling into vertex-color layers
//! - `printability`: manifold-edge checks
//! - `convert`: the end-to-end GLB to OBJ flow
//!

pub mod bake;
pub mod convert;
pub mod data_structures;
pub mod error;
pub mod printability;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use bake::{BakeOutcome, SkipReason};
pub use convert::{ConvertOptions, ConvertSummary};
pub use data_structures::scene::{Object, ObjectKind, Scene};
pub use error::{BakeError, Result};
pub use resources::obj::ObjExportOptions;

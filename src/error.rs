//! Error types for import, baking and export.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, BakeError>;

/// Errors that abort a whole operation.
///
/// Per-object problems (no texture, no UVs, not a mesh) are not errors: they are
/// logged and the object is skipped.
#[derive(Debug, Error)]
pub enum BakeError {
    /// Error reading or writing a file.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input could not be parsed as glTF/GLB.
    #[error("failed to parse glTF from {path}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    /// An embedded or referenced image could not be decoded.
    #[error("failed to decode image {label}: {source}")]
    Image {
        label: String,
        #[source]
        source: image::ImageError,
    },

    /// The input could not be parsed as OBJ.
    #[error("failed to parse OBJ from {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    /// No importer or exporter handles this file extension.
    #[error("unsupported file format: {extension:?}")]
    UnsupportedFormat { extension: Option<String> },
}

impl BakeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

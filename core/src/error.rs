use std::path::PathBuf;

use crate::catalog::{LevelId, PhotoId};

/// Broad class of a [`GameError`], used by hosts to pick a recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Catalog data is inconsistent or incomplete; the level cannot be built.
    Configuration,
    /// The requested id does not exist.
    NotFound,
}

/// Failures while loading a level into a playable session.
///
/// None of these are fatal to the application: they abort the current
/// level load only.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("level {0} not found")]
    LevelNotFound(LevelId),
    #[error("photo {0} not found")]
    PhotoNotFound(PhotoId),
    #[error("level {level_id} references missing photo {photo_id}")]
    MissingPhoto { level_id: LevelId, photo_id: PhotoId },
    #[error("photo {0} has no image")]
    MissingImage(PhotoId),
    #[error("invalid grid dimensions {cols}x{rows}")]
    InvalidDimensions { cols: u32, rows: u32 },
    #[error("image {width}x{height} is too small for a {cols}x{rows} grid")]
    ImageTooSmall {
        width: u32,
        height: u32,
        cols: u32,
        rows: u32,
    },
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::LevelNotFound(_) | GameError::PhotoNotFound(_) => ErrorKind::NotFound,
            GameError::MissingPhoto { .. }
            | GameError::MissingImage(_)
            | GameError::InvalidDimensions { .. }
            | GameError::ImageTooSmall { .. } => ErrorKind::Configuration,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to write catalog entries: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("duplicate level id {0}")]
    DuplicateLevel(LevelId),
    #[error("duplicate photo id {0}")]
    DuplicatePhoto(PhotoId),
    #[error("photo {0} has an empty src")]
    EmptySrc(PhotoId),
    #[error("photo {0} must set both width and height or neither")]
    PartialSize(PhotoId),
    #[error("rule {name} is out of range")]
    InvalidRule { name: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("progress i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("progress data could not be encoded")]
    Encode,
    #[error("progress data could not be decoded")]
    Decode,
    #[error("progress version {found} does not match {expected}")]
    Version { expected: u32, found: u32 },
}

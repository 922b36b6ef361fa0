pub mod catalog;
pub mod context;
pub mod error;
pub mod game;
pub mod grid;
pub mod progress;
pub mod state;

pub use catalog::{
    photos_from_dir, photos_to_toml, Catalog, Level, LevelId, Photo, PhotoId, PhotoImage,
};
pub use context::{GameContext, LevelEntry};
pub use error::{CatalogError, ErrorKind, GameError, ProgressError};
pub use game::{check_win, shuffle_grid, GameRules, ShuffleReport};
pub use grid::{GridSize, Piece, PieceGrid, PieceId, PieceRegion};
pub use progress::{
    format_time, is_level_unlocked, record_completion, CompletionReport, MemoryProgress,
    ProgressBlob, ProgressStore,
};
pub use state::{ClickOutcome, PuzzleEvent, PuzzleSession, PuzzleState, SwapTransition};

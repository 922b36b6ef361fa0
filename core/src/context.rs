use rand::Rng;

use crate::catalog::{Catalog, Level, LevelId};
use crate::error::GameError;
use crate::game::GameRules;
use crate::grid::{GridSize, PieceGrid};
use crate::progress::{is_level_unlocked, ProgressStore};
use crate::state::PuzzleSession;

/// A row of the level map.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelEntry {
    pub level_id: LevelId,
    pub grid: GridSize,
    pub photo_name: Option<String>,
    pub unlocked: bool,
    pub best_time: Option<f32>,
}

/// Owns everything a play session needs from the outside world.
///
/// Built once at startup and handed to whoever drives the game.
#[derive(Debug)]
pub struct GameContext<P: ProgressStore> {
    catalog: Catalog,
    progress: P,
    rules: GameRules,
}

impl<P: ProgressStore> GameContext<P> {
    pub fn new(catalog: Catalog, progress: P) -> Self {
        let rules = *catalog.rules();
        Self {
            catalog,
            progress,
            rules,
        }
    }

    pub fn with_rules(mut self, rules: GameRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn progress(&self) -> &P {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut P {
        &mut self.progress
    }

    pub fn into_progress(self) -> P {
        self.progress
    }

    pub fn is_level_unlocked(&self, level_id: LevelId) -> bool {
        is_level_unlocked(&self.progress, level_id)
    }

    pub fn best_time(&self, level_id: LevelId) -> Option<f32> {
        self.progress.best_time(level_id)
    }

    /// The level after `level_id`; `None` means go back to level select.
    pub fn next_level(&self, level_id: LevelId) -> Option<&Level> {
        self.catalog.next_level(level_id)
    }

    pub fn level_entries(&self) -> Vec<LevelEntry> {
        self.catalog
            .levels()
            .iter()
            .map(|level| LevelEntry {
                level_id: level.id,
                grid: GridSize {
                    cols: level.cols,
                    rows: level.rows,
                },
                photo_name: self
                    .catalog
                    .photo(level.photo_id)
                    .map(|photo| photo.name.clone()),
                unlocked: self.is_level_unlocked(level.id),
                best_time: self.best_time(level.id),
            })
            .collect()
    }

    /// Builds the grid for a level without shuffling it.
    pub fn build_level(&self, level_id: LevelId) -> Result<PuzzleSession, GameError> {
        let result = self.try_build_level(level_id);
        if let Err(err) = &result {
            log::warn!("cannot load level {}: {}", level_id, err);
        }
        result
    }

    /// Builds and shuffles a fresh session. Calling it again restarts the level.
    pub fn start_level<R: Rng + ?Sized>(
        &self,
        level_id: LevelId,
        rng: &mut R,
    ) -> Result<PuzzleSession, GameError> {
        let mut session = self.build_level(level_id)?;
        session.shuffle(rng);
        Ok(session)
    }

    fn try_build_level(&self, level_id: LevelId) -> Result<PuzzleSession, GameError> {
        let level = self
            .catalog
            .level(level_id)
            .ok_or(GameError::LevelNotFound(level_id))?;
        if !level.has_valid_grid() {
            return Err(GameError::InvalidDimensions {
                cols: level.cols,
                rows: level.rows,
            });
        }
        let photo = self
            .catalog
            .photo(level.photo_id)
            .ok_or(GameError::MissingPhoto {
                level_id,
                photo_id: level.photo_id,
            })?;
        let grid = PieceGrid::build(level.cols, level.rows, photo)?;
        Ok(PuzzleSession::new(level.id, grid, self.rules))
    }
}

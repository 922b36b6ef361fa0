use rand::Rng;

use crate::catalog::LevelId;
use crate::game::{check_win, shuffle_grid, GameRules, ShuffleReport};
use crate::grid::{PieceGrid, PieceId};
use crate::progress::{record_completion, CompletionReport, ProgressStore};

/// Notifications for the presentation layer, drained with [`PuzzleSession::drain_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum PuzzleEvent {
    Shuffled(ShuffleReport),
    PieceSelected(PieceId),
    PieceDeselected(PieceId),
    SwapStarted(PieceId, PieceId),
    SwapFinished(PieceId, PieceId),
    Completed(CompletionReport),
}

/// An in-flight swap between two pieces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapTransition {
    pub first: PieceId,
    pub second: PieceId,
    pub elapsed: f32,
    pub duration: f32,
}

impl SwapTransition {
    /// Interpolation factor in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PuzzleState {
    Idle,
    OneSelected { piece: PieceId },
    Swapping(SwapTransition),
    Complete(CompletionReport),
}

impl PuzzleState {
    pub fn accepts_input(&self) -> bool {
        matches!(self, PuzzleState::Idle | PuzzleState::OneSelected { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Selected,
    Deselected,
    SwapStarted,
    Ignored,
}

/// One play of a level: the grid, the selection state machine and the timer.
///
/// Input goes through [`click_slot`](Self::click_slot) or
/// [`click_piece`](Self::click_piece); time advances only through
/// [`tick`](Self::tick). Neither touches any global state: the progress store
/// is passed in by the caller whenever a swap may finish.
#[derive(Debug, Clone)]
pub struct PuzzleSession {
    level_id: LevelId,
    grid: PieceGrid,
    rules: GameRules,
    state: PuzzleState,
    elapsed: f32,
    started: bool,
    events: Vec<PuzzleEvent>,
}

impl PuzzleSession {
    pub fn new(level_id: LevelId, grid: PieceGrid, rules: GameRules) -> Self {
        Self {
            level_id,
            grid,
            rules,
            state: PuzzleState::Idle,
            elapsed: 0.0,
            started: false,
            events: Vec::new(),
        }
    }

    pub fn level_id(&self) -> LevelId {
        self.level_id
    }

    pub fn grid(&self) -> &PieceGrid {
        &self.grid
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn state(&self) -> &PuzzleState {
        &self.state
    }

    /// Seconds since the grid was built, frozen once the puzzle is complete.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn selected(&self) -> Option<PieceId> {
        match self.state {
            PuzzleState::OneSelected { piece } => Some(piece),
            _ => None,
        }
    }

    pub fn swap_transition(&self) -> Option<&SwapTransition> {
        match &self.state {
            PuzzleState::Swapping(transition) => Some(transition),
            _ => None,
        }
    }

    pub fn completion(&self) -> Option<&CompletionReport> {
        match &self.state {
            PuzzleState::Complete(report) => Some(report),
            _ => None,
        }
    }

    /// True once any click has been accepted.
    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, PuzzleState::Complete(_))
    }

    pub fn is_solved(&self) -> bool {
        check_win(&self.grid)
    }

    pub fn drain_events(&mut self) -> Vec<PuzzleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Scrambles the grid. Only allowed before the first accepted click;
    /// afterwards the call is ignored and returns `None`.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<ShuffleReport> {
        if self.started || self.state != PuzzleState::Idle {
            log::debug!("shuffle ignored once play has started");
            return None;
        }
        let report = shuffle_grid(&mut self.grid, &self.rules, rng);
        self.events.push(PuzzleEvent::Shuffled(report));
        Some(report)
    }

    pub fn click_slot<P: ProgressStore + ?Sized>(
        &mut self,
        slot: usize,
        progress: &mut P,
    ) -> ClickOutcome {
        let Some(piece) = self.grid.piece_at(slot).map(|piece| piece.id()) else {
            log::debug!("click on slot {} outside grid of {}", slot, self.grid.len());
            return ClickOutcome::Ignored;
        };
        self.click_piece(piece, progress)
    }

    pub fn click_piece<P: ProgressStore + ?Sized>(
        &mut self,
        piece: PieceId,
        progress: &mut P,
    ) -> ClickOutcome {
        if piece >= self.grid.len() {
            log::debug!("click on unknown piece {}", piece);
            return ClickOutcome::Ignored;
        }
        if self.state.accepts_input() {
            self.started = true;
        }
        match self.state {
            PuzzleState::Idle => {
                self.state = PuzzleState::OneSelected { piece };
                self.events.push(PuzzleEvent::PieceSelected(piece));
                ClickOutcome::Selected
            }
            PuzzleState::OneSelected { piece: selected } if selected == piece => {
                self.state = PuzzleState::Idle;
                self.events.push(PuzzleEvent::PieceDeselected(piece));
                ClickOutcome::Deselected
            }
            PuzzleState::OneSelected { piece: selected } => {
                self.begin_swap(selected, piece, progress);
                ClickOutcome::SwapStarted
            }
            PuzzleState::Swapping(_) | PuzzleState::Complete(_) => ClickOutcome::Ignored,
        }
    }

    /// Advances the timer and any swap transition by `dt` seconds.
    pub fn tick<P: ProgressStore + ?Sized>(&mut self, dt: f32, progress: &mut P) {
        if !dt.is_finite() || dt < 0.0 || self.is_complete() {
            return;
        }
        self.elapsed += dt;
        if let PuzzleState::Swapping(transition) = &mut self.state {
            transition.elapsed += dt;
            if transition.is_done() {
                let (first, second) = (transition.first, transition.second);
                self.finish_swap(first, second, progress);
            }
        }
    }

    fn begin_swap<P: ProgressStore + ?Sized>(
        &mut self,
        first: PieceId,
        second: PieceId,
        progress: &mut P,
    ) {
        log::debug!("swap {} <-> {}", first, second);
        self.events.push(PuzzleEvent::SwapStarted(first, second));
        let transition = SwapTransition {
            first,
            second,
            elapsed: 0.0,
            duration: self.rules.swap_duration.max(0.0),
        };
        self.state = PuzzleState::Swapping(transition);
        if transition.is_done() {
            self.finish_swap(first, second, progress);
        }
    }

    fn finish_swap<P: ProgressStore + ?Sized>(
        &mut self,
        first: PieceId,
        second: PieceId,
        progress: &mut P,
    ) {
        self.grid.swap_pieces(first, second);
        self.events.push(PuzzleEvent::SwapFinished(first, second));
        if !check_win(&self.grid) {
            self.state = PuzzleState::Idle;
            return;
        }
        let report = record_completion(progress, self.level_id, self.elapsed);
        log::info!(
            "level {} completed in {:.2}s (best {:.2}s)",
            self.level_id,
            report.time,
            report.best_time
        );
        self.state = PuzzleState::Complete(report);
        self.events.push(PuzzleEvent::Completed(report));
    }
}

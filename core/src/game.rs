use rand::Rng;

use crate::grid::PieceGrid;

pub const SWAP_DURATION_DEFAULT: f32 = 0.3;
pub const SHUFFLE_SWAPS_PER_PIECE_DEFAULT: u32 = 3;
pub const MAX_SHUFFLE_PASSES_DEFAULT: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameRules {
    /// Seconds a swap transition takes. Zero swaps instantly.
    pub swap_duration: f32,
    pub shuffle_swaps_per_piece: u32,
    pub max_shuffle_passes: u32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            swap_duration: SWAP_DURATION_DEFAULT,
            shuffle_swaps_per_piece: SHUFFLE_SWAPS_PER_PIECE_DEFAULT,
            max_shuffle_passes: MAX_SHUFFLE_PASSES_DEFAULT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShuffleReport {
    pub passes: u32,
    pub swaps: usize,
}

/// True when every piece occupies its correct slot.
pub fn check_win(grid: &PieceGrid) -> bool {
    grid.is_solved()
}

/// Scrambles `grid` with random pairwise swaps until it is no longer solved.
///
/// Each pass performs `shuffle_swaps_per_piece * len` swaps between two
/// distinct slots. Grids of one piece or fewer are left alone. If the pass
/// budget runs out while the grid is still solved, slots 0 and 1 are swapped.
pub fn shuffle_grid<R: Rng + ?Sized>(
    grid: &mut PieceGrid,
    rules: &GameRules,
    rng: &mut R,
) -> ShuffleReport {
    let total = grid.len();
    let mut report = ShuffleReport::default();
    if total <= 1 {
        return report;
    }
    let swaps_per_pass = total * rules.shuffle_swaps_per_piece.max(1) as usize;
    let max_passes = rules.max_shuffle_passes.max(1);

    while report.passes < max_passes {
        for _ in 0..swaps_per_pass {
            let a = rng.random_range(0..total);
            let mut b = rng.random_range(0..total - 1);
            if b >= a {
                b += 1;
            }
            grid.swap_slots(a, b);
        }
        report.passes += 1;
        report.swaps += swaps_per_pass;
        if !check_win(grid) {
            log::debug!(
                "shuffled {} pieces in {} pass(es), {} misplaced",
                total,
                report.passes,
                grid.misplaced_count()
            );
            return report;
        }
        log::debug!("shuffle pass {} left the grid solved", report.passes);
    }

    log::warn!("shuffle gave up after {} passes, forcing a swap", report.passes);
    grid.swap_slots(0, 1);
    report.swaps += 1;
    report
}

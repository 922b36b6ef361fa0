use photoswap_core::{
    is_level_unlocked, record_completion, Catalog, ClickOutcome, ErrorKind, GameContext,
    GameError, GameRules, Level, MemoryProgress, Photo, PhotoImage, ProgressBlob, ProgressStore,
    PuzzleEvent, PuzzleState,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn photo(id: u32, image: bool) -> Photo {
    Photo {
        id,
        name: format!("photo-{id}"),
        image: image.then(|| PhotoImage {
            src: format!("images/{id}.png"),
            width: 600,
            height: 600,
        }),
    }
}

fn level(id: u32, cols: u32, rows: u32, photo_id: u32) -> Level {
    Level {
        id,
        cols,
        rows,
        photo_id,
    }
}

fn build_context(swap_duration: f32) -> GameContext<MemoryProgress> {
    let catalog = Catalog::new(
        vec![photo(1, true), photo(2, true), photo(3, false)],
        vec![
            level(3, 4, 4, 2),
            level(1, 3, 3, 1),
            level(2, 2, 2, 2),
            level(4, 3, 3, 9),
            level(5, 3, 3, 3),
            level(6, 1, 4, 1),
        ],
    )
    .expect("catalog");
    GameContext::new(catalog, MemoryProgress::new()).with_rules(GameRules {
        swap_duration,
        ..GameRules::default()
    })
}

fn assert_permutation(indices: impl Iterator<Item = usize>, total: usize) {
    let mut seen: Vec<usize> = indices.collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..total).collect::<Vec<_>>());
}

#[test]
fn built_grid_holds_every_correct_index_once() {
    let ctx = build_context(0.3);
    let session = ctx.build_level(3).expect("level 3");
    let grid = session.grid();
    assert_eq!(grid.len(), 16);
    assert_permutation(grid.pieces().iter().map(|piece| piece.correct_index()), 16);
    assert!(session.is_solved());
}

#[test]
fn swaps_preserve_permutation() {
    let ctx = build_context(0.0);
    let mut progress = MemoryProgress::new();
    let mut session = ctx.start_level(1, &mut StdRng::seed_from_u64(5)).expect("level 1");
    let clicks = [0usize, 4, 8, 2, 3, 7, 1, 6, 5, 0];
    for pair in clicks.windows(2) {
        session.click_slot(pair[0], &mut progress);
        session.click_slot(pair[1], &mut progress);
        if session.is_complete() {
            break;
        }
        let grid = session.grid();
        assert_permutation(grid.pieces().iter().map(|piece| piece.current_index()), 9);
        for (slot, piece) in grid.pieces().iter().enumerate() {
            assert_eq!(piece.current_index(), slot);
        }
    }
}

#[test]
fn shuffled_grid_is_never_solved() {
    let ctx = build_context(0.3);
    for seed in 0..256 {
        let session = ctx
            .start_level(1, &mut StdRng::seed_from_u64(seed))
            .expect("level 1");
        assert!(!session.is_solved(), "seed {seed} produced a solved grid");
        assert_eq!(*session.state(), PuzzleState::Idle);
        assert_eq!(session.elapsed(), 0.0);
    }
}

#[test]
fn shuffle_emits_event() {
    let ctx = build_context(0.3);
    let mut session = ctx
        .start_level(2, &mut StdRng::seed_from_u64(11))
        .expect("level 2");
    let events = session.drain_events();
    assert!(matches!(events.as_slice(), [PuzzleEvent::Shuffled(report)] if report.passes >= 1));
    assert!(session.drain_events().is_empty());
}

#[test]
fn selecting_same_piece_twice_deselects() {
    let ctx = build_context(0.3);
    let mut progress = MemoryProgress::new();
    let mut session = ctx.build_level(1).expect("level 1");
    assert_eq!(session.click_slot(4, &mut progress), ClickOutcome::Selected);
    assert_eq!(session.selected(), Some(4));
    assert_eq!(session.click_piece(4, &mut progress), ClickOutcome::Deselected);
    assert_eq!(*session.state(), PuzzleState::Idle);
    assert_eq!(
        session.drain_events(),
        vec![PuzzleEvent::PieceSelected(4), PuzzleEvent::PieceDeselected(4)]
    );
}

#[test]
fn out_of_range_clicks_are_ignored() {
    let ctx = build_context(0.3);
    let mut progress = MemoryProgress::new();
    let mut session = ctx.build_level(2).expect("level 2");
    assert_eq!(session.click_slot(4, &mut progress), ClickOutcome::Ignored);
    assert_eq!(session.click_piece(99, &mut progress), ClickOutcome::Ignored);
    assert_eq!(*session.state(), PuzzleState::Idle);
    assert!(session.drain_events().is_empty());
}

#[test]
fn swap_transition_locks_input_then_completes() {
    let ctx = build_context(0.5);
    let mut progress = MemoryProgress::new();
    let mut session = ctx.build_level(1).expect("level 1");
    session.tick(2.0, &mut progress);

    // Swap two pieces out of place.
    session.click_slot(0, &mut progress);
    assert_eq!(session.click_slot(1, &mut progress), ClickOutcome::SwapStarted);
    assert_eq!(session.click_slot(2, &mut progress), ClickOutcome::Ignored);
    session.tick(0.25, &mut progress);
    let transition = session.swap_transition().expect("swapping");
    assert_eq!(transition.progress(), 0.5);
    assert!(session.is_solved(), "pieces move only when the transition ends");
    session.tick(0.25, &mut progress);
    assert_eq!(*session.state(), PuzzleState::Idle);
    assert!(!session.is_solved());
    assert_eq!(session.grid().piece_at(0).map(|piece| piece.id()), Some(1));

    // Swap them back to solve the puzzle.
    session.click_slot(0, &mut progress);
    session.click_slot(1, &mut progress);
    session.tick(0.5, &mut progress);
    assert!(session.is_complete());
    assert_eq!(session.elapsed(), 3.0);

    let report = *session.completion().expect("report");
    assert_eq!(report.level_id, 1);
    assert_eq!(report.time, 3.0);
    assert_eq!(report.best_time, 3.0);
    assert!(report.is_new_record);
    assert_eq!(progress.best_time(1), Some(3.0));

    let events = session.drain_events();
    assert_eq!(
        events,
        vec![
            PuzzleEvent::PieceSelected(0),
            PuzzleEvent::SwapStarted(0, 1),
            PuzzleEvent::SwapFinished(0, 1),
            PuzzleEvent::PieceSelected(1),
            PuzzleEvent::SwapStarted(1, 0),
            PuzzleEvent::SwapFinished(1, 0),
            PuzzleEvent::Completed(report),
        ]
    );

    // Complete is terminal: no input, timer frozen.
    assert_eq!(session.click_slot(3, &mut progress), ClickOutcome::Ignored);
    session.tick(10.0, &mut progress);
    assert_eq!(session.elapsed(), 3.0);
    assert!(session.drain_events().is_empty());
}

#[test]
fn slower_completion_keeps_existing_record() {
    let ctx = build_context(0.0);
    let mut progress = MemoryProgress::new();
    progress.set_best_time(2, 1.0);
    let mut session = ctx.build_level(2).expect("level 2");
    session.tick(5.0, &mut progress);
    session.click_slot(0, &mut progress);
    session.click_slot(3, &mut progress);
    session.click_slot(0, &mut progress);
    session.click_slot(3, &mut progress);
    let report = session.completion().expect("complete");
    assert!(!report.is_new_record);
    assert_eq!(report.time, 5.0);
    assert_eq!(report.best_time, 1.0);
    assert_eq!(progress.best_time(2), Some(1.0));
}

#[test]
fn timer_ignores_invalid_deltas() {
    let ctx = build_context(0.3);
    let mut progress = MemoryProgress::new();
    let mut session = ctx.build_level(1).expect("level 1");
    session.tick(-1.0, &mut progress);
    session.tick(f32::NAN, &mut progress);
    session.tick(0.5, &mut progress);
    assert_eq!(session.elapsed(), 0.5);
}

#[test]
fn best_time_bookkeeping() {
    let mut progress = MemoryProgress::new();
    let first = record_completion(&mut progress, 2, 45.2);
    assert!(first.is_new_record);
    assert_eq!(progress.best_time(2), Some(45.2));

    let slower = record_completion(&mut progress, 2, 50.0);
    assert!(!slower.is_new_record);
    assert_eq!(slower.time, 50.0);
    assert_eq!(slower.best_time, 45.2);
    assert_eq!(progress.best_time(2), Some(45.2));

    let faster = record_completion(&mut progress, 2, 30.0);
    assert!(faster.is_new_record);
    assert_eq!(faster.best_time, 30.0);
    assert_eq!(progress.best_time(2), Some(30.0));
}

#[test]
fn equal_time_is_not_a_new_record() {
    let mut progress = MemoryProgress::new();
    record_completion(&mut progress, 1, 20.0);
    assert!(!record_completion(&mut progress, 1, 20.0).is_new_record);
}

#[test]
fn unlocks_follow_previous_level() {
    let mut ctx = build_context(0.3);
    assert!(ctx.is_level_unlocked(1));
    assert!(!ctx.is_level_unlocked(2));
    assert!(!is_level_unlocked(ctx.progress(), 0));

    ctx.progress_mut().set_best_time(1, 61.0);
    assert!(ctx.is_level_unlocked(2));
    assert!(!ctx.is_level_unlocked(3));

    let entries = ctx.level_entries();
    let ids: Vec<u32> = entries.iter().map(|entry| entry.level_id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(entries[0].best_time, Some(61.0));
    assert!(entries[1].unlocked);
    assert!(!entries[2].unlocked);
    assert_eq!(entries[3].photo_name, None);
}

#[test]
fn next_level_ends_at_highest_id() {
    let ctx = build_context(0.3);
    assert_eq!(ctx.next_level(1).map(|level| level.id), Some(2));
    assert!(ctx.next_level(6).is_none());
    assert!(ctx.next_level(u32::MAX).is_none());
}

#[test]
fn win_check_is_idempotent() {
    let ctx = build_context(0.3);
    let session = ctx
        .start_level(1, &mut StdRng::seed_from_u64(2))
        .expect("level 1");
    let first = session.is_solved();
    assert_eq!(session.is_solved(), first);

    let solved = ctx.build_level(1).expect("level 1");
    assert!(solved.is_solved());
    assert!(solved.is_solved());
}

#[test]
fn restart_gives_a_fresh_session() {
    let ctx = build_context(0.0);
    let mut progress = MemoryProgress::new();
    let mut rng = StdRng::seed_from_u64(8);
    let mut session = ctx.start_level(1, &mut rng).expect("level 1");
    session.tick(4.0, &mut progress);
    session.click_slot(0, &mut progress);

    let restarted = ctx.start_level(1, &mut rng).expect("level 1");
    assert_eq!(restarted.elapsed(), 0.0);
    assert_eq!(restarted.selected(), None);
}

#[test]
fn instant_completion_keeps_next_level_open_after_reload() {
    let ctx = build_context(0.0);
    let mut progress = MemoryProgress::new();
    let mut session = ctx.build_level(2).expect("level 2");
    session.click_slot(0, &mut progress);
    session.click_slot(1, &mut progress);
    session.click_slot(0, &mut progress);
    session.click_slot(1, &mut progress);

    let report = *session.completion().expect("solved without any tick");
    assert_eq!(report.time, 0.0);
    assert!(report.is_new_record);
    assert!(is_level_unlocked(&progress, 3));

    let bytes = progress.to_blob().encode().expect("encode");
    let reloaded = MemoryProgress::from_blob(&ProgressBlob::decode(&bytes).expect("decode"));
    assert_eq!(reloaded.best_time(2), Some(0.0));
    assert!(is_level_unlocked(&reloaded, 3));
}

#[test]
fn shuffle_is_refused_once_input_was_accepted() {
    let ctx = build_context(0.0);
    let mut progress = MemoryProgress::new();
    let mut rng = StdRng::seed_from_u64(11);
    let mut session = ctx.build_level(1).expect("level 1");
    assert!(!session.has_started());
    assert!(session.shuffle(&mut rng).is_some());

    // Select then deselect: back to idle, but play has begun.
    let piece = session.grid().piece_at(0).map(|piece| piece.id());
    session.click_slot(0, &mut progress);
    session.click_slot(0, &mut progress);
    assert_eq!(*session.state(), PuzzleState::Idle);
    assert!(session.has_started());
    session.tick(1.5, &mut progress);

    session.drain_events();
    assert!(session.shuffle(&mut rng).is_none());
    assert!(session.drain_events().is_empty());
    assert_eq!(session.grid().piece_at(0).map(|piece| piece.id()), piece);
    assert_eq!(session.elapsed(), 1.5);

    // A finished swap leaves the session idle too.
    session.click_slot(3, &mut progress);
    session.click_slot(4, &mut progress);
    if !session.is_complete() {
        assert_eq!(*session.state(), PuzzleState::Idle);
        assert!(session.shuffle(&mut rng).is_none());
    }

    // Out-of-range clicks are not accepted input.
    let mut fresh = ctx.build_level(1).expect("level 1");
    fresh.click_slot(99, &mut progress);
    assert!(!fresh.has_started());
    assert!(fresh.shuffle(&mut rng).is_some());
}

#[test]
fn load_failures_are_classified() {
    let ctx = build_context(0.3);
    let missing = ctx.build_level(42).expect_err("no level 42");
    assert!(matches!(missing, GameError::LevelNotFound(42)));
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let dangling = ctx.build_level(4).expect_err("photo 9 missing");
    assert!(matches!(
        dangling,
        GameError::MissingPhoto {
            level_id: 4,
            photo_id: 9
        }
    ));
    assert_eq!(dangling.kind(), ErrorKind::Configuration);

    let blank = ctx.build_level(5).expect_err("photo 3 has no image");
    assert!(matches!(blank, GameError::MissingImage(3)));
    assert_eq!(blank.kind(), ErrorKind::Configuration);

    let narrow = ctx.build_level(6).expect_err("1x4 is too narrow");
    assert!(matches!(
        narrow,
        GameError::InvalidDimensions { cols: 1, rows: 4 }
    ));
    assert_eq!(narrow.kind(), ErrorKind::Configuration);
}

use std::fmt::Write;

use photoswap_core::{
    format_time, CompletionReport, GameContext, GridSize, LevelId, PuzzleEvent, PuzzleSession,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

use crate::store::FileProgress;

const FRAME_INTERVAL: Duration = Duration::from_millis(50);

type InputLines = Lines<BufReader<Stdin>>;

pub(crate) struct PlayOptions {
    pub(crate) level_id: LevelId,
    pub(crate) seed: Option<u64>,
    pub(crate) force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Pick(usize),
    Board,
    Restart,
    Quit,
    Help,
}

enum LevelExit {
    Next,
    Restart,
    Quit,
}

pub(crate) async fn run(
    ctx: &mut GameContext<FileProgress>,
    options: PlayOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    if !options.force && !ctx.is_level_unlocked(options.level_id) {
        eprintln!(
            "level {} is locked; finish level {} first or pass --force",
            options.level_id,
            options.level_id.saturating_sub(1)
        );
        return Ok(());
    }
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut level_id = options.level_id;

    loop {
        let mut session = match ctx.start_level(level_id, &mut rng) {
            Ok(session) => session,
            Err(err) => {
                eprintln!("cannot start level {level_id}: {err}");
                return Ok(());
            }
        };
        session.drain_events();
        print_help();
        match play_level(ctx, &mut session, &mut lines).await? {
            LevelExit::Quit => return Ok(()),
            LevelExit::Restart => {}
            LevelExit::Next => match ctx.next_level(level_id) {
                Some(next) => level_id = next.id,
                None => {
                    println!("That was the last level. Back to level select.");
                    return Ok(());
                }
            },
        }
    }
}

async fn play_level(
    ctx: &mut GameContext<FileProgress>,
    session: &mut PuzzleSession,
    lines: &mut InputLines,
) -> std::io::Result<LevelExit> {
    println!("{}", render_board(session));
    let mut ticker = interval(FRAME_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_tick = Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                let dt = now.duration_since(last_tick).as_secs_f32();
                last_tick = now;
                session.tick(dt, ctx.progress_mut());
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(LevelExit::Quit);
                };
                match parse_command(&line, session.grid().size()) {
                    Ok(Command::Pick(slot)) => {
                        session.click_slot(slot, ctx.progress_mut());
                    }
                    Ok(Command::Board) => println!("{}", render_board(session)),
                    Ok(Command::Restart) => return Ok(LevelExit::Restart),
                    Ok(Command::Quit) => return Ok(LevelExit::Quit),
                    Ok(Command::Help) => print_help(),
                    Err(message) => println!("{message}"),
                }
            }
        }

        if let Some(report) = show_events(session) {
            print_completion(&report);
            return after_win(ctx, session.level_id(), lines).await;
        }
    }
}

async fn after_win(
    ctx: &GameContext<FileProgress>,
    level_id: LevelId,
    lines: &mut InputLines,
) -> std::io::Result<LevelExit> {
    let has_next = ctx.next_level(level_id).is_some();
    if has_next {
        println!("[n]ext level, [r]estart, [q]uit");
    } else {
        println!("[r]estart, [q]uit");
    }
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "n" | "next" if has_next => return Ok(LevelExit::Next),
            "r" | "restart" => return Ok(LevelExit::Restart),
            "q" | "quit" | "" => return Ok(LevelExit::Quit),
            other => println!("unknown choice '{other}'"),
        }
    }
    Ok(LevelExit::Quit)
}

/// Prints what happened since the last call; returns the report once the puzzle is solved.
fn show_events(session: &mut PuzzleSession) -> Option<CompletionReport> {
    let mut completed = None;
    for event in session.drain_events() {
        match event {
            PuzzleEvent::Shuffled(_) => {}
            PuzzleEvent::PieceSelected(piece) => {
                println!("selected piece {}", piece + 1);
            }
            PuzzleEvent::PieceDeselected(piece) => {
                println!("deselected piece {}", piece + 1);
            }
            PuzzleEvent::SwapStarted(a, b) => {
                println!("swapping {} <-> {} ...", a + 1, b + 1);
            }
            PuzzleEvent::SwapFinished(_, _) => println!("{}", render_board(session)),
            PuzzleEvent::Completed(report) => completed = Some(report),
        }
    }
    completed
}

fn print_completion(report: &CompletionReport) {
    println!("Solved level {}!", report.level_id);
    println!("Time: {}", format_time(report.time));
    println!("Best: {}", format_time(report.best_time));
    if report.is_new_record {
        println!("New record!");
    }
}

fn print_help() {
    println!("Pick a slot by number, or by 'row col'. Pick two slots to swap them.");
    println!("Commands: b (board), r (restart), q (quit), h (help)");
}

fn parse_command(input: &str, size: GridSize) -> Result<Command, String> {
    let trimmed = input.trim();
    match trimmed {
        "b" | "board" => return Ok(Command::Board),
        "r" | "restart" => return Ok(Command::Restart),
        "q" | "quit" => return Ok(Command::Quit),
        "h" | "help" | "?" => return Ok(Command::Help),
        _ => {}
    }
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    let total = size.piece_count();
    let slot = match parts.as_slice() {
        [single] => {
            let value: usize = single
                .parse()
                .map_err(|_| format!("not a slot number: '{single}'"))?;
            if value == 0 || value > total {
                return Err(format!("slot must be between 1 and {total}"));
            }
            value - 1
        }
        [row, col] => {
            let row: u32 = row.parse().map_err(|_| format!("not a row: '{row}'"))?;
            let col: u32 = col.parse().map_err(|_| format!("not a column: '{col}'"))?;
            if row == 0 || row > size.rows || col == 0 || col > size.cols {
                return Err(format!(
                    "row must be 1..={} and column 1..={}",
                    size.rows, size.cols
                ));
            }
            ((row - 1) * size.cols + (col - 1)) as usize
        }
        _ => return Err("type h for help".to_string()),
    };
    Ok(Command::Pick(slot))
}

fn render_board(session: &PuzzleSession) -> String {
    let grid = session.grid();
    let size = grid.size();
    let width = grid.len().to_string().len();
    let selected = session.selected();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Level {}  {}  time {}  misplaced {}",
        session.level_id(),
        size.label(),
        format_time(session.elapsed()),
        grid.misplaced_count()
    );
    for (slot, piece) in grid.pieces().iter().enumerate() {
        let (open, close) = if selected == Some(piece.id()) {
            ('*', '*')
        } else if piece.is_in_correct_position() {
            ('(', ')')
        } else {
            ('[', ']')
        };
        let _ = write!(out, " {open}{:>width$}{close}", piece.id() + 1);
        if (slot + 1) % size.cols as usize == 0 {
            out.push('\n');
        }
    }
    out
}

mod play;
mod store;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use photoswap_core::{
    format_time, photos_from_dir, photos_to_toml, Catalog, GameContext, LevelId,
};

use crate::play::PlayOptions;
use crate::store::FileProgress;

#[derive(Parser)]
#[command(name = "photoswap", version, about = "Swap tiles back into place to rebuild a photo")]
struct Cli {
    #[arg(long, global = true, env = "PHOTOSWAP_CATALOG_PATH", default_value = "puzzles/catalog.toml")]
    catalog: PathBuf,
    #[arg(long, global = true, env = "PHOTOSWAP_PROGRESS_PATH", default_value = "photoswap-progress.bin")]
    progress: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List levels with their lock state and best time.
    Levels,
    /// Play a level in the terminal.
    Play {
        #[arg(long, default_value_t = 1)]
        level: LevelId,
        #[arg(long)]
        seed: Option<String>,
        /// Start the level even if it is still locked.
        #[arg(long)]
        force: bool,
    },
    Photos {
        #[command(subcommand)]
        command: PhotoCommand,
    },
    Progress {
        #[command(subcommand)]
        command: ProgressCommand,
    },
}

#[derive(Subcommand)]
enum PhotoCommand {
    /// Print catalog entries for every image in a directory.
    ///
    /// Sources are written relative to the catalog file's directory unless
    /// `--relative-to` names another one.
    Scan {
        dir: PathBuf,
        #[arg(long)]
        relative_to: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ProgressCommand {
    Show,
    Reset,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Levels => {
            let ctx = load_context(&cli.catalog, &cli.progress)?;
            if ctx.catalog().level_count() == 0 {
                println!("no levels in {}", cli.catalog.display());
            }
            for entry in ctx.level_entries() {
                let lock = if entry.unlocked { "open  " } else { "locked" };
                let best = entry
                    .best_time
                    .map(format_time)
                    .unwrap_or_else(|| "--:--".to_string());
                let photo = entry.photo_name.as_deref().unwrap_or("<missing photo>");
                println!(
                    "{:>3}  {}  {:<24} best {}  {}",
                    entry.level_id,
                    lock,
                    entry.grid.label(),
                    best,
                    photo
                );
            }
        }
        Commands::Play { level, seed, force } => {
            let seed = match seed.as_deref() {
                Some(raw) => Some(parse_seed_arg(raw)?),
                None => None,
            };
            let mut ctx = load_context(&cli.catalog, &cli.progress)?;
            play::run(
                &mut ctx,
                PlayOptions {
                    level_id: level,
                    seed,
                    force,
                },
            )
            .await?;
        }
        Commands::Photos { command } => match command {
            PhotoCommand::Scan { dir, relative_to } => {
                let photos = photos_from_dir(&dir)?;
                if photos.is_empty() {
                    eprintln!("no images found in {}", dir.display());
                }
                let catalog_dir = relative_to
                    .as_deref()
                    .or_else(|| cli.catalog.parent())
                    .unwrap_or(Path::new(""));
                print!("{}", photos_to_toml(&photos, catalog_dir)?);
            }
        },
        Commands::Progress { command } => {
            let mut progress = FileProgress::open(&cli.progress);
            match command {
                ProgressCommand::Show => {
                    let mut empty = true;
                    for (level_id, best) in progress.records() {
                        empty = false;
                        println!("level {:>3}  best {}", level_id, format_time(best));
                    }
                    if empty {
                        println!("no progress recorded in {}", progress.path().display());
                    }
                }
                ProgressCommand::Reset => {
                    progress.reset()?;
                    println!("progress cleared");
                }
            }
        }
    }

    Ok(())
}

fn load_context(
    catalog_path: &Path,
    progress_path: &Path,
) -> Result<GameContext<FileProgress>, Box<dyn std::error::Error>> {
    let catalog = Catalog::load(catalog_path)?;
    let progress = FileProgress::open(progress_path);
    Ok(GameContext::new(catalog, progress))
}

fn parse_seed_arg(raw: &str) -> Result<u64, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    let value = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)?
    } else {
        trimmed.parse::<u64>()?
    };
    Ok(value)
}

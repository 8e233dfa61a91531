//! Terminal front-end for PocketPal.
//!
//! The pet itself lives in the library crate (`pocketpal::game::Game`); this
//! binary only handles flags, logging, and the crossterm UI.
mod app;
mod input;
mod render;

use anyhow::Result;
use clap::Parser;
use pocketpal::config::{load_settings, project_paths};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pocketpal")]
#[command(about = "A virtual pet that lives in your terminal")]
#[command(version)]
struct Cli {
    /// Seed for the random source (0 picks one from the OS)
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for the save file, settings and log
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Seconds between decay ticks
    #[arg(long)]
    tick_secs: Option<u64>,

    /// Disable colors
    #[arg(long)]
    mono: bool,

    /// Verbose logging (-v, -vv for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Replace the saved pet with a new one
    #[arg(long)]
    reset: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = project_paths(cli.data_dir.as_deref())?;
    init_logging(&paths.log_path, cli.verbose);

    let mut settings = load_settings(&paths.settings_path);
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }
    if let Some(secs) = cli.tick_secs {
        settings.tick_secs = secs;
    }
    if cli.mono {
        settings.enable_color = false;
    }
    log::info!("starting pocketpal, saving to {}", paths.save_path.display());

    app::run(paths, settings, cli.reset)
}

/// The UI owns the screen, so log lines go to a file in the data dir.
fn init_logging(path: &Path, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        builder.parse_filters(&rust_log);
    }
    builder.format(|fmt, record| {
        writeln!(
            fmt,
            "{} [{}] {}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
            record.level(),
            record.args()
        )
    });
    match std::fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            // Nowhere safe to write; stderr would tear the UI.
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
}

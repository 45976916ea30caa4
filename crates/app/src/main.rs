use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use muza_broadcast::{Fanout, JsonLines, TrackRow, WatchBroadcaster};
use muza_core::time::format_time;
use muza_core::PlayerConfig;
use muza_engine::{PlaybackSynchronizer, TrackBounds};
use muza_media::{MediaAdapter, SimulatedAdapter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use url::Url;

mod commands;
mod queue;

use commands::Command;
use queue::{Playlist, QueueController};

#[derive(Parser, Debug)]
#[command(
    name = "muza-player",
    about = "Playback synchronizer driven from the terminal against a simulated media resource"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Run,
    Playlist,
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cmd = cli.command.unwrap_or(Commands::Run);
    let cfg_path = cli.config.unwrap_or_else(default_config_path);

    match cmd {
        Commands::Config {
            action: ConfigAction::Init,
        } => {
            init_config(&cfg_path)?;
            println!("Initialized config at {}", cfg_path.display());
            Ok(())
        }
        Commands::Playlist => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            print_playlist(&build_queue(&cfg)?, None);
            Ok(())
        }
        Commands::Run => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            run(cfg).await
        }
    }
}

async fn run(cfg: PlayerConfig) -> Result<()> {
    let mut queue = build_queue(&cfg)?;
    let mut probe = queue.probe();
    for pattern in &cfg.simulation.failing_sources {
        probe.fail_matching(pattern.clone());
    }
    let (adapter, mut media_rx) = SimulatedAdapter::new(cfg.simulation.clone(), Arc::new(probe));

    let watch = WatchBroadcaster::new();
    let rows: Vec<TrackRow> = queue
        .entries()
        .iter()
        .map(|entry| watch.row(entry.id.clone()))
        .collect();
    let broadcaster = Fanout::new()
        .with(watch)
        .with(JsonLines::new(std::io::stdout()));

    let mut player = PlaybackSynchronizer::new(adapter, Box::new(broadcaster), cfg.initial_volume);
    let mut events_out = JsonLines::new(std::io::stdout());

    info!(
        tracks = queue.len(),
        adapter = player.adapter().name(),
        "muza-player started"
    );

    if let Some(entry) = queue.start() {
        player.set_track(entry.id, entry.source, entry.metadata, false);
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(tagged) = media_rx.recv() => {
                player.on_resource_event(tagged.generation, tagged.event);
            }
            line = stdin.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    info!("stdin closed; shutting down");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(cmd) => apply(&mut player, &queue, &rows, cmd),
                    Err(err) => warn!(error = %err, "ignoring command"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received ctrl-c; shutting down");
                break;
            }
        }

        for event in player.drain_events() {
            if let Err(err) = events_out.write_event(&event) {
                warn!(error = %err, "failed to write player event");
            }
            if let Some(entry) = queue.react(&event) {
                player.set_track(
                    entry.id,
                    entry.source,
                    entry.metadata,
                    cfg.autoplay_on_advance,
                );
            }
        }
    }

    Ok(())
}

fn apply<A: MediaAdapter>(
    player: &mut PlaybackSynchronizer<A>,
    queue: &QueueController,
    rows: &[TrackRow],
    cmd: Command,
) {
    match cmd {
        Command::Toggle => player.request_play_pause(),
        Command::Next => player.request_next(),
        Command::Previous => player.request_previous(),
        Command::Seek(position) => player.request_seek(position),
        Command::Drag { x, width } => player.begin_drag(x, TrackBounds::new(0.0, width)),
        Command::Move { x, width } => player.drag_move(x, TrackBounds::new(0.0, width)),
        Command::Release => player.end_drag(),
        Command::Volume(value) => player.update_volume(value),
        Command::Mute => player.toggle_mute(),
        Command::Status => match player.view() {
            Some(view) => {
                println!(
                    "{} - {} ({} • {})",
                    view.metadata.artist,
                    view.metadata.title,
                    view.metadata.album,
                    view.metadata
                        .year
                        .map(|y| y.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                );
                println!(
                    "[{}] {} / -{} ({:.0}%) {}",
                    view.state,
                    view.elapsed,
                    view.remaining,
                    view.progress * 100.0,
                    if view.shows_pause { "⏸" } else { "▶" },
                );
                println!("volume: {:.2} ({:?})", view.volume, view.volume_level);
                if let Some(err) = view.error {
                    println!("error: {err}");
                }
                if let Some(entry) = queue.current() {
                    println!("queue: {} of {} tracks", entry.id, queue.len());
                }
            }
            None => println!("nothing loaded"),
        },
        Command::List => print_playlist(queue, Some(rows)),
        Command::Quit => {}
    }
}

fn print_playlist(queue: &QueueController, rows: Option<&[TrackRow]>) {
    for (i, entry) in queue.entries().iter().enumerate() {
        let playing = rows
            .and_then(|rows| rows.iter().find(|row| row.track_id() == &entry.id))
            .is_some_and(|row| row.is_now_playing());
        let marker = if playing { "▶" } else { " " };
        println!(
            "{marker} {:>2}. {} - {} [{}]",
            i + 1,
            entry.metadata.artist,
            entry.metadata.title,
            format_time(entry.duration)
        );
    }
}

fn build_queue(cfg: &PlayerConfig) -> Result<QueueController> {
    let base = Url::parse(&cfg.media_base_url)
        .with_context(|| format!("invalid media_base_url {}", cfg.media_base_url))?;
    let playlist = match &cfg.playlist_path {
        Some(path) => Playlist::load(Path::new(path))?,
        None => Playlist::demo(),
    };
    QueueController::from_playlist(&playlist, &base)
}

fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("muza-player").join("config.toml")
}

fn init_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let cfg = PlayerConfig::default();
    let toml = toml::to_string_pretty(&cfg)?;
    std::fs::write(path, toml)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}

fn load_or_default(path: &Path) -> Result<PlayerConfig> {
    let mut cfg = if !path.exists() {
        PlayerConfig::default()
    } else {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))?
    };
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

fn init_logging(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // stdout carries the JSON event stream
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn apply_env_overrides(cfg: &mut PlayerConfig) {
    if let Ok(v) = std::env::var("MUZA_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.log_level = v;
        }
    }
    if let Ok(v) = std::env::var("MUZA_MEDIA_BASE_URL") {
        if !v.trim().is_empty() {
            cfg.media_base_url = v;
        }
    }
    if let Ok(v) = std::env::var("MUZA_INITIAL_VOLUME") {
        if let Ok(parsed) = v.parse::<f64>() {
            cfg.initial_volume = parsed;
        }
    }
    if let Ok(v) = std::env::var("MUZA_REJECT_PLAY") {
        if let Ok(parsed) = v.parse::<bool>() {
            cfg.simulation.reject_play = parsed;
        }
    }
}

/// Encore - terminal player for an Encore playback session
mod backend;
mod commands;

use anyhow::{bail, Context};
use backend::SimulatedBackend;
use clap::{Parser, Subcommand};
use commands::{parse_input, Input, HELP};
use encore_core::{parse_track_list, Track, TrackId};
use encore_playback::{
    format_time, notification_channel, PlaybackConfig, PlaybackEvent, PlaybackSession,
    PlaybackState, RepeatMode, SessionCommand, SessionHandle, SessionRunner,
};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "encore")]
#[command(about = "Encore playback session in the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a track list against a simulated player
    Play {
        /// JSON track list (bare array or search response)
        tracks: PathBuf,

        /// Configuration file path
        #[arg(short, long, env = "ENCORE_CONFIG")]
        config: Option<PathBuf>,

        /// Track id to start from (default: first track)
        #[arg(long)]
        start: Option<String>,

        /// Initial volume (0-100)
        #[arg(long)]
        volume: Option<u8>,

        /// Start with shuffle on
        #[arg(long)]
        shuffle: bool,

        /// Initial repeat mode (off, all, one)
        #[arg(long)]
        repeat: Option<RepeatMode>,

        /// Playback speed multiplier for the simulated clock
        #[arg(long, default_value_t = 1.0)]
        speed: f64,

        /// Track ids the simulated player refuses to load
        #[arg(long = "unavailable", value_delimiter = ',')]
        unavailable: Vec<String>,
    },
    /// List the tracks in a track list
    List {
        /// JSON track list (bare array or search response)
        tracks: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encore_cli=info,encore_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            tracks,
            config,
            start,
            volume,
            shuffle,
            repeat,
            speed,
            unavailable,
        } => {
            let settings = resolve_config(config.as_deref(), volume, shuffle, repeat)?;

            if !(speed.is_finite() && speed > 0.0) {
                bail!("Speed must be a positive number, got {speed}");
            }

            let tracks = read_tracks(&tracks)?;
            let unavailable = unavailable.into_iter().map(TrackId::new);
            play(settings, tracks, start, speed, unavailable).await?;
        }
        Commands::List { tracks } => {
            let tracks = read_tracks(&tracks)?;
            println!("{} tracks:", tracks.len());
            for (index, track) in tracks.iter().enumerate() {
                let duration = track
                    .duration_secs
                    .map_or_else(|| "--:--".to_string(), format_time);
                println!(
                    "  {:>3}  {:<12} {:>6}  {} - {}",
                    index,
                    track.id.as_str(),
                    duration,
                    track.artist,
                    track.title
                );
            }
        }
    }

    Ok(())
}

/// Configuration file and environment, then command-line overrides
fn resolve_config(
    path: Option<&Path>,
    volume: Option<u8>,
    shuffle: bool,
    repeat: Option<RepeatMode>,
) -> anyhow::Result<PlaybackConfig> {
    let mut settings = PlaybackConfig::load(path)?;
    if let Some(volume) = volume {
        settings.initial_volume = volume;
    }
    if shuffle {
        settings.shuffle = true;
    }
    if let Some(repeat) = repeat {
        settings.repeat = repeat;
    }
    settings.validate()?;
    Ok(settings)
}

fn read_tracks(path: &Path) -> anyhow::Result<Vec<Track>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read track list {}", path.display()))?;
    let tracks = parse_track_list(&json)
        .with_context(|| format!("Invalid track list {}", path.display()))?;
    debug!(count = tracks.len(), path = %path.display(), "Loaded track list");
    Ok(tracks)
}

async fn play(
    config: PlaybackConfig,
    tracks: Vec<Track>,
    start: Option<String>,
    speed: f64,
    unavailable: impl IntoIterator<Item = TrackId>,
) -> anyhow::Result<()> {
    let first = match start {
        Some(id) => tracks
            .iter()
            .find(|track| track.id.as_str() == id)
            .cloned()
            .with_context(|| format!("Track '{id}' is not in the track list"))?,
        None => tracks
            .first()
            .cloned()
            .context("Track list is empty, nothing to play")?,
    };

    let (notifier, notifications) = notification_channel();
    let backend = SimulatedBackend::new(notifier, &tracks, speed).with_unavailable(unavailable);
    let session = PlaybackSession::new(backend, &config);
    let (runner, handle, events) = SessionRunner::new(session, notifications, &config);

    info!(tracks = tracks.len(), speed, "Starting playback");
    handle.play_track(first, Some(tracks))?;
    println!("{HELP}");

    let (session, input, ()) = tokio::join!(
        runner.run(),
        read_commands(handle),
        print_events(events)
    );
    input?;

    let liked = session.likes().sorted_ids();
    if !liked.is_empty() {
        let liked: Vec<&str> = liked.iter().map(TrackId::as_str).collect();
        println!("Liked this session: {}", liked.join(", "));
    }

    Ok(())
}

/// Feed stdin lines to the session until `quit` or end of input
async fn read_commands(handle: SessionHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match parse_input(&line) {
            Ok(Input::Session(command)) => handle.send(command)?,
            Ok(Input::LikeCurrent) => {
                let state = handle.snapshot().await?;
                match state.current_track {
                    Some(track) => handle.send(SessionCommand::ToggleLiked(track.id))?,
                    None => println!("Nothing is playing"),
                }
            }
            Ok(Input::Status) => print_status(&handle.snapshot().await?),
            Ok(Input::Wait(duration)) => tokio::time::sleep(duration).await,
            Ok(Input::Help) => println!("{HELP}"),
            Ok(Input::Quit) => break,
            Err(message) => println!("{message}"),
        }
    }

    // The runner may already be gone if the user quit twice
    handle.shutdown().ok();
    Ok(())
}

async fn print_events(mut events: UnboundedReceiver<PlaybackEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            PlaybackEvent::StateChanged { status } => println!("[{status}]"),
            PlaybackEvent::TrackChanged {
                track_id,
                generation,
                ..
            } => println!("> loading {track_id} ({generation})"),
            PlaybackEvent::TrackFinished { track_id } => println!("  finished {track_id}"),
            PlaybackEvent::PositionUpdate {
                position_secs,
                duration_secs,
            } => debug!(
                "{} / {}",
                format_time(position_secs),
                format_time(duration_secs)
            ),
            PlaybackEvent::VolumeChanged { level, is_muted } => {
                if is_muted {
                    println!("  volume {level} (muted)");
                } else {
                    println!("  volume {level}");
                }
            }
            PlaybackEvent::QueueChanged {
                length,
                current_index,
            } => match current_index {
                Some(index) => println!("  queue {}/{length}", index + 1),
                None => println!("  queue empty"),
            },
            PlaybackEvent::ShuffleChanged { enabled } => {
                println!("  shuffle {}", if enabled { "on" } else { "off" });
            }
            PlaybackEvent::RepeatModeChanged { mode } => println!("  repeat {mode}"),
            PlaybackEvent::LikeChanged { track_id, liked } => {
                println!("  {} {track_id}", if liked { "liked" } else { "unliked" });
            }
            PlaybackEvent::Error { message } => println!("! {message}"),
        }
    }
}

fn print_status(state: &PlaybackState) {
    let Some(track) = &state.current_track else {
        println!("[{}] nothing loaded", state.status);
        return;
    };

    let heart = if state.current_track_liked() { " <3" } else { "" };
    println!(
        "[{}] {} - {}{heart}",
        state.status, track.artist, track.title
    );
    println!(
        "  {} / {} ({:.0}%)  track {}/{}",
        state.elapsed_label(),
        state.duration_label(),
        state.progress_percent(),
        state.current_index.map_or(0, |index| index + 1),
        state.queue_length
    );
    println!(
        "  volume {}{}  shuffle {}  repeat {}",
        state.volume,
        if state.muted { " (muted)" } else { "" },
        if state.shuffle_enabled { "on" } else { "off" },
        state.repeat_mode
    );
}

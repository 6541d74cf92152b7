// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use jamm::audio::output::{default_device_name, list_devices};
use jamm::audio::{AudioDevice, CpalDevice, NullDevice};
use jamm::config::{AppConfig, SongEvent, SongWatcher};
use jamm::control::{ControlAction, KeyboardController};
use jamm::metronome::BeatScheduler;
use jamm::music::{guitar_fingering, parse_chord};
use jamm::session::{JamSession, SessionEvent};
use jamm::song::{Song, SongError, SongLibrary, SongRepository};
use jamm::ui::{App, UiState};

/// Frame interval of the UI
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// How long the input thread waits for a key before checking for shutdown
const INPUT_POLL: Duration = Duration::from_millis(100);

fn print_usage() {
    println!("JAMM - Chord Progression Practice");
    println!();
    println!("Usage: jamm [OPTIONS] [SONG]");
    println!();
    println!("SONG is a song id from the library or a path to a song YAML file.");
    println!();
    println!("Options:");
    println!("  --config <FILE>     Settings file (default: jamm.toml)");
    println!("  --library <DIR>     Song library directory (overrides config)");
    println!("  --list              List songs in the library");
    println!("  --search <TEXT>     Search songs by title or artist");
    println!("  --chord <SYMBOL>    Show the notes of a chord");
    println!("  --devices           List audio output devices");
    println!("  --silent            Run without opening an audio device");
    println!("  --help              Show this help message");
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Practice,
    List,
    Search(String),
    Chord(String),
    Devices,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
struct Cli {
    command: Command,
    config: Option<PathBuf>,
    library: Option<PathBuf>,
    song: Option<String>,
    silent: bool,
}

fn parse_args(args: &[String]) -> Result<Cli> {
    let mut cli = Cli {
        command: Command::Practice,
        config: None,
        library: None,
        song: None,
        silent: false,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| anyhow!("{} requires a value", flag))
        };
        match arg.as_str() {
            "--config" => cli.config = Some(PathBuf::from(value("--config")?)),
            "--library" => cli.library = Some(PathBuf::from(value("--library")?)),
            "--list" => cli.command = Command::List,
            "--search" => cli.command = Command::Search(value("--search")?),
            "--chord" => cli.command = Command::Chord(value("--chord")?),
            "--devices" => cli.command = Command::Devices,
            "--silent" => cli.silent = true,
            "--help" | "-h" => cli.command = Command::Help,
            other if other.starts_with('-') => return Err(anyhow!("Unknown option: {}", other)),
            other => {
                if cli.song.is_some() {
                    return Err(anyhow!("Unexpected argument: {}", other));
                }
                cli.song = Some(other.to_string());
            }
        }
    }
    Ok(cli)
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("Failed to open log file: {:?}", config.log_file))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(config.log_level())
        .init();
    Ok(())
}

fn load_library(config: &AppConfig) -> Result<SongLibrary> {
    SongLibrary::load_dir(&config.library_dir)
        .with_context(|| format!("Failed to load song library: {:?}", config.library_dir))
}

fn print_songs(songs: &[Song]) {
    if songs.is_empty() {
        println!("No songs found");
        return;
    }
    for song in songs {
        println!(
            "{:<20} {:<32} {:<20} {:>4} {:>3} BPM  {}",
            song.id, song.title, song.artist, song.original_key, song.tempo_bpm, song.difficulty
        );
    }
}

fn show_chord(symbol: &str) -> Result<()> {
    let chord = parse_chord(symbol)?;
    println!("{}", symbol);
    println!("  Root:      {}", chord.root);
    println!("  Quality:   {}", chord.quality);
    if let Some(extension) = &chord.extension {
        println!("  Extension: {}", extension);
    }
    println!("  Notes:     {}", chord.note_names().join(" "));

    let fingering = guitar_fingering(symbol);
    if !fingering.is_empty() {
        let frets: Vec<String> = (1..=6u8)
            .rev()
            .map(|string| {
                fingering
                    .iter()
                    .find(|p| p.string == string)
                    .map(|p| p.fret.to_string())
                    .unwrap_or_else(|| "x".to_string())
            })
            .collect();
        println!("  Guitar:    {}", frets.join(" "));
    }
    Ok(())
}

fn show_devices() {
    let default = default_device_name();
    let devices = list_devices();
    if devices.is_empty() {
        println!("No audio output devices found");
        return;
    }
    println!("Audio output devices:");
    for (i, name) in devices.iter().enumerate() {
        let marker = if Some(name) == default.as_ref() { " (default)" } else { "" };
        println!("  {}: {}{}", i, name, marker);
    }
}

/// A song to start with: the loaded song and the file to watch, or the
/// message to show instead
fn resolve_song(
    target: &str,
    library: &SongLibrary,
) -> std::result::Result<(Song, PathBuf), SongError> {
    let path = Path::new(target);
    let looks_like_file = path.is_file()
        || matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"));
    if looks_like_file {
        return Song::load(path).map(|song| (song, path.to_path_buf()));
    }

    let song = library.fetch_by_id(target)?;
    let source = library
        .source_path(target)
        .map(Path::to_path_buf)
        .ok_or_else(|| SongError::NotFound(target.to_string()))?;
    Ok((song, source))
}

async fn practice(cli: Cli, config: AppConfig, config_dir: PathBuf) -> Result<()> {
    let library = match load_library(&config) {
        Ok(library) => library,
        Err(e) => {
            warn!("{:#}", e);
            SongLibrary::default()
        }
    };

    let device: Box<dyn AudioDevice> = if cli.silent {
        Box::new(NullDevice::default())
    } else {
        Box::new(CpalDevice::new(config.audio.buffer_frames))
    };
    let scheduler = BeatScheduler::new(device, config.scheduler_config(&config_dir))?;
    let (mut session, mut events) = JamSession::new(scheduler, config.sound_names());
    session.apply(ControlAction::SetVolume(config.defaults.volume as i32));
    session.apply(ControlAction::SetInstrument(config.defaults.instrument));
    session.apply(ControlAction::SetSound(config.defaults.sound.clone()));

    let mut ui = UiState::default();
    let mut _watcher = None;
    match cli.song.as_deref().map(|target| resolve_song(target, &library)) {
        Some(Ok((song, path))) => {
            session.load_song(song);
            let forward = session.sender();
            match SongWatcher::with_callback(&path, None, move |event| {
                let message = match event {
                    SongEvent::Reloaded(song) => SessionEvent::SongReloaded((**song).clone()),
                    SongEvent::Error(e) => SessionEvent::Notice(format!("Reload failed: {}", e)),
                };
                let _ = forward.send(message);
            }) {
                Ok(watcher) => _watcher = Some(watcher),
                Err(e) => warn!("hot reload disabled: {:#}", e),
            }
        }
        Some(Err(e)) => {
            error!("{}", e);
            ui.set_status(e.to_string());
        }
        None => ui.set_status(format!(
            "No song selected ({} in library, run with --list)",
            library.len()
        )),
    }

    let keys = KeyboardController::with_defaults();
    let (key_tx, mut key_rx) = mpsc::unbounded_channel::<KeyEvent>();
    let running = Arc::new(AtomicBool::new(true));
    let input_running = Arc::clone(&running);
    let input = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        while input_running.load(Ordering::SeqCst) {
            if !event::poll(INPUT_POLL)? {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && key_tx.send(key).is_err() {
                    break;
                }
            }
        }
        Ok(())
    });

    let mut app = App::new().context("Failed to initialize terminal")?;
    let mut redraw = tokio::time::interval(FRAME_INTERVAL);
    info!("practice session started");

    let result: Result<()> = loop {
        tokio::select! {
            Some(key) = key_rx.recv() => match keys.process_key(key.code, key.modifiers) {
                Some(ControlAction::Quit) => break Ok(()),
                Some(ControlAction::ToggleHelp) => ui.toggle_help(),
                Some(action) => session.apply(action),
                None => {}
            },
            Some(event) = events.recv() => session.handle_event(event),
            _ = redraw.tick() => {
                if let Some(notice) = session.notice() {
                    ui.set_status(notice.to_string());
                    session.clear_notice();
                }
                ui.clear_expired_status();
                if let Err(e) = app.draw(session.state(), &ui, &keys) {
                    break Err(e.into());
                }
            }
        }
    };

    running.store(false, Ordering::SeqCst);
    drop(app);
    session.shutdown();
    match input.await {
        Ok(Err(e)) => error!("input thread failed: {}", e),
        Err(e) => error!("input thread panicked: {}", e),
        Ok(Ok(())) => {}
    }
    info!("practice session ended");
    result
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    if cli.command == Command::Help {
        print_usage();
        return Ok(());
    }

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(library) = &cli.library {
        config.library_dir = library.clone();
    }
    let config_dir = cli
        .config
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    init_logging(&config)?;

    match cli.command.clone() {
        Command::Practice => practice(cli, config, config_dir).await?,
        Command::List => print_songs(load_library(&config)?.all()),
        Command::Search(text) => print_songs(&load_library(&config)?.search(&text)),
        Command::Chord(symbol) => show_chord(&symbol)?,
        Command::Devices => show_devices(),
        Command::Help => print_usage(),
    }

    Ok(())
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Hot reload of the song being practised.
//!
//! The parent directory is watched rather than the file itself, since
//! editors commonly save by writing a new file and renaming it over the
//! old one.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::song::Song;

const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Events emitted by the song watcher
#[derive(Debug, Clone)]
pub enum SongEvent {
    /// The file changed and parsed cleanly
    Reloaded(Box<Song>),
    /// The file changed but could not be loaded
    Error(String),
}

/// Song file watcher with debouncing
pub struct SongWatcher {
    _watcher: RecommendedWatcher,
    event_receiver: Receiver<SongEvent>,
    watched_path: PathBuf,
}

impl SongWatcher {
    /// Watch `path` and reload it `debounce_ms` (default 500) after the
    /// last change.
    pub fn new<P: AsRef<Path>>(path: P, debounce_ms: Option<u64>) -> Result<Self> {
        Self::with_callback(path, debounce_ms, |_| {})
    }

    /// Like `new`, additionally invoking `forward` on the debounce thread
    /// for every event
    pub fn with_callback<P, F>(path: P, debounce_ms: Option<u64>, forward: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&SongEvent) + Send + 'static,
    {
        let watched_path = path.as_ref().to_path_buf();
        let debounce = Duration::from_millis(debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS));
        let dir = watched_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let file_name = watched_path
            .file_name()
            .ok_or_else(|| anyhow!("Not a file path: {:?}", watched_path))?
            .to_os_string();

        let (event_tx, event_rx): (Sender<SongEvent>, Receiver<SongEvent>) = mpsc::channel();
        let (notify_tx, notify_rx): (Sender<Event>, Receiver<Event>) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    let _ = notify_tx.send(event);
                }
                Err(e) => warn!("file watch error: {}", e),
            },
            Config::default(),
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {}", e))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| anyhow!("Failed to watch path {:?}: {}", dir, e))?;

        let song_path = watched_path.clone();
        std::thread::Builder::new()
            .name("jamm-watch".to_string())
            .spawn(move || {
                let mut last_change: Option<Instant> = None;

                loop {
                    match notify_rx.recv_timeout(Duration::from_millis(50)) {
                        Ok(event) => {
                            let relevant = matches!(
                                event.kind,
                                EventKind::Create(_) | EventKind::Modify(_)
                            ) && event
                                .paths
                                .iter()
                                .any(|p| p.file_name() == Some(file_name.as_os_str()));
                            if relevant {
                                last_change = Some(Instant::now());
                            }
                        }
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }

                    let Some(changed) = last_change else {
                        continue;
                    };
                    if changed.elapsed() < debounce {
                        continue;
                    }
                    last_change = None;

                    let event = match Song::load(&song_path) {
                        Ok(song) => {
                            info!(path = ?song_path, "song reloaded");
                            SongEvent::Reloaded(Box::new(song))
                        }
                        Err(e) => {
                            warn!("song reload failed: {}", e);
                            SongEvent::Error(e.to_string())
                        }
                    };
                    forward(&event);
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
                debug!("song watcher exiting");
            })
            .map_err(|e| anyhow!("Failed to spawn watcher thread: {}", e))?;

        Ok(Self {
            _watcher: watcher,
            event_receiver: event_rx,
            watched_path,
        })
    }

    /// Try to receive the next event (non-blocking)
    pub fn try_recv(&self) -> Option<SongEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Receive all pending events
    pub fn recv_all(&self) -> Vec<SongEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SongEvent> {
        self.event_receiver.recv_timeout(timeout).ok()
    }

    /// Get the path being watched
    pub fn watched_path(&self) -> &Path {
        &self.watched_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SONG: &str = r#"
id: watch-test
title: "Initial"
tempo_bpm: 100
chord_progression:
  sections:
    - name: Verse
      chords:
        - { chord: C, beats: 4 }
"#;

    #[test]
    fn test_watcher_creation() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("watch_test.yaml");
        fs::write(&file_path, SONG).unwrap();

        let watcher = SongWatcher::new(&file_path, Some(100)).unwrap();
        assert_eq!(watcher.watched_path(), file_path.as_path());
        assert!(watcher.recv_all().is_empty());
    }

    #[test]
    fn test_watcher_rejects_directory_root() {
        assert!(SongWatcher::new("/", Some(100)).is_err());
    }

    #[test]
    fn test_watcher_detects_changes() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("detect_test.yaml");
        fs::write(&file_path, SONG).unwrap();

        let watcher = SongWatcher::new(&file_path, Some(100)).unwrap();
        std::thread::sleep(Duration::from_millis(50));

        fs::write(&file_path, SONG.replace("Initial", "Modified")).unwrap();

        // File events may not be delivered in every CI sandbox, so only
        // the contents of a delivered event are checked
        if let Some(SongEvent::Reloaded(song)) = watcher.recv_timeout(Duration::from_secs(2)) {
            assert_eq!(song.title, "Modified");
        }
    }

    #[test]
    fn test_watcher_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("broken.yaml");
        fs::write(&file_path, SONG).unwrap();

        let watcher = SongWatcher::new(&file_path, Some(100)).unwrap();
        std::thread::sleep(Duration::from_millis(50));

        fs::write(&file_path, "title: [").unwrap();

        if let Some(event) = watcher.recv_timeout(Duration::from_secs(2)) {
            assert!(matches!(event, SongEvent::Error(_)));
        }
    }
}

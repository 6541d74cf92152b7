// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song repository backed by a directory of YAML charts.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{Difficulty, Song, SongError};

/// Maximum number of search results
pub const SEARCH_LIMIT: usize = 50;

/// Source of songs for the practice session
pub trait SongRepository {
    /// Fetch one song by id
    fn fetch_by_id(&self, id: &str) -> Result<Song, SongError>;

    /// Songs whose title or artist contains `text`, case-insensitive, sorted by title
    fn search(&self, text: &str) -> Vec<Song>;
}

/// In-memory song collection, usually loaded from a directory
#[derive(Debug, Clone, Default)]
pub struct SongLibrary {
    songs: Vec<Song>,
    /// File each song was loaded from, by id
    sources: HashMap<String, PathBuf>,
}

impl SongLibrary {
    /// Build a library from songs already in memory
    pub fn from_songs(mut songs: Vec<Song>) -> Self {
        songs.sort_by(|a, b| a.title.cmp(&b.title));
        Self {
            songs,
            sources: HashMap::new(),
        }
    }

    /// Load every `.yaml`/`.yml` file in a directory.
    ///
    /// Files that fail to parse are logged and skipped.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, SongError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| SongError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut songs = Vec::new();
        let mut sources = HashMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yaml" || e == "yml")
                .unwrap_or(false);
            if !is_yaml {
                continue;
            }

            match Song::load(&path) {
                Ok(song) => {
                    for (section, chord) in song.integrity_faults() {
                        warn!(
                            song = %song.id,
                            section,
                            chord,
                            "chord has zero beats; playback will stall on it"
                        );
                    }
                    sources.insert(song.id.clone(), path.clone());
                    songs.push(song);
                }
                Err(e) => warn!("skipping {}: {}", path.display(), e),
            }
        }

        info!("loaded {} songs from {}", songs.len(), dir.display());
        let mut library = Self::from_songs(songs);
        library.sources = sources;
        Ok(library)
    }

    /// File a song was loaded from, when it came from disk
    pub fn source_path(&self, id: &str) -> Option<&Path> {
        self.sources.get(id).map(PathBuf::as_path)
    }

    /// All songs, sorted by title
    pub fn all(&self) -> &[Song] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn by_genre(&self, genre: &str) -> Vec<Song> {
        self.songs
            .iter()
            .filter(|s| s.genre.as_deref() == Some(genre))
            .cloned()
            .collect()
    }

    pub fn by_difficulty(&self, difficulty: Difficulty) -> Vec<Song> {
        self.songs
            .iter()
            .filter(|s| s.difficulty == difficulty)
            .cloned()
            .collect()
    }
}

impl SongRepository for SongLibrary {
    fn fetch_by_id(&self, id: &str) -> Result<Song, SongError> {
        self.songs
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| SongError::NotFound(id.to_string()))
    }

    fn search(&self, text: &str) -> Vec<Song> {
        let needle = text.trim().to_lowercase();
        self.songs
            .iter()
            .filter(|s| {
                s.title.to_lowercase().contains(&needle) || s.artist.to_lowercase().contains(&needle)
            })
            .take(SEARCH_LIMIT)
            .cloned()
            .collect()
    }
}

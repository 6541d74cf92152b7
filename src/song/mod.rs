// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song data model.
//!
//! A song is a list of named sections, each a list of chords with a beat
//! duration. Songs are stored as YAML and never mutated once loaded.

pub mod library;

pub use library::{SongLibrary, SongRepository, SEARCH_LIMIT};

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Song repository and file errors
#[derive(Debug, thiserror::Error)]
pub enum SongError {
    /// No song with this id
    #[error("song not found: {0}")]
    NotFound(String),
    /// File could not be read or written
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// File is not a valid song document
    #[error("failed to parse song {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Difficulty rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "beginner"),
            Difficulty::Intermediate => write!(f, "intermediate"),
            Difficulty::Advanced => write!(f, "advanced"),
        }
    }
}

/// A chord held for a number of beats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordInstance {
    /// Chord symbol, e.g. "Dm7"
    pub chord: String,
    /// Duration in beats, must be at least 1
    pub beats: u32,
}

impl ChordInstance {
    pub fn new(chord: impl Into<String>, beats: u32) -> Self {
        Self {
            chord: chord.into(),
            beats,
        }
    }
}

/// A named part of the song ("Verse", "Chorus")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    #[serde(default)]
    pub chords: Vec<ChordInstance>,
}

impl Section {
    pub fn new(name: impl Into<String>, chords: Vec<ChordInstance>) -> Self {
        Self {
            name: name.into(),
            chords,
        }
    }

    /// Sum of all chord durations
    pub fn total_beats(&self) -> u64 {
        self.chords.iter().map(|c| c.beats as u64).sum()
    }
}

/// Sections in playback order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChordProgression {
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl ChordProgression {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// Total number of chords across all sections
    pub fn chord_count(&self) -> usize {
        self.sections.iter().map(|s| s.chords.len()).sum()
    }

    /// Every chord in playback order, paired with its section name
    pub fn flattened(&self) -> impl Iterator<Item = (&str, &ChordInstance)> + '_ {
        self.sections
            .iter()
            .flat_map(|s| s.chords.iter().map(move |c| (s.name.as_str(), c)))
    }
}

/// A song chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Library id; defaults to the file stem when absent
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default = "default_key")]
    pub original_key: String,
    #[serde(default = "default_tempo")]
    pub tempo_bpm: u16,
    #[serde(default = "default_time_signature")]
    pub time_signature: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub chord_progression: ChordProgression,
}

fn default_key() -> String {
    "C".to_string()
}
fn default_tempo() -> u16 {
    120
}
fn default_time_signature() -> String {
    "4/4".to_string()
}

impl Song {
    /// Load a song from a YAML file, using the file stem as id if none is given
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SongError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SongError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut song: Song = serde_yaml::from_str(&contents).map_err(|source| SongError::Parse {
            origin: path.display().to_string(),
            source,
        })?;
        if song.id.is_empty() {
            song.id = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(song)
    }

    /// Parse a song from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, SongError> {
        serde_yaml::from_str(yaml).map_err(|source| SongError::Parse {
            origin: "<string>".to_string(),
            source,
        })
    }

    /// Serialize to a YAML string
    pub fn to_yaml(&self) -> Result<String, SongError> {
        serde_yaml::to_string(self).map_err(|source| SongError::Parse {
            origin: self.id.clone(),
            source,
        })
    }

    /// Save to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SongError> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml).map_err(|source| SongError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })
    }

    pub fn sections(&self) -> &[Section] {
        &self.chord_progression.sections
    }

    /// Positions `(section, chord)` of chords with a zero beat count
    pub fn integrity_faults(&self) -> Vec<(usize, usize)> {
        self.sections()
            .iter()
            .enumerate()
            .flat_map(|(si, s)| {
                s.chords
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.beats < 1)
                    .map(move |(ci, _)| (si, ci))
            })
            .collect()
    }
}

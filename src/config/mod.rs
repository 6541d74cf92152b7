// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for JAMM.
//!
//! This module provides the application settings file (`jamm.toml`) and
//! the watcher that hot-reloads the song being practised.

pub mod watcher;

pub use watcher::{SongEvent, SongWatcher};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{warn, Level};

use crate::audio::SoundAsset;
use crate::metronome::SchedulerConfig;
use crate::music::Instrument;
use crate::playback::{DEFAULT_SOUND, DEFAULT_VOLUME};

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "jamm.toml";

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Directory of song YAML files
    #[serde(default = "default_library_dir")]
    pub library_dir: PathBuf,
    /// Log output; the terminal is owned by the UI
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    /// One of trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Metronome and output settings
    #[serde(default)]
    pub audio: AudioSettings,
    /// Settings a new session starts with
    #[serde(default)]
    pub defaults: SessionDefaults,
}

fn default_library_dir() -> PathBuf {
    PathBuf::from("songs")
}
fn default_log_file() -> PathBuf {
    PathBuf::from("jamm.log")
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            library_dir: default_library_dir(),
            log_file: default_log_file(),
            log_level: default_log_level(),
            audio: AudioSettings::default(),
            defaults: SessionDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Invalid config file: {:?}", path.as_ref()))
    }

    /// Load `path`, or `jamm.toml` when `None`. A missing file yields the
    /// defaults; an unreadable or invalid one is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).context("Failed to parse TOML configuration")
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = self.to_toml()?;
        fs::write(path.as_ref(), contents)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Parsed `log_level`, falling back to info
    pub fn log_level(&self) -> Level {
        self.log_level.parse().unwrap_or_else(|_| {
            warn!(level = %self.log_level, "unknown log level, using info");
            Level::INFO
        })
    }

    /// Names in the order `CycleSound` visits them
    pub fn sound_names(&self) -> Vec<String> {
        self.audio.sounds().into_iter().map(|s| s.name).collect()
    }

    /// Scheduler settings; relative sample paths resolve against `base`
    pub fn scheduler_config(&self, base: &Path) -> SchedulerConfig {
        let sounds: Vec<SoundAsset> = self
            .audio
            .sounds()
            .into_iter()
            .map(|mut asset| {
                if let Some(path) = asset.path.as_mut() {
                    if path.is_relative() {
                        *path = base.join(&*path);
                    }
                }
                asset
            })
            .collect();

        let initial_sound = if sounds.iter().any(|s| s.name == self.defaults.sound) {
            self.defaults.sound.clone()
        } else {
            warn!(sound = %self.defaults.sound, "default sound is not configured");
            sounds
                .first()
                .map(|s| s.name.clone())
                .unwrap_or_else(|| DEFAULT_SOUND.to_string())
        };

        SchedulerConfig {
            lookahead: Duration::from_millis(self.audio.lookahead_ms),
            render_lead: Duration::from_millis(self.audio.render_lead_ms),
            sounds,
            initial_sound,
        }
    }
}

/// Audio settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioSettings {
    /// How early a beat's audio is queued
    #[serde(default = "default_lookahead_ms")]
    pub lookahead_ms: u64,
    /// How early the beat callback runs, at most `lookahead_ms`
    #[serde(default = "default_render_lead_ms")]
    pub render_lead_ms: u64,
    /// Output buffer size in frames; device default when absent
    #[serde(default)]
    pub buffer_frames: Option<u32>,
    /// Selectable metronome sounds
    #[serde(default)]
    pub sounds: Vec<SoundAsset>,
}

fn default_lookahead_ms() -> u64 {
    100
}
fn default_render_lead_ms() -> u64 {
    10
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            lookahead_ms: default_lookahead_ms(),
            render_lead_ms: default_render_lead_ms(),
            buffer_frames: None,
            sounds: Vec::new(),
        }
    }
}

impl AudioSettings {
    /// Configured sounds, with the built-in click first unless a sound of
    /// that name is configured
    pub fn sounds(&self) -> Vec<SoundAsset> {
        let mut sounds = Vec::with_capacity(self.sounds.len() + 1);
        if !self.sounds.iter().any(|s| s.name == DEFAULT_SOUND) {
            sounds.push(SoundAsset::builtin(DEFAULT_SOUND));
        }
        sounds.extend(self.sounds.iter().cloned());
        sounds
    }
}

/// Initial session settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionDefaults {
    #[serde(default = "default_volume")]
    pub volume: u8,
    #[serde(default)]
    pub instrument: Instrument,
    #[serde(default = "default_sound")]
    pub sound: String,
}

fn default_volume() -> u8 {
    DEFAULT_VOLUME
}
fn default_sound() -> String {
    DEFAULT_SOUND.to_string()
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            instrument: Instrument::default(),
            sound: default_sound(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
library_dir = "/srv/songs"
log_level = "debug"

[audio]
lookahead_ms = 80
buffer_frames = 256

[[audio.sounds]]
name = "wood"
path = "sounds/wood.wav"
reference_bpm = 90
slice_count = 8

[defaults]
volume = 40
instrument = "guitar"
sound = "wood"
"#;

        let config = AppConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.library_dir, PathBuf::from("/srv/songs"));
        assert_eq!(config.log_level(), Level::DEBUG);
        assert_eq!(config.audio.lookahead_ms, 80);
        assert_eq!(config.audio.render_lead_ms, 10);
        assert_eq!(config.audio.buffer_frames, Some(256));
        assert_eq!(config.audio.sounds[0].slice_count, 8);
        assert_eq!(config.defaults.volume, 40);
        assert_eq!(config.defaults.instrument, Instrument::Guitar);
        assert_eq!(config.sound_names(), vec!["metronome", "wood"]);
    }

    #[test]
    fn test_default_values() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.library_dir, PathBuf::from("songs"));
        assert_eq!(config.log_level(), Level::INFO);
        assert_eq!(config.defaults.volume, 70);
        assert_eq!(config.defaults.sound, "metronome");
        assert_eq!(config.sound_names(), vec!["metronome"]);
    }

    #[test]
    fn test_unknown_log_level() {
        let config = AppConfig::from_toml("log_level = \"chatty\"").unwrap();
        assert_eq!(config.log_level(), Level::INFO);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(AppConfig::from_toml("library_dir = [").is_err());
        assert!(AppConfig::from_toml("[defaults]\nvolume = 300").is_err());
    }

    #[test]
    fn test_scheduler_config() {
        let toml_str = r#"
[audio]
lookahead_ms = 50
render_lead_ms = 5

[[audio.sounds]]
name = "wood"
path = "wood.wav"

[defaults]
sound = "wood"
"#;
        let config = AppConfig::from_toml(toml_str).unwrap();
        let scheduler = config.scheduler_config(Path::new("/etc/jamm"));
        assert_eq!(scheduler.lookahead, Duration::from_millis(50));
        assert_eq!(scheduler.render_lead, Duration::from_millis(5));
        assert_eq!(scheduler.initial_sound, "wood");
        assert_eq!(scheduler.sounds.len(), 2);
        assert_eq!(scheduler.sounds[0].path, None);
        assert_eq!(
            scheduler.sounds[1].path,
            Some(PathBuf::from("/etc/jamm/wood.wav"))
        );
    }

    #[test]
    fn test_unconfigured_default_sound() {
        let config = AppConfig::from_toml("[defaults]\nsound = \"cowbell\"").unwrap();
        let scheduler = config.scheduler_config(Path::new("."));
        assert_eq!(scheduler.initial_sound, "metronome");
    }

    #[test]
    fn test_round_trip_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jamm.toml");

        let mut config = AppConfig::default();
        config.defaults.volume = 55;
        config.audio.sounds.push(SoundAsset::builtin("soft"));
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let config = AppConfig::load_or_default(Some(&missing)).unwrap();
        assert_eq!(config, AppConfig::default());

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "log_level = ").unwrap();
        assert!(AppConfig::load_or_default(Some(&broken)).is_err());
    }
}

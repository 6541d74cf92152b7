// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio engine for the JAMM metronome.
//!
//! This module provides:
//! - The `AudioDevice` seam the beat scheduler plays through
//! - Sample loading and the built-in click loop
//! - A one-shot voice mixer and cpal output

pub mod mixer;
pub mod output;
pub mod sampler;

pub use mixer::Mixer;
pub use output::{AudioConfig, AudioOutput, CpalDevice};
pub use sampler::{SampleBuffer, SliceRotation};

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Fade applied to the tail of every slice
pub const SLICE_FADE_OUT: Duration = Duration::from_millis(10);

/// Attenuation at volume 1, in dB
const MIN_DB: f32 = -40.0;

/// Audio error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AudioError {
    /// Failed to initialize audio
    #[error("audio initialization failed: {0}")]
    InitFailed(String),
    /// No audio device available
    #[error("no audio device available")]
    NoDevice,
    /// Failed to build or start the output stream
    #[error("audio stream failed: {0}")]
    StreamFailed(String),
    /// A sample file could not be decoded
    #[error("failed to load sound {name:?}: {reason}")]
    SampleLoadFailed { name: String, reason: String },
    /// No sound with this name has been loaded
    #[error("unknown sound {0:?}")]
    UnknownSound(String),
    /// Failed to acquire lock
    #[error("failed to acquire audio lock")]
    LockFailed,
}

/// A named, sliceable sample loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundAsset {
    pub name: String,
    /// WAV file; the synthesized click loop is used when absent
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Tempo the loop was recorded at
    #[serde(default = "default_reference_bpm")]
    pub reference_bpm: f64,
    /// Number of beats in the loop
    #[serde(default = "default_slice_count")]
    pub slice_count: u32,
}

fn default_reference_bpm() -> f64 {
    100.0
}

fn default_slice_count() -> u32 {
    4
}

impl SoundAsset {
    /// The built-in metronome click
    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            reference_bpm: default_reference_bpm(),
            slice_count: default_slice_count(),
        }
    }
}

/// One slice of a loop, scheduled at an exact instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceRequest {
    /// When the slice should start sounding
    pub at: Instant,
    /// Start position within the loop
    pub offset: Duration,
    /// How much of the loop to play
    pub duration: Duration,
    /// Linear gain
    pub gain: f32,
    /// Fade at the end of the slice
    pub fade_out: Duration,
}

/// Output device used by the beat scheduler.
///
/// Implementations must accept requests scheduled slightly in the future
/// and start them on time.
pub trait AudioDevice: Send {
    /// Open the output; called once before anything is played
    fn start(&mut self) -> Result<(), AudioError>;

    /// Decode or synthesize a sound and keep it under its name
    fn load_sound(&mut self, asset: &SoundAsset) -> Result<(), AudioError>;

    /// Length of a loaded sound
    fn buffer_duration(&self, name: &str) -> Option<Duration>;

    /// Schedule one slice of a loaded sound
    fn play_slice(&mut self, name: &str, request: SliceRequest) -> Result<(), AudioError>;

    /// Drop every slice that has not started yet
    fn cancel_pending(&mut self);

    /// Close the output and free the sounds
    fn release(&mut self);
}

/// Device that accepts everything and plays nothing
#[derive(Debug, Default)]
pub struct NullDevice {
    sounds: HashMap<String, Duration>,
}

impl AudioDevice for NullDevice {
    fn start(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn load_sound(&mut self, asset: &SoundAsset) -> Result<(), AudioError> {
        let rotation = SliceRotation::new(asset.reference_bpm, asset.slice_count);
        let length = rotation.slice_duration() * asset.slice_count.max(1);
        self.sounds.insert(asset.name.clone(), length);
        Ok(())
    }

    fn buffer_duration(&self, name: &str) -> Option<Duration> {
        self.sounds.get(name).copied()
    }

    fn play_slice(&mut self, name: &str, _request: SliceRequest) -> Result<(), AudioError> {
        if self.sounds.contains_key(name) {
            Ok(())
        } else {
            Err(AudioError::UnknownSound(name.to_string()))
        }
    }

    fn cancel_pending(&mut self) {}

    fn release(&mut self) {
        self.sounds.clear();
    }
}

/// Map a 0-100 volume to decibels; `None` is silence
pub fn volume_to_db(volume: u8) -> Option<f32> {
    if volume == 0 {
        return None;
    }
    let v = volume.min(100) as f32;
    Some((v / 100.0) * -MIN_DB + MIN_DB)
}

/// Map a 0-100 volume to a linear gain
pub fn volume_to_gain(volume: u8) -> f32 {
    volume_to_db(volume)
        .map(|db| 10f32.powf(db / 20.0))
        .unwrap_or(0.0)
}

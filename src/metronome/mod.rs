// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Metronome module.
//!
//! The beat scheduler owns the audible click and is the single source of
//! "when is beat N". Listeners learn about beats through the beat callback.

pub mod scheduler;

pub use scheduler::{BeatCallback, BeatScheduler, SchedulerHandle};

use std::time::Duration;

use crate::audio::SoundAsset;
use crate::playback::DEFAULT_SOUND;

/// Scheduler lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetronomeError {
    /// The scheduler was disposed and cannot be restarted
    #[error("metronome has been disposed")]
    Disposed,
    /// The clock thread could not be created
    #[error("failed to spawn clock thread: {0}")]
    Spawn(String),
}

/// Configuration for the scheduler
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// How far ahead of the onset audio is handed to the device
    pub lookahead: Duration,
    /// How far ahead of the onset the beat callback runs
    pub render_lead: Duration,
    /// Sounds loaded on first start
    pub sounds: Vec<SoundAsset>,
    /// Sound selected initially
    pub initial_sound: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lookahead: Duration::from_millis(100),
            render_lead: Duration::from_millis(10),
            sounds: vec![SoundAsset::builtin(DEFAULT_SOUND)],
            initial_sound: DEFAULT_SOUND.to_string(),
        }
    }
}

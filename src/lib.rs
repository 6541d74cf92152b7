// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! JAMM - chord progression practice with a tempo-locked metronome.
//!
//! A song's chord chart is walked beat by beat by `playback::PlaybackState`,
//! driven by the `metronome::BeatScheduler` clock through a
//! `session::JamSession`, and drawn by the `ui` module.

pub mod audio;
pub mod config;
pub mod control;
pub mod metronome;
pub mod music;
pub mod playback;
pub mod session;
pub mod song;
pub mod timing;
pub mod ui;

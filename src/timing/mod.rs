// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing module.
//!
//! This module provides the beat clock used by the metronome scheduler.

pub mod clock;

pub use clock::{BeatClock, ClockState, MAX_BPM, MIN_BPM};

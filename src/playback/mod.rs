// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback state machine.
//!
//! `PlaybackState` holds the position within the loaded song and the user
//! settings. It is mutated only through its transitions; the UI reads it
//! through the functions in [`selectors`].

pub mod selectors;
pub mod state;

pub use selectors::{
    active_section_index, chord_grid, current_chord, current_section, highlighted_chord_index,
    tempo_label, upcoming_chords, visualized_chord, UpcomingChord, GRID_SIZE,
};
pub use state::{
    PlaybackMode, PlaybackPosition, PlaybackState, DEFAULT_SOUND, DEFAULT_TEMPO, DEFAULT_VOLUME,
    MAX_TEMPO, MAX_VOLUME, MIN_TEMPO, MIN_VOLUME,
};

/// State machine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// The current chord has no duration and cannot be advanced through
    #[error("chord {chord} of section {section} has invalid beat count {beats}")]
    DataIntegrity {
        section: usize,
        chord: usize,
        beats: u32,
    },
}

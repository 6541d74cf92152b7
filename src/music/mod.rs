// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory utilities for JAMM.
//!
//! This module provides pitch classes, chord symbol parsing and the
//! instrument layouts used by the visualizers. Everything here is pure.

pub mod chord;
pub mod instrument;
pub mod note;

pub use chord::{chord_notes_with_octave, is_note_in_chord, parse_chord, ParsedChord, Quality};
pub use instrument::{guitar_fingering, piano_keys, FretPosition, Instrument, PianoKey};
pub use note::Note;

/// Theory layer errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChordError {
    /// Symbol does not start with a recognizable root note
    #[error("invalid chord symbol: {0:?}")]
    InvalidSymbol(String),
    /// Not one of the twelve note spellings
    #[error("invalid note name: {0:?}")]
    InvalidNote(String),
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitch classes on the 12-tone chromatic scale.
//!
//! Notes parse from either sharp or flat spellings of the black keys but
//! always render with sharps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ChordError;

/// Note names (pitch classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Note {
    C,
    Cs, // C# / Db
    D,
    Ds, // D# / Eb
    E,
    F,
    Fs, // F# / Gb
    G,
    Gs, // G# / Ab
    A,
    As, // A# / Bb
    B,
}

/// Canonical sharp spelling, indexed by pitch class
const SHARP_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

impl Note {
    /// All notes in chromatic order
    pub const ALL: [Note; 12] = [
        Note::C,
        Note::Cs,
        Note::D,
        Note::Ds,
        Note::E,
        Note::F,
        Note::Fs,
        Note::G,
        Note::Gs,
        Note::A,
        Note::As,
        Note::B,
    ];

    /// Get the pitch class (0-11) for this note
    pub fn pitch_class(self) -> u8 {
        self as u8
    }

    /// Get note from pitch class, wrapping octaves
    pub fn from_pitch_class(pc: u8) -> Self {
        Note::ALL[(pc % 12) as usize]
    }

    /// Sharp spelling of this note
    pub fn name(self) -> &'static str {
        SHARP_NAMES[self.pitch_class() as usize]
    }

    /// Whether this is a black key on a keyboard
    pub fn is_black_key(self) -> bool {
        matches!(self, Note::Cs | Note::Ds | Note::Fs | Note::Gs | Note::As)
    }

    /// Move up by an interval in semitones
    pub fn transpose_up(self, semitones: u8) -> Self {
        Note::from_pitch_class(self.pitch_class() + semitones % 12)
    }

    /// Look up a note spelling, case sensitive ("C", "C#", "Db", ...)
    pub fn from_name(name: &str) -> Option<Self> {
        let note = match name {
            "C" => Note::C,
            "C#" | "Db" => Note::Cs,
            "D" => Note::D,
            "D#" | "Eb" => Note::Ds,
            "E" => Note::E,
            "F" => Note::F,
            "F#" | "Gb" => Note::Fs,
            "G" => Note::G,
            "G#" | "Ab" => Note::Gs,
            "A" => Note::A,
            "A#" | "Bb" => Note::As,
            "B" => Note::B,
            _ => return None,
        };
        Some(note)
    }
}

impl FromStr for Note {
    type Err = ChordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Note::from_name(s.trim()).ok_or_else(|| ChordError::InvalidNote(s.to_string()))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Instrument layouts for the chord visualizers.
//!
//! Maps a chord onto a piano key strip and onto common open guitar shapes.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::chord::{parse_chord, Quality};
use super::Note;

/// Instrument shown by the visualizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    #[default]
    Piano,
    Guitar,
}

impl Instrument {
    /// The other instrument
    pub fn toggled(self) -> Self {
        match self {
            Instrument::Piano => Instrument::Guitar,
            Instrument::Guitar => Instrument::Piano,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instrument::Piano => write!(f, "Piano"),
            Instrument::Guitar => write!(f, "Guitar"),
        }
    }
}

/// One key of the piano strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PianoKey {
    pub note: Note,
    pub octave: u8,
    pub is_black: bool,
    /// Whether the key's pitch class sounds in the chord
    pub is_active: bool,
}

/// Build a key strip of `octaves` octaves starting at C of `start_octave`.
///
/// Keys light up by pitch class, so every octave shows the chord.
/// An unparsable chord lights nothing.
pub fn piano_keys(symbol: Option<&str>, start_octave: u8, octaves: u8) -> Vec<PianoKey> {
    let chord = symbol.and_then(|s| match parse_chord(s) {
        Ok(chord) => Some(chord),
        Err(e) => {
            debug!("piano highlight degraded: {}", e);
            None
        }
    });

    (0..octaves)
        .flat_map(|o| Note::ALL.iter().map(move |&note| (note, start_octave + o)))
        .map(|(note, octave)| PianoKey {
            note,
            octave,
            is_black: note.is_black_key(),
            is_active: chord.as_ref().is_some_and(|c| c.contains(note)),
        })
        .collect()
}

/// A fretted position; string 1 is high E, string 6 is low E, fret 0 is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FretPosition {
    pub string: u8,
    pub fret: u8,
}

const fn pos(string: u8, fret: u8) -> FretPosition {
    FretPosition { string, fret }
}

/// Common open shapes
const CHORD_SHAPES: &[(&str, &[FretPosition])] = &[
    ("C", &[pos(5, 3), pos(4, 2), pos(2, 1)]),
    ("D", &[pos(4, 0), pos(3, 2), pos(2, 3), pos(1, 2)]),
    ("E", &[pos(5, 0), pos(4, 2), pos(3, 2), pos(2, 1)]),
    ("F", &[pos(6, 1), pos(5, 3), pos(4, 3), pos(3, 2), pos(2, 1), pos(1, 1)]),
    ("G", &[pos(6, 3), pos(5, 2), pos(1, 3)]),
    ("A", &[pos(4, 2), pos(3, 2), pos(2, 2)]),
    ("Am", &[pos(4, 2), pos(3, 2), pos(2, 1)]),
    ("Dm", &[pos(4, 0), pos(3, 2), pos(2, 3), pos(1, 1)]),
    ("Em", &[pos(5, 2), pos(4, 2)]),
    ("F#m", &[pos(6, 2), pos(5, 4), pos(4, 4), pos(3, 2), pos(2, 2), pos(1, 2)]),
];

/// Number of strings on the fretboard
pub const GUITAR_STRINGS: u8 = 6;

/// Number of frets drawn by the visualizer
pub const GUITAR_FRETS: u8 = 5;

fn shape(name: &str) -> Option<&'static [FretPosition]> {
    CHORD_SHAPES.iter().find(|(n, _)| *n == name).map(|(_, s)| *s)
}

/// Look up a fingering for a chord.
///
/// Exact symbol first, then the plain major/minor triad on the same root.
/// Empty when no shape is known.
pub fn guitar_fingering(symbol: &str) -> Vec<FretPosition> {
    let symbol = symbol.trim();
    if let Some(shape) = shape(symbol) {
        return shape.to_vec();
    }

    let chord = match parse_chord(symbol) {
        Ok(chord) => chord,
        Err(e) => {
            debug!("guitar fingering degraded: {}", e);
            return Vec::new();
        }
    };
    let simple = match chord.quality {
        Quality::Minor => format!("{}m", chord.root),
        _ => chord.root.to_string(),
    };
    shape(&simple).map(<[FretPosition]>::to_vec).unwrap_or_default()
}

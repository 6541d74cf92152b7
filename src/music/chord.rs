// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord symbol parsing.
//!
//! Turns lead-sheet chord symbols ("Cmaj7", "F#m", "A7sus4") into a root,
//! a quality, an optional extension token and the chord tones they imply.
//! Only root, third (or its sus replacement), fifth, seventh and ninth are
//! modeled; other tensions are accepted and ignored.

use std::fmt;

use tracing::debug;

use super::{ChordError, Note};

/// Intervals in semitones above the root
const MAJOR_THIRD: u8 = 4;
const MINOR_THIRD: u8 = 3;
const PERFECT_FOURTH: u8 = 5;
const MAJOR_SECOND: u8 = 2;
const PERFECT_FIFTH: u8 = 7;
const DIMINISHED_FIFTH: u8 = 6;
const AUGMENTED_FIFTH: u8 = 8;
const MINOR_SEVENTH: u8 = 10;
const MAJOR_SEVENTH: u8 = 11;
const NINTH: u8 = 14;

/// Triad quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    Major,
    Minor,
    Diminished,
    Augmented,
}

impl Quality {
    /// Lowercase name ("major", "minor", ...)
    pub fn name(self) -> &'static str {
        match self {
            Quality::Major => "major",
            Quality::Minor => "minor",
            Quality::Diminished => "diminished",
            Quality::Augmented => "augmented",
        }
    }

    fn third(self) -> u8 {
        match self {
            Quality::Major | Quality::Augmented => MAJOR_THIRD,
            Quality::Minor | Quality::Diminished => MINOR_THIRD,
        }
    }

    fn fifth(self) -> u8 {
        match self {
            Quality::Diminished => DIMINISHED_FIFTH,
            Quality::Augmented => AUGMENTED_FIFTH,
            Quality::Major | Quality::Minor => PERFECT_FIFTH,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A chord symbol broken into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChord {
    /// Root note
    pub root: Note,
    /// Triad quality
    pub quality: Quality,
    /// Whatever follows the quality marker ("7", "maj7", "sus4"), if anything
    pub extension: Option<String>,
    /// Semitones above the root: root, third, fifth, then seventh and ninth
    pub intervals: Vec<u8>,
    /// Chord tones in the same order as `intervals`
    pub notes: Vec<Note>,
}

impl ParsedChord {
    /// Chord tones rendered with sharp spelling
    pub fn note_names(&self) -> Vec<String> {
        self.notes.iter().map(|n| n.to_string()).collect()
    }

    /// Chord tones as pitch classes (0-11)
    pub fn pitch_classes(&self) -> Vec<u8> {
        self.notes.iter().map(|n| n.pitch_class()).collect()
    }

    /// Whether a pitch class sounds in this chord
    pub fn contains(&self, note: Note) -> bool {
        self.notes.contains(&note)
    }
}

/// Parse a chord symbol
pub fn parse_chord(symbol: &str) -> Result<ParsedChord, ChordError> {
    let symbol = symbol.trim();
    let (root, rest) = split_root(symbol).ok_or_else(|| ChordError::InvalidSymbol(symbol.to_string()))?;
    let (quality, extension) = split_quality(rest);
    let extension = if extension.is_empty() { None } else { Some(extension) };

    let intervals = chord_intervals(quality, extension.as_deref());
    let notes = intervals.iter().map(|&i| root.transpose_up(i)).collect();

    Ok(ParsedChord {
        root,
        quality,
        extension,
        intervals,
        notes,
    })
}

/// Check whether a note name belongs to a chord.
///
/// Unparsable chords or notes are reported as "not in chord".
pub fn is_note_in_chord(symbol: &str, note: &str) -> bool {
    let parsed = match parse_chord(symbol) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("chord lookup degraded: {}", e);
            return false;
        }
    };
    match note.parse::<Note>() {
        Ok(note) => parsed.contains(note),
        Err(e) => {
            debug!("chord lookup degraded: {}", e);
            false
        }
    }
}

/// Chord tones with octave numbers, stacked upwards from `start_octave`.
///
/// `"Am7"` at octave 4 gives `["A4", "C5", "E5", "G5"]`.
pub fn chord_notes_with_octave(symbol: &str, start_octave: u8) -> Vec<String> {
    let parsed = match parse_chord(symbol) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("octave voicing degraded: {}", e);
            return Vec::new();
        }
    };

    let mut octave = start_octave;
    let mut previous = parsed.root.pitch_class();
    parsed
        .notes
        .iter()
        .enumerate()
        .map(|(i, note)| {
            let pc = note.pitch_class();
            if i > 0 && pc < previous {
                octave += 1;
            }
            previous = pc;
            format!("{}{}", note, octave)
        })
        .collect()
}

/// Split off the root note ("F#" from "F#m7")
fn split_root(symbol: &str) -> Option<(Note, &str)> {
    let first = symbol.chars().next()?;
    if !('A'..='G').contains(&first) {
        return None;
    }
    let len = match symbol[1..].chars().next() {
        Some('#') | Some('b') => 2,
        _ => 1,
    };
    let root = Note::from_name(&symbol[..len])?;
    Some((root, &symbol[len..]))
}

/// Detect the quality marker and return what remains as the extension.
///
/// Precedence: minor, diminished, augmented, explicit major, default major.
fn split_quality(rest: &str) -> (Quality, String) {
    if rest.starts_with('m') && !rest[1..].starts_with("aj") {
        (Quality::Minor, rest[1..].to_string())
    } else if rest.starts_with("dim") || rest.contains('°') {
        (Quality::Diminished, strip_leftmost(rest, &["dim", "°"]))
    } else if rest.starts_with("aug") || rest.contains('+') {
        (Quality::Augmented, strip_leftmost(rest, &["aug", "+"]))
    } else if rest.starts_with("maj") || rest.starts_with('M') {
        let marker = if rest.starts_with("maj") { 3 } else { 1 };
        // "maj7", "M7", "maj9" keep the marker: it belongs to the seventh
        if rest[marker..].starts_with(|c: char| c.is_ascii_digit()) {
            (Quality::Major, rest.to_string())
        } else {
            (Quality::Major, rest[marker..].to_string())
        }
    } else {
        (Quality::Major, rest.to_string())
    }
}

/// Remove the leftmost occurrence of any marker
fn strip_leftmost(s: &str, markers: &[&str]) -> String {
    let hit = markers
        .iter()
        .filter_map(|m| s.find(m).map(|at| (at, m.len())))
        .min_by_key(|&(at, _)| at);
    match hit {
        Some((at, len)) => format!("{}{}", &s[..at], &s[at + len..]),
        None => s.to_string(),
    }
}

fn chord_intervals(quality: Quality, extension: Option<&str>) -> Vec<u8> {
    let mut intervals = vec![0, quality.third(), quality.fifth()];

    if let Some(ext) = extension {
        if ext.contains('7') {
            if ext.contains("maj7") || ext.contains("M7") {
                intervals.push(MAJOR_SEVENTH);
            } else {
                intervals.push(MINOR_SEVENTH);
            }
        }

        if ext.contains("sus4") {
            intervals[1] = PERFECT_FOURTH;
        } else if ext.contains("sus2") {
            intervals[1] = MAJOR_SECOND;
        }

        // Ninths stack on top of whatever is already there
        if ext.contains('9') {
            intervals.push(NINTH);
        }
    }

    intervals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(symbol: &str) -> Vec<String> {
        parse_chord(symbol).unwrap().note_names()
    }

    #[test]
    fn test_major_triad() {
        let chord = parse_chord("C").unwrap();
        assert_eq!(chord.root, Note::C);
        assert_eq!(chord.quality, Quality::Major);
        assert_eq!(chord.extension, None);
        assert_eq!(chord.note_names(), vec!["C", "E", "G"]);
    }

    #[test]
    fn test_sharp_minor() {
        let chord = parse_chord("F#m").unwrap();
        assert_eq!(chord.root.to_string(), "F#");
        assert_eq!(chord.quality.name(), "minor");
        assert_eq!(chord.note_names(), vec!["F#", "A", "C#"]);
    }

    #[test]
    fn test_flat_root_renders_sharp() {
        let chord = parse_chord("Bbm").unwrap();
        assert_eq!(chord.root, Note::As);
        assert_eq!(chord.note_names(), vec!["A#", "C#", "F"]);
        assert_eq!(names("Eb7"), vec!["D#", "G", "A#", "C#"]);
    }

    #[test]
    fn test_sus4_with_seventh() {
        assert_eq!(names("A7sus4"), vec!["A", "D", "E", "G"]);
        assert_eq!(names("Dsus2"), vec!["D", "E", "A"]);
    }

    #[test]
    fn test_sevenths() {
        assert_eq!(names("G7"), vec!["G", "B", "D", "F"]);
        assert_eq!(names("Cmaj7"), vec!["C", "E", "G", "B"]);
        assert_eq!(names("CM7"), vec!["C", "E", "G", "B"]);
        assert_eq!(names("Am7"), vec!["A", "C", "E", "G"]);
        assert_eq!(names("Cm(maj7)"), vec!["C", "D#", "G", "B"]);
    }

    #[test]
    fn test_explicit_major_extension() {
        let chord = parse_chord("Cmaj7").unwrap();
        assert_eq!(chord.quality, Quality::Major);
        assert_eq!(chord.extension.as_deref(), Some("maj7"));

        let bare = parse_chord("Cmaj").unwrap();
        assert_eq!(bare.extension, None);
        assert_eq!(bare.note_names(), vec!["C", "E", "G"]);
    }

    #[test]
    fn test_diminished_and_augmented() {
        assert_eq!(names("Bdim"), vec!["B", "D", "F"]);
        assert_eq!(names("B°"), vec!["B", "D", "F"]);
        assert_eq!(names("Caug"), vec!["C", "E", "G#"]);
        assert_eq!(names("C+"), vec!["C", "E", "G#"]);

        let dim7 = parse_chord("Cdim7").unwrap();
        assert_eq!(dim7.quality, Quality::Diminished);
        assert_eq!(dim7.extension.as_deref(), Some("7"));
    }

    #[test]
    fn test_minor_precedes_major_marker() {
        // "m" followed by "aj" is a major marker, not minor
        assert_eq!(parse_chord("Dmaj7").unwrap().quality, Quality::Major);
        assert_eq!(parse_chord("Dmin7").unwrap().quality, Quality::Minor);
        assert_eq!(parse_chord("Dm7b5").unwrap().quality, Quality::Minor);
    }

    #[test]
    fn test_ninth_stacks() {
        let chord = parse_chord("G7b9").unwrap();
        assert_eq!(chord.intervals, vec![0, 4, 7, 10, 14]);
        assert_eq!(chord.note_names(), vec!["G", "B", "D", "F", "A"]);

        // A ninth without a seventh only adds the ninth
        assert_eq!(names("Cadd9"), vec!["C", "E", "G", "D"]);
    }

    #[test]
    fn test_cardinality() {
        let triads = ["C", "Dm", "Ebdim", "F#aug", "Gsus4", "Asus2", "Bbmaj"];
        let tetrads = ["C7", "Dm7", "Ebmaj7", "F#m7b5", "G7sus4", "AM7"];
        let pentads = ["C7add9", "Dm7(9)", "Ebmaj7/9", "G7b9", "A7sus2add9"];

        for symbol in triads {
            assert_eq!(parse_chord(symbol).unwrap().notes.len(), 3, "{}", symbol);
        }
        for symbol in tetrads {
            assert_eq!(parse_chord(symbol).unwrap().notes.len(), 4, "{}", symbol);
        }
        for symbol in pentads {
            assert_eq!(parse_chord(symbol).unwrap().notes.len(), 5, "{}", symbol);
        }
    }

    #[test]
    fn test_pitch_classes_in_range_and_stable() {
        let roots = ["C", "C#", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B"];
        let suffixes = ["", "m", "dim", "aug", "maj7", "m7", "7", "sus4", "sus2", "9", "7b9", "m9"];

        for root in roots {
            for suffix in suffixes {
                let symbol = format!("{}{}", root, suffix);
                let chord = parse_chord(&symbol).unwrap();
                assert_eq!(chord.notes[0], chord.root);
                for (note, pc) in chord.notes.iter().zip(chord.pitch_classes()) {
                    assert!(pc < 12);
                    let again: Note = note.name().parse().unwrap();
                    assert_eq!(again, *note);
                    assert_eq!(again.pitch_class(), pc);
                }
            }
        }
    }

    #[test]
    fn test_invalid_symbols() {
        assert!(matches!(parse_chord(""), Err(ChordError::InvalidSymbol(_))));
        assert!(matches!(parse_chord("H7"), Err(ChordError::InvalidSymbol(_))));
        assert!(matches!(parse_chord("am"), Err(ChordError::InvalidSymbol(_))));
        assert!(matches!(parse_chord("Cb"), Err(ChordError::InvalidSymbol(_))));
        assert!(matches!(parse_chord("N.C."), Err(ChordError::InvalidSymbol(_))));
    }

    #[test]
    fn test_whitespace_trimmed() {
        assert_eq!(names("  Am "), vec!["A", "C", "E"]);
    }

    #[test]
    fn test_is_note_in_chord() {
        assert!(is_note_in_chord("Cmaj7", "B"));
        assert!(!is_note_in_chord("Cmaj7", "D"));
        assert!(is_note_in_chord("Bb", "D"));
        // Enharmonic spelling of the query note
        assert!(is_note_in_chord("E", "Ab"));
    }

    #[test]
    fn test_is_note_in_chord_degrades() {
        assert!(!is_note_in_chord("Xyz", "C"));
        assert!(!is_note_in_chord("C", "Q"));
    }

    #[test]
    fn test_notes_with_octave() {
        assert_eq!(chord_notes_with_octave("C", 4), vec!["C4", "E4", "G4"]);
        assert_eq!(chord_notes_with_octave("Am7", 4), vec!["A4", "C5", "E5", "G5"]);
        assert_eq!(chord_notes_with_octave("G7b9", 3), vec!["G3", "B3", "D4", "F4", "A4"]);
        assert!(chord_notes_with_octave("?", 4).is_empty());
    }
}

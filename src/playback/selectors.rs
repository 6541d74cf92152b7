// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Read-only projections of `PlaybackState` for the views.

use super::state::{PlaybackMode, PlaybackState};
use crate::song::{ChordInstance, Section};

/// Number of chords shown in the chord grid
pub const GRID_SIZE: usize = 4;

/// A chord coming up after the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpcomingChord<'a> {
    pub chord: &'a str,
    pub section_name: &'a str,
}

fn following_clock(state: &PlaybackState) -> bool {
    state.mode() == PlaybackMode::Auto && state.is_playing()
}

/// Section the views should emphasize
pub fn active_section_index(state: &PlaybackState) -> Option<usize> {
    state.song()?;
    let live = state.position().section;
    Some(match state.mode() {
        PlaybackMode::Auto => live,
        PlaybackMode::Manual => state.selected_section().unwrap_or(live),
    })
}

pub fn current_section(state: &PlaybackState) -> Option<&Section> {
    state.song()?.sections().get(state.position().section)
}

pub fn current_chord(state: &PlaybackState) -> Option<&ChordInstance> {
    current_section(state)?.chords.get(state.position().chord)
}

/// The next `count` chords after the current one, looping over the song
pub fn upcoming_chords(state: &PlaybackState, count: usize) -> Vec<UpcomingChord<'_>> {
    let Some(song) = state.song() else {
        return Vec::new();
    };
    let all: Vec<UpcomingChord<'_>> = song
        .chord_progression
        .flattened()
        .map(|(section_name, c)| UpcomingChord {
            chord: c.chord.as_str(),
            section_name,
        })
        .collect();
    if all.is_empty() {
        return Vec::new();
    }

    let position = state.position();
    let current: usize = song
        .sections()
        .iter()
        .take(position.section)
        .map(|s| s.chords.len())
        .sum::<usize>()
        + position.chord;

    (1..=count).map(|i| all[(current + i) % all.len()]).collect()
}

/// Window of chords from the active section shown in the grid.
///
/// While the clock drives playback the window pages along with the
/// current chord; otherwise it shows the section's first chords.
/// Slots past the end of the section are `None`.
pub fn chord_grid(state: &PlaybackState) -> Vec<Option<&str>> {
    let section = active_section_index(state)
        .and_then(|i| state.song().and_then(|s| s.sections().get(i)));
    let Some(section) = section else {
        return Vec::new();
    };

    let start = if following_clock(state) {
        (state.position().chord / GRID_SIZE) * GRID_SIZE
    } else {
        0
    };
    (start..start + GRID_SIZE)
        .map(|i| section.chords.get(i).map(|c| c.chord.as_str()))
        .collect()
}

/// Grid slot of the chord currently sounding, only while the clock drives playback
pub fn highlighted_chord_index(state: &PlaybackState) -> Option<usize> {
    state.song()?;
    following_clock(state).then(|| state.position().chord % GRID_SIZE)
}

/// Chord the instrument view should draw
pub fn visualized_chord(state: &PlaybackState) -> Option<&str> {
    let current = current_chord(state).map(|c| c.chord.as_str());
    if state.is_playing() {
        current
    } else {
        state.visualizer_chord().or(current)
    }
}

/// Descriptive name for a tempo
pub fn tempo_label(bpm: f64) -> &'static str {
    match bpm {
        b if b < 60.0 => "Very Slow",
        b if b < 80.0 => "Slow",
        b if b < 108.0 => "Moderate",
        b if b < 120.0 => "Medium",
        b if b < 140.0 => "Fast",
        b if b < 168.0 => "Very Fast",
        _ => "Presto",
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Position and settings of a practice session.

use tracing::{debug, error, warn};

use super::PlaybackError;
use crate::music::Instrument;
use crate::song::{Section, Song};

pub const MIN_TEMPO: f64 = 40.0;
pub const MAX_TEMPO: f64 = 240.0;
pub const DEFAULT_TEMPO: f64 = 120.0;

pub const MIN_VOLUME: u8 = 0;
pub const MAX_VOLUME: u8 = 100;
pub const DEFAULT_VOLUME: u8 = 70;

/// Sound selected on first launch and after unload
pub const DEFAULT_SOUND: &str = "metronome";

/// Who drives the position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    /// The user picks sections; the position does not follow the clock
    #[default]
    Manual,
    /// The beat clock advances the position
    Auto,
}

/// `(section, chord, beat)` within the loaded song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlaybackPosition {
    pub section: usize,
    pub chord: usize,
    pub beat: u32,
}

impl PlaybackPosition {
    pub const START: Self = Self::new(0, 0, 0);

    pub const fn new(section: usize, chord: usize, beat: u32) -> Self {
        Self {
            section,
            chord,
            beat,
        }
    }
}

/// Everything the session knows about playback
#[derive(Debug, Clone)]
pub struct PlaybackState {
    song: Option<Song>,
    position: PlaybackPosition,
    mode: PlaybackMode,
    selected_section: Option<usize>,
    playing: bool,
    tempo: f64,
    volume: u8,
    muted: bool,
    instrument: Instrument,
    metronome_sound: String,
    visualizer_chord: Option<String>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackState {
    /// Empty state with default settings
    pub fn new() -> Self {
        Self {
            song: None,
            position: PlaybackPosition::START,
            mode: PlaybackMode::Manual,
            selected_section: None,
            playing: false,
            tempo: DEFAULT_TEMPO,
            volume: DEFAULT_VOLUME,
            muted: false,
            instrument: Instrument::default(),
            metronome_sound: DEFAULT_SOUND.to_string(),
            visualizer_chord: None,
        }
    }

    // ----- reads -----

    pub fn song(&self) -> Option<&Song> {
        self.song.as_ref()
    }

    pub fn position(&self) -> PlaybackPosition {
        self.position
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn selected_section(&self) -> Option<usize> {
        self.selected_section
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn metronome_sound(&self) -> &str {
        &self.metronome_sound
    }

    /// Chord picked for the visualizer while stopped
    pub fn visualizer_chord(&self) -> Option<&str> {
        self.visualizer_chord.as_deref()
    }

    // ----- transitions -----

    /// Load a song and rewind to its start in manual mode
    pub fn load_song(&mut self, song: Song) {
        self.tempo = (song.tempo_bpm as f64).clamp(MIN_TEMPO, MAX_TEMPO);
        self.song = Some(song);
        self.rewind();
        self.playing = false;
        self.visualizer_chord = None;
    }

    /// Drop the song and restore every default
    pub fn unload(&mut self) {
        *self = Self::new();
    }

    /// Start following the clock, from the selected section if there is one
    pub fn play(&mut self) {
        if self.song.is_none() {
            return;
        }
        self.playing = true;
        self.mode = PlaybackMode::Auto;
        if let Some(section) = self.selected_section.take() {
            self.position = self.first_chord_from(section);
        }
    }

    pub fn pause(&mut self) {
        if self.song.is_none() {
            return;
        }
        self.playing = false;
    }

    /// Halt and rewind to the first section
    pub fn stop(&mut self) {
        if self.song.is_none() {
            return;
        }
        self.playing = false;
        self.rewind();
    }

    /// Manual mode at the first chord that will sound
    fn rewind(&mut self) {
        self.position = self.first_chord_from(0);
        self.mode = PlaybackMode::Manual;
        self.selected_section = Some(self.position.section);
    }

    /// First chord of the first non-empty section at or after `section`,
    /// wrapping to the song start. `START` when the song has no chords.
    fn first_chord_from(&self, section: usize) -> PlaybackPosition {
        let Some(song) = &self.song else {
            return PlaybackPosition::START;
        };
        let sections = song.sections();
        first_playable(sections, section)
            .or_else(|| first_playable(sections, 0))
            .map(|i| PlaybackPosition::new(i, 0, 0))
            .unwrap_or(PlaybackPosition::START)
    }

    /// Advance one beat.
    ///
    /// A chord with a zero beat count is reported and leaves the position
    /// where it is.
    pub fn advance_beat(&mut self) -> Result<(), PlaybackError> {
        let Some(song) = &self.song else {
            return Ok(());
        };
        let PlaybackPosition {
            section,
            chord,
            beat,
        } = self.position;
        let Some(current) = song.sections().get(section) else {
            return Ok(());
        };

        let Some(instance) = current.chords.get(chord) else {
            self.advance_chord();
            return Ok(());
        };

        if instance.beats < 1 {
            error!(
                section,
                chord,
                beats = instance.beats,
                "invalid chord beats value, not advancing"
            );
            return Err(PlaybackError::DataIntegrity {
                section,
                chord,
                beats: instance.beats,
            });
        }

        let next = beat + 1;
        if next >= instance.beats {
            self.advance_chord();
        } else {
            self.position.beat = next;
        }
        Ok(())
    }

    /// Move to the next chord, looping to the start after the last one
    pub fn advance_chord(&mut self) {
        let Some(song) = &self.song else {
            return;
        };
        let sections = song.sections();
        let PlaybackPosition { section, chord, .. } = self.position;

        if let Some(current) = sections.get(section) {
            if chord + 1 < current.chords.len() {
                self.position = PlaybackPosition::new(section, chord + 1, 0);
                return;
            }
        }

        let next_section = match first_playable(sections, section + 1) {
            Some(i) => i,
            None => {
                debug!("end of progression, looping");
                first_playable(sections, 0).unwrap_or(0)
            }
        };
        self.position = PlaybackPosition::new(next_section, 0, 0);
    }

    /// Pick a section to start from; takes effect on the next `play`
    pub fn select_section(&mut self, index: usize) {
        let Some(song) = &self.song else {
            return;
        };
        if index >= song.sections().len() {
            warn!(index, sections = song.sections().len(), "section out of range, ignoring");
            return;
        }
        self.selected_section = Some(index);
        self.mode = PlaybackMode::Manual;
    }

    // ----- settings -----

    pub fn set_tempo(&mut self, bpm: f64) {
        if bpm.is_nan() {
            warn!("ignoring NaN tempo");
            return;
        }
        self.tempo = bpm.clamp(MIN_TEMPO, MAX_TEMPO);
    }

    pub fn set_volume(&mut self, volume: i32) {
        self.volume = volume.clamp(MIN_VOLUME as i32, MAX_VOLUME as i32) as u8;
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn set_instrument(&mut self, instrument: Instrument) {
        self.instrument = instrument;
    }

    pub fn set_metronome_sound(&mut self, name: impl Into<String>) {
        self.metronome_sound = name.into();
    }

    pub fn select_chord_for_visualizer(&mut self, chord: Option<String>) {
        self.visualizer_chord = chord;
    }
}

/// Index of the first section at or after `from` that has chords
fn first_playable(sections: &[Section], from: usize) -> Option<usize> {
    sections
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, s)| !s.chords.is_empty())
        .map(|(i, _)| i)
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Practice session.
//!
//! `JamSession` is the only writer of the `PlaybackState`. The beat
//! scheduler reports beats over a channel; user input arrives as
//! `ControlAction`s. After every action the scheduler is brought in line
//! with the state (tempo, volume, mute, sound, running).
//!
//! Beats that were queued before a pause or stop carry an old generation
//! and are dropped when they are finally received.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::control::ControlAction;
use crate::metronome::{BeatScheduler, SchedulerHandle};
use crate::playback::{chord_grid, PlaybackState};
use crate::song::Song;
use crate::timing::ClockState;

/// Message delivered to the session loop
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The scheduler fired a beat
    Beat { generation: u64, count: u64 },
    /// The song file on disk changed
    SongReloaded(Song),
    /// Something worth showing in the status line
    Notice(String),
}

/// Playback state wired to a running beat scheduler
pub struct JamSession {
    state: PlaybackState,
    scheduler: BeatScheduler,
    generation: Arc<AtomicU64>,
    events: UnboundedSender<SessionEvent>,
    sounds: Vec<String>,
    last_beat: Option<u64>,
    notice: Option<String>,
}

impl JamSession {
    /// Take over `scheduler` and return the receiving end of the event
    /// channel. `sounds` is the rotation for `ControlAction::CycleSound`.
    pub fn new(
        scheduler: BeatScheduler,
        sounds: Vec<String>,
    ) -> (Self, UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let generation = Arc::new(AtomicU64::new(0));

        let beat_tx = tx.clone();
        let beat_generation = Arc::clone(&generation);
        scheduler.set_beat_callback(move |count| {
            let generation = beat_generation.load(Ordering::SeqCst);
            // The receiver only goes away on shutdown
            let _ = beat_tx.send(SessionEvent::Beat { generation, count });
        });

        let mut session = Self {
            state: PlaybackState::new(),
            scheduler,
            generation,
            events: tx,
            sounds,
            last_beat: None,
            notice: None,
        };
        session.sync_scheduler();
        (session, rx)
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn scheduler(&self) -> SchedulerHandle {
        self.scheduler.handle()
    }

    /// Sender for events produced outside the scheduler (file watcher)
    pub fn sender(&self) -> UnboundedSender<SessionEvent> {
        self.events.clone()
    }

    /// Generation stamped on beats that are still current
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Count of the last beat applied to the state
    pub fn last_beat(&self) -> Option<u64> {
        self.last_beat
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Replace the current song, rewinding to its start
    pub fn load_song(&mut self, song: Song) {
        self.halt_scheduler(true);
        info!(id = %song.id, title = %song.title, "song loaded");
        self.state.load_song(song);
        self.last_beat = None;
        self.sync_scheduler();
    }

    /// Stop and forget the current song
    pub fn unload(&mut self) {
        self.halt_scheduler(true);
        self.state.unload();
        self.last_beat = None;
        self.sync_scheduler();
    }

    /// Apply a user action. `ToggleHelp` and `Quit` belong to the UI and
    /// are ignored here.
    pub fn apply(&mut self, action: ControlAction) {
        debug!(?action, category = %action.category(), "apply");
        match action {
            ControlAction::TogglePlay => {
                if self.state.is_playing() {
                    self.pause();
                } else {
                    self.play();
                }
            }
            ControlAction::Play => self.play(),
            ControlAction::Pause => self.pause(),
            ControlAction::Stop => self.stop(),
            ControlAction::Restart => {
                let was_playing = self.state.is_playing();
                self.stop();
                if was_playing {
                    self.play();
                }
            }
            ControlAction::SetTempo(bpm) => self.state.set_tempo(bpm),
            ControlAction::AdjustTempo(delta) => {
                self.state.set_tempo(self.state.tempo() + delta);
            }
            ControlAction::SetVolume(volume) => self.state.set_volume(volume),
            ControlAction::AdjustVolume(delta) => {
                self.state.set_volume(self.state.volume() as i32 + delta);
            }
            ControlAction::ToggleMute => self.state.toggle_mute(),
            ControlAction::CycleSound => self.cycle_sound(),
            ControlAction::SetSound(name) => self.state.set_metronome_sound(name),
            ControlAction::SelectSection(index) => self.state.select_section(index),
            ControlAction::PreviousChord => self.step_visualizer(-1),
            ControlAction::NextChord => self.step_visualizer(1),
            ControlAction::ToggleInstrument => {
                self.state.set_instrument(self.state.instrument().toggled());
            }
            ControlAction::SetInstrument(instrument) => self.state.set_instrument(instrument),
            ControlAction::ToggleHelp | ControlAction::Quit => {}
        }
        self.sync_scheduler();
    }

    /// Handle one message from the event channel
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Beat { generation, count } => self.on_beat(generation, count),
            SessionEvent::SongReloaded(song) => {
                let title = song.title.clone();
                self.load_song(song);
                self.notice = Some(format!("Reloaded {}", title));
            }
            SessionEvent::Notice(message) => self.notice = Some(message),
        }
    }

    /// Stop the clock and release audio
    pub fn shutdown(&mut self) {
        self.halt_scheduler(true);
        self.scheduler.dispose();
    }

    fn on_beat(&mut self, generation: u64, count: u64) {
        if generation != self.generation() {
            debug!(generation, count, "stale beat dropped");
            return;
        }
        if !self.state.is_playing() {
            return;
        }
        self.last_beat = Some(count);
        if let Err(e) = self.state.advance_beat() {
            self.notice = Some(e.to_string());
        }
    }

    fn play(&mut self) {
        if self.state.song().is_none() {
            warn!("play ignored: no song loaded");
            return;
        }
        self.state.play();
    }

    fn pause(&mut self) {
        self.state.pause();
        self.halt_scheduler(false);
    }

    fn stop(&mut self) {
        self.state.stop();
        self.halt_scheduler(true);
        self.last_beat = None;
    }

    /// Pause or stop the clock, then invalidate queued beats
    fn halt_scheduler(&mut self, rewind: bool) {
        if rewind {
            self.scheduler.stop();
        } else {
            self.scheduler.pause();
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn cycle_sound(&mut self) {
        if self.sounds.is_empty() {
            return;
        }
        let current = self.state.metronome_sound();
        let next = self
            .sounds
            .iter()
            .position(|s| s == current)
            .map(|i| (i + 1) % self.sounds.len())
            .unwrap_or(0);
        let name = self.sounds[next].clone();
        info!(sound = %name, "metronome sound");
        self.state.set_metronome_sound(name);
    }

    /// Move the visualizer through the chords on the grid
    fn step_visualizer(&mut self, step: isize) {
        let chords: Vec<String> = chord_grid(&self.state)
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        if chords.is_empty() {
            return;
        }
        let len = chords.len() as isize;
        let next = match self
            .state
            .visualizer_chord()
            .and_then(|c| chords.iter().position(|g| g == c))
        {
            Some(i) => (i as isize + step).rem_euclid(len),
            None if step < 0 => len - 1,
            None => 0,
        };
        self.state
            .select_chord_for_visualizer(Some(chords[next as usize].clone()));
    }

    fn sync_scheduler(&mut self) {
        self.scheduler.set_tempo(self.state.tempo());
        self.scheduler.set_volume(self.state.volume());
        self.scheduler.set_muted(self.state.is_muted());
        self.scheduler.set_sound(self.state.metronome_sound());

        let running = self.scheduler.state() == ClockState::Running;
        if self.state.is_playing() && !running {
            if let Err(e) = self.scheduler.start() {
                error!("metronome failed to start: {}", e);
                self.notice = Some(e.to_string());
                self.state.pause();
            }
        } else if !self.state.is_playing() && running {
            self.halt_scheduler(false);
        }
    }
}

impl Drop for JamSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullDevice;
    use crate::metronome::SchedulerConfig;
    use crate::music::Instrument;
    use crate::playback::{PlaybackMode, PlaybackPosition};
    use crate::song::{ChordInstance, ChordProgression, Difficulty, Section};

    fn song() -> Song {
        Song {
            id: "test".to_string(),
            title: "Test".to_string(),
            artist: "Nobody".to_string(),
            original_key: "C".to_string(),
            tempo_bpm: 90,
            time_signature: "4/4".to_string(),
            genre: None,
            difficulty: Difficulty::Beginner,
            chord_progression: ChordProgression::new(vec![
                Section::new(
                    "Intro",
                    vec![ChordInstance::new("C", 2), ChordInstance::new("G", 3)],
                ),
                Section::new("Verse", vec![ChordInstance::new("Am", 4)]),
            ]),
        }
    }

    fn session() -> (JamSession, UnboundedReceiver<SessionEvent>) {
        let scheduler =
            BeatScheduler::new(Box::new(NullDevice::default()), SchedulerConfig::default())
                .unwrap();
        JamSession::new(scheduler, vec!["metronome".to_string(), "wood".to_string()])
    }

    fn beat(session: &mut JamSession) {
        let generation = session.generation();
        session.handle_event(SessionEvent::Beat {
            generation,
            count: 0,
        });
    }

    #[test]
    fn test_load_song_syncs_tempo() {
        let (mut session, _rx) = session();
        session.load_song(song());
        assert_eq!(session.state().tempo(), 90.0);
        assert_eq!(session.scheduler().tempo(), 90.0);
        assert_eq!(session.scheduler().state(), ClockState::Stopped);
    }

    #[test]
    fn test_play_starts_scheduler() {
        let (mut session, _rx) = session();
        session.load_song(song());
        session.apply(ControlAction::TogglePlay);
        assert!(session.state().is_playing());
        assert_eq!(session.state().mode(), PlaybackMode::Auto);
        assert_eq!(session.scheduler().state(), ClockState::Running);

        session.apply(ControlAction::TogglePlay);
        assert!(!session.state().is_playing());
        assert_eq!(session.scheduler().state(), ClockState::Paused);
    }

    #[test]
    fn test_play_without_song_does_nothing() {
        let (mut session, _rx) = session();
        session.apply(ControlAction::Play);
        assert!(!session.state().is_playing());
        assert_eq!(session.scheduler().state(), ClockState::Stopped);
    }

    #[test]
    fn test_beats_advance_position() {
        let (mut session, _rx) = session();
        session.load_song(song());
        session.apply(ControlAction::Play);
        beat(&mut session);
        beat(&mut session);
        assert_eq!(session.state().position(), PlaybackPosition::new(0, 1, 0));
    }

    #[test]
    fn test_stale_beats_ignored() {
        let (mut session, _rx) = session();
        session.load_song(song());
        session.apply(ControlAction::Play);
        let stale = session.generation();

        session.apply(ControlAction::Pause);
        session.apply(ControlAction::Play);
        assert_ne!(session.generation(), stale);

        session.handle_event(SessionEvent::Beat {
            generation: stale,
            count: 7,
        });
        assert_eq!(session.state().position(), PlaybackPosition::START);
        assert_eq!(session.last_beat(), None);
    }

    #[test]
    fn test_beat_while_paused_ignored() {
        let (mut session, _rx) = session();
        session.load_song(song());
        session.apply(ControlAction::Play);
        session.apply(ControlAction::Pause);
        beat(&mut session);
        assert_eq!(session.state().position(), PlaybackPosition::START);
    }

    #[test]
    fn test_stop_rewinds() {
        let (mut session, _rx) = session();
        session.load_song(song());
        session.apply(ControlAction::Play);
        for _ in 0..3 {
            beat(&mut session);
        }
        session.apply(ControlAction::Stop);
        assert_eq!(session.state().position(), PlaybackPosition::START);
        assert_eq!(session.state().mode(), PlaybackMode::Manual);
        assert_eq!(session.scheduler().state(), ClockState::Stopped);
        assert_eq!(session.scheduler().slice_index(), 0);
    }

    #[test]
    fn test_restart_keeps_playing() {
        let (mut session, _rx) = session();
        session.load_song(song());
        session.apply(ControlAction::Play);
        for _ in 0..3 {
            beat(&mut session);
        }
        session.apply(ControlAction::Restart);
        assert!(session.state().is_playing());
        assert_eq!(session.state().position(), PlaybackPosition::START);
        assert_eq!(session.scheduler().state(), ClockState::Running);
    }

    #[test]
    fn test_settings_follow_state() {
        let (mut session, _rx) = session();
        session.apply(ControlAction::AdjustTempo(500.0));
        session.apply(ControlAction::AdjustVolume(-20));
        session.apply(ControlAction::ToggleMute);
        let handle = session.scheduler();
        assert_eq!(handle.tempo(), 240.0);
        assert_eq!(handle.volume(), 50);
        assert!(handle.is_muted());
    }

    #[test]
    fn test_cycle_sound() {
        let (mut session, _rx) = session();
        session.apply(ControlAction::CycleSound);
        assert_eq!(session.state().metronome_sound(), "wood");
        session.apply(ControlAction::CycleSound);
        assert_eq!(session.state().metronome_sound(), "metronome");

        session.apply(ControlAction::SetSound("clave".to_string()));
        session.apply(ControlAction::CycleSound);
        assert_eq!(session.state().metronome_sound(), "metronome");
    }

    #[test]
    fn test_step_visualizer() {
        let (mut session, _rx) = session();
        session.load_song(song());
        session.apply(ControlAction::NextChord);
        assert_eq!(session.state().visualizer_chord(), Some("C"));
        session.apply(ControlAction::NextChord);
        assert_eq!(session.state().visualizer_chord(), Some("G"));
        session.apply(ControlAction::NextChord);
        assert_eq!(session.state().visualizer_chord(), Some("C"));
        session.apply(ControlAction::PreviousChord);
        assert_eq!(session.state().visualizer_chord(), Some("G"));
    }

    #[test]
    fn test_toggle_instrument() {
        let (mut session, _rx) = session();
        session.apply(ControlAction::ToggleInstrument);
        assert_eq!(session.state().instrument(), Instrument::Guitar);
        session.apply(ControlAction::SetInstrument(Instrument::Piano));
        assert_eq!(session.state().instrument(), Instrument::Piano);
    }

    #[test]
    fn test_reload_replaces_song() {
        let (mut session, _rx) = session();
        session.load_song(song());
        session.apply(ControlAction::Play);

        let mut edited = song();
        edited.tempo_bpm = 150;
        session.handle_event(SessionEvent::SongReloaded(edited));
        assert!(!session.state().is_playing());
        assert_eq!(session.state().tempo(), 150.0);
        assert_eq!(session.notice(), Some("Reloaded Test"));
    }

    #[test]
    fn test_data_integrity_error_noticed() {
        let (mut session, _rx) = session();
        let mut bad = song();
        bad.chord_progression.sections[0].chords[0].beats = 0;
        session.load_song(bad);
        session.apply(ControlAction::Play);
        beat(&mut session);
        assert_eq!(session.state().position(), PlaybackPosition::START);
        assert!(session.notice().is_some());
    }

    #[tokio::test]
    async fn test_scheduler_beats_reach_channel() {
        let (mut session, mut rx) = session();
        session.load_song(song());
        session.apply(ControlAction::Play);
        let event = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match &event {
            SessionEvent::Beat { generation, count } => {
                assert_eq!(*generation, session.generation());
                assert_eq!(*count, 0);
            }
            other => panic!("unexpected event {:?}", other),
        }
        session.handle_event(event);
        assert_eq!(session.state().position(), PlaybackPosition::new(0, 0, 1));
        session.shutdown();
    }
}

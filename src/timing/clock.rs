// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Beat clock.
//!
//! Tracks tempo, run state and the absolute onset of the next beat. All
//! methods take the current instant explicitly so the arithmetic can be
//! tested without sleeping.

use std::time::{Duration, Instant};

/// Slowest supported tempo
pub const MIN_BPM: f64 = 40.0;

/// Fastest supported tempo
pub const MAX_BPM: f64 = 240.0;

/// Clock state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
    Paused,
}

/// Quarter-note beat clock with absolute deadlines
#[derive(Debug, Clone)]
pub struct BeatClock {
    /// Current tempo in BPM
    bpm: f64,
    /// Current clock state
    state: ClockState,
    /// Number of beats fired since the last stop
    beat: u64,
    /// Onset of the next beat while running
    next_onset: Option<Instant>,
    /// Time left until the next beat when paused
    remaining: Option<Duration>,
}

impl BeatClock {
    /// Create a stopped clock at the specified tempo
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm: clamp_bpm(bpm, 120.0),
            state: ClockState::Stopped,
            beat: 0,
            next_onset: None,
            remaining: None,
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Set the tempo. The pending onset is kept; the new interval applies
    /// from the beat after it.
    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = clamp_bpm(bpm, self.bpm);
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Number of beats fired since the last stop
    pub fn beat(&self) -> u64 {
        self.beat
    }

    /// Interval between beats at the current tempo
    pub fn beat_interval(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.bpm)
    }

    /// Onset of the next beat, if running
    pub fn next_onset(&self) -> Option<Instant> {
        match self.state {
            ClockState::Running => self.next_onset,
            _ => None,
        }
    }

    /// Start or resume.
    ///
    /// From stopped the first beat is due at `now`. From paused the
    /// interrupted beat is due after the time that was left when pausing.
    /// Returns false if the clock was already running.
    pub fn start(&mut self, now: Instant) -> bool {
        match self.state {
            ClockState::Running => false,
            ClockState::Stopped => {
                self.beat = 0;
                self.next_onset = Some(now);
                self.remaining = None;
                self.state = ClockState::Running;
                true
            }
            ClockState::Paused => {
                let remaining = self.remaining.take().unwrap_or_default();
                self.next_onset = Some(now + remaining);
                self.state = ClockState::Running;
                true
            }
        }
    }

    /// Halt, keeping the phase of the current beat
    pub fn pause(&mut self, now: Instant) {
        if self.state != ClockState::Running {
            return;
        }
        self.remaining = self
            .next_onset
            .take()
            .map(|onset| onset.saturating_duration_since(now));
        self.state = ClockState::Paused;
    }

    /// Halt and reset phase and beat count
    pub fn stop(&mut self) {
        self.state = ClockState::Stopped;
        self.beat = 0;
        self.next_onset = None;
        self.remaining = None;
    }

    /// Mark the pending beat as fired.
    ///
    /// Returns its count and schedules the next onset one interval after
    /// it, regardless of how late this call is.
    pub fn fire(&mut self) -> Option<u64> {
        if self.state != ClockState::Running {
            return None;
        }
        let onset = self.next_onset?;
        let count = self.beat;
        self.beat += 1;
        self.next_onset = Some(onset + self.beat_interval());
        Some(count)
    }
}

impl Default for BeatClock {
    fn default() -> Self {
        Self::new(120.0)
    }
}

fn clamp_bpm(bpm: f64, fallback: f64) -> f64 {
    if bpm.is_finite() {
        bpm.clamp(MIN_BPM, MAX_BPM)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_clock_creation() {
        let clock = BeatClock::new(120.0);
        assert_eq!(clock.bpm(), 120.0);
        assert_eq!(clock.state(), ClockState::Stopped);
        assert_eq!(clock.beat(), 0);
        assert_eq!(clock.next_onset(), None);
    }

    #[test]
    fn test_clock_bpm_clamping() {
        assert_eq!(BeatClock::new(10.0).bpm(), 40.0);
        assert_eq!(BeatClock::new(500.0).bpm(), 240.0);
        assert_eq!(BeatClock::new(f64::NAN).bpm(), 120.0);
    }

    #[test]
    fn test_beat_interval() {
        assert_eq!(BeatClock::new(120.0).beat_interval(), ms(500));
        assert_eq!(BeatClock::new(60.0).beat_interval(), ms(1000));
    }

    #[test]
    fn test_first_beat_is_immediate() {
        let t0 = Instant::now();
        let mut clock = BeatClock::new(120.0);
        assert!(clock.start(t0));
        assert!(!clock.start(t0 + ms(50)));
        assert_eq!(clock.next_onset(), Some(t0));
        assert_eq!(clock.fire(), Some(0));
        assert_eq!(clock.next_onset(), Some(t0 + ms(500)));
    }

    #[test]
    fn test_deadlines_do_not_drift() {
        let t0 = Instant::now();
        let mut clock = BeatClock::new(120.0);
        clock.start(t0);
        for _ in 0..100 {
            clock.fire();
        }
        assert_eq!(clock.beat(), 100);
        assert_eq!(clock.next_onset(), Some(t0 + ms(50_000)));
    }

    #[test]
    fn test_tempo_change_applies_after_pending_beat() {
        let t0 = Instant::now();
        let mut clock = BeatClock::new(120.0);
        clock.start(t0);
        clock.fire();
        clock.set_bpm(60.0);
        assert_eq!(clock.next_onset(), Some(t0 + ms(500)));
        clock.fire();
        assert_eq!(clock.next_onset(), Some(t0 + ms(1500)));
    }

    #[test]
    fn test_pause_resume_keeps_phase() {
        let t0 = Instant::now();
        let mut clock = BeatClock::new(120.0);
        clock.start(t0);
        clock.fire();
        clock.pause(t0 + ms(200));
        assert_eq!(clock.state(), ClockState::Paused);
        assert_eq!(clock.next_onset(), None);
        assert_eq!(clock.fire(), None);

        let t1 = t0 + ms(5000);
        clock.start(t1);
        assert_eq!(clock.next_onset(), Some(t1 + ms(300)));
        assert_eq!(clock.fire(), Some(1));
    }

    #[test]
    fn test_stop_resets() {
        let t0 = Instant::now();
        let mut clock = BeatClock::new(120.0);
        clock.start(t0);
        clock.fire();
        clock.fire();
        clock.stop();
        assert_eq!(clock.beat(), 0);
        clock.start(t0 + ms(3000));
        assert_eq!(clock.next_onset(), Some(t0 + ms(3000)));
        assert_eq!(clock.fire(), Some(0));
    }
}

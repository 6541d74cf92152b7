// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! One-shot voice mixer.
//!
//! Slices are scheduled against wall-clock instants, converted to output
//! frame positions relative to the moment the stream started. Voices are
//! dropped as soon as they finish.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{AudioError, SampleBuffer, SliceRequest};

#[derive(Debug)]
struct Voice {
    buffer: Arc<SampleBuffer>,
    start_frame: u64,
    /// Start position in source samples
    position: f64,
    /// Source samples per output frame
    step: f64,
    /// Length in output frames
    length: u64,
    fade: u64,
    gain: f32,
    played: u64,
}

impl Voice {
    fn finished(&self) -> bool {
        self.played >= self.length
    }

    fn next_sample(&mut self) -> f32 {
        let raw = self
            .buffer
            .sample_at(self.position + self.played as f64 * self.step);
        let remaining = self.length - self.played;
        let env = if remaining <= self.fade {
            remaining as f32 / self.fade as f32
        } else {
            1.0
        };
        self.played += 1;
        raw * self.gain * env
    }
}

/// Mixes scheduled slices of named sounds into an output buffer
#[derive(Debug)]
pub struct Mixer {
    sample_rate: u32,
    origin: Instant,
    frames_rendered: u64,
    sounds: HashMap<String, Arc<SampleBuffer>>,
    voices: Vec<Voice>,
}

impl Mixer {
    /// Create a mixer whose frame 0 is `origin`
    pub fn new(sample_rate: u32, origin: Instant) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            origin,
            frames_rendered: 0,
            sounds: HashMap::new(),
            voices: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Restart the frame clock at a new origin, e.g. when a stream opens
    pub fn reset_clock(&mut self, sample_rate: u32, origin: Instant) {
        self.sample_rate = sample_rate.max(1);
        self.origin = origin;
        self.frames_rendered = 0;
        self.voices.clear();
    }

    pub fn insert_sound(&mut self, name: impl Into<String>, buffer: SampleBuffer) {
        self.sounds.insert(name.into(), Arc::new(buffer));
    }

    pub fn sound_duration(&self, name: &str) -> Option<Duration> {
        self.sounds.get(name).map(|b| b.duration())
    }

    pub fn clear_sounds(&mut self) {
        self.sounds.clear();
        self.voices.clear();
    }

    /// Voices scheduled or sounding
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    fn frames(&self, d: Duration) -> u64 {
        (d.as_secs_f64() * self.sample_rate as f64).round() as u64
    }

    /// Schedule a slice. Requests in the past start immediately.
    pub fn schedule(&mut self, name: &str, request: SliceRequest) -> Result<(), AudioError> {
        let buffer = self
            .sounds
            .get(name)
            .cloned()
            .ok_or_else(|| AudioError::UnknownSound(name.to_string()))?;

        let length = self.frames(request.duration);
        if length == 0 || request.gain <= 0.0 {
            return Ok(());
        }

        let start_frame = self
            .frames(request.at.saturating_duration_since(self.origin))
            .max(self.frames_rendered);
        let source_rate = buffer.sample_rate as f64;
        self.voices.push(Voice {
            start_frame,
            position: request.offset.as_secs_f64() * source_rate,
            step: source_rate / self.sample_rate as f64,
            length,
            fade: self.frames(request.fade_out).min(length),
            gain: request.gain,
            played: 0,
            buffer,
        });
        Ok(())
    }

    /// Drop voices that have not started sounding
    pub fn cancel_pending(&mut self) {
        self.voices.retain(|v| v.played > 0);
    }

    /// Add the next block of audio into `out` (interleaved, pre-zeroed)
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let frames = out.len() / channels;
        let block_start = self.frames_rendered;

        for voice in &mut self.voices {
            for f in 0..frames {
                if block_start + (f as u64) < voice.start_frame {
                    continue;
                }
                if voice.finished() {
                    break;
                }
                let sample = voice.next_sample();
                for out_sample in &mut out[f * channels..(f + 1) * channels] {
                    *out_sample += sample;
                }
            }
        }

        self.voices.retain(|v| !v.finished());
        self.frames_rendered += frames as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SLICE_FADE_OUT;

    fn mixer(origin: Instant) -> Mixer {
        let mut mixer = Mixer::new(1000, origin);
        mixer.insert_sound("ones", SampleBuffer::new(1000, vec![1.0; 1000]));
        mixer
    }

    fn request(at: Instant, duration_ms: u64) -> SliceRequest {
        SliceRequest {
            at,
            offset: Duration::ZERO,
            duration: Duration::from_millis(duration_ms),
            gain: 0.5,
            fade_out: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_slice_starts_on_its_frame() {
        let t0 = Instant::now();
        let mut mixer = mixer(t0);
        mixer
            .schedule("ones", request(t0 + Duration::from_millis(10), 20))
            .unwrap();

        let mut out = vec![0.0; 64];
        mixer.render(&mut out, 1);

        assert!(out[..10].iter().all(|s| *s == 0.0));
        assert!(out[10..25].iter().all(|s| (*s - 0.5).abs() < 1e-6));
        assert!(out[26] < out[25]);
        assert!((out[29] - 0.1).abs() < 1e-6);
        assert!(out[30..].iter().all(|s| *s == 0.0));
        assert_eq!(mixer.voice_count(), 0);
    }

    #[test]
    fn test_stereo_duplicates_mono() {
        let t0 = Instant::now();
        let mut mixer = mixer(t0);
        mixer.schedule("ones", request(t0, 10)).unwrap();

        let mut out = vec![0.0; 8];
        mixer.render(&mut out, 2);
        assert_eq!(out[0], out[1]);
        assert!(out[0] > 0.0);
    }

    #[test]
    fn test_voice_spans_blocks() {
        let t0 = Instant::now();
        let mut mixer = mixer(t0);
        mixer.schedule("ones", request(t0, 20)).unwrap();

        let mut out = vec![0.0; 16];
        mixer.render(&mut out, 1);
        assert_eq!(mixer.voice_count(), 1);
        let mut out = vec![0.0; 16];
        mixer.render(&mut out, 1);
        assert!(out[0] > 0.0);
        assert_eq!(out[4], 0.0);
        assert_eq!(mixer.voice_count(), 0);
    }

    #[test]
    fn test_late_request_starts_now() {
        let t0 = Instant::now();
        let mut mixer = mixer(t0);
        let mut out = vec![0.0; 100];
        mixer.render(&mut out, 1);

        mixer.schedule("ones", request(t0, 10)).unwrap();
        let mut out = vec![0.0; 4];
        mixer.render(&mut out, 1);
        assert!(out[0] > 0.0);
    }

    #[test]
    fn test_cancel_pending_keeps_sounding_voices() {
        let t0 = Instant::now();
        let mut mixer = mixer(t0);
        mixer.schedule("ones", request(t0, 50)).unwrap();
        mixer
            .schedule("ones", request(t0 + Duration::from_millis(500), 50))
            .unwrap();

        let mut out = vec![0.0; 10];
        mixer.render(&mut out, 1);
        mixer.cancel_pending();
        assert_eq!(mixer.voice_count(), 1);
    }

    #[test]
    fn test_unknown_sound() {
        let mut mixer = mixer(Instant::now());
        let err = mixer.schedule("cowbell", request(Instant::now(), 10)).unwrap_err();
        assert_eq!(err, AudioError::UnknownSound("cowbell".to_string()));
    }

    #[test]
    fn test_silent_request_is_not_scheduled() {
        let t0 = Instant::now();
        let mut mixer = mixer(t0);
        let mut silent = request(t0, 10);
        silent.gain = 0.0;
        mixer.schedule("ones", silent).unwrap();
        assert_eq!(mixer.voice_count(), 0);
    }

    #[test]
    fn test_fade_never_exceeds_slice() {
        let t0 = Instant::now();
        let mut mixer = mixer(t0);
        let mut short = request(t0, 3);
        short.fade_out = SLICE_FADE_OUT;
        mixer.schedule("ones", short).unwrap();
        let mut out = vec![0.0; 8];
        mixer.render(&mut out, 1);
        assert!(out[0] > out[1] && out[1] > out[2] && out[2] > 0.0);
        assert_eq!(out[3], 0.0);
    }
}

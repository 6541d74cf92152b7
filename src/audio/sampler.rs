// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sample buffers and loop slicing.

use std::f32::consts::TAU;
use std::path::Path;
use std::time::Duration;

use super::AudioError;

/// Sample rate of the synthesized click loop
pub const CLICK_SAMPLE_RATE: u32 = 44_100;

/// Mono sample data
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl SampleBuffer {
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    /// Decode a WAV file, mixing all channels down to mono
    pub fn from_wav<P: AsRef<Path>>(name: &str, path: P) -> Result<Self, AudioError> {
        let load_err = |reason: String| AudioError::SampleLoadFailed {
            name: name.to_string(),
            reason,
        };

        let mut reader = hound::WavReader::open(path.as_ref()).map_err(|e| load_err(e.to_string()))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| load_err(e.to_string()))?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| s as f32 * scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| load_err(e.to_string()))?
            }
        };

        if interleaved.is_empty() {
            return Err(load_err("file contains no samples".to_string()));
        }

        let samples = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();
        Ok(Self::new(spec.sample_rate, samples))
    }

    /// Synthesize a click loop of `slice_count` beats at `reference_bpm`.
    ///
    /// The first beat of the loop is pitched higher as a downbeat accent.
    pub fn click_loop(reference_bpm: f64, slice_count: u32) -> Self {
        let rate = CLICK_SAMPLE_RATE as f32;
        let beat_len = (60.0 * CLICK_SAMPLE_RATE as f64 / reference_bpm.max(1.0)).round() as usize;
        let click_len = (0.03 * rate) as usize;
        let slices = slice_count.max(1) as usize;

        let mut samples = vec![0.0; beat_len * slices];
        for (beat, chunk) in samples.chunks_mut(beat_len).enumerate() {
            let freq = if beat == 0 { 1500.0 } else { 1000.0 };
            for (i, sample) in chunk.iter_mut().take(click_len).enumerate() {
                let t = i as f32 / rate;
                let env = (-t * 150.0).exp();
                *sample = (TAU * freq * t).sin() * env * 0.8;
            }
        }
        Self::new(CLICK_SAMPLE_RATE, samples)
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Linearly interpolated sample at a fractional position, wrapping around the loop
    pub fn sample_at(&self, position: f64) -> f32 {
        let len = self.samples.len();
        if len == 0 {
            return 0.0;
        }
        let position = position.rem_euclid(len as f64);
        let index = position as usize % len;
        let frac = (position - position.floor()) as f32;
        let a = self.samples[index];
        let b = self.samples[(index + 1) % len];
        a + (b - a) * frac
    }
}

/// Rotates through the beats of a sample loop.
///
/// One slice is one beat at the loop's reference tempo; the index moves on
/// after every beat, whether or not anything was heard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceRotation {
    index: u32,
    slice_count: u32,
    reference_bpm: f64,
}

impl SliceRotation {
    pub fn new(reference_bpm: f64, slice_count: u32) -> Self {
        Self {
            index: 0,
            slice_count: slice_count.max(1),
            reference_bpm: if reference_bpm > 0.0 { reference_bpm } else { 100.0 },
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Length of one slice
    pub fn slice_duration(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.reference_bpm)
    }

    /// Start of the current slice within a loop of `loop_len`
    pub fn offset(&self, loop_len: Duration) -> Duration {
        let loop_secs = loop_len.as_secs_f64();
        if loop_secs <= 0.0 {
            return Duration::ZERO;
        }
        let start = self.index as f64 * self.slice_duration().as_secs_f64();
        Duration::from_secs_f64(start % loop_secs)
    }

    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.slice_count;
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Switch to another loop's geometry, keeping the index in range
    pub fn reconfigure(&mut self, reference_bpm: f64, slice_count: u32) {
        let index = self.index;
        *self = Self::new(reference_bpm, slice_count);
        self.index = index % self.slice_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(d: Duration) -> u64 {
        (d.as_secs_f64() * 1000.0).round() as u64
    }

    #[test]
    fn test_click_loop_length() {
        let buffer = SampleBuffer::click_loop(100.0, 4);
        assert_eq!(buffer.sample_rate, CLICK_SAMPLE_RATE);
        assert_eq!(buffer.samples.len(), 26_460 * 4);
        assert!((buffer.duration().as_secs_f64() - 2.4).abs() < 1e-6);
    }

    #[test]
    fn test_click_loop_has_clicks_on_beats() {
        let buffer = SampleBuffer::click_loop(100.0, 4);
        let beat = 26_460;
        for b in 0..4 {
            let click = &buffer.samples[b * beat..b * beat + 200];
            assert!(click.iter().any(|s| s.abs() > 0.1));
            let gap = &buffer.samples[b * beat + 5000..(b + 1) * beat];
            assert!(gap.iter().all(|s| *s == 0.0));
        }
    }

    #[test]
    fn test_sample_at_interpolates_and_wraps() {
        let buffer = SampleBuffer::new(4, vec![0.0, 1.0, 0.0, -1.0]);
        assert_eq!(buffer.sample_at(1.0), 1.0);
        assert_eq!(buffer.sample_at(0.5), 0.5);
        assert_eq!(buffer.sample_at(3.5), -0.5);
        assert_eq!(buffer.sample_at(5.0), 1.0);
        assert_eq!(SampleBuffer::new(4, vec![]).sample_at(1.0), 0.0);
    }

    #[test]
    fn test_from_wav_mixes_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let buffer = SampleBuffer::from_wav("stereo", &path).unwrap();
        assert_eq!(buffer.sample_rate, 8000);
        assert_eq!(buffer.samples.len(), 100);
        assert!((buffer.samples[0] - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_from_wav_missing_file() {
        let err = SampleBuffer::from_wav("gone", "/no/such.wav").unwrap_err();
        assert!(matches!(err, AudioError::SampleLoadFailed { name, .. } if name == "gone"));
    }

    #[test]
    fn test_slice_offsets() {
        let mut rotation = SliceRotation::new(100.0, 4);
        let loop_len = Duration::from_secs_f64(2.4);
        assert_eq!(millis(rotation.slice_duration()), 600);

        let mut offsets = Vec::new();
        for _ in 0..5 {
            offsets.push(millis(rotation.offset(loop_len)));
            rotation.advance();
        }
        assert_eq!(offsets, vec![0, 600, 1200, 1800, 0]);
    }

    #[test]
    fn test_offset_wraps_short_loop() {
        let mut rotation = SliceRotation::new(100.0, 4);
        rotation.advance();
        rotation.advance();
        // 1.2s into a 1s loop
        let offset = rotation.offset(Duration::from_secs(1));
        assert_eq!(millis(offset), 200);
    }

    #[test]
    fn test_reset_and_reconfigure() {
        let mut rotation = SliceRotation::new(100.0, 4);
        rotation.advance();
        rotation.advance();
        rotation.advance();
        rotation.reconfigure(120.0, 2);
        assert_eq!(rotation.index(), 1);
        rotation.reset();
        assert_eq!(rotation.index(), 0);
    }
}

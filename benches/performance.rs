// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for JAMM
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Chord symbol parsing
//! - Beat advancement and display selectors
//! - Audio mixing in the output callback

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::{Duration, Instant};

use jamm::audio::{Mixer, SampleBuffer, SliceRequest, SLICE_FADE_OUT};
use jamm::music::{guitar_fingering, parse_chord, piano_keys};
use jamm::playback::{chord_grid, upcoming_chords, PlaybackState};
use jamm::song::{ChordInstance, ChordProgression, Section, Song};

const SYMBOLS: [&str; 8] = ["C", "F#m", "Bbmaj7", "G7b9", "A7sus4", "Ebdim", "Daug", "Cadd9"];

fn long_song(sections: usize) -> Song {
    let sections = (0..sections)
        .map(|i| {
            Section::new(
                format!("Section {}", i),
                SYMBOLS
                    .iter()
                    .enumerate()
                    .map(|(j, s)| ChordInstance::new(*s, (j % 4 + 1) as u32))
                    .collect(),
            )
        })
        .collect();
    Song {
        id: "bench".to_string(),
        title: "Bench".to_string(),
        artist: String::new(),
        original_key: "C".to_string(),
        tempo_bpm: 120,
        time_signature: "4/4".to_string(),
        genre: None,
        difficulty: Default::default(),
        chord_progression: ChordProgression::new(sections),
    }
}

/// Benchmark chord symbol parsing (every redraw of the visualizer)
fn bench_parse_chord(c: &mut Criterion) {
    c.bench_function("parse_chord", |b| {
        b.iter(|| {
            for symbol in SYMBOLS {
                black_box(parse_chord(black_box(symbol)).ok());
            }
        })
    });

    c.bench_function("piano_keys", |b| {
        b.iter(|| black_box(piano_keys(black_box(Some("G7b9")), 4, 2)))
    });

    c.bench_function("guitar_fingering", |b| {
        b.iter(|| black_box(guitar_fingering(black_box("Am"))))
    });
}

/// Benchmark beat advancement (runs on every beat callback)
fn bench_advance_beat(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance_beat");

    for sections in [1, 16, 128].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(sections), sections, |b, &n| {
            let mut state = PlaybackState::new();
            state.load_song(long_song(n));
            state.play();
            b.iter(|| black_box(state.advance_beat().is_ok()))
        });
    }

    group.finish();
}

/// Benchmark the selectors the UI calls on every frame
fn bench_selectors(c: &mut Criterion) {
    let mut state = PlaybackState::new();
    state.load_song(long_song(32));
    state.play();
    for _ in 0..500 {
        let _ = state.advance_beat();
    }

    let mut group = c.benchmark_group("selectors");
    group.bench_function("upcoming_chords", |b| {
        b.iter(|| black_box(upcoming_chords(&state, 3).len()))
    });
    group.bench_function("chord_grid", |b| b.iter(|| black_box(chord_grid(&state).len())));
    group.finish();
}

/// Benchmark one output buffer of mixing with overlapping slices
fn bench_mixer_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixer_render");

    for frames in [256usize, 1024].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(frames), frames, |b, &frames| {
            let origin = Instant::now();
            let mut mixer = Mixer::new(44_100, origin);
            mixer.insert_sound("metronome", SampleBuffer::click_loop(100.0, 4));
            let mut out = vec![0.0f32; frames * 2];

            b.iter(|| {
                if mixer.voice_count() < 2 {
                    let request = SliceRequest {
                        at: Instant::now(),
                        offset: Duration::ZERO,
                        duration: Duration::from_millis(600),
                        gain: 0.8,
                        fade_out: SLICE_FADE_OUT,
                    };
                    let _ = mixer.schedule("metronome", request);
                }
                mixer.render(black_box(&mut out), 2);
                black_box(out[0])
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_chord,
    bench_advance_beat,
    bench_selectors,
    bench_mixer_render,
);

criterion_main!(benches);

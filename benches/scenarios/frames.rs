//! Benchmarks for whole tracker frames.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_partials::{Strategy, TrackerConfig, VoiceTracker};

use crate::POLYPHONIES;

const SEQUENCE_LEN: usize = 32;

/// A harmonic stack with vibrato: every partial keeps matching.
fn steady_sequence(voices: usize) -> Vec<Vec<(f32, f32)>> {
    (0..SEQUENCE_LEN)
        .map(|frame| {
            let vibrato = 1.0 + 0.003 * (frame as f32 * 0.7).sin();
            (0..voices)
                .map(|k| (220.0 * (k + 1) as f32 * vibrato, -6.0 - 1.5 * k as f32))
                .collect()
        })
        .collect()
}

/// Partials blinking in and out so births and deaths happen every frame.
fn churning_sequence(voices: usize) -> Vec<Vec<(f32, f32)>> {
    (0..SEQUENCE_LEN)
        .map(|frame| {
            (0..voices)
                .filter(|k| (frame + k) % 3 != 0)
                .map(|k| (180.0 * (k + 1) as f32 + (frame % 4) as f32, -10.0 - k as f32))
                .collect()
        })
        .collect()
}

pub fn bench_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/frames");

    for &voices in POLYPHONIES {
        for (label, sequence) in [
            ("steady", steady_sequence(voices)),
            ("churn", churning_sequence(voices)),
        ] {
            for strategy in [Strategy::Greedy, Strategy::Optimal] {
                let config = TrackerConfig::with_voices(voices)
                    .with_min_track_length(2)
                    .with_strategy(strategy);
                let mut tracker = match VoiceTracker::new(config) {
                    Ok(tracker) => tracker,
                    Err(err) => panic!("bench config rejected: {err}"),
                };

                let id = format!("{label}_{}", format!("{strategy:?}").to_lowercase());
                group.bench_with_input(BenchmarkId::new(id, voices), &voices, |b, _| {
                    b.iter(|| {
                        for peaks in &sequence {
                            black_box(tracker.process_peaks(black_box(peaks)));
                            tracker.prune();
                        }
                    })
                });
            }
        }
    }

    group.finish();
}

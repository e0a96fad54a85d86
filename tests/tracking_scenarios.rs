use std::collections::HashSet;

use saavy_partials::{
    MagnitudeScale, OutputSlot, Strategy, TrackerConfig, VoiceState, VoiceTracker,
};

fn run_frame(tracker: &mut VoiceTracker, peaks: &[(f32, f32)]) -> Vec<OutputSlot> {
    let out = tracker.process_peaks(peaks).to_vec();
    tracker.prune();
    out
}

fn assert_unique_voices(frame: &[OutputSlot]) {
    let mut seen = HashSet::new();
    for slot in frame.iter().filter(|s| !s.is_empty()) {
        assert!(seen.insert(slot.voice), "voice {} emitted twice", slot.voice);
    }
}

fn assert_pool_conserved(tracker: &VoiceTracker) {
    let holding = tracker.tracks().filter(|t| t.id().is_some()).count();
    assert_eq!(
        holding + tracker.free_voice_count(),
        tracker.config().max_voices,
        "voice ids leaked or duplicated"
    );
}

/// Deterministic pseudo-random peaks: a handful of slowly drifting partials
/// with dropouts and a sprinkle of noise peaks.
fn noisy_frames(frames: usize, width: usize) -> Vec<Vec<(f32, f32)>> {
    let mut seed: u32 = 0x2545_f491;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        seed as f32 / u32::MAX as f32
    };

    (0..frames)
        .map(|frame| {
            (0..width)
                .map(|slot| {
                    let r = next();
                    if r < 0.15 {
                        (0.0, 0.0)
                    } else if r < 0.3 {
                        (100.0 + next() * 4_000.0, -20.0 - next() * 50.0)
                    } else {
                        let base = 110.0 * (slot as f32 + 1.0);
                        let drift = (frame as f32 * 0.1).sin() * 5.0;
                        (base + drift, -10.0 - slot as f32 * 3.0)
                    }
                })
                .collect()
        })
        .collect()
}

#[test]
fn documented_birth_confirm_release_sequence() {
    let config = TrackerConfig::with_voices(2).with_min_track_length(2);
    let mut tracker = VoiceTracker::new(config).unwrap();

    // Frame 1: new candidate, not reported yet
    let out = run_frame(&mut tracker, &[(440.0, -20.0)]);
    assert!(out.iter().all(OutputSlot::is_empty));
    let track = tracker.tracks().next().expect("candidate exists");
    assert_eq!(track.age(), 1);
    assert!(track.id().is_none());

    // Frame 2: matched, confirmed with voice 0
    let out = run_frame(&mut tracker, &[(440.0, -20.0)]);
    assert_eq!(out[0].as_tuple(), (0, 440.0, -20.0));
    assert_eq!(out[0].state, VoiceState::Attack);
    assert!(out[1].is_empty());

    // Frame 3: gone. Reported one last time, then freed by prune
    let out = tracker.process_peaks(&[]).to_vec();
    assert_eq!(out[0].as_tuple(), (0, 440.0, -20.0));
    assert_eq!(out[0].state, VoiceState::Release);
    assert_eq!(tracker.prune(), 1);
    assert_eq!(tracker.free_voice_count(), 2);

    // Frame 4: slot is back to the sentinel
    let out = run_frame(&mut tracker, &[]);
    assert_eq!(out[0].as_tuple(), (-1, 0.0, 0.0));
}

#[test]
fn confirmation_takes_exactly_min_track_length_frames() {
    for min_len in 1..=5u32 {
        let config = TrackerConfig::with_voices(2).with_min_track_length(min_len);
        let mut tracker = VoiceTracker::new(config).unwrap();

        for frame in 1..=min_len {
            let out = run_frame(&mut tracker, &[(1_000.0, -6.0)]);
            let reported = out.iter().any(|s| !s.is_empty());
            assert_eq!(reported, frame == min_len, "min_len {min_len}, frame {frame}");
        }
    }
}

#[test]
fn uniqueness_and_conservation_hold_under_noise() {
    for strategy in [Strategy::Greedy, Strategy::Optimal] {
        let config = TrackerConfig::with_voices(6)
            .with_max_peaks(10)
            .with_min_track_length(2)
            .with_grace_frames(1)
            .with_strategy(strategy);
        let mut tracker = VoiceTracker::new(config).unwrap();

        for peaks in noisy_frames(300, 10) {
            let out = tracker.process_peaks(&peaks).to_vec();
            assert_eq!(out.len(), 6);
            assert_unique_voices(&out);
            assert!(tracker.track_count() <= 6);
            assert_pool_conserved(&tracker);

            tracker.prune();
            assert_pool_conserved(&tracker);
        }
    }
}

#[test]
fn strategies_agree_on_one_track_one_candidate() {
    let mut outputs = Vec::new();
    for strategy in [Strategy::Greedy, Strategy::Optimal] {
        let config = TrackerConfig::with_voices(2)
            .with_min_track_length(1)
            .with_strategy(strategy);
        let mut tracker = VoiceTracker::new(config).unwrap();
        run_frame(&mut tracker, &[(440.0, -20.0)]);
        outputs.push(run_frame(&mut tracker, &[(447.0, -22.0)]));
    }
    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[0][0].as_tuple(), (0, 447.0, -22.0));
}

#[test]
fn optimal_keeps_both_partials_where_greedy_loses_one() {
    // Two tracks 30 Hz apart. Next frame both peaks move up by ~25 Hz: the
    // lower track's cheapest pair is the upper track's peak.
    let peaks_a = [(1_000.0, -10.0), (1_030.0, -10.0)];
    let peaks_b = [(1_028.0, -10.0), (1_055.0, -10.0)];

    let mut matched = Vec::new();
    for strategy in [Strategy::Greedy, Strategy::Optimal] {
        let config = TrackerConfig::with_voices(2)
            .with_min_track_length(1)
            .with_ranges(30.0, 10.0)
            .with_track_prob(0.0)
            .with_strategy(strategy);
        let mut tracker = VoiceTracker::new(config).unwrap();
        run_frame(&mut tracker, &peaks_a);
        let out = run_frame(&mut tracker, &peaks_b);
        matched.push(out.iter().filter(|s| s.state == VoiceState::Sustain).count());
    }

    assert_eq!(matched, vec![1, 2]);
}

#[test]
fn exhaustion_promotes_exactly_one_voice() {
    let config = TrackerConfig::with_voices(1).with_min_track_length(1);
    let mut tracker = VoiceTracker::new(config).unwrap();

    for _ in 0..4 {
        let out = run_frame(&mut tracker, &[(440.0, -20.0), (880.0, -20.0)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].voice, 0);
        // equal loudness: the first slot wins every time
        assert_eq!(out[0].frequency, 440.0);
        assert_eq!(tracker.track_count(), 1);
        assert_eq!(tracker.free_voice_count(), 0);
    }
}

#[test]
fn only_louder_of_two_births_becomes_candidate() {
    let config = TrackerConfig::with_voices(1).with_min_track_length(2);
    let mut tracker = VoiceTracker::new(config).unwrap();

    run_frame(&mut tracker, &[(440.0, -20.0), (880.0, -8.0)]);
    let tracks: Vec<_> = tracker.tracks().collect();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].frequency(), 880.0);
    assert!(tracks[0].id().is_none());
}

#[test]
fn configure_twice_equals_configure_once() {
    let config = TrackerConfig::with_voices(3).with_min_track_length(1);
    let frames = [
        vec![(220.0, -10.0), (330.0, -12.0)],
        vec![(221.0, -10.0), (331.0, -12.0)],
    ];

    let mut once = VoiceTracker::default();
    once.configure(config).unwrap();
    let mut twice = VoiceTracker::default();
    twice.configure(config).unwrap();
    twice.configure(config).unwrap();

    for peaks in &frames {
        assert_eq!(run_frame(&mut once, peaks), run_frame(&mut twice, peaks));
    }

    // And mid-stream: the same config again leaves live voices alone
    once.configure(config).unwrap();
    assert_eq!(once.active_voice_count(), 2);
}

#[test]
fn invalid_configuration_leaves_tracker_running() {
    let config = TrackerConfig::with_voices(2).with_min_track_length(1);
    let mut tracker = VoiceTracker::new(config).unwrap();
    run_frame(&mut tracker, &[(440.0, -20.0)]);

    assert!(tracker.configure(TrackerConfig::with_voices(0)).is_err());
    assert!(tracker
        .configure(config.with_min_track_length(0))
        .is_err());

    assert_eq!(*tracker.config(), config);
    let out = run_frame(&mut tracker, &[(440.0, -20.0)]);
    assert_eq!(out[0].as_tuple(), (0, 440.0, -20.0));
}

#[test]
fn reconfiguring_polyphony_resets_everything() {
    let mut tracker =
        VoiceTracker::new(TrackerConfig::with_voices(2).with_min_track_length(1)).unwrap();
    run_frame(&mut tracker, &[(440.0, -20.0), (660.0, -20.0)]);
    assert_eq!(tracker.active_voice_count(), 2);

    tracker
        .configure(TrackerConfig::with_voices(4).with_min_track_length(1))
        .unwrap();
    assert_eq!(tracker.track_count(), 0);
    assert_eq!(tracker.free_voice_count(), 4);
    assert_eq!(tracker.output().len(), 4);
}

#[test]
fn grace_frame_revives_a_dropout() {
    let config = TrackerConfig::with_voices(2)
        .with_min_track_length(1)
        .with_grace_frames(1);
    let mut tracker = VoiceTracker::new(config).unwrap();

    run_frame(&mut tracker, &[(440.0, -20.0)]);
    let dropout = run_frame(&mut tracker, &[]);
    assert_eq!(dropout[0].state, VoiceState::Release);
    assert_eq!(tracker.active_voice_count(), 1);

    let back = run_frame(&mut tracker, &[(441.0, -20.0)]);
    assert_eq!(back[0].voice, 0);
    assert_eq!(back[0].state, VoiceState::Sustain);
}

#[test]
fn grace_runs_out_after_two_misses() {
    let config = TrackerConfig::with_voices(1)
        .with_min_track_length(1)
        .with_grace_frames(1);
    let mut tracker = VoiceTracker::new(config).unwrap();

    run_frame(&mut tracker, &[(440.0, -20.0)]);
    run_frame(&mut tracker, &[]);
    run_frame(&mut tracker, &[]);
    assert_eq!(tracker.active_voice_count(), 0);
    assert_eq!(tracker.track_count(), 0);
}

#[test]
fn without_grace_a_dropout_gets_a_new_identity_cycle() {
    let config = TrackerConfig::with_voices(2).with_min_track_length(2);
    let mut tracker = VoiceTracker::new(config).unwrap();

    run_frame(&mut tracker, &[(440.0, -20.0)]);
    run_frame(&mut tracker, &[(440.0, -20.0)]);
    run_frame(&mut tracker, &[]);

    // must re-confirm from scratch
    let out = run_frame(&mut tracker, &[(440.0, -20.0)]);
    assert!(out.iter().all(OutputSlot::is_empty));
    let out = run_frame(&mut tracker, &[(440.0, -20.0)]);
    assert_eq!(out[0].state, VoiceState::Attack);
}

#[test]
fn parallel_arrays_and_linear_magnitudes() {
    let config = TrackerConfig::with_voices(4)
        .with_min_track_length(1)
        .with_magnitude_scale(MagnitudeScale::Linear);
    let mut tracker = VoiceTracker::new(config).unwrap();

    let freqs = [440.0, 0.0, 660.0, 0.0];
    let mags = [0.5, 0.0, 0.25, 0.0];
    let out = tracker.process_frame(&freqs, &mags).to_vec();
    tracker.prune();

    let live: Vec<_> = out.iter().filter(|s| !s.is_empty()).collect();
    assert_eq!(live.len(), 2);
    // magnitudes come back in the caller's scale
    assert_eq!(live[0].magnitude, 0.5);
    assert_eq!(live[1].magnitude, 0.25);
    assert!((tracker.last_frame_level() - 20.0 * 0.5f32.log10()).abs() < 1e-4);
}

#[test]
fn garbage_input_degrades_to_silence() {
    let mut tracker =
        VoiceTracker::new(TrackerConfig::with_voices(2).with_min_track_length(1)).unwrap();
    let out = run_frame(
        &mut tracker,
        &[(f32::NAN, -10.0), (-50.0, -10.0), (440.0, f32::NEG_INFINITY)],
    );
    assert!(out.iter().all(OutputSlot::is_empty));

    // mismatched array lengths are read up to the shorter one
    let out = tracker.process_frame(&[440.0, 880.0, 1_320.0], &[-6.0]).to_vec();
    tracker.prune();
    assert_eq!(out.iter().filter(|s| !s.is_empty()).count(), 1);
}

#[test]
fn wide_input_keeps_the_loudest_peaks() {
    let config = TrackerConfig::with_voices(2).with_min_track_length(1);
    let mut tracker = VoiceTracker::new(config).unwrap();

    let peaks: Vec<(f32, f32)> = (0..8)
        .map(|i| (200.0 * (i + 1) as f32, if i == 5 { -3.0 } else { -20.0 - i as f32 }))
        .collect();
    let out = run_frame(&mut tracker, &peaks);
    let mut freqs: Vec<f32> = out.iter().map(|s| s.frequency).collect();
    freqs.sort_by(f32::total_cmp);
    assert_eq!(freqs, vec![200.0, 1_200.0]);
}

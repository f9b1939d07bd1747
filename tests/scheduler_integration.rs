// Integration test: scheduler driven end-to-end against the manual clock
//
// Covers long sessions and cross-module behavior that the per-file unit
// tests do not: drift over hundreds of bars, pause surviving armed
// notifications, and the public transport facade.

use clicktrack::{
    AudioClock, BeatAccent, LOOKAHEAD_INTERVAL, LookaheadScheduler, ManualClock,
    MetronomeCallbacks, PlaybackPosition, START_LATENCY, SubdivisionMode, TimeSignature,
    ToneSink,
};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct CollectingSink {
    times: Arc<Mutex<Vec<f64>>>,
}

impl ToneSink for CollectingSink {
    fn schedule(&mut self, time: f64, _frequency: f32, _duration: f64, _volume: f32) {
        self.times.lock().unwrap().push(time);
    }
}

struct Rig {
    clock: ManualClock,
    scheduler: LookaheadScheduler,
    tone_times: Arc<Mutex<Vec<f64>>>,
    beats: Arc<Mutex<Vec<(PlaybackPosition, BeatAccent)>>>,
    bars: Arc<Mutex<Vec<u32>>>,
}

fn rig() -> Rig {
    let clock = ManualClock::new();
    let sink = CollectingSink::default();
    let tone_times = Arc::clone(&sink.times);
    let beats: Arc<Mutex<Vec<(PlaybackPosition, BeatAccent)>>> = Arc::default();
    let bars: Arc<Mutex<Vec<u32>>> = Arc::default();

    let beat_log = Arc::clone(&beats);
    let bar_log = Arc::clone(&bars);
    let callbacks = MetronomeCallbacks {
        on_beat: Box::new(move |position, accent| {
            beat_log.lock().unwrap().push((position, accent));
        }),
        on_bar_complete: Box::new(move |bar| {
            bar_log.lock().unwrap().push(bar);
        }),
    };

    let scheduler = LookaheadScheduler::new(Box::new(clock.clone()), Box::new(sink), callbacks);
    Rig {
        clock,
        scheduler,
        tone_times,
        beats,
        bars,
    }
}

fn run_for(rig: &mut Rig, seconds: f64) {
    let step = LOOKAHEAD_INTERVAL.as_secs_f64();
    let mut remaining = seconds;
    while remaining > 0.0 {
        rig.scheduler.poll();
        rig.clock.advance(step);
        remaining -= step;
    }
    rig.scheduler.poll();
}

#[test]
fn no_drift_over_five_hundred_bars() {
    let mut rig = rig();
    rig.scheduler.start();

    // 500 bars of 4/4 at 120 BPM = 1000 seconds of audio time
    run_for(&mut rig, 1001.0);

    let times = rig.tone_times.lock().unwrap();
    assert!(times.len() >= 2000, "expected 2000+ clicks, got {}", times.len());

    // Every click must sit exactly on the grid; anchored arithmetic means
    // the 2000th click is as precise as the first
    for (n, time) in times.iter().enumerate() {
        let expected = START_LATENCY + n as f64 * 0.5;
        assert!(
            (time - expected).abs() < 1e-9,
            "click {} drifted: {} vs {}",
            n,
            time,
            expected
        );
    }

    // Bars complete in order
    let bars = rig.bars.lock().unwrap();
    assert!(bars.len() >= 499);
    for (i, bar) in bars.iter().enumerate() {
        assert_eq!(*bar, i as u32 + 1);
    }
}

#[test]
fn every_beat_observed_exactly_once_in_order() {
    let mut rig = rig();
    rig.scheduler.start();
    run_for(&mut rig, 20.0);

    let beats = rig.beats.lock().unwrap();
    assert!(beats.len() >= 39);
    for (n, (position, _)) in beats.iter().enumerate() {
        let expected_bar = n as u32 / 4 + 1;
        let expected_beat = n as u32 % 4 + 1;
        assert_eq!(position.bar, expected_bar, "beat index {}", n);
        assert_eq!(position.beat, expected_beat, "beat index {}", n);
    }
}

#[test]
fn pause_keeps_armed_notifications_for_resume() {
    let mut rig = rig();
    rig.scheduler.start();

    // First poll commits the first beat (due at START_LATENCY) but the
    // notification has not fired yet
    rig.scheduler.poll();
    assert!(rig.beats.lock().unwrap().is_empty());

    rig.scheduler.pause();
    rig.clock.advance(60.0); // suspended clock ignores this
    rig.scheduler.resume();
    run_for(&mut rig, 1.0);

    // The armed downbeat fired after resume, exactly once
    let beats = rig.beats.lock().unwrap();
    let downbeats = beats
        .iter()
        .filter(|(p, _)| p.bar == 1 && p.beat == 1)
        .count();
    assert_eq!(downbeats, 1);
}

#[test]
fn stop_drops_armed_notifications() {
    let mut rig = rig();
    rig.scheduler.start();
    rig.scheduler.poll();
    rig.scheduler.stop();

    // Re-running the clock past the armed fire time produces nothing
    rig.clock.resume();
    run_for(&mut rig, 1.0);
    assert!(rig.beats.lock().unwrap().is_empty());
}

#[test]
fn swing_grid_holds_across_bars() {
    let mut rig = rig();
    rig.scheduler.set_swing(SubdivisionMode::SixteenthSwing, true);
    rig.scheduler.start();
    run_for(&mut rig, 4.1);

    // 120 BPM sixteenth swing: per beat, offsets 0, 1/3, 1/2, 5/6 of 0.5 s
    let times = rig.tone_times.lock().unwrap();
    let offsets = [0.0, 1.0 / 3.0, 0.5, 5.0 / 6.0];
    assert!(times.len() >= 16);
    for (n, time) in times.iter().enumerate() {
        let beat = n / 4;
        let slot = n % 4;
        let expected = START_LATENCY + beat as f64 * 0.5 + offsets[slot] * 0.5;
        assert!(
            (time - expected).abs() < 1e-9,
            "slot {} of beat {} at {} expected {}",
            slot,
            beat,
            time,
            expected
        );
    }
}

#[test]
fn seven_eight_meter_rolls_over_correctly() {
    let mut rig = rig();
    rig.scheduler
        .set_time_signature(TimeSignature::new(7, 8).expect("valid signature"));
    rig.scheduler.start();
    run_for(&mut rig, 8.0);

    let beats = rig.beats.lock().unwrap();
    assert!(beats.len() >= 14);
    assert_eq!(beats[0].0, PlaybackPosition { bar: 1, beat: 1 });
    assert_eq!(beats[6].0, PlaybackPosition { bar: 1, beat: 7 });
    assert_eq!(beats[7].0, PlaybackPosition { bar: 2, beat: 1 });
    assert_eq!(beats[7].1, BeatAccent::Accent);
}

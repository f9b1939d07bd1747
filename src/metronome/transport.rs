// Metronome transport - playback control and the poll thread
//
// Owns the scheduler behind a mutex and a dedicated thread ticking it every
// LOOKAHEAD_INTERVAL. The tick is strictly serial; pause/stop join the
// thread before returning, so no poll can run after they do.

use crate::audio::clock::AudioClock;
use crate::audio::tone::ToneSink;
use crate::metronome::meter::{
    BeatAccent, BeatAccents, MetronomeSettings, MeterError, PlaybackPosition, TimeSignature,
};
use crate::metronome::scheduler::{
    LOOKAHEAD_INTERVAL, LookaheadScheduler, MetronomeCallbacks, SchedulerState,
};
use crate::metronome::subdivision::SubdivisionMode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// The metronome engine facade
///
/// Construction injects the audio clock and tone sink, so the same transport
/// drives the CPAL output in production and a manual clock in tests.
pub struct Metronome {
    scheduler: Arc<Mutex<LookaheadScheduler>>,
    poll_running: Arc<AtomicBool>,
    poll_thread: Option<JoinHandle<()>>,
}

impl Metronome {
    pub fn new(
        clock: Box<dyn AudioClock>,
        sink: Box<dyn ToneSink>,
        callbacks: MetronomeCallbacks,
    ) -> Self {
        Self {
            scheduler: Arc::new(Mutex::new(LookaheadScheduler::new(clock, sink, callbacks))),
            poll_running: Arc::new(AtomicBool::new(false)),
            poll_thread: None,
        }
    }

    // -- transport ---------------------------------------------------------

    /// Start playback from bar 1, beat 1 (restarts when already playing)
    pub fn start(&mut self) {
        self.halt_poll_thread();
        if let Ok(mut scheduler) = self.scheduler.lock() {
            scheduler.start();
        }
        self.spawn_poll_thread();
    }

    /// Freeze playback; position is preserved for `resume`
    pub fn pause(&mut self) {
        self.halt_poll_thread();
        if let Ok(mut scheduler) = self.scheduler.lock() {
            scheduler.pause();
        }
    }

    /// Continue a paused metronome from its preserved position
    pub fn resume(&mut self) {
        let resumed = match self.scheduler.lock() {
            Ok(mut scheduler) => {
                scheduler.resume();
                scheduler.state() == SchedulerState::Running
            }
            Err(_) => false,
        };
        if resumed {
            self.spawn_poll_thread();
        }
    }

    /// Halt playback and rewind to bar 1, beat 1
    pub fn stop(&mut self) {
        self.halt_poll_thread();
        if let Ok(mut scheduler) = self.scheduler.lock() {
            scheduler.stop();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler
            .lock()
            .map(|scheduler| scheduler.is_playing())
            .unwrap_or(false)
    }

    pub fn current_position(&self) -> PlaybackPosition {
        self.scheduler
            .lock()
            .map(|scheduler| scheduler.position())
            .unwrap_or(PlaybackPosition { bar: 1, beat: 1 })
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> MetronomeSettings {
        self.scheduler
            .lock()
            .map(|scheduler| scheduler.settings().clone())
            .unwrap_or_default()
    }

    // -- live configuration ------------------------------------------------

    pub fn set_bpm(&self, bpm: f64) {
        if let Ok(mut scheduler) = self.scheduler.lock() {
            scheduler.set_bpm(bpm);
        }
    }

    pub fn set_time_signature(&self, beats: u32, note_value: u32) -> Result<(), MeterError> {
        let time_signature = TimeSignature::new(beats, note_value)?;
        if let Ok(mut scheduler) = self.scheduler.lock() {
            scheduler.set_time_signature(time_signature);
        }
        Ok(())
    }

    pub fn set_swing(&self, mode: SubdivisionMode, enabled: bool) {
        if let Ok(mut scheduler) = self.scheduler.lock() {
            scheduler.set_swing(mode, enabled);
        }
    }

    pub fn set_beat_accents(&self, accents: BeatAccents) {
        if let Ok(mut scheduler) = self.scheduler.lock() {
            scheduler.set_beat_accents(accents);
        }
    }

    pub fn set_beat_accent(&self, beat: u32, accent: BeatAccent) {
        if let Ok(mut scheduler) = self.scheduler.lock() {
            scheduler.set_beat_accent(beat, accent);
        }
    }

    pub fn cycle_beat_accent(&self, beat: u32) {
        if let Ok(mut scheduler) = self.scheduler.lock() {
            scheduler.cycle_beat_accent(beat);
        }
    }

    pub fn set_muted(&self, muted: bool) {
        if let Ok(mut scheduler) = self.scheduler.lock() {
            scheduler.set_muted(muted);
        }
    }

    // -- poll thread -------------------------------------------------------

    fn spawn_poll_thread(&mut self) {
        if self.poll_thread.is_some() {
            return;
        }
        self.poll_running.store(true, Ordering::Relaxed);

        let scheduler = Arc::clone(&self.scheduler);
        let running = Arc::clone(&self.poll_running);
        self.poll_thread = Some(thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                if let Ok(mut scheduler) = scheduler.lock() {
                    scheduler.poll();
                }
                thread::sleep(LOOKAHEAD_INTERVAL);
            }
        }));
    }

    fn halt_poll_thread(&mut self) {
        self.poll_running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.poll_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        self.halt_poll_thread();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::clock::ManualClock;
    use std::sync::Mutex as StdMutex;

    #[derive(Clone, Default)]
    struct CountingSink {
        count: Arc<StdMutex<usize>>,
    }

    impl ToneSink for CountingSink {
        fn schedule(&mut self, _time: f64, _frequency: f32, _duration: f64, _volume: f32) {
            *self.count.lock().unwrap() += 1;
        }
    }

    fn metronome_with_manual_clock() -> (Metronome, ManualClock, Arc<StdMutex<usize>>) {
        let clock = ManualClock::new();
        let sink = CountingSink::default();
        let count = Arc::clone(&sink.count);
        let metronome = Metronome::new(
            Box::new(clock.clone()),
            Box::new(sink),
            MetronomeCallbacks::default(),
        );
        (metronome, clock, count)
    }

    #[test]
    fn test_transport_state_transitions() {
        let (mut metronome, _clock, _count) = metronome_with_manual_clock();

        assert!(!metronome.is_playing());

        metronome.start();
        assert!(metronome.is_playing());

        metronome.pause();
        assert!(!metronome.is_playing());

        metronome.resume();
        assert!(metronome.is_playing());

        metronome.stop();
        assert!(!metronome.is_playing());
        assert_eq!(metronome.current_position(), PlaybackPosition { bar: 1, beat: 1 });
    }

    #[test]
    fn test_resume_without_pause_is_a_no_op() {
        let (mut metronome, _clock, _count) = metronome_with_manual_clock();
        metronome.resume();
        assert!(!metronome.is_playing());
    }

    #[test]
    fn test_settings_forwarding() {
        let (metronome, _clock, _count) = metronome_with_manual_clock();

        metronome.set_bpm(500.0);
        assert_eq!(metronome.settings().bpm(), 300.0);

        metronome
            .set_time_signature(7, 8)
            .expect("7/8 is a valid signature");
        assert_eq!(metronome.settings().time_signature().to_string(), "7/8");
        assert_eq!(metronome.settings().accents().len(), 7);

        assert!(metronome.set_time_signature(0, 4).is_err());

        metronome.set_swing(SubdivisionMode::TripletShuffle, true);
        assert!(metronome.settings().swing().enabled);

        metronome.set_muted(true);
        assert!(metronome.settings().muted());
    }

    #[test]
    fn test_first_click_scheduled_after_start() {
        let (mut metronome, _clock, count) = metronome_with_manual_clock();

        metronome.start();
        // The first poll commits the first click without any clock movement
        std::thread::sleep(std::time::Duration::from_millis(80));
        metronome.stop();

        assert!(*count.lock().unwrap() >= 1);
    }
}

// Lookahead scheduler - the core click state machine
//
// A coarse, jitter-prone poll drives a finer, bounded scheduling horizon:
// on every poll, all grid events falling inside the next SCHEDULE_AHEAD
// seconds are committed to the tone sink at exact audio-clock times. Event
// times come from musical arithmetic anchored to the audio clock, never from
// "now" at poll time, so timer jitter only changes how early an event is
// queued - not when it sounds. The horizon must exceed the worst-case poll
// delay plus one interval or events are missed.

use crate::audio::clock::{AudioClock, ClockState};
use crate::audio::tone::{ClickType, ToneParams, ToneSink};
use crate::metronome::meter::{BeatAccent, MetronomeSettings, PlaybackPosition, TimeSignature};
use crate::metronome::notify::{BeatNotification, NotificationQueue};
use crate::metronome::subdivision::{SubdivisionMode, subdivision_time};
use std::time::Duration;

/// Delay before the first click after start/resume, absorbing audio-graph
/// setup latency
pub const START_LATENCY: f64 = 0.05;

/// Cadence of the poll timer
pub const LOOKAHEAD_INTERVAL: Duration = Duration::from_millis(25);

/// Scheduling horizon: events inside this window are committed each poll
pub const SCHEDULE_AHEAD: f64 = 0.1;

/// Scheduler lifecycle
/// `Paused` is reachable only from `Running` and keeps a valid cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl SchedulerState {
    pub fn is_playing(&self) -> bool {
        matches!(self, SchedulerState::Running)
    }
}

/// Called once per logical beat, at the beat's audio-accurate instant
pub type BeatCallback = Box<dyn FnMut(PlaybackPosition, BeatAccent) + Send>;

/// Called on every bar rollover with the completed bar number
pub type BarCallback = Box<dyn FnMut(u32) + Send>;

/// Caller-supplied observers for visual feedback
pub struct MetronomeCallbacks {
    pub on_beat: BeatCallback,
    pub on_bar_complete: BarCallback,
}

impl Default for MetronomeCallbacks {
    fn default() -> Self {
        Self {
            on_beat: Box::new(|_, _| {}),
            on_bar_complete: Box::new(|_| {}),
        }
    }
}

pub struct LookaheadScheduler {
    clock: Box<dyn AudioClock>,
    sink: Box<dyn ToneSink>,
    settings: MetronomeSettings,
    state: SchedulerState,

    // Position cursor: bar is 1-based, beat and subdivision are 0-based
    current_bar: u32,
    current_beat: u32,
    current_subdivision: u32,

    // Audio-clock anchors (seconds). The beat anchor always sits on the last
    // exact beat boundary; subdivision offsets are applied to it rather than
    // accumulated, so no floating-point drift builds up over long sessions.
    beat_anchor_time: f64,
    next_event_time: f64,

    notifications: NotificationQueue,
    on_beat: BeatCallback,
    on_bar_complete: BarCallback,
}

impl LookaheadScheduler {
    pub fn new(
        clock: Box<dyn AudioClock>,
        sink: Box<dyn ToneSink>,
        callbacks: MetronomeCallbacks,
    ) -> Self {
        Self {
            clock,
            sink,
            settings: MetronomeSettings::default(),
            state: SchedulerState::Stopped,
            current_bar: 1,
            current_beat: 0,
            current_subdivision: 0,
            beat_anchor_time: 0.0,
            next_event_time: 0.0,
            notifications: NotificationQueue::new(),
            on_beat: callbacks.on_beat,
            on_bar_complete: callbacks.on_bar_complete,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Logical position as presented to the caller (1-based beat)
    pub fn position(&self) -> PlaybackPosition {
        PlaybackPosition {
            bar: self.current_bar,
            beat: self.current_beat + 1,
        }
    }

    pub fn settings(&self) -> &MetronomeSettings {
        &self.settings
    }

    // -- transport ---------------------------------------------------------

    /// Begin playback from bar 1, beat 1
    pub fn start(&mut self) {
        if self.clock.state() == ClockState::Suspended {
            self.clock.resume();
        }

        self.current_bar = 1;
        self.current_beat = 0;
        self.current_subdivision = 0;
        self.notifications.clear();

        let first_event = self.clock.now() + START_LATENCY;
        self.beat_anchor_time = first_event;
        self.next_event_time = first_event;

        self.state = SchedulerState::Running;
    }

    /// Freeze playback, preserving the cursor and clock anchors
    ///
    /// Armed notifications and tones already committed inside the horizon are
    /// not retracted; the suspended clock keeps them not-yet-due, so they
    /// fire at the correct instants after `resume`.
    pub fn pause(&mut self) {
        if self.state != SchedulerState::Running {
            return;
        }
        self.clock.suspend();
        self.state = SchedulerState::Paused;
    }

    /// Continue from the preserved cursor
    pub fn resume(&mut self) {
        if self.state != SchedulerState::Paused {
            return;
        }
        self.clock.resume();

        // Re-aim the next event a small latency ahead of now, shifting the
        // beat anchor by the same delta so the preserved cursor keeps its
        // place on a consistent grid
        let delta = (self.clock.now() + START_LATENCY) - self.next_event_time;
        self.next_event_time += delta;
        self.beat_anchor_time += delta;

        self.state = SchedulerState::Running;
    }

    /// Halt and rewind to bar 1, beat 1; idempotent
    /// Drops all armed notifications - nothing fires after `stop` returns.
    pub fn stop(&mut self) {
        self.clock.suspend();
        self.current_bar = 1;
        self.current_beat = 0;
        self.current_subdivision = 0;
        self.beat_anchor_time = 0.0;
        self.next_event_time = 0.0;
        self.notifications.clear();
        self.state = SchedulerState::Stopped;
    }

    /// One scheduling pass; invoked every `LOOKAHEAD_INTERVAL` while running
    pub fn poll(&mut self) {
        if self.state != SchedulerState::Running {
            return;
        }

        let now = self.clock.now();
        self.notifications.fire_due(now, &mut self.on_beat);

        while self.next_event_time < now + SCHEDULE_AHEAD {
            let event_time = self.next_event_time;
            self.emit(event_time);
            self.advance();
        }
    }

    // -- live configuration ------------------------------------------------
    // Mutations take effect from the next computed event; anything already
    // committed inside the horizon keeps its previously computed timing.

    pub fn set_bpm(&mut self, bpm: f64) {
        self.settings.set_bpm(bpm);
    }

    /// Replace the time signature; the live beat cursor is clamped back to
    /// the downbeat when it falls outside the new bar
    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.settings.set_time_signature(time_signature);
        if self.current_beat >= time_signature.beats {
            self.current_beat = 0;
        }
    }

    pub fn set_swing(&mut self, mode: SubdivisionMode, enabled: bool) {
        self.settings.set_swing(mode, enabled);
    }

    pub fn set_beat_accents(&mut self, accents: Vec<BeatAccent>) {
        self.settings.set_beat_accents(accents);
    }

    pub fn set_beat_accent(&mut self, beat: u32, accent: BeatAccent) {
        self.settings.set_beat_accent(beat, accent);
    }

    pub fn cycle_beat_accent(&mut self, beat: u32) {
        self.settings.cycle_beat_accent(beat);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.settings.set_muted(muted);
    }

    // -- internals ---------------------------------------------------------

    /// Commit the event under the cursor at `time`
    fn emit(&mut self, time: f64) {
        let accent = self.settings.accent_at(self.current_beat);
        let suppressed = self.settings.muted() || accent == BeatAccent::Mute;
        let on_the_beat = self.current_subdivision == 0;

        if !suppressed {
            let click = if on_the_beat {
                match accent {
                    BeatAccent::Accent => ClickType::Accent,
                    _ => ClickType::Normal,
                }
            } else {
                ClickType::Subdivision
            };
            let params = ToneParams::for_click(click);
            self.sink
                .schedule(time, params.frequency, params.duration, params.volume);
        }

        // Subdivision ticks never reach the UI callback
        if on_the_beat {
            self.notifications.push(BeatNotification {
                fire_time: time,
                position: self.position(),
                accent,
            });
        }
    }

    /// Step the cursor one grid slot and compute the next event time
    fn advance(&mut self) {
        let seconds_per_beat = self.settings.seconds_per_beat();
        let swing = self.settings.swing();
        let count = if swing.enabled {
            swing.mode.count() as u32
        } else {
            1
        };

        self.current_subdivision += 1;
        if self.current_subdivision >= count {
            self.current_subdivision = 0;
            self.current_beat += 1;
            if self.current_beat >= self.settings.time_signature().beats {
                self.current_beat = 0;
                (self.on_bar_complete)(self.current_bar);
                self.current_bar += 1;
            }
            self.beat_anchor_time += seconds_per_beat;
        }

        self.next_event_time = if swing.enabled {
            subdivision_time(
                self.beat_anchor_time,
                self.current_subdivision as usize,
                swing.mode,
                seconds_per_beat,
            )
        } else {
            self.beat_anchor_time
        };
    }
}

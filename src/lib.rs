// clicktrack - Library exports for tests and benchmarks

pub mod audio;
pub mod metronome;

// Re-export commonly used types for convenience
pub use audio::clock::{AudioClock, ClockState, ManualClock};
pub use audio::engine::{AudioError, AudioOutput, DeviceStatus, StreamClock, StreamToneSink};
pub use audio::tone::{ClickType, ToneParams, ToneSink};
pub use metronome::meter::{
    BeatAccent, BeatAccents, BPM_MAX, BPM_MIN, MeterError, MetronomeSettings, PlaybackPosition,
    SwingSettings, TimeSignature, default_accents,
};
pub use metronome::scheduler::{
    LookaheadScheduler, MetronomeCallbacks, SchedulerState, LOOKAHEAD_INTERVAL, SCHEDULE_AHEAD,
    START_LATENCY,
};
pub use metronome::subdivision::{SubdivisionMode, subdivision_time};
pub use metronome::training::{
    ClickSkipSettings, CountInSettings, TempoRampSettings, TrainingSettings,
};
pub use metronome::transport::Metronome;

// Metronome module - meter model, subdivision math, scheduler and transport

pub mod meter;
pub mod notify;
pub mod scheduler;
pub mod subdivision;
pub mod training;
pub mod transport;

pub use meter::{BeatAccent, BeatAccents, MetronomeSettings, PlaybackPosition, TimeSignature};
pub use scheduler::{LookaheadScheduler, MetronomeCallbacks, SchedulerState};
pub use subdivision::SubdivisionMode;
pub use transport::Metronome;

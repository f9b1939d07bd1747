// Tempo & meter model - BPM, time signature, swing and accent pattern
// All mutations sanitize by clamping or truncation; the only rejected input
// is a degenerate time signature

use crate::metronome::subdivision::SubdivisionMode;
use std::fmt;
use thiserror::Error;

/// Lowest usable tempo
pub const BPM_MIN: f64 = 20.0;
/// Highest usable tempo
pub const BPM_MAX: f64 = 300.0;

/// Meter validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeterError {
    #[error("Time signature must have at least one beat per bar")]
    InvalidBeats,

    #[error("Time signature note value must be at least 1")]
    InvalidNoteValue,
}

/// Time signature (beats per bar / note value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeSignature {
    pub beats: u32,
    pub note_value: u32,
}

impl TimeSignature {
    /// Creates a new time signature; zero beats or note value is rejected
    pub fn new(beats: u32, note_value: u32) -> Result<Self, MeterError> {
        if beats == 0 {
            return Err(MeterError::InvalidBeats);
        }
        if note_value == 0 {
            return Err(MeterError::InvalidNoteValue);
        }
        Ok(Self { beats, note_value })
    }

    /// Common 4/4 time signature
    pub fn four_four() -> Self {
        Self {
            beats: 4,
            note_value: 4,
        }
    }

    /// Common 3/4 time signature (waltz)
    pub fn three_four() -> Self {
        Self {
            beats: 3,
            note_value: 4,
        }
    }

    /// Common 6/8 time signature
    pub fn six_eight() -> Self {
        Self {
            beats: 6,
            note_value: 8,
        }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.note_value)
    }
}

/// Per-beat click classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeatAccent {
    /// Beat is skipped entirely (no tone; the UI callback still fires)
    Mute,
    Normal,
    Accent,
}

impl BeatAccent {
    /// Next accent in the edit cycle Normal -> Accent -> Mute -> Normal
    pub fn cycled(self) -> Self {
        match self {
            BeatAccent::Normal => BeatAccent::Accent,
            BeatAccent::Accent => BeatAccent::Mute,
            BeatAccent::Mute => BeatAccent::Normal,
        }
    }
}

/// Accent pattern, one entry per beat of the bar
pub type BeatAccents = Vec<BeatAccent>;

/// Freshly generated pattern: accent on the downbeat, the rest normal
pub fn default_accents(beats: u32) -> BeatAccents {
    let mut accents = vec![BeatAccent::Normal; beats as usize];
    if let Some(first) = accents.first_mut() {
        *first = BeatAccent::Accent;
    }
    accents
}

/// Swing configuration
/// Disabled swing is equivalent to the single-offset straight table `[0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SwingSettings {
    pub enabled: bool,
    pub mode: SubdivisionMode,
}

impl Default for SwingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: SubdivisionMode::SixteenthSwing,
        }
    }
}

/// Logical playback position, 1-based as presented to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlaybackPosition {
    /// Bar number (1-based)
    pub bar: u32,
    /// Beat within the bar (1-based, in `[1, beats]`)
    pub beat: u32,
}

impl fmt::Display for PlaybackPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.bar, self.beat)
    }
}

/// The complete tempo & meter model
///
/// Fields stay private so the invariants hold at every mutation boundary:
/// BPM is never stored out of `[BPM_MIN, BPM_MAX]` and the accent pattern
/// length always equals `time_signature.beats`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MetronomeSettings {
    bpm: f64,
    time_signature: TimeSignature,
    swing: SwingSettings,
    accents: BeatAccents,
    muted: bool,
}

impl MetronomeSettings {
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Stores `clamp(bpm, 20, 300)`; out-of-range values are never rejected
    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm.clamp(BPM_MIN, BPM_MAX);
    }

    /// Duration of one beat in seconds
    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    /// Replace the time signature and resize the accent pattern to the new
    /// bar length, preserving existing entries by index and filling new
    /// slots with `Normal`
    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
        self.accents
            .resize(time_signature.beats as usize, BeatAccent::Normal);
    }

    pub fn swing(&self) -> SwingSettings {
        self.swing
    }

    pub fn set_swing(&mut self, mode: SubdivisionMode, enabled: bool) {
        self.swing = SwingSettings { enabled, mode };
    }

    pub fn accents(&self) -> &[BeatAccent] {
        &self.accents
    }

    /// Accent for a 0-based beat index; `Normal` when out of range
    /// (tolerates a cursor briefly ahead of a mid-resize pattern)
    pub fn accent_at(&self, beat: u32) -> BeatAccent {
        self.accents
            .get(beat as usize)
            .copied()
            .unwrap_or(BeatAccent::Normal)
    }

    /// Replace the whole pattern; length is normalized to the bar length
    pub fn set_beat_accents(&mut self, accents: BeatAccents) {
        self.accents = accents;
        self.accents
            .resize(self.time_signature.beats as usize, BeatAccent::Normal);
    }

    /// Set a single beat's accent; out-of-range indices are ignored
    pub fn set_beat_accent(&mut self, beat: u32, accent: BeatAccent) {
        if let Some(slot) = self.accents.get_mut(beat as usize) {
            *slot = accent;
        }
    }

    /// Step one beat through the edit cycle Normal -> Accent -> Mute
    pub fn cycle_beat_accent(&mut self, beat: u32) {
        if let Some(slot) = self.accents.get_mut(beat as usize) {
            *slot = slot.cycled();
        }
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

impl Default for MetronomeSettings {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            time_signature: TimeSignature::four_four(),
            swing: SwingSettings::default(),
            accents: default_accents(4),
            muted: false,
        }
    }
}

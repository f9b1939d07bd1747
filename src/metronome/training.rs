// Training configuration shapes - count-in, click-skip, tempo-ramp
//
// Declared for callers and persistence, but not consumed by the scheduler.
// Wiring them into the poll loop is the designated extension point.

use crate::metronome::meter::TimeSignature;

/// Count-in before playback proper
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CountInSettings {
    pub enabled: bool,
    /// Count-in length in bars (1 or 2 in practice)
    pub bars: u32,
}

impl CountInSettings {
    /// Number of count-in beats for a given meter
    pub fn total_beats(&self, time_signature: TimeSignature) -> u32 {
        self.bars * time_signature.beats
    }
}

impl Default for CountInSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            bars: 1,
        }
    }
}

/// Alternate audible and silent bars to train internal tempo
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClickSkipSettings {
    pub enabled: bool,
    pub play_bars: u32,
    pub mute_bars: u32,
}

impl Default for ClickSkipSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            play_bars: 4,
            mute_bars: 4,
        }
    }
}

/// Gradually raise the tempo over the course of a session
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TempoRampSettings {
    pub enabled: bool,
    pub increment_bpm: f64,
    pub every_bars: u32,
    pub max_bpm: f64,
}

impl Default for TempoRampSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            increment_bpm: 5.0,
            every_bars: 8,
            max_bpm: 200.0,
        }
    }
}

/// All training options
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct TrainingSettings {
    pub count_in: CountInSettings,
    pub click_skip: ClickSkipSettings,
    pub tempo_ramp: TempoRampSettings,
}

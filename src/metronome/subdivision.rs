// Subdivision timing tables - within-beat offsets for swing feel
//
// Each mode carries its canonical table of normalized offsets (fraction of a
// beat, first entry always 0). The enum replaces string-keyed lookups so a
// new mode cannot silently fall back to a default table.

/// Swing/subdivision mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubdivisionMode {
    /// Four even sixteenths
    Straight,
    /// Two slots per beat, the second on the last triplet
    TripletShuffle,
    /// Four slots with the 2nd and 4th pushed late
    SixteenthSwing,
}

impl SubdivisionMode {
    /// Ordered normalized offsets within one beat
    pub fn offsets(self) -> &'static [f64] {
        match self {
            SubdivisionMode::Straight => &[0.0, 0.25, 0.5, 0.75],
            SubdivisionMode::TripletShuffle => &[0.0, 2.0 / 3.0],
            SubdivisionMode::SixteenthSwing => &[0.0, 1.0 / 3.0, 0.5, 5.0 / 6.0],
        }
    }

    /// Number of click slots per beat
    pub fn count(self) -> usize {
        self.offsets().len()
    }
}

/// Absolute audio-clock time of one subdivision slot
///
/// The offset is always applied to the beat anchor, never accumulated, so
/// repeated fractional addition cannot drift over long sessions.
pub fn subdivision_time(
    beat_anchor: f64,
    subdivision_index: usize,
    mode: SubdivisionMode,
    seconds_per_beat: f64,
) -> f64 {
    let offsets = mode.offsets();
    beat_anchor + offsets[subdivision_index % offsets.len()] * seconds_per_beat
}

// Click tones - fixed timbre table and the sink the scheduler emits into

/// Click timbre selected per grid event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// Click on an accented beat (downbeat by default)
    Accent,
    /// Click on other beats
    Normal,
    /// Softer click on swing/subdivision slots between beats
    Subdivision,
}

/// Fixed synthesis parameters for one click timbre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneParams {
    pub frequency: f32,
    /// Pulse length in seconds
    pub duration: f64,
    /// Peak volume in [0, 1]
    pub volume: f32,
}

impl ToneParams {
    /// Timbre table: higher and louder for accents, short and quiet for
    /// subdivision ticks
    pub fn for_click(click: ClickType) -> Self {
        match click {
            ClickType::Accent => Self {
                frequency: 880.0,
                duration: 0.05,
                volume: 1.0,
            },
            ClickType::Normal => Self {
                frequency: 440.0,
                duration: 0.03,
                volume: 0.7,
            },
            ClickType::Subdivision => Self {
                frequency: 330.0,
                duration: 0.02,
                volume: 0.35,
            },
        }
    }
}

/// Future-timed tone requests, fire-and-forget
///
/// `schedule` must never block: the implementation queues the request for an
/// opaque rendering subsystem and returns immediately. There is no completion
/// signal and no retraction.
pub trait ToneSink: Send {
    /// Schedule a pulse at an absolute audio-clock time (seconds)
    fn schedule(&mut self, time: f64, frequency: f32, duration: f64, volume: f32);
}

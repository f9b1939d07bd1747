// Audio timing - shared sample counter between the audio callback and control side

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared audio timing state
/// The callback advances the counter; every other thread only reads it.
#[derive(Clone)]
pub struct AudioTiming {
    /// Current sample position (incremented by audio callback)
    sample_position: Arc<AtomicU64>,
    /// Sample rate (for timestamp conversions)
    sample_rate: f64,
}

impl AudioTiming {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_position: Arc::new(AtomicU64::new(0)),
            sample_rate: sample_rate as f64,
        }
    }

    /// Get current sample position (called from the control side)
    pub fn current_sample(&self) -> u64 {
        self.sample_position.load(Ordering::Relaxed)
    }

    /// Advance sample position (called from audio callback)
    pub fn advance(&self, frames: usize) {
        self.sample_position
            .fetch_add(frames as u64, Ordering::Relaxed);
    }

    /// Current position expressed in seconds on the audio clock
    pub fn current_seconds(&self) -> f64 {
        self.current_sample() as f64 / self.sample_rate
    }

    /// Convert an audio-clock timestamp in seconds to a sample count
    /// Negative timestamps map to sample 0 (event in the past, play immediately)
    pub fn seconds_to_samples(&self, seconds: f64) -> u64 {
        if seconds <= 0.0 {
            return 0;
        }
        (seconds * self.sample_rate) as u64
    }

    /// Get sample rate
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate as f32
    }
}

// Audio clock - sample position advanced by the output callback

use crate::timebase::Seconds;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared sample counter; the audio thread advances it, everyone else reads
#[derive(Clone, Debug)]
pub struct AudioClock {
    sample_position: Arc<AtomicU64>,
    sample_rate: f64,
}

impl AudioClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_position: Arc::new(AtomicU64::new(0)),
            sample_rate: sample_rate.max(1.0) as f64,
        }
    }

    /// Current sample position (any thread)
    pub fn current_sample(&self) -> u64 {
        self.sample_position.load(Ordering::Relaxed)
    }

    /// Advance by one callback's worth of frames (audio thread)
    pub fn advance(&self, frames: usize) {
        self.sample_position
            .fetch_add(frames as u64, Ordering::Relaxed);
    }

    pub fn now(&self) -> Seconds {
        Seconds(self.current_sample() as f64 / self.sample_rate)
    }

    /// Sample index of an audio-clock instant; negative instants map to 0
    pub fn seconds_to_sample(&self, at: Seconds) -> u64 {
        let samples = at.value() * self.sample_rate;
        if samples.is_finite() && samples > 0.0 {
            samples.round() as u64
        } else {
            0
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate as f32
    }
}

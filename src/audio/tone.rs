// Tone table - scheduled sine tones mixed by the output callback

use std::f32::consts::PI;

/// Upper bound on simultaneously scheduled tones
pub const MAX_TONES: usize = 1024;

/// Attack/release shape applied to every tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneEnvelope {
    /// Attack time in seconds
    pub attack: f32,
    /// Release time in seconds, after the tone's duration
    pub release: f32,
}

impl Default for ToneEnvelope {
    fn default() -> Self {
        Self {
            attack: 0.01,
            release: 0.2,
        }
    }
}

/// One note as the audio thread sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledTone {
    /// Owning voice; disposing the voice cancels its tones
    pub voice: u64,
    pub start_sample: u64,
    /// Sample the release begins at
    pub release_sample: u64,
    pub frequency_hz: f32,
}

#[derive(Debug, Clone, Copy)]
struct ActiveTone {
    tone: ScheduledTone,
    phase: f32,
    phase_increment: f32,
}

/// Pre-allocated set of tones; mixing never allocates
pub struct ToneTable {
    tones: Vec<ActiveTone>,
    sample_rate: f32,
    attack_samples: f32,
    release_samples: f32,
}

impl ToneTable {
    pub fn new(sample_rate: f32, envelope: ToneEnvelope) -> Self {
        let sample_rate = sample_rate.max(1.0);
        Self {
            tones: Vec::with_capacity(MAX_TONES),
            sample_rate,
            attack_samples: (envelope.attack * sample_rate).max(1.0),
            release_samples: (envelope.release * sample_rate).max(1.0),
        }
    }

    /// Adds a tone; false if the table is full
    pub fn schedule(&mut self, tone: ScheduledTone) -> bool {
        if self.tones.len() >= MAX_TONES {
            return false;
        }
        self.tones.push(ActiveTone {
            tone,
            phase: 0.0,
            phase_increment: tone.frequency_hz / self.sample_rate,
        });
        true
    }

    /// Drops every tone of `voice`, sounding or not
    pub fn cancel_voice(&mut self, voice: u64) -> usize {
        let before = self.tones.len();
        self.tones.retain(|t| t.tone.voice != voice);
        before - self.tones.len()
    }

    /// Mixes the sample at `position` and advances every sounding tone
    pub fn next_sample(&mut self, position: u64) -> f32 {
        let mut mix = 0.0;
        for active in &mut self.tones {
            let gain = envelope_at(
                &active.tone,
                position,
                self.attack_samples,
                self.release_samples,
            );
            if gain <= 0.0 {
                continue;
            }
            mix += (active.phase * 2.0 * PI).sin() * gain;
            active.phase += active.phase_increment;
            if active.phase >= 1.0 {
                active.phase -= 1.0;
            }
        }
        mix
    }

    /// Removes tones whose release finished before `position`
    pub fn prune(&mut self, position: u64) {
        let release = self.release_samples as u64;
        self.tones
            .retain(|t| position < t.tone.release_sample.saturating_add(release));
    }

    pub fn len(&self) -> usize {
        self.tones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tones.is_empty()
    }

    pub fn voice_tones(&self, voice: u64) -> usize {
        self.tones.iter().filter(|t| t.tone.voice == voice).count()
    }
}

/// Linear attack up to 1.0, hold, then linear release to 0.0
fn envelope_at(tone: &ScheduledTone, position: u64, attack: f32, release: f32) -> f32 {
    if position < tone.start_sample {
        return 0.0;
    }
    let since_start = (position - tone.start_sample) as f32;
    let level = (since_start / attack).min(1.0);

    if position < tone.release_sample {
        level
    } else {
        let since_release = (position - tone.release_sample) as f32;
        let held = ((tone.release_sample.saturating_sub(tone.start_sample)) as f32 / attack).min(1.0);
        (held * (1.0 - since_release / release)).max(0.0)
    }
}

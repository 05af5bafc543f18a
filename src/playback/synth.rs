// Synth contract - what the scheduler needs from a synthesis engine

use crate::error::SynthError;
use crate::timebase::Seconds;

/// A voice that plays scheduled notes until disposed
pub trait SynthVoice {
    /// Plays `frequency_hz` for `duration` starting at audio-clock instant `at`
    fn trigger_attack_release(&mut self, frequency_hz: f64, duration: Seconds, at: Seconds);

    /// Silences the voice and cancels everything it still has scheduled
    fn dispose(&mut self);
}

/// Audio clock plus voice factory
pub trait SynthBackend {
    type Voice: SynthVoice;

    /// Unlocks audio output; called once per user gesture
    fn start(&mut self) -> Result<(), SynthError>;

    /// Current audio-clock instant
    fn now(&self) -> Seconds;

    fn create_voice(&mut self) -> Result<Self::Voice, SynthError>;
}

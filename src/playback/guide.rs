// Guide output contract - what the guide transport needs to make sound

use crate::error::SynthError;
use crate::timebase::Seconds;
use crate::waveform::MonoAudio;
use std::sync::Arc;

/// Plays one decoded guide at a time
pub trait GuideOutput {
    /// Replaces the guide; output is paused at the start afterwards
    fn load(&mut self, audio: Arc<MonoAudio>);

    /// Starts (or restarts) playback at `from`; opens the device if needed
    fn play(&mut self, from: Seconds) -> Result<(), SynthError>;

    fn pause(&mut self);

    /// Where the output is and whether it is still sounding
    fn position(&self) -> (Seconds, bool);
}

// Module audio - CPAL backend for the melody preview and the guide

pub mod clock;
pub mod engine;
pub mod guide;
pub mod tone;

pub use clock::AudioClock;
pub use engine::{CpalSynth, CpalVoice};
pub use guide::{CpalGuideOutput, GuideCursor};
pub use tone::{ScheduledTone, ToneEnvelope, ToneTable};

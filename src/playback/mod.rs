// Playback module - Melody preview scheduling
// Note events are scheduled against the synth's audio clock, one session at a time

pub mod guide;
pub mod note;
pub mod scheduler;
pub mod synth;

pub use guide::GuideOutput;
pub use note::NoteEvent;
pub use scheduler::{COMPLETION_SLACK, MelodyScheduler, PlayOutcome, ScheduledTrigger, SessionId};
pub use synth::{SynthBackend, SynthVoice};

// Lyric Studio - Library exports for tests and benchmarks

pub mod audio;
pub mod config;
pub mod error;
pub mod generation;
pub mod lane;
pub mod lazy;
pub mod messaging;
pub mod piano_roll;
pub mod playback;
pub mod regions;
pub mod session;
pub mod timebase;
pub mod ui;
pub mod waveform;

// Re-export commonly used types for convenience
pub use config::StudioConfig;
pub use error::{ConfigError, GenerationError, RendererError, StudioError, SynthError};
pub use generation::{GenerationClient, GenerationRequest, GenerationResult, Key, PreviewForm, Style};
pub use lane::{Timeline, WaveformLane};
pub use messaging::{Notifier, create_notification_channel};
pub use piano_roll::{PianoRollLayout, PianoRollProjector};
pub use playback::{GuideOutput, MelodyScheduler, NoteEvent, PlayOutcome, SynthBackend, SynthVoice};
pub use regions::{LyricLine, RegionSet, TimeRegion};
pub use session::{GuidePlayer, PreviewDialog, StudioSession};
pub use timebase::{Millis, Ntu, NtuMode, NtuRate, Seconds};

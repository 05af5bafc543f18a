// Note representation for generated melodies
// Pitch plus start/duration in native time units

use crate::timebase::{Ntu, NtuRate, Seconds};
use serde::{Deserialize, Serialize};

/// A generated note: `{midi, time, duration}` on the wire
///
/// `time` and `duration` are native time units; convert with an [`NtuRate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI note number (0-127, where 60 = C4)
    pub midi: u8,
    /// Start, in native time units
    pub time: f64,
    /// Length, in native time units
    pub duration: f64,
}

impl NoteEvent {
    pub fn new(midi: u8, time: f64, duration: f64) -> Self {
        Self {
            midi,
            time,
            duration,
        }
    }

    /// MIDI range, non-negative start, positive length
    pub fn is_valid(&self) -> bool {
        self.midi <= 127
            && self.time.is_finite()
            && self.time >= 0.0
            && self.duration.is_finite()
            && self.duration > 0.0
    }

    pub fn start(&self) -> Ntu {
        Ntu(self.time)
    }

    pub fn length(&self) -> Ntu {
        Ntu(self.duration)
    }

    /// time + duration
    pub fn end(&self) -> Ntu {
        Ntu(self.time + self.duration)
    }

    pub fn start_seconds(&self, rate: NtuRate) -> Seconds {
        self.start().to_seconds(rate)
    }

    pub fn duration_seconds(&self, rate: NtuRate) -> Seconds {
        self.length().to_seconds(rate)
    }

    /// Get the note name (e.g., "C4", "A#5")
    pub fn note_name(&self) -> String {
        const NOTE_NAMES: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];

        let octave = (self.midi / 12) as i32 - 1;
        let note_index = (self.midi % 12) as usize;

        format!("{}{}", NOTE_NAMES[note_index], octave)
    }
}

/// Latest `time + duration` over valid notes, zero for an empty sequence
pub fn sequence_end(notes: &[NoteEvent]) -> Ntu {
    Ntu(notes
        .iter()
        .filter(|n| n.is_valid())
        .map(|n| n.end().value())
        .fold(0.0, f64::max))
}

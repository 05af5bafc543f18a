// Piano roll projection - notes to drawable rectangles
// Pure geometry; shares the NTU time axis with the playback scheduler

use crate::playback::note::{NoteEvent, sequence_end};
use serde::{Deserialize, Serialize};

/// Rectangle in roll-local pixels (origin top-left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Projection result
#[derive(Debug, Clone, PartialEq)]
pub struct PianoRollLayout {
    pub width: f32,
    pub height: f32,
    /// Visible duration in native time units
    pub visible_units: u32,
    /// x of one vertical grid line per time unit, both edges included
    pub grid_lines: Vec<f32>,
    /// One rectangle per input note, same order
    pub rects: Vec<NoteRect>,
}

/// Geometry of the piano roll
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PianoRollProjector {
    pub min_midi: u8,
    pub max_midi: u8,
    /// Horizontal density (pixels per native time unit)
    pub pixels_per_unit: f32,
    pub height: f32,
    pub note_height: f32,
    pub min_width: f32,
    /// Gap trimmed off each note so neighbours stay distinct
    pub gap: f32,
    /// Vertical padding above the highest and below the lowest pitch
    pub padding: f32,
    /// Shortest visible duration in native time units
    pub min_visible_units: u32,
}

impl Default for PianoRollProjector {
    fn default() -> Self {
        Self {
            min_midi: 48,
            max_midi: 84,
            pixels_per_unit: 40.0,
            height: 12.0 * 16.0,
            note_height: 12.0,
            min_width: 4.0,
            gap: 2.0,
            padding: 10.0,
            min_visible_units: 8,
        }
    }
}

impl PianoRollProjector {
    /// Visible duration: `ceil(max(time + duration))`, at least `min_visible_units`
    pub fn visible_units(&self, notes: &[NoteEvent]) -> u32 {
        let end = sequence_end(notes).value().ceil();
        let end = if end.is_finite() && end > 0.0 {
            end.min(u32::MAX as f64) as u32
        } else {
            0
        };
        end.max(self.min_visible_units)
    }

    /// y of a pitch; out-of-window pitches sit on the window edge
    pub fn pitch_to_y(&self, midi: u8) -> f32 {
        let (low, high) = self.window();
        let range = (high - low).max(1) as f32;
        let clamped = midi.clamp(low, high);
        (high - clamped) as f32 / range * (self.height - 2.0 * self.padding) + self.padding
    }

    pub fn project(&self, notes: &[NoteEvent]) -> PianoRollLayout {
        let visible_units = self.visible_units(notes);
        let width = visible_units as f32 * self.pixels_per_unit;

        let grid_lines = (0..=visible_units)
            .map(|i| i as f32 * self.pixels_per_unit)
            .collect();

        let rects = notes
            .iter()
            .map(|note| NoteRect {
                x: note.time as f32 * self.pixels_per_unit,
                y: self.pitch_to_y(note.midi),
                width: (note.duration as f32 * self.pixels_per_unit - self.gap).max(self.min_width),
                height: self.note_height,
            })
            .collect();

        PianoRollLayout {
            width,
            height: self.height,
            visible_units,
            grid_lines,
            rects,
        }
    }

    /// Pitch window with bounds in order even if configured backwards
    fn window(&self) -> (u8, u8) {
        if self.min_midi <= self.max_midi {
            (self.min_midi, self.max_midi)
        } else {
            (self.max_midi, self.min_midi)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sequence_uses_minimum_width() {
        let projector = PianoRollProjector::default();
        let layout = projector.project(&[]);

        assert_eq!(layout.visible_units, 8);
        assert_eq!(layout.width, 320.0);
        assert_eq!(layout.grid_lines.len(), 9);
        assert!(layout.rects.is_empty());
    }

    #[test]
    fn test_long_sequence_extends_width() {
        let projector = PianoRollProjector::default();
        let notes = vec![NoteEvent::new(60, 9.0, 1.5)];
        assert_eq!(projector.visible_units(&notes), 11);
    }

    #[test]
    fn test_note_geometry() {
        let projector = PianoRollProjector::default();
        let layout = projector.project(&[NoteEvent::new(84, 1.0, 0.5), NoteEvent::new(48, 2.0, 0.05)]);

        // Top of the window sits on the padding
        assert_eq!(layout.rects[0], NoteRect {
            x: 40.0,
            y: 10.0,
            width: 18.0,
            height: 12.0,
        });

        // Bottom of the window, and a tiny note clamped to the minimum width
        assert_eq!(layout.rects[1].y, 182.0);
        assert_eq!(layout.rects[1].width, 4.0);
    }

    #[test]
    fn test_higher_pitch_is_higher_on_screen() {
        let projector = PianoRollProjector::default();
        assert!(projector.pitch_to_y(72) < projector.pitch_to_y(60));
        assert_eq!(projector.pitch_to_y(66), 96.0);
    }

    #[test]
    fn test_out_of_window_pitches_clamped_not_dropped() {
        let projector = PianoRollProjector::default();
        let layout = projector.project(&[NoteEvent::new(20, 0.0, 1.0), NoteEvent::new(110, 0.0, 1.0)]);

        assert_eq!(layout.rects.len(), 2);
        assert_eq!(layout.rects[0].y, projector.pitch_to_y(48));
        assert_eq!(layout.rects[1].y, projector.pitch_to_y(84));
    }
}

// Piano roll view - draws a projected layout, read-only

use crate::piano_roll::PianoRollLayout;
use egui::{Color32, Pos2, Rect, Sense, Ui, Vec2};

const BACKGROUND: Color32 = Color32::from_gray(30);
const GRID: Color32 = Color32::from_gray(55);
const NOTE_FILL: Color32 = Color32::from_rgb(100, 150, 255);
const PLAYHEAD: Color32 = Color32::from_rgb(255, 200, 100);

/// Draws `layout`; `playhead` is in the layout's pixel space
pub fn show(ui: &mut Ui, layout: &PianoRollLayout, playhead: Option<f32>) {
    egui::ScrollArea::horizontal()
        .auto_shrink([false, true])
        .show(ui, |ui| {
            let (response, painter) =
                ui.allocate_painter(Vec2::new(layout.width, layout.height), Sense::hover());
            let rect = response.rect;

            painter.rect_filled(rect, 0.0, BACKGROUND);

            for x in &layout.grid_lines {
                let x = rect.left() + x;
                painter.line_segment(
                    [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
                    (1.0, GRID),
                );
            }

            for note in &layout.rects {
                let min = rect.min + Vec2::new(note.x, note.y);
                let note_rect = Rect::from_min_size(min, Vec2::new(note.width, note.height));
                painter.rect_filled(note_rect, 2.0, NOTE_FILL);
                painter.rect_stroke(note_rect, 2.0, (1.0, Color32::from_gray(150)));
            }

            if let Some(x) = playhead
                && x.is_finite()
                && (0.0..=layout.width).contains(&x)
            {
                let x = rect.left() + x;
                painter.line_segment(
                    [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
                    (2.0, PLAYHEAD),
                );
            }
        });
}

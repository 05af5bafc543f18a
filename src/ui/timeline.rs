// Timeline view - one waveform strip per lane with draggable lyric regions

use crate::lane::renderer::RegionSpec;
use crate::lane::timeline::Timeline;
use crate::lane::waveform_lane::{LaneId, WaveformLane};
use crate::regions::RegionId;
use crate::timebase::Seconds;
use crate::waveform::{PeakRenderer, PeakRendererFactory, WaveformPeaks};
use egui::{Color32, Id, Pos2, Rect, Sense, Ui, Vec2};

const HANDLE_WIDTH: f32 = 6.0;
const WAVE_COLOR: Color32 = Color32::from_rgb(120, 180, 160);
const REGION_FILL: Color32 = Color32::from_rgba_premultiplied(60, 90, 160, 90);
const REGION_ACTIVE: Color32 = Color32::from_rgba_premultiplied(200, 150, 60, 110);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Move,
    ResizeStart,
    ResizeEnd,
}

#[derive(Debug, Clone, Copy)]
struct ActiveDrag {
    lane: LaneId,
    region: RegionId,
    mode: DragMode,
}

/// Draws every lane and turns pointer gestures into renderer drags
#[derive(Default)]
pub struct TimelineView {
    drag: Option<ActiveDrag>,
}

impl TimelineView {
    pub fn show(&mut self, ui: &mut Ui, timeline: &mut Timeline<PeakRendererFactory>, lane_height: f32) {
        if timeline.is_empty() {
            ui.label("No audio to show yet");
            return;
        }

        // A lane disposed mid-gesture leaves nothing to release
        if let Some(active) = self.drag
            && timeline
                .lane(active.lane)
                .and_then(|lane| lane.renderer())
                .and_then(|renderer| renderer.dragging())
                != Some(active.region)
        {
            self.drag = None;
        }

        for lane in timeline.lanes_mut() {
            ui.horizontal(|ui| {
                ui.strong(lane.title());
                if lane.is_authoritative() {
                    ui.weak("(lyric regions)");
                }
                if lane.shows_loading_indicator() {
                    ui.spinner();
                }
            });
            self.show_lane(ui, lane, lane_height);
            ui.add_space(6.0);
        }
    }

    fn show_lane(&mut self, ui: &mut Ui, lane: &mut WaveformLane<PeakRenderer>, height: f32) {
        let width = ui.available_width().max(100.0);
        let (response, painter) = ui.allocate_painter(Vec2::new(width, height), Sense::hover());
        let rect = response.rect;
        painter.rect_filled(rect, 2.0, Color32::from_gray(25));

        if lane.is_unavailable() {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Waveform unavailable",
                egui::FontId::proportional(14.0),
                Color32::from_gray(140),
            );
            return;
        }

        let Some(duration) = lane.duration().filter(|d| d.value() > 0.0) else {
            return;
        };
        let lane_id = lane.id();
        let Some(renderer) = lane.renderer_mut() else {
            return;
        };

        if let Some(peaks) = renderer.peaks() {
            draw_peaks(&painter, rect, peaks);
        }

        let px_per_second = rect.width() as f64 / duration.value();
        let overlays: Vec<RegionSpec> = renderer.regions().collect();

        for spec in overlays {
            let x0 = rect.left() + (spec.start.value() * px_per_second) as f32;
            let x1 = rect.left() + (spec.end.value() * px_per_second) as f32;
            let region_rect = Rect::from_min_max(Pos2::new(x0, rect.top()), Pos2::new(x1.max(x0 + 1.0), rect.bottom()));

            let dragging = renderer.dragging() == Some(spec.id);
            painter.rect_filled(region_rect, 2.0, if dragging { REGION_ACTIVE } else { REGION_FILL });
            painter.text(
                region_rect.left_top() + Vec2::new(4.0, 4.0),
                egui::Align2::LEFT_TOP,
                &spec.line_text,
                egui::FontId::proportional(11.0),
                Color32::WHITE,
            );

            if !spec.drag && !spec.resize {
                continue;
            }

            let id = Id::new(("lyric_region", lane_id, spec.id));
            let handle = ui.interact(region_rect, id, Sense::drag());

            if handle.drag_started() && self.drag.is_none() {
                let mode = handle
                    .interact_pointer_pos()
                    .map(|pos| drag_mode_at(pos.x, region_rect, spec.resize))
                    .unwrap_or(DragMode::Move);
                if (mode != DragMode::Move || spec.drag) && renderer.begin_drag(spec.id) {
                    self.drag = Some(ActiveDrag {
                        lane: lane_id,
                        region: spec.id,
                        mode,
                    });
                }
            }

            if let Some(active) = self.drag
                && active.lane == lane_id
                && active.region == spec.id
            {
                if handle.dragged() {
                    let delta = Seconds(handle.drag_delta().x as f64 / px_per_second);
                    let (start, end) = match active.mode {
                        DragMode::Move => (spec.start + delta, spec.end + delta),
                        DragMode::ResizeStart => (spec.start + delta, spec.end),
                        DragMode::ResizeEnd => (spec.start, spec.end + delta),
                    };
                    renderer.drag_to(start, end);
                }
                if handle.drag_stopped() {
                    renderer.end_drag();
                    self.drag = None;
                }
            }
        }
    }
}

fn drag_mode_at(x: f32, rect: Rect, resizable: bool) -> DragMode {
    if !resizable {
        DragMode::Move
    } else if x <= rect.left() + HANDLE_WIDTH {
        DragMode::ResizeStart
    } else if x >= rect.right() - HANDLE_WIDTH {
        DragMode::ResizeEnd
    } else {
        DragMode::Move
    }
}

fn draw_peaks(painter: &egui::Painter, rect: Rect, peaks: &WaveformPeaks) {
    if peaks.is_empty() {
        return;
    }
    let step = rect.width() / peaks.len() as f32;
    let mid = rect.center().y;
    let half = rect.height() / 2.0;

    for (i, (low, high)) in peaks.min.iter().zip(&peaks.max).enumerate() {
        let x = rect.left() + i as f32 * step;
        painter.line_segment(
            [
                Pos2::new(x, mid - high.clamp(-1.0, 1.0) * half),
                Pos2::new(x, mid - low.clamp(-1.0, 1.0) * half),
            ],
            (step.max(1.0), WAVE_COLOR),
        );
    }
}

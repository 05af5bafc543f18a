// Main UI App - lyrics form, timeline, melody preview and status bar

use crate::audio::{CpalGuideOutput, CpalSynth};
use crate::config::StudioConfig;
use crate::error::GenerationError;
use crate::generation::{GenerationClient, GenerationResult, Key, PreviewForm, Style};
use crate::generation::payload::{MAX_TEMPO, MIN_TEMPO};
use crate::lane::renderer::{AudioSource, RendererConfig};
use crate::lane::timeline::TrackSource;
use crate::messaging::{
    Notification, NotificationCategory, NotificationConsumer, NotificationLevel, Notifier,
};
use crate::playback::PlayOutcome;
use crate::session::{DEMO_LYRICS, GuidePlayer, PreviewDialog, StudioSession};
use crate::timebase::Seconds;
use crate::ui::{piano_roll, timeline::TimelineView};
use crate::waveform::PeakRendererFactory;
use eframe::egui;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapRb};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

type GenerationOutcome = Result<GenerationResult, GenerationError>;

pub struct StudioApp {
    config: StudioConfig,
    form: PreviewForm,
    client: Arc<dyn GenerationClient>,
    pending: Option<HeapCons<GenerationOutcome>>,
    session: StudioSession<PeakRendererFactory>,
    dialog: PreviewDialog<CpalSynth>,
    guide_player: GuidePlayer,
    timeline_view: TimelineView,
    new_track: String,
    last_frame: Option<Instant>,
    // Notification system
    notifier: Notifier,
    notification_rx: NotificationConsumer,
    notification_queue: VecDeque<Notification>,
    max_notifications: usize,
}

impl StudioApp {
    pub fn new(
        config: StudioConfig,
        client: Arc<dyn GenerationClient>,
        notifier: Notifier,
        notification_rx: NotificationConsumer,
    ) -> Self {
        let form = PreviewForm::new(
            DEMO_LYRICS,
            config.default_tempo,
            config.default_key,
            config.default_style,
        );

        let renderer_config = RendererConfig {
            height: config.lane_height,
            ..RendererConfig::default()
        };
        let session = StudioSession::new(PeakRendererFactory, renderer_config, notifier.clone());

        let synth_gain = config.synth_gain;
        let synth_notifier = notifier.clone();
        let dialog = PreviewDialog::new(
            move || Ok(CpalSynth::new(synth_gain, synth_notifier.clone())),
            config.piano_roll,
            config.ntu_mode,
            config.completion_slack(),
        );

        let guide_player = GuidePlayer::with_output(Box::new(CpalGuideOutput::new(
            config.guide_gain,
            notifier.clone(),
        )));

        Self {
            config,
            form,
            client,
            pending: None,
            session,
            dialog,
            guide_player,
            timeline_view: TimelineView::default(),
            new_track: String::new(),
            last_frame: None,
            notifier,
            notification_rx,
            notification_queue: VecDeque::new(),
            max_notifications: 10,
        }
    }

    /// Reads new notifications from the ringbuffer into the queue
    fn update_notifications(&mut self) {
        while let Some(notification) = self.notification_rx.try_pop() {
            self.notification_queue.push_back(notification);

            if self.notification_queue.len() > self.max_notifications {
                self.notification_queue.pop_front();
            }
        }
    }

    /// Notifications younger than five seconds, newest first
    fn recent_notifications(&self) -> Vec<&Notification> {
        self.notification_queue
            .iter()
            .rev()
            .filter(|n| n.is_recent(5000))
            .take(3)
            .collect()
    }

    fn submit(&mut self, ctx: &egui::Context) {
        let Some(request) = self.form.begin_submit() else {
            return;
        };

        let (mut tx, rx) = HeapRb::<GenerationOutcome>::new(1).split();
        let client = Arc::clone(&self.client);
        let ctx = ctx.clone();

        let spawned = std::thread::Builder::new()
            .name("generation".to_string())
            .spawn(move || {
                let outcome = client.generate(&request);
                let _ = tx.try_push(outcome);
                ctx.request_repaint();
            });

        match spawned {
            Ok(_) => self.pending = Some(rx),
            Err(e) => {
                self.form
                    .finish(Err(GenerationError::Transport(e.to_string())));
            }
        }
    }

    fn poll_generation(&mut self) {
        let Some(rx) = self.pending.as_mut() else {
            return;
        };
        let Some(outcome) = rx.try_pop() else {
            return;
        };
        self.pending = None;

        if let Some(result) = self.form.finish(outcome) {
            self.guide_player.reset();
            self.notifier.info(
                NotificationCategory::Generation,
                format!(
                    "Preview ready: {} notes, {} lines",
                    result.notes.len(),
                    result.timestamps.len()
                ),
            );
            self.session.on_preview(result);
            self.dialog.show_result();
        }
    }

    fn advance_clocks(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_frame {
            self.guide_player
                .advance(Seconds((now - last).as_secs_f64()));
        }
        self.last_frame = Some(now);

        if self.session.pump() {
            log::debug!("Regions now {:?}", self.session.regions());
        }

        if !self.guide_player.has_audio()
            && self.session.guide().is_some()
            && let Some(audio) = self
                .session
                .timeline()
                .lanes()
                .first()
                .and_then(|lane| lane.renderer())
                .and_then(|renderer| renderer.audio())
        {
            self.guide_player.attach_audio(audio);
        }

        if let Some(session) = self.dialog.poll() {
            log::debug!("{} finished", session);
        }
    }

    fn draw_form(&mut self, ui: &mut egui::Ui) {
        ui.heading("Lyrics");
        ui.add(
            egui::TextEdit::multiline(&mut self.form.lyrics)
                .desired_rows(8)
                .desired_width(f32::INFINITY),
        );
        ui.add_space(8.0);

        let mut tempo = self.form.tempo();
        if ui
            .add(egui::Slider::new(&mut tempo, MIN_TEMPO..=MAX_TEMPO).text("BPM"))
            .changed()
        {
            self.form.set_tempo(tempo);
        }

        ui.horizontal(|ui| {
            ui.label("Key:");
            egui::ComboBox::from_id_salt("key_selector")
                .selected_text(self.form.key.to_string())
                .show_ui(ui, |ui| {
                    for key in Key::ALL {
                        ui.selectable_value(&mut self.form.key, key, key.to_string());
                    }
                });

            ui.label("Style:");
            egui::ComboBox::from_id_salt("style_selector")
                .selected_text(self.form.style.to_string())
                .show_ui(ui, |ui| {
                    for style in Style::ALL {
                        ui.selectable_value(&mut self.form.style, style, style.to_string());
                    }
                });
        });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let generate = ui.add_enabled(self.form.can_submit(), egui::Button::new("Generate Preview"));
            if generate.clicked() {
                self.submit(ui.ctx());
            }
            if self.form.is_loading() {
                ui.spinner();
                ui.label("Generating...");
            }
        });

        if let Some(error) = self.form.error() {
            ui.colored_label(egui::Color32::RED, error);
        }
    }

    fn draw_guide_player(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let label = if self.guide_player.is_playing() { "Pause" } else { "Play" };
            let has_audio = self.guide_player.has_audio();
            if ui.add_enabled(has_audio, egui::Button::new(label)).clicked()
                && let Err(e) = self.guide_player.toggle()
            {
                log::warn!("Guide playback unavailable: {}", e);
            }

            let max = self.guide_player.duration().map(|d| d.value()).unwrap_or(0.0);
            let mut position = self.guide_player.position().value();
            if ui
                .add_enabled(
                    has_audio,
                    egui::Slider::new(&mut position, 0.0..=max).show_value(false),
                )
                .changed()
            {
                self.guide_player.seek(Seconds(position));
            }
            ui.monospace(self.guide_player.readout());
        });
    }

    fn draw_tracks(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Add track:");
            ui.text_edit_singleline(&mut self.new_track);
            let can_add = !self.new_track.trim().is_empty();
            if ui.add_enabled(can_add, egui::Button::new("Add")).clicked() {
                let location = self.new_track.trim().to_string();
                let name = std::path::Path::new(&location)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string());
                self.session.add_track(TrackSource {
                    name,
                    source: AudioSource::new(location),
                });
                self.new_track.clear();
            }
        });
    }

    fn draw_regions(&self, ui: &mut egui::Ui) {
        egui::Grid::new("region_table")
            .striped(true)
            .num_columns(3)
            .show(ui, |ui| {
                ui.strong("Line");
                ui.strong("Start (ms)");
                ui.strong("End (ms)");
                ui.end_row();

                for region in self.session.regions() {
                    ui.label(&region.line_text);
                    ui.monospace(region.start_ms.to_string());
                    ui.monospace(region.end_ms.to_string());
                    ui.end_row();
                }
            });
    }

    fn draw_preview_window(&mut self, ctx: &egui::Context) {
        if !self.dialog.is_open() {
            return;
        }
        let Some(result) = self.session.result().cloned() else {
            self.dialog.close();
            return;
        };

        let mut open = true;
        egui::Window::new("Melody Preview")
            .open(&mut open)
            .resizable(true)
            .default_width(480.0)
            .show(ctx, |ui| {
                ui.label(format!(
                    "{} BPM, key of {}, {}, {} notes",
                    result.tempo,
                    result.key,
                    result.style,
                    result.notes.len()
                ));

                let layout = self.dialog.layout(&result);
                piano_roll::show(ui, &layout, self.dialog.playhead(&result));

                ui.add_space(8.0);
                if ui.button(self.dialog.play_label()).clicked() {
                    match self.dialog.toggle_play(&result) {
                        Ok(PlayOutcome::Empty) => {
                            self.notifier
                                .warning(NotificationCategory::Playback, "Nothing to play");
                        }
                        Ok(_) => {}
                        Err(e) => {
                            self.notifier
                                .error(NotificationCategory::Playback, e.to_string());
                        }
                    }
                }
            });

        if !open {
            self.dialog.close();
        }
    }

    fn draw_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let recent = self.recent_notifications();
            if recent.is_empty() {
                ui.label(format!("Ready - backend {}", self.config.backend_url));
                return;
            }
            for notification in recent {
                let (icon, color) = match notification.level {
                    NotificationLevel::Info => ("ℹ", egui::Color32::from_rgb(100, 150, 255)),
                    NotificationLevel::Warning => ("⚠", egui::Color32::from_rgb(255, 165, 0)),
                    NotificationLevel::Error => ("✖", egui::Color32::RED),
                };
                ui.colored_label(color, icon);
                ui.colored_label(color, &notification.message);
                ui.add_space(10.0);
            }
        });
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_notifications();
        self.poll_generation();
        self.advance_clocks();

        // Keep pumping while anything is in flight
        if self.form.is_loading()
            || self.dialog.is_playing()
            || self.guide_player.is_playing()
            || self.session.timeline().lanes().iter().any(|l| l.shows_loading_indicator())
        {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.draw_status_bar(ui);
        });

        egui::SidePanel::left("lyrics_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                self.draw_form(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Lyric Studio");
            ui.separator();

            if self.session.result().is_none() {
                ui.label("Generate a preview to see the guide and lyric timing");
                return;
            }

            ui.horizontal(|ui| {
                if ui.button("Open Melody Preview").clicked() {
                    self.dialog.open();
                }
            });
            ui.add_space(6.0);

            if self.session.guide().is_some() {
                self.draw_guide_player(ui);
                ui.add_space(6.0);
            }

            self.draw_tracks(ui);
            ui.add_space(6.0);

            egui::ScrollArea::vertical().show(ui, |ui| {
                let lane_height = self.config.lane_height;
                self.timeline_view
                    .show(ui, self.session.timeline_mut(), lane_height);
                ui.add_space(10.0);
                ui.separator();
                self.draw_regions(ui);
            });
        });

        self.draw_preview_window(ctx);
    }
}

// Studio session - the current preview, its timeline, dialog and guide player

use crate::error::SynthError;
use crate::generation::payload::GenerationResult;
use crate::lane::renderer::{AudioSource, RendererConfig, RendererEvent, RendererFactory};
use crate::lane::timeline::{Timeline, TrackSource};
use crate::lane::waveform_lane::LaneId;
use crate::lazy::Deferred;
use crate::messaging::Notifier;
use crate::piano_roll::{PianoRollLayout, PianoRollProjector};
use crate::playback::guide::GuideOutput;
use crate::playback::scheduler::{MelodyScheduler, PlayOutcome, SessionId};
use crate::playback::synth::SynthBackend;
use crate::regions::TimeRegion;
use crate::timebase::{NtuMode, NtuRate, Seconds};
use crate::waveform::MonoAudio;
use std::fmt;
use std::sync::Arc;

/// Lyrics the form starts with
pub const DEMO_LYRICS: &str = "When the night is young\n\
We chase the neon glow\n\
Hearts are beating as one\n\
Feel the river flow";

/// Holds the latest generation result and the regions edited against it
pub struct StudioSession<F: RendererFactory> {
    result: Option<GenerationResult>,
    guide: Option<AudioSource>,
    tracks: Vec<TrackSource>,
    regions: Vec<TimeRegion>,
    timeline: Timeline<F>,
}

impl<F: RendererFactory> StudioSession<F> {
    pub fn new(factory: F, config: RendererConfig, notifier: Notifier) -> Self {
        Self {
            result: None,
            guide: None,
            tracks: Vec::new(),
            regions: Vec::new(),
            timeline: Timeline::new(factory, config, notifier),
        }
    }

    /// Adopts a new result: guide source, regions and lanes are all replaced
    pub fn on_preview(&mut self, result: GenerationResult) {
        self.guide = result.guide_audio_url.as_deref().map(AudioSource::new);
        self.regions = result.timestamps.clone();
        self.timeline
            .load(self.guide.as_ref(), &self.tracks, &self.regions);

        log::info!(
            "Preview loaded: {} notes, {} regions, guide {}",
            result.notes.len(),
            self.regions.len(),
            self.guide
                .as_ref()
                .map(|g| g.as_str())
                .unwrap_or("none")
        );
        self.result = Some(result);
    }

    /// Replaces the held regions wholesale with an exported snapshot
    pub fn on_regions_change(&mut self, export: Vec<TimeRegion>) {
        self.regions = export;
    }

    /// Adds a track lane and remembers it for later reloads
    pub fn add_track(&mut self, track: TrackSource) -> LaneId {
        self.tracks.push(track.clone());
        self.timeline.add_track(track)
    }

    /// Drains renderer events; true if the regions changed
    pub fn pump(&mut self) -> bool {
        match self.timeline.pump() {
            Some(export) => {
                self.on_regions_change(export);
                true
            }
            None => false,
        }
    }

    /// Routes one event to a lane; true if the regions changed
    pub fn handle_event(&mut self, lane: LaneId, event: RendererEvent) -> bool {
        match self.timeline.handle_event(lane, event) {
            Some(export) => {
                self.on_regions_change(export);
                true
            }
            None => false,
        }
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    pub fn guide(&self) -> Option<&AudioSource> {
        self.guide.as_ref()
    }

    pub fn regions(&self) -> &[TimeRegion] {
        &self.regions
    }

    pub fn tracks(&self) -> &[TrackSource] {
        &self.tracks
    }

    pub fn timeline(&self) -> &Timeline<F> {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut Timeline<F> {
        &mut self.timeline
    }
}

type SynthFactory<S> = Box<dyn Fn() -> Result<S, SynthError>>;

/// Modal that previews the melody of a result
///
/// The synth is built on the first play; closing always stops playback.
pub struct PreviewDialog<S: SynthBackend> {
    open: bool,
    scheduler: Deferred<MelodyScheduler<S>>,
    make_synth: SynthFactory<S>,
    projector: PianoRollProjector,
    ntu_mode: NtuMode,
    slack: Seconds,
}

impl<S: SynthBackend> PreviewDialog<S> {
    pub fn new<M>(make_synth: M, projector: PianoRollProjector, ntu_mode: NtuMode, slack: Seconds) -> Self
    where
        M: Fn() -> Result<S, SynthError> + 'static,
    {
        Self {
            open: false,
            scheduler: Deferred::new(),
            make_synth: Box::new(make_synth),
            projector,
            ntu_mode,
            slack,
        }
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.stop();
        self.open = false;
    }

    /// A new result arrived: stop the old melody and show the new one
    pub fn show_result(&mut self) {
        self.stop();
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Play/stop toggle for `result`'s notes
    pub fn toggle_play(&mut self, result: &GenerationResult) -> Result<PlayOutcome, SynthError> {
        let rate = self.rate_for(result);
        let slack = self.slack;
        let make_synth = &self.make_synth;
        let scheduler = self
            .scheduler
            .get_or_try_init(|| make_synth().map(|synth| MelodyScheduler::with_slack(synth, slack)))?;
        scheduler.play(&result.notes, rate)
    }

    pub fn stop(&mut self) {
        if let Some(scheduler) = self.scheduler.get_mut() {
            scheduler.stop();
        }
    }

    /// Host-loop hook; returns the session that just completed
    pub fn poll(&mut self) -> Option<SessionId> {
        self.scheduler.get_mut()?.poll()
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler
            .get()
            .is_some_and(|scheduler| scheduler.is_running())
    }

    pub fn play_label(&self) -> &'static str {
        if self.is_playing() { "Stop" } else { "Play Preview" }
    }

    pub fn layout(&self, result: &GenerationResult) -> PianoRollLayout {
        self.projector.project(&result.notes)
    }

    /// Playhead x in piano-roll pixels while a session is running
    pub fn playhead(&self, result: &GenerationResult) -> Option<f32> {
        let elapsed = self.scheduler.get()?.elapsed()?;
        let units = elapsed.value() / self.rate_for(result).seconds_per_unit();
        Some((units * self.projector.pixels_per_unit as f64) as f32)
    }

    pub fn rate_for(&self, result: &GenerationResult) -> NtuRate {
        NtuRate::for_mode(self.ntu_mode, result.tempo as f64)
    }

    pub fn scheduler(&self) -> Option<&MelodyScheduler<S>> {
        self.scheduler.get()
    }
}

/// Transport for the guide audio
///
/// Without an output (or before the guide is decoded) it only keeps time.
/// Once audio is attached the output is the clock: `advance` reads its
/// position back instead of counting frames.
#[derive(Default)]
pub struct GuidePlayer {
    playing: bool,
    position: Seconds,
    duration: Option<Seconds>,
    output: Option<Box<dyn GuideOutput>>,
    audio_attached: bool,
}

impl fmt::Debug for GuidePlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuidePlayer")
            .field("playing", &self.playing)
            .field("position", &self.position)
            .field("duration", &self.duration)
            .field("has_output", &self.output.is_some())
            .field("audio_attached", &self.audio_attached)
            .finish()
    }
}

impl GuidePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(output: Box<dyn GuideOutput>) -> Self {
        Self {
            output: Some(output),
            ..Self::default()
        }
    }

    /// Hands decoded guide samples to the output, rewound and paused
    pub fn attach_audio(&mut self, audio: Arc<MonoAudio>) {
        self.playing = false;
        self.position = Seconds::ZERO;
        self.set_duration(audio.duration());
        if let Some(output) = self.output.as_mut() {
            output.load(audio);
            self.audio_attached = true;
        }
    }

    pub fn has_audio(&self) -> bool {
        self.audio_attached
    }

    /// Forgets the current guide; the output keeps its device
    pub fn reset(&mut self) {
        self.pause();
        self.position = Seconds::ZERO;
        self.duration = None;
        self.audio_attached = false;
    }

    /// Play/pause; returns whether it is playing now
    pub fn toggle(&mut self) -> Result<bool, SynthError> {
        self.playing = !self.playing;
        if self.playing && self.at_end() {
            self.position = Seconds::ZERO;
        }
        let attached = self.audio_attached;
        if let Some(output) = self.output.as_mut().filter(|_| attached) {
            if self.playing {
                if let Err(e) = output.play(self.position) {
                    self.playing = false;
                    return Err(e);
                }
            } else {
                output.pause();
            }
        }
        Ok(self.playing)
    }

    pub fn pause(&mut self) {
        self.playing = false;
        let attached = self.audio_attached;
        if let Some(output) = self.output.as_mut().filter(|_| attached) {
            output.pause();
        }
    }

    /// Moves the playhead, clamped to the known duration
    pub fn seek(&mut self, to: Seconds) {
        self.set_position(to);
        if !self.playing {
            return;
        }
        let attached = self.audio_attached;
        if let Some(output) = self.output.as_mut().filter(|_| attached)
            && let Err(e) = output.play(self.position)
        {
            log::warn!("Guide seek failed: {}", e);
            self.playing = false;
        }
    }

    /// Advances the playhead while playing; stops at the end
    pub fn advance(&mut self, elapsed: Seconds) {
        if !self.playing {
            return;
        }
        let attached = self.audio_attached;
        if let Some(output) = self.output.as_ref().filter(|_| attached) {
            let (position, sounding) = output.position();
            self.set_position(position);
            if !sounding {
                self.playing = false;
            }
            return;
        }
        self.set_position(self.position + elapsed);
        if self.at_end() {
            self.playing = false;
        }
    }

    /// Records the decoded duration; negative or non-finite values are ignored
    pub fn set_duration(&mut self, duration: Seconds) {
        if !duration.value().is_finite() || duration.value() < 0.0 {
            log::warn!("Ignoring guide duration {}", duration);
            return;
        }
        self.duration = Some(duration);
        self.set_position(self.position);
    }

    /// `current / duration s`, one decimal each
    pub fn readout(&self) -> String {
        format!(
            "{:.1} / {:.1} s",
            self.position.value(),
            self.duration.map(|d| d.value()).unwrap_or(0.0)
        )
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position(&self) -> Seconds {
        self.position
    }

    pub fn duration(&self) -> Option<Seconds> {
        self.duration
    }

    fn set_position(&mut self, to: Seconds) {
        let upper = self.duration.map(|d| d.value()).unwrap_or(f64::INFINITY);
        let target = if to.value().is_finite() { to.value() } else { 0.0 };
        self.position = Seconds(target.clamp(0.0, upper));
    }

    fn at_end(&self) -> bool {
        self.duration.is_some_and(|d| self.position >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::payload::{Key, Style};
    use crate::lane::test_support::FakeFactory;
    use crate::playback::note::NoteEvent;
    use crate::playback::test_support::{FakeGuide, FakeSynth};

    fn result(guide: Option<&str>) -> GenerationResult {
        GenerationResult {
            lyrics: DEMO_LYRICS.to_string(),
            tempo: 120,
            key: Key::C,
            style: Style::Pop,
            guide_audio_url: guide.map(str::to_string),
            notes: vec![NoteEvent::new(60, 0.0, 1.0), NoteEvent::new(62, 1.0, 1.0)],
            timestamps: vec![
                TimeRegion::new("When the night is young", 0, 1000),
                TimeRegion::new("We chase the neon glow", 1000, 2000),
            ],
        }
    }

    fn dialog(synth: FakeSynth) -> PreviewDialog<FakeSynth> {
        PreviewDialog::new(
            move || Ok(synth.clone()),
            PianoRollProjector::default(),
            NtuMode::Beats,
            Seconds(0.1),
        )
    }

    #[test]
    fn test_demo_lyrics_have_four_lines() {
        assert_eq!(crate::regions::LyricLine::split(DEMO_LYRICS).len(), 4);
    }

    #[test]
    fn test_on_preview_builds_guide_lane() {
        let factory = FakeFactory::default();
        let mut session = StudioSession::new(factory.clone(), RendererConfig::default(), Notifier::silent());

        session.on_preview(result(Some("file:///tmp/guide.wav")));

        assert_eq!(session.regions().len(), 2);
        assert_eq!(session.timeline().lanes().len(), 1);
        assert_eq!(session.timeline().lanes()[0].title(), "Guide");
        assert!(session.timeline().authoritative_lane().is_some());
        assert_eq!(factory.log().loaded, vec!["file:///tmp/guide.wav".to_string()]);
    }

    #[test]
    fn test_result_without_guide_has_no_lanes() {
        let mut session = StudioSession::new(FakeFactory::default(), RendererConfig::default(), Notifier::silent());
        session.on_preview(result(None));

        assert!(session.guide().is_none());
        assert!(session.timeline().is_empty());
        assert_eq!(session.regions().len(), 2);
    }

    #[test]
    fn test_regions_change_replaces_wholesale() {
        let mut session = StudioSession::new(FakeFactory::default(), RendererConfig::default(), Notifier::silent());
        session.on_preview(result(None));

        session.on_regions_change(vec![TimeRegion::new("only", 5, 10)]);
        assert_eq!(session.regions(), &[TimeRegion::new("only", 5, 10)]);
    }

    #[test]
    fn test_new_preview_disposes_old_lanes() {
        let factory = FakeFactory::default();
        let mut session = StudioSession::new(factory.clone(), RendererConfig::default(), Notifier::silent());

        session.on_preview(result(Some("file:///a.wav")));
        session.on_preview(result(Some("file:///b.wav")));

        assert_eq!(factory.log().destroyed, 1);
        assert_eq!(session.timeline().lanes().len(), 1);
    }

    #[test]
    fn test_dialog_builds_synth_on_first_play() {
        let synth = FakeSynth::at(0.0);
        let mut dialog = dialog(synth.clone());
        dialog.open();
        assert!(dialog.scheduler().is_none());
        assert_eq!(dialog.play_label(), "Play Preview");

        let outcome = dialog.toggle_play(&result(None)).unwrap();
        // 120 BPM: two beats end at 1.0s
        assert!(matches!(outcome, PlayOutcome::Started { ends_at, .. } if ends_at == Seconds(1.0)));
        assert_eq!(dialog.play_label(), "Stop");

        // Half a second at 120 BPM is one beat, 40 px
        synth.set_now(0.5);
        assert_eq!(dialog.playhead(&result(None)), Some(40.0));

        assert_eq!(dialog.toggle_play(&result(None)).unwrap(), PlayOutcome::Stopped);
        assert_eq!(synth.log().disposed, 1);
    }

    #[test]
    fn test_dialog_close_stops_playback() {
        let synth = FakeSynth::at(0.0);
        let mut dialog = dialog(synth.clone());
        dialog.open();
        dialog.toggle_play(&result(None)).unwrap();

        dialog.close();
        assert!(!dialog.is_open());
        assert!(!dialog.is_playing());
        assert_eq!(synth.log().disposed, 1);
    }

    #[test]
    fn test_show_result_opens_and_stops_previous_melody() {
        let synth = FakeSynth::at(0.0);
        let mut dialog = dialog(synth.clone());
        dialog.toggle_play(&result(None)).unwrap();
        assert!(!dialog.is_open());

        dialog.show_result();
        assert!(dialog.is_open());
        assert!(!dialog.is_playing());
        assert_eq!(synth.log().disposed, 1);
    }

    #[test]
    fn test_dialog_synth_failure_retries() {
        let mut dialog: PreviewDialog<FakeSynth> = PreviewDialog::new(
            || Err(SynthError::NoDevice),
            PianoRollProjector::default(),
            NtuMode::Seconds,
            Seconds(0.1),
        );
        assert!(dialog.toggle_play(&result(None)).is_err());
        assert!(dialog.toggle_play(&result(None)).is_err());
        assert!(!dialog.is_playing());
    }

    #[test]
    fn test_guide_player_seek_and_readout() {
        let mut player = GuidePlayer::new();
        assert_eq!(player.readout(), "0.0 / 0.0 s");

        player.set_duration(Seconds(12.0));
        player.seek(Seconds(30.0));
        assert_eq!(player.position(), Seconds(12.0));
        player.seek(Seconds(-1.0));
        assert_eq!(player.position(), Seconds::ZERO);

        player.seek(Seconds(1.34));
        assert_eq!(player.readout(), "1.3 / 12.0 s");
    }

    #[test]
    fn test_guide_player_stops_at_end() {
        let mut player = GuidePlayer::new();
        player.set_duration(Seconds(2.0));
        assert!(player.toggle().unwrap());

        player.advance(Seconds(1.5));
        assert!(player.is_playing());
        player.advance(Seconds(1.0));
        assert!(!player.is_playing());
        assert_eq!(player.position(), Seconds(2.0));

        // Playing again from the end restarts
        assert!(player.toggle().unwrap());
        assert_eq!(player.position(), Seconds::ZERO);
    }

    fn guide_audio(seconds: usize) -> Arc<MonoAudio> {
        Arc::new(MonoAudio {
            samples: vec![0.25; seconds * 100],
            sample_rate: 100,
        })
    }

    #[test]
    fn test_guide_player_drives_output() {
        let output = FakeGuide::default();
        let mut player = GuidePlayer::with_output(Box::new(output.clone()));
        player.attach_audio(guide_audio(3));
        assert!(player.has_audio());
        assert_eq!(output.log().loaded, Some(Seconds(3.0)));
        assert_eq!(player.duration(), Some(Seconds(3.0)));

        assert!(player.toggle().unwrap());
        assert_eq!(output.log().played_from, vec![Seconds::ZERO]);

        // Position comes back from the output, not from frame time
        output.set_position(1.5, true);
        player.advance(Seconds(0.01));
        assert_eq!(player.position(), Seconds(1.5));

        player.seek(Seconds(0.5));
        assert_eq!(output.log().played_from, vec![Seconds::ZERO, Seconds(0.5)]);

        assert!(!player.toggle().unwrap());
        assert_eq!(output.log().paused, 1);

        // Resuming plays from where it paused; the output running dry ends playback
        assert!(player.toggle().unwrap());
        assert_eq!(output.log().played_from.last(), Some(&Seconds(0.5)));
        output.set_position(3.0, false);
        player.advance(Seconds(0.01));
        assert!(!player.is_playing());
        assert_eq!(player.position(), Seconds(3.0));
    }

    #[test]
    fn test_guide_player_output_failure_stays_paused() {
        let mut player = GuidePlayer::with_output(Box::new(FakeGuide::failing()));
        player.attach_audio(guide_audio(2));

        assert!(matches!(player.toggle(), Err(SynthError::NoDevice)));
        assert!(!player.is_playing());
    }

    #[test]
    fn test_guide_player_silent_until_audio_attached() {
        let output = FakeGuide::default();
        let mut player = GuidePlayer::with_output(Box::new(output.clone()));

        assert!(player.toggle().unwrap());
        player.advance(Seconds(0.5));
        assert!(output.log().played_from.is_empty());
        assert_eq!(player.position(), Seconds(0.5));

        player.attach_audio(guide_audio(2));
        assert!(!player.is_playing());
        assert_eq!(player.position(), Seconds::ZERO);

        player.reset();
        assert!(!player.has_audio());
        assert_eq!(player.duration(), None);
    }
}

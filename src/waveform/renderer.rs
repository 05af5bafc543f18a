// Peak renderer - decodes on a worker thread, reports back through a ringbuffer

use crate::error::RendererError;
use crate::lane::renderer::{
    AudioSource, RegionSpec, RendererConfig, RendererEvent, RendererFactory, WaveformRenderer,
};
use crate::regions::RegionId;
use crate::timebase::Seconds;
use crate::waveform::peaks::{MonoAudio, WaveformPeaks, decode_wav, fetch_wav};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapRb};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

type DecodeOutcome = Result<(WaveformPeaks, Arc<MonoAudio>), RendererError>;

/// Shortest region a drag may leave behind, in seconds
const MIN_REGION_LENGTH: f64 = 0.01;

#[derive(Debug)]
enum Location {
    File(PathBuf),
    Url(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    region: RegionId,
    start: Seconds,
    end: Seconds,
}

/// Waveform surface backed by decoded peaks
///
/// Region gestures from the UI are queued as renderer events so the lane
/// sees them through `poll_event` like any other renderer's.
pub struct PeakRenderer {
    config: RendererConfig,
    job: Option<HeapCons<DecodeOutcome>>,
    peaks: Option<WaveformPeaks>,
    audio: Option<Arc<MonoAudio>>,
    regions: Vec<RegionSpec>,
    events: VecDeque<RendererEvent>,
    drag: Option<Drag>,
    destroyed: bool,
}

impl PeakRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            job: None,
            peaks: None,
            audio: None,
            regions: Vec::new(),
            events: VecDeque::new(),
            drag: None,
            destroyed: false,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn peaks(&self) -> Option<&WaveformPeaks> {
        self.peaks.as_ref()
    }

    /// Decoded samples, shared with whoever plays them
    pub fn audio(&self) -> Option<Arc<MonoAudio>> {
        self.audio.clone()
    }

    pub fn is_decoding(&self) -> bool {
        self.job.is_some()
    }

    /// Overlays with any in-progress drag applied
    pub fn regions(&self) -> impl Iterator<Item = RegionSpec> + '_ {
        self.regions.iter().map(move |spec| match self.drag {
            Some(drag) if drag.region == spec.id => RegionSpec {
                start: drag.start,
                end: drag.end,
                ..spec.clone()
            },
            _ => spec.clone(),
        })
    }

    /// User grabbed an overlay; false if it cannot be moved
    pub fn begin_drag(&mut self, region: RegionId) -> bool {
        if self.destroyed || !self.config.regions_editable || self.drag.is_some() {
            return false;
        }
        let Some(spec) = self.regions.iter().find(|s| s.id == region) else {
            return false;
        };
        if !spec.drag && !spec.resize {
            return false;
        }
        self.drag = Some(Drag {
            region,
            start: spec.start,
            end: spec.end,
        });
        self.events
            .push_back(RendererEvent::RegionUpdateStarted { region });
        true
    }

    /// Moves the grabbed overlay to new bounds
    ///
    /// Bounds are kept inside `0 ≤ start < end ≤ duration`. A move that would
    /// leave the waveform is pushed back in with its length kept; a resize
    /// that would collapse the region is ignored.
    pub fn drag_to(&mut self, start: Seconds, end: Seconds) {
        let duration = self.peaks.as_ref().map(|p| p.duration.value());
        let Some(drag) = &mut self.drag else {
            return;
        };
        let (mut start, mut end) = (start.value(), end.value());
        if !start.is_finite() || !end.is_finite() {
            return;
        }

        let length = end - start;
        let is_move = (length - (drag.end - drag.start).value()).abs() < 1e-9;
        let upper = duration.unwrap_or(f64::INFINITY);

        if is_move && length <= upper {
            let shift = if start < 0.0 {
                -start
            } else if end > upper {
                upper - end
            } else {
                0.0
            };
            start += shift;
            end += shift;
        } else {
            start = start.max(0.0);
            end = end.min(upper);
        }

        if end - start < MIN_REGION_LENGTH {
            return;
        }
        drag.start = Seconds(start);
        drag.end = Seconds(end);
    }

    /// User released the overlay; the final bounds go to the lane
    pub fn end_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        if let Some(spec) = self.regions.iter_mut().find(|s| s.id == drag.region) {
            spec.start = drag.start;
            spec.end = drag.end;
        }
        self.events.push_back(RendererEvent::RegionUpdated {
            region: drag.region,
            start: drag.start,
            end: drag.end,
        });
    }

    pub fn dragging(&self) -> Option<RegionId> {
        self.drag.map(|d| d.region)
    }

    fn poll_job(&mut self) -> Option<RendererEvent> {
        let outcome = self.job.as_mut()?.try_pop()?;
        self.job = None;
        match outcome {
            Ok((peaks, audio)) => {
                let duration = peaks.duration;
                self.peaks = Some(peaks);
                self.audio = Some(audio);
                Some(RendererEvent::Ready { duration })
            }
            Err(e) => Some(RendererEvent::Failed(e)),
        }
    }
}

impl WaveformRenderer for PeakRenderer {
    fn load(&mut self, source: &AudioSource) -> Result<(), RendererError> {
        let location = if let Some(path) = source.local_path() {
            Location::File(PathBuf::from(path))
        } else if let Some(url) = source.remote_url() {
            Location::Url(url.to_string())
        } else {
            return Err(RendererError::SourceUnavailable(format!(
                "{} is neither a file nor an HTTP URL",
                source
            )));
        };

        let (mut tx, rx) = HeapRb::<DecodeOutcome>::new(1).split();
        let resolution = self.config.peak_resolution;

        thread::Builder::new()
            .name("waveform-decode".to_string())
            .spawn(move || {
                let decoded = match &location {
                    Location::File(path) => decode_wav(path),
                    Location::Url(url) => fetch_wav(url),
                };
                let outcome = decoded.map(|audio| (audio.peaks(resolution), Arc::new(audio)));
                if let Err(e) = &outcome {
                    log::warn!("Decoding {:?} failed: {}", location, e);
                }
                // Receiver gone means the lane was disposed
                let _ = tx.try_push(outcome);
            })
            .map_err(|e| RendererError::InitFailed(e.to_string()))?;

        self.peaks = None;
        self.audio = None;
        self.job = Some(rx);
        Ok(())
    }

    fn add_region(&mut self, spec: RegionSpec) {
        self.regions.push(spec);
    }

    fn update_region(&mut self, spec: RegionSpec) {
        if self.destroyed {
            return;
        }
        if let Some(existing) = self.regions.iter_mut().find(|s| s.id == spec.id) {
            *existing = spec;
        }
    }

    fn poll_event(&mut self) -> Option<RendererEvent> {
        if self.destroyed {
            return None;
        }
        self.events.pop_front().or_else(|| self.poll_job())
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.job = None;
        self.peaks = None;
        self.audio = None;
        self.regions.clear();
        self.events.clear();
        self.drag = None;
    }
}

/// Builds [`PeakRenderer`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct PeakRendererFactory;

impl RendererFactory for PeakRendererFactory {
    type Renderer = PeakRenderer;

    fn create(&self, config: &RendererConfig) -> Result<PeakRenderer, RendererError> {
        if config.peak_resolution == 0 {
            return Err(RendererError::InitFailed(
                "peak resolution must be positive".to_string(),
            ));
        }
        Ok(PeakRenderer::new(config.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lane::waveform_lane::{LaneState, WaveformLane};
    use crate::messaging::Notifier;
    use crate::regions::{LyricLine, RegionSet};
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::path::Path;
    use std::time::{Duration, Instant};

    /// One-second-per-thousand-frames mono guide
    fn write_guide(dir: &Path, frames: usize) -> PathBuf {
        let path = dir.join("guide.wav");
        let wav_spec = WavSpec {
            channels: 1,
            sample_rate: 1000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, wav_spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(1000_i16).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    fn with_duration(mut renderer: PeakRenderer, seconds: f64) -> PeakRenderer {
        renderer.peaks = Some(WaveformPeaks {
            min: vec![0.0],
            max: vec![0.0],
            duration: Seconds(seconds),
        });
        renderer
    }

    fn spec(id: RegionId) -> RegionSpec {
        RegionSpec {
            id,
            line_text: "Feel the river flow".to_string(),
            start: Seconds(1.0),
            end: Seconds(2.0),
            drag: true,
            resize: true,
        }
    }

    fn wait_for_event(renderer: &mut PeakRenderer) -> RendererEvent {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(event) = renderer.poll_event() {
                return event;
            }
            assert!(Instant::now() < deadline, "decode never finished");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_unsupported_scheme_rejected() {
        let mut renderer = PeakRenderer::new(RendererConfig::default());
        let result = renderer.load(&AudioSource::new("ftp://localhost/guide.wav"));
        assert!(matches!(result, Err(RendererError::SourceUnavailable(_))));
    }

    #[test]
    fn test_decode_reports_ready() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_guide(dir.path(), 1500);

        let mut renderer = PeakRendererFactory.create(&RendererConfig::default()).unwrap();
        renderer
            .load(&AudioSource::new(path.to_string_lossy().to_string()))
            .unwrap();

        assert_eq!(wait_for_event(&mut renderer), RendererEvent::Ready {
            duration: Seconds(1.5)
        });
        assert_eq!(renderer.peaks().map(|p| p.len()), Some(800));
        let audio = renderer.audio().unwrap();
        assert_eq!((audio.samples.len(), audio.sample_rate), (1500, 1000));
        assert!(!renderer.is_decoding());
    }

    #[test]
    fn test_missing_file_reports_failure() {
        let mut renderer = PeakRenderer::new(RendererConfig::default());
        renderer
            .load(&AudioSource::new("file:///no/such/guide.wav"))
            .unwrap();
        assert!(matches!(
            wait_for_event(&mut renderer),
            RendererEvent::Failed(RendererError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn test_drag_queues_events() {
        let id = RegionId::new();
        let mut renderer = PeakRenderer::new(RendererConfig::default());
        renderer.add_region(spec(id));

        assert!(renderer.begin_drag(id));
        assert!(!renderer.begin_drag(id));
        renderer.drag_to(Seconds(1.5), Seconds(2.5));
        assert_eq!(renderer.regions().next().map(|r| r.start), Some(Seconds(1.5)));
        renderer.end_drag();

        assert_eq!(
            renderer.poll_event(),
            Some(RendererEvent::RegionUpdateStarted { region: id })
        );
        assert_eq!(
            renderer.poll_event(),
            Some(RendererEvent::RegionUpdated {
                region: id,
                start: Seconds(1.5),
                end: Seconds(2.5),
            })
        );
        assert!(renderer.poll_event().is_none());
        assert!(renderer.dragging().is_none());
    }

    #[test]
    fn test_read_only_regions_cannot_drag() {
        let id = RegionId::new();
        let mut renderer = PeakRenderer::new(RendererConfig {
            regions_editable: false,
            ..RendererConfig::default()
        });
        renderer.add_region(spec(id));
        assert!(!renderer.begin_drag(id));
        assert!(renderer.poll_event().is_none());
    }

    #[test]
    fn test_destroy_silences_renderer() {
        let id = RegionId::new();
        let mut renderer = PeakRenderer::new(RendererConfig::default());
        renderer.add_region(spec(id));
        renderer.begin_drag(id);

        renderer.destroy();
        assert!(renderer.poll_event().is_none());
        assert_eq!(renderer.regions().count(), 0);
    }

    #[test]
    fn test_factory_rejects_zero_resolution() {
        let config = RendererConfig {
            peak_resolution: 0,
            ..RendererConfig::default()
        };
        assert!(PeakRendererFactory.create(&config).is_err());
    }

    #[test]
    fn test_drag_clamped_to_waveform() {
        let id = RegionId::new();
        let mut renderer = with_duration(PeakRenderer::new(RendererConfig::default()), 3.0);
        renderer.add_region(spec(id));
        assert!(renderer.begin_drag(id));

        // Resizing the end past the start leaves the region alone
        renderer.drag_to(Seconds(1.0), Seconds(0.4));
        assert_eq!(renderer.regions().next().map(|r| (r.start, r.end)), Some((Seconds(1.0), Seconds(2.0))));

        // Moving before zero keeps the length
        renderer.drag_to(Seconds(-0.5), Seconds(0.5));
        assert_eq!(renderer.regions().next().map(|r| (r.start, r.end)), Some((Seconds(0.0), Seconds(1.0))));

        // Moving past the end keeps the length
        renderer.drag_to(Seconds(2.5), Seconds(3.5));
        assert_eq!(renderer.regions().next().map(|r| (r.start, r.end)), Some((Seconds(2.0), Seconds(3.0))));

        // Resizing past either edge stops at the edge
        renderer.drag_to(Seconds(-1.0), Seconds(3.0));
        assert_eq!(renderer.regions().next().map(|r| (r.start, r.end)), Some((Seconds(0.0), Seconds(3.0))));
        renderer.drag_to(Seconds(0.0), Seconds(4.0));
        assert_eq!(renderer.regions().next().map(|r| (r.start, r.end)), Some((Seconds(0.0), Seconds(3.0))));
    }

    #[test]
    fn test_update_region_replaces_overlay() {
        let id = RegionId::new();
        let mut renderer = PeakRenderer::new(RendererConfig::default());
        renderer.add_region(spec(id));
        renderer.update_region(RegionSpec {
            start: Seconds(0.5),
            end: Seconds(0.9),
            ..spec(id)
        });
        renderer.update_region(spec(RegionId::new()));

        let overlays: Vec<RegionSpec> = renderer.regions().collect();
        assert_eq!(overlays.len(), 1);
        assert_eq!((overlays[0].start, overlays[0].end), (Seconds(0.5), Seconds(0.9)));
    }

    #[test]
    fn test_overlay_follows_lane_model_after_drags() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_guide(dir.path(), 3000);
        let lines = vec![
            LyricLine::new(0, "When the night is young"),
            LyricLine::new(1, "We chase the neon glow"),
        ];

        let mut lane = WaveformLane::new(
            "Guide",
            AudioSource::new(path.to_string_lossy().to_string()),
            Notifier::silent(),
        );
        lane.grant_authority(RegionSet::seed(&lines, &[(0, 1000), (1000, 2200)]));
        lane.attach(&PeakRendererFactory, &RendererConfig::default());

        let deadline = Instant::now() + Duration::from_secs(5);
        while lane.state() != LaneState::Ready {
            assert!(Instant::now() < deadline, "decode never finished");
            lane.pump();
            thread::sleep(Duration::from_millis(5));
        }

        let id = lane.regions().unwrap().ids()[1];
        let overlay_matches_model = |lane: &WaveformLane<PeakRenderer>| {
            let held = lane.regions().and_then(|set| set.get(id)).unwrap();
            let shown = lane
                .renderer()
                .and_then(|r| r.regions().find(|s| s.id == id))
                .unwrap();
            (shown.start, shown.end) == (held.start().to_seconds(), held.end().to_seconds())
        };

        // Inverted resize, then a move before zero, released in one gesture
        let renderer = lane.renderer_mut().unwrap();
        assert!(renderer.begin_drag(id));
        renderer.drag_to(Seconds(1.0), Seconds(0.4));
        renderer.drag_to(Seconds(-0.5), Seconds(0.7));
        renderer.end_drag();

        let export = lane.pump().unwrap();
        assert_eq!((export[1].start_ms, export[1].end_ms), (0, 1200));
        assert!(overlay_matches_model(&lane));

        // An edit the model refuses puts the overlay back
        lane.handle_event(RendererEvent::RegionUpdateStarted { region: id });
        let refused = lane.handle_event(RendererEvent::RegionUpdated {
            region: id,
            start: Seconds(2.0),
            end: Seconds(1.0),
        });
        assert!(refused.is_none());
        assert!(overlay_matches_model(&lane));
        assert_eq!(lane.regions().unwrap().export_normalized()[1].end_ms, 1200);
    }
}

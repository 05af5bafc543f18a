//! Region editing through the public API
//!
//! Seeds lyric regions, edits them through a lane the way a renderer would,
//! and checks what the session gets to see.

use lyric_studio::error::RendererError;
use lyric_studio::lane::{
    AudioSource, RegionSpec, RendererConfig, RendererEvent, RendererFactory, Timeline,
    TrackSource, WaveformRenderer,
};
use lyric_studio::messaging::Notifier;
use lyric_studio::regions::{LyricLine, RegionSet, TimeRegion};
use lyric_studio::timebase::{Millis, Seconds};

const SPANS: [(u64, u64); 4] = [(0, 1000), (1000, 2200), (2200, 3400), (3400, 4800)];

fn lyrics() -> Vec<LyricLine> {
    LyricLine::split("When the night is young\nAnd the lights are low\nWe dance alone\nTill the morning glow")
}

/// Renderer that only remembers its overlays
#[derive(Default)]
struct QuietRenderer {
    overlays: Vec<RegionSpec>,
}

impl WaveformRenderer for QuietRenderer {
    fn load(&mut self, _source: &AudioSource) -> Result<(), RendererError> {
        Ok(())
    }

    fn add_region(&mut self, spec: RegionSpec) {
        self.overlays.push(spec);
    }

    fn update_region(&mut self, spec: RegionSpec) {
        if let Some(overlay) = self.overlays.iter_mut().find(|o| o.id == spec.id) {
            *overlay = spec;
        }
    }

    fn poll_event(&mut self) -> Option<RendererEvent> {
        None
    }

    fn destroy(&mut self) {
        self.overlays.clear();
    }
}

struct QuietFactory;

impl RendererFactory for QuietFactory {
    type Renderer = QuietRenderer;

    fn create(&self, _config: &RendererConfig) -> Result<QuietRenderer, RendererError> {
        Ok(QuietRenderer::default())
    }
}

fn ready_timeline(regions: &[TimeRegion]) -> Timeline<QuietFactory> {
    let mut timeline = Timeline::new(QuietFactory, RendererConfig::default(), Notifier::silent());
    timeline.load(Some(&AudioSource::new("/tmp/guide.wav")), &[], regions);
    let lane = timeline.authoritative_lane().unwrap();
    timeline.handle_event(lane, RendererEvent::Ready {
        duration: Seconds(5.0),
    });
    timeline
}

#[test]
fn test_seed_exports_in_order() {
    let set = RegionSet::seed(&lyrics(), &SPANS);
    let export = set.export_normalized();

    assert_eq!(export.len(), 4);
    let bounds: Vec<(u64, u64)> = export.iter().map(|r| (r.start_ms, r.end_ms)).collect();
    assert_eq!(bounds, SPANS.to_vec());
    assert_eq!(export[0].line_text, "When the night is young");
    assert_eq!(export[3].line_text, "Till the morning glow");
}

#[test]
fn test_mismatched_seed_is_empty() {
    let set = RegionSet::seed(&lyrics(), &SPANS[..3]);
    assert!(set.is_empty());
}

#[test]
fn test_inverted_edit_rejected() {
    let mut set = RegionSet::seed(&lyrics(), &SPANS);
    let before = set.export_normalized();
    let second = set.ids()[1];

    assert!(!set.apply_edit(second, Millis(1500.0), Millis(1000.0)));
    assert_eq!(set.export_normalized(), before);
}

#[test]
fn test_lane_edit_emits_full_export() {
    let seeded = RegionSet::seed(&lyrics(), &SPANS).export_normalized();
    let mut timeline = ready_timeline(&seeded);
    let lane = timeline.authoritative_lane().unwrap();

    let ids = timeline.lane(lane).and_then(|l| l.regions()).unwrap().ids();
    let overlays = timeline
        .lane(lane)
        .and_then(|l| l.renderer())
        .map(|r| r.overlays.len());
    assert_eq!(overlays, Some(4));

    timeline.handle_event(lane, RendererEvent::RegionUpdateStarted { region: ids[1] });
    let export = timeline
        .handle_event(lane, RendererEvent::RegionUpdated {
            region: ids[1],
            start: Seconds(1.1004),
            end: Seconds(2.5),
        })
        .unwrap();

    assert_eq!(export.len(), 4);
    assert_eq!((export[1].start_ms, export[1].end_ms), (1100, 2500));
    // Untouched regions come back verbatim
    assert_eq!(export[0], seeded[0]);
    assert_eq!(export[2], seeded[2]);
    assert_eq!(export[3], seeded[3]);
}

#[test]
fn test_lane_rejects_inverted_edit() {
    let seeded = RegionSet::seed(&lyrics(), &SPANS).export_normalized();
    let mut timeline = ready_timeline(&seeded);
    let lane = timeline.authoritative_lane().unwrap();
    let ids = timeline.lane(lane).and_then(|l| l.regions()).unwrap().ids();

    let export = timeline.handle_event(lane, RendererEvent::RegionUpdated {
        region: ids[1],
        start: Seconds(1.5),
        end: Seconds(1.0),
    });

    assert!(export.is_none());
    let current = timeline
        .lane(lane)
        .and_then(|l| l.regions())
        .unwrap()
        .export_normalized();
    assert_eq!(current, seeded);
}

#[test]
fn test_only_first_lane_edits() {
    let seeded = RegionSet::seed(&lyrics(), &SPANS).export_normalized();
    let mut timeline = Timeline::new(QuietFactory, RendererConfig::default(), Notifier::silent());
    let tracks = vec![TrackSource {
        name: Some("Vocals".to_string()),
        source: AudioSource::new("/tmp/vocals.wav"),
    }];
    timeline.load(Some(&AudioSource::new("/tmp/guide.wav")), &tracks, &seeded);

    let lanes = timeline.lanes();
    assert_eq!(lanes.len(), 2);
    assert!(lanes[0].is_authoritative());
    assert!(!lanes[1].is_authoritative());
    assert!(lanes[1].regions().is_none());
}

// Timeline - the set of lanes shown for one generation result
// Guide lane first, then one lane per track; one editing lane at most

use crate::lane::renderer::{AudioSource, RendererConfig, RendererEvent, RendererFactory};
use crate::lane::waveform_lane::{LaneId, WaveformLane};
use crate::messaging::Notifier;
use crate::regions::{RegionSet, TimeRegion};

/// An extra audio track shown under the guide
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSource {
    pub name: Option<String>,
    pub source: AudioSource,
}

/// Lane to create, before any renderer exists
#[derive(Debug, Clone, PartialEq)]
pub struct LanePlan {
    pub title: String,
    pub source: AudioSource,
    /// Asks for the region editing role
    pub wants_authority: bool,
}

/// Lanes for a guide source and extra tracks
///
/// The guide edits regions; without a guide the first track does.
pub fn plan_lanes(guide: Option<&AudioSource>, tracks: &[TrackSource]) -> Vec<LanePlan> {
    let mut plans = Vec::with_capacity(tracks.len() + 1);

    if let Some(guide) = guide {
        plans.push(LanePlan {
            title: "Guide".to_string(),
            source: guide.clone(),
            wants_authority: true,
        });
    }

    for (i, track) in tracks.iter().enumerate() {
        plans.push(LanePlan {
            title: track
                .name
                .clone()
                .unwrap_or_else(|| format!("Track {}", i + 1)),
            source: track.source.clone(),
            wants_authority: i == 0 && guide.is_none(),
        });
    }

    plans
}

/// Owns the lanes and the single editing role
pub struct Timeline<F: RendererFactory> {
    factory: F,
    config: RendererConfig,
    lanes: Vec<WaveformLane<F::Renderer>>,
    authority: Option<LaneId>,
    /// Regions waiting for a lane to own them (no authoritative lane yet)
    orphaned: Option<RegionSet>,
    /// Track lanes added since the last load, guide excluded
    track_count: usize,
    notifier: Notifier,
}

impl<F: RendererFactory> Timeline<F> {
    pub fn new(factory: F, config: RendererConfig, notifier: Notifier) -> Self {
        Self {
            factory,
            config,
            lanes: Vec::new(),
            authority: None,
            orphaned: None,
            track_count: 0,
            notifier,
        }
    }

    /// Replaces every lane for a freshly loaded result
    ///
    /// Previous lanes are disposed; `regions` seeds the editing lane.
    pub fn load(&mut self, guide: Option<&AudioSource>, tracks: &[TrackSource], regions: &[TimeRegion]) {
        self.clear();
        self.orphaned = Some(RegionSet::from_timestamps(regions));
        self.track_count = tracks.len();

        for plan in plan_lanes(guide, tracks) {
            self.add_lane(plan);
        }
    }

    /// Adds a track lane to the current session
    ///
    /// Unnamed tracks are numbered among tracks only, as `plan_lanes` does,
    /// so a reload keeps their titles.
    pub fn add_track(&mut self, track: TrackSource) -> LaneId {
        self.track_count += 1;
        let index = self.track_count;
        self.add_lane(LanePlan {
            title: track.name.unwrap_or_else(|| format!("Track {}", index)),
            source: track.source,
            wants_authority: true,
        })
    }

    fn add_lane(&mut self, plan: LanePlan) -> LaneId {
        let mut lane = WaveformLane::new(plan.title, plan.source, self.notifier.clone());
        let id = lane.id();

        if plan.wants_authority && self.authority.is_none() {
            lane.grant_authority(self.orphaned.take().unwrap_or_default());
            self.authority = Some(id);
        }

        lane.attach(&self.factory, &self.config);
        self.lanes.push(lane);
        id
    }

    /// Routes an event to its lane; unknown or disposed lanes drop it
    pub fn handle_event(&mut self, lane: LaneId, event: RendererEvent) -> Option<Vec<TimeRegion>> {
        match self.lane_mut(lane) {
            Some(lane) => lane.handle_event(event),
            None => {
                log::debug!("No {} on the timeline, dropping {:?}", lane, event);
                None
            }
        }
    }

    /// Drains every lane's renderer; returns the latest export
    pub fn pump(&mut self) -> Option<Vec<TimeRegion>> {
        let mut latest = None;
        for lane in &mut self.lanes {
            if let Some(export) = lane.pump() {
                latest = Some(export);
            }
        }
        latest
    }

    /// Disposes one lane and frees the editing role if it held it
    pub fn dispose_lane(&mut self, id: LaneId) {
        let Some(index) = self.lanes.iter().position(|l| l.id() == id) else {
            return;
        };
        let mut lane = self.lanes.remove(index);
        if self.authority == Some(id) {
            self.authority = None;
            self.orphaned = lane.release_authority();
        }
        lane.dispose();
    }

    /// Disposes every lane
    pub fn clear(&mut self) {
        for lane in &mut self.lanes {
            lane.dispose();
        }
        self.lanes.clear();
        self.authority = None;
        self.orphaned = None;
        self.track_count = 0;
    }

    pub fn lanes(&self) -> &[WaveformLane<F::Renderer>] {
        &self.lanes
    }

    pub fn lanes_mut(&mut self) -> &mut [WaveformLane<F::Renderer>] {
        &mut self.lanes
    }

    pub fn lane(&self, id: LaneId) -> Option<&WaveformLane<F::Renderer>> {
        self.lanes.iter().find(|l| l.id() == id)
    }

    pub fn lane_mut(&mut self, id: LaneId) -> Option<&mut WaveformLane<F::Renderer>> {
        self.lanes.iter_mut().find(|l| l.id() == id)
    }

    pub fn authoritative_lane(&self) -> Option<LaneId> {
        self.authority
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}

// Waveform lane - one renderer bound to one audio source
// Uninitialized → Loading → Ready ⇄ Editing → Disposed

use crate::lane::renderer::{
    AudioSource, RegionSpec, RendererConfig, RendererEvent, RendererFactory, WaveformRenderer,
};
use crate::messaging::{NotificationCategory, Notifier};
use crate::regions::{Region, RegionId, RegionSet, TimeRegion};
use crate::timebase::Seconds;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LANE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaneId(u64);

impl LaneId {
    pub fn next() -> Self {
        Self(NEXT_LANE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lane#{}", self.0)
    }
}

/// Lane lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneState {
    Uninitialized,
    Loading,
    Ready,
    /// A drag/resize is in progress on this region
    Editing(RegionId),
    Disposed,
}

impl LaneState {
    pub fn is_disposed(&self) -> bool {
        matches!(self, LaneState::Disposed)
    }
}

/// One waveform surface for one audio source
///
/// An authoritative lane exclusively owns the [`RegionSet`] being edited and
/// returns a full export after every accepted edit.
pub struct WaveformLane<R: WaveformRenderer> {
    id: LaneId,
    title: String,
    source: AudioSource,
    state: LaneState,
    renderer: Option<R>,
    regions: Option<RegionSet>,
    unavailable: bool,
    duration: Option<Seconds>,
    notifier: Notifier,
}

impl<R: WaveformRenderer> WaveformLane<R> {
    pub fn new(title: impl Into<String>, source: AudioSource, notifier: Notifier) -> Self {
        Self {
            id: LaneId::next(),
            title: title.into(),
            source,
            state: LaneState::Uninitialized,
            renderer: None,
            regions: None,
            unavailable: false,
            duration: None,
            notifier,
        }
    }

    pub fn id(&self) -> LaneId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source(&self) -> &AudioSource {
        &self.source
    }

    pub fn state(&self) -> LaneState {
        self.state
    }

    pub fn is_authoritative(&self) -> bool {
        self.regions.is_some()
    }

    /// Renderer failed; the lane stays in `Loading` for good
    pub fn is_unavailable(&self) -> bool {
        self.unavailable
    }

    /// Whether the UI should show the "Loading waveform..." indicator
    pub fn shows_loading_indicator(&self) -> bool {
        matches!(self.state, LaneState::Uninitialized | LaneState::Loading)
    }

    /// Decoded length of the source, once ready
    pub fn duration(&self) -> Option<Seconds> {
        self.duration
    }

    pub fn regions(&self) -> Option<&RegionSet> {
        self.regions.as_ref()
    }

    pub fn renderer(&self) -> Option<&R> {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> Option<&mut R> {
        self.renderer.as_mut()
    }

    /// Makes this lane the region editor, handing it the set to own
    ///
    /// If the waveform is already displayed the overlays are seeded now.
    pub fn grant_authority(&mut self, regions: RegionSet) {
        if self.state.is_disposed() {
            return;
        }
        self.regions = Some(regions);
        if matches!(self.state, LaneState::Ready) {
            self.seed_overlays();
        }
    }

    /// Creates the renderer and starts loading the source
    ///
    /// Failures are logged and notified; the lane then stays in `Loading`.
    pub fn attach<F>(&mut self, factory: &F, config: &RendererConfig)
    where
        F: RendererFactory<Renderer = R>,
    {
        if !matches!(self.state, LaneState::Uninitialized) {
            return;
        }
        self.state = LaneState::Loading;

        let mut renderer = match factory.create(config) {
            Ok(renderer) => renderer,
            Err(e) => {
                self.mark_unavailable(&e.to_string());
                return;
            }
        };

        if let Err(e) = renderer.load(&self.source) {
            renderer.destroy();
            self.mark_unavailable(&e.to_string());
            return;
        }

        log::debug!("{} loading '{}'", self.id, self.source);
        self.renderer = Some(renderer);
    }

    /// Drains pending renderer events
    ///
    /// Returns the latest region export if any edit was accepted; each export
    /// replaces the previous one entirely.
    pub fn pump(&mut self) -> Option<Vec<TimeRegion>> {
        let mut latest = None;
        loop {
            if self.state.is_disposed() {
                break;
            }
            let Some(event) = self.renderer.as_mut().and_then(|r| r.poll_event()) else {
                break;
            };
            if let Some(export) = self.handle_event(event) {
                latest = Some(export);
            }
        }
        latest
    }

    /// Applies one renderer event; returns an export when regions changed
    pub fn handle_event(&mut self, event: RendererEvent) -> Option<Vec<TimeRegion>> {
        if self.state.is_disposed() {
            log::debug!("{} disposed, dropping {:?}", self.id, event);
            return None;
        }

        match event {
            RendererEvent::Ready { duration } => {
                if matches!(self.state, LaneState::Loading) && !self.unavailable {
                    self.state = LaneState::Ready;
                    self.duration = Some(duration);
                    self.seed_overlays();
                    log::info!("{} ready ({})", self.id, duration);
                }
                None
            }
            RendererEvent::Failed(e) => {
                if matches!(self.state, LaneState::Loading) {
                    self.mark_unavailable(&e.to_string());
                }
                None
            }
            RendererEvent::RegionUpdateStarted { region } => {
                if matches!(self.state, LaneState::Ready)
                    && self.regions.as_ref().is_some_and(|set| set.get(region).is_some())
                {
                    self.state = LaneState::Editing(region);
                }
                None
            }
            RendererEvent::RegionUpdated { region, start, end } => {
                self.commit_edit(region, start, end)
            }
        }
    }

    /// Tears the lane down; calling it again does nothing
    pub fn dispose(&mut self) {
        if self.state.is_disposed() {
            return;
        }
        if let Some(mut renderer) = self.renderer.take() {
            renderer.destroy();
        }
        self.state = LaneState::Disposed;
        log::debug!("{} disposed", self.id);
    }

    /// Hands the region set back (used when authority moves elsewhere)
    pub fn release_authority(&mut self) -> Option<RegionSet> {
        self.regions.take()
    }

    fn commit_edit(&mut self, region: RegionId, start: Seconds, end: Seconds) -> Option<Vec<TimeRegion>> {
        match self.state {
            LaneState::Ready => {}
            LaneState::Editing(editing) if editing == region => {}
            _ => return None,
        }
        self.state = LaneState::Ready;

        let regions = self.regions.as_mut()?;
        let accepted = regions.apply_edit(region, start.to_millis(), end.to_millis());
        let export = accepted.then(|| regions.export_normalized());

        // The overlay always ends up showing what the model holds
        if let (Some(held), Some(renderer)) = (regions.get(region), self.renderer.as_mut()) {
            renderer.update_region(overlay_spec(held));
        }
        export
    }

    fn seed_overlays(&mut self) {
        let (Some(regions), Some(renderer)) = (self.regions.as_ref(), self.renderer.as_mut()) else {
            return;
        };
        for region in regions.iter() {
            renderer.add_region(overlay_spec(region));
        }
    }

    fn mark_unavailable(&mut self, reason: &str) {
        self.unavailable = true;
        self.notifier.warning(
            NotificationCategory::Waveform,
            format!("Waveform '{}' unavailable: {}", self.title, reason),
        );
    }
}

fn overlay_spec(region: &Region) -> RegionSpec {
    RegionSpec {
        id: region.id,
        line_text: region.line_text.clone(),
        start: region.start().to_seconds(),
        end: region.end().to_seconds(),
        drag: true,
        resize: true,
    }
}

impl<R: WaveformRenderer> Drop for WaveformLane<R> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<R: WaveformRenderer> fmt::Debug for WaveformLane<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveformLane")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("source", &self.source)
            .field("state", &self.state)
            .field("authoritative", &self.is_authoritative())
            .field("unavailable", &self.unavailable)
            .finish()
    }
}

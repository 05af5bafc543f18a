// Lane module - Waveform lanes and the timeline that owns them
// One lane per audio source; at most one lane edits regions at a time

pub mod renderer;
pub mod timeline;
pub mod waveform_lane;

pub use renderer::{
    AudioSource, RegionSpec, RendererConfig, RendererEvent, RendererFactory, WaveformRenderer,
};
pub use timeline::{LanePlan, Timeline, TrackSource, plan_lanes};
pub use waveform_lane::{LaneId, LaneState, WaveformLane};

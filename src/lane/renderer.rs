// Renderer contract - what a lane needs from a waveform surface
// Implementations decode and draw; lanes only see this trait

use crate::error::RendererError;
use crate::regions::RegionId;
use crate::timebase::Seconds;
use std::fmt;

/// Where a lane's audio comes from (URL or file path)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioSource(String);

impl AudioSource {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local filesystem path, if the source is one (`file://` or bare path)
    pub fn local_path(&self) -> Option<&str> {
        if let Some(path) = self.0.strip_prefix("file://") {
            Some(path)
        } else if self.0.contains("://") {
            None
        } else {
            Some(&self.0)
        }
    }

    /// HTTP(S) URL, if the source is one
    pub fn remote_url(&self) -> Option<&str> {
        (self.0.starts_with("http://") || self.0.starts_with("https://")).then_some(self.0.as_str())
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renderer creation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Waveform height in pixels
    pub height: f32,
    /// Number of peak buckets to compute across the whole source
    pub peak_resolution: usize,
    /// Whether region overlays can be dragged and resized
    pub regions_editable: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            height: 84.0,
            peak_resolution: 800,
            regions_editable: true,
        }
    }
}

/// Region overlay handed to a renderer; bounds in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSpec {
    pub id: RegionId,
    pub line_text: String,
    pub start: Seconds,
    pub end: Seconds,
    pub drag: bool,
    pub resize: bool,
}

/// Events a renderer reports back to its lane
#[derive(Debug, Clone, PartialEq)]
pub enum RendererEvent {
    /// Decode finished; the waveform is displayed
    Ready { duration: Seconds },
    /// Source missing or corrupt
    Failed(RendererError),
    /// User grabbed a region overlay
    RegionUpdateStarted { region: RegionId },
    /// User released a region overlay at new bounds (seconds)
    RegionUpdated {
        region: RegionId,
        start: Seconds,
        end: Seconds,
    },
}

/// One waveform surface bound to one audio source
pub trait WaveformRenderer {
    /// Starts decoding `source`; completion arrives as [`RendererEvent::Ready`]
    fn load(&mut self, source: &AudioSource) -> Result<(), RendererError>;

    /// Adds a draggable/resizable overlay
    fn add_region(&mut self, spec: RegionSpec);

    /// Moves an existing overlay to `spec`'s bounds; unknown ids are ignored
    fn update_region(&mut self, spec: RegionSpec);

    /// Next pending event, if any
    fn poll_event(&mut self) -> Option<RendererEvent>;

    /// Releases all resources; no events are produced afterwards
    fn destroy(&mut self);
}

/// Creates renderers (the `create(config)` side of the collaborator)
pub trait RendererFactory {
    type Renderer: WaveformRenderer;

    fn create(&self, config: &RendererConfig) -> Result<Self::Renderer, RendererError>;
}

// Regions - Lyric lines bound to mutable time intervals
// A RegionSet is edited in place and exported whole after every change

use crate::timebase::Millis;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of generated lyrics; its index is its identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricLine {
    pub index: usize,
    pub text: String,
}

impl LyricLine {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Splits a lyrics block into ordered lines, one per non-blank row
    pub fn split(lyrics: &str) -> Vec<LyricLine> {
        lyrics
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(index, text)| LyricLine::new(index, text))
            .collect()
    }
}

/// Region as it travels on the wire and upward to the caller
///
/// Whole milliseconds. Field names follow the generation backend
/// (`lineText`, `start_ms`, `end_ms`); camelCase bounds are accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRegion {
    #[serde(rename = "lineText", default)]
    pub line_text: String,
    #[serde(alias = "startMs")]
    pub start_ms: u64,
    #[serde(alias = "endMs")]
    pub end_ms: u64,
}

impl TimeRegion {
    pub fn new(line_text: impl Into<String>, start_ms: u64, end_ms: u64) -> Self {
        Self {
            line_text: line_text.into(),
            start_ms,
            end_ms,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Stable identifier of a region within its set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(Uuid);

impl RegionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A mutable interval bound to one line of text
///
/// Bounds may be fractional while held; `end > start` always holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: RegionId,
    pub line_text: String,
    start: Millis,
    end: Millis,
}

impl Region {
    fn new(line_text: String, start: Millis, end: Millis) -> Self {
        Self {
            id: RegionId::new(),
            line_text,
            start,
            end,
        }
    }

    pub fn start(&self) -> Millis {
        self.start
    }

    pub fn end(&self) -> Millis {
        self.end
    }

    fn export(&self) -> TimeRegion {
        TimeRegion {
            line_text: self.line_text.clone(),
            start_ms: self.start.round_to_wire(),
            end_ms: self.end.round_to_wire(),
        }
    }
}

/// Bounds accepted by the region model: finite, non-negative start, and an
/// end that is still after the start once rounded to whole milliseconds
fn valid_bounds(start: Millis, end: Millis) -> bool {
    start.value().is_finite()
        && end.value().is_finite()
        && start.value() >= 0.0
        && end.round_to_wire() > start.round_to_wire()
}

/// Ordered collection of regions, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSet {
    regions: Vec<Region>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zips lyric lines with proposed (start_ms, end_ms) spans by index
    ///
    /// Mismatched lengths produce an empty set and a warning. Spans that do
    /// not satisfy `end > start` are skipped.
    pub fn seed(lines: &[LyricLine], spans: &[(u64, u64)]) -> Self {
        if lines.len() != spans.len() {
            log::warn!(
                "Cannot seed regions: {} lyric lines but {} time spans",
                lines.len(),
                spans.len()
            );
            return Self::new();
        }

        let mut set = Self::new();
        for (line, &(start_ms, end_ms)) in lines.iter().zip(spans) {
            if set
                .push(line.text.clone(), Millis::from(start_ms), Millis::from(end_ms))
                .is_none()
            {
                log::warn!(
                    "Skipping region for line {} ({}..{} ms): end must be after start",
                    line.index,
                    start_ms,
                    end_ms
                );
            }
        }
        set
    }

    /// Seeds from wire regions that already carry their line text
    pub fn from_timestamps(timestamps: &[TimeRegion]) -> Self {
        let mut set = Self::new();
        for ts in timestamps {
            if set
                .push(
                    ts.line_text.clone(),
                    Millis::from(ts.start_ms),
                    Millis::from(ts.end_ms),
                )
                .is_none()
            {
                log::warn!(
                    "Skipping timestamp '{}' ({}..{} ms): end must be after start",
                    ts.line_text,
                    ts.start_ms,
                    ts.end_ms
                );
            }
        }
        set
    }

    /// Appends a region; returns `None` if the bounds are invalid
    pub fn push(&mut self, line_text: String, start: Millis, end: Millis) -> Option<RegionId> {
        if !valid_bounds(start, end) {
            return None;
        }
        let region = Region::new(line_text, start, end);
        let id = region.id;
        self.regions.push(region);
        Some(id)
    }

    /// Moves or resizes exactly one region
    ///
    /// Returns false (and leaves the set untouched) when `new_end <= new_start`,
    /// when the start is negative, or when the id is unknown.
    pub fn apply_edit(&mut self, id: RegionId, new_start: Millis, new_end: Millis) -> bool {
        if !valid_bounds(new_start, new_end) {
            log::debug!(
                "Rejected edit on region {}: {} .. {}",
                id,
                new_start,
                new_end
            );
            return false;
        }

        match self.regions.iter_mut().find(|r| r.id == id) {
            Some(region) => {
                region.start = new_start;
                region.end = new_end;
                true
            }
            None => {
                log::debug!("Rejected edit on unknown region {}", id);
                false
            }
        }
    }

    /// Full authoritative state in insertion order, whole milliseconds
    pub fn export_normalized(&self) -> Vec<TimeRegion> {
        self.regions.iter().map(Region::export).collect()
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn ids(&self) -> Vec<RegionId> {
        self.regions.iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

// Generation payloads - request body, raw response, merged result

use crate::error::GenerationError;
use crate::playback::note::NoteEvent;
use crate::regions::{LyricLine, RegionSet, TimeRegion};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tempo range accepted by the generator (BPM)
pub const MIN_TEMPO: u32 = 60;
pub const MAX_TEMPO: u32 = 180;
pub const DEFAULT_TEMPO: u32 = 96;

/// Key of the generated melody
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Key {
    #[default]
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Key {
    pub const ALL: [Key; 7] = [Key::C, Key::D, Key::E, Key::F, Key::G, Key::A, Key::B];
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Musical style of the generated melody
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Pop,
    Rock,
    Rnb,
    Edm,
    Folk,
}

impl Style {
    pub const ALL: [Style; 5] = [Style::Pop, Style::Rock, Style::Rnb, Style::Edm, Style::Folk];

    /// Wire name ("pop", "rnb", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Pop => "pop",
            Style::Rock => "rock",
            Style::Rnb => "rnb",
            Style::Edm => "edm",
            Style::Folk => "folk",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// Body of `POST /api/generate/melody-preview`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub lyrics: String,
    pub tempo: u32,
    pub key: Key,
    pub style: Style,
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.lyrics.trim().is_empty() {
            return Err(GenerationError::InvalidRequest("lyrics are empty".to_string()));
        }
        if !(MIN_TEMPO..=MAX_TEMPO).contains(&self.tempo) {
            return Err(GenerationError::InvalidRequest(format!(
                "tempo {} outside {}..={}",
                self.tempo, MIN_TEMPO, MAX_TEMPO
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MidiJson {
    #[serde(default)]
    pub notes: Vec<NoteEvent>,
}

/// Response body as the backend sends it
///
/// Notes may arrive top-level or nested under `midiJson`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    #[serde(default)]
    pub guide_audio_url: Option<String>,
    #[serde(default)]
    pub notes: Option<Vec<NoteEvent>>,
    #[serde(default)]
    pub midi_json: Option<MidiJson>,
    #[serde(default)]
    pub timestamps: Vec<TimeRegion>,
}

impl GenerationResponse {
    /// Merges the request fields back in, as the result always echoes them
    pub fn into_result(self, request: &GenerationRequest) -> GenerationResult {
        let notes = self
            .notes
            .or_else(|| self.midi_json.map(|m| m.notes))
            .unwrap_or_default();

        GenerationResult {
            lyrics: request.lyrics.clone(),
            tempo: request.tempo,
            key: request.key,
            style: request.style,
            guide_audio_url: self.guide_audio_url.filter(|url| !url.trim().is_empty()),
            notes,
            timestamps: self.timestamps,
        }
    }
}

/// One successful generation; immutable once produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub lyrics: String,
    pub tempo: u32,
    pub key: Key,
    pub style: Style,
    pub guide_audio_url: Option<String>,
    pub notes: Vec<NoteEvent>,
    pub timestamps: Vec<TimeRegion>,
}

impl GenerationResult {
    pub fn lyric_lines(&self) -> Vec<LyricLine> {
        LyricLine::split(&self.lyrics)
    }

    /// Fresh region set seeded from the result's timestamps
    pub fn region_set(&self) -> RegionSet {
        RegionSet::from_timestamps(&self.timestamps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            lyrics: "When the night is young".to_string(),
            tempo: 96,
            key: Key::C,
            style: Style::Pop,
        }
    }

    #[test]
    fn test_request_body() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "lyrics": "When the night is young",
                "tempo": 96,
                "key": "C",
                "style": "pop"
            })
        );
    }

    #[test]
    fn test_request_validation() {
        assert!(request().validate().is_ok());

        let mut blank = request();
        blank.lyrics = "  \n ".to_string();
        assert!(matches!(blank.validate(), Err(GenerationError::InvalidRequest(_))));

        let mut fast = request();
        fast.tempo = 200;
        assert!(fast.validate().is_err());
    }

    #[test]
    fn test_response_with_nested_notes() {
        let body = r#"{
            "guideAudioUrl": "http://localhost:8000/static/guide.wav",
            "midiJson": {"notes": [{"midi": 60, "time": 0, "duration": 0.5}]},
            "timestamps": [{"lineText": "When the night is young", "start_ms": 0, "end_ms": 1000}]
        }"#;
        let response: GenerationResponse = serde_json::from_str(body).unwrap();
        let result = response.into_result(&request());

        assert_eq!(result.notes, vec![NoteEvent::new(60, 0.0, 0.5)]);
        assert_eq!(result.tempo, 96);
        assert_eq!(result.region_set().len(), 1);
        assert_eq!(
            result.guide_audio_url.as_deref(),
            Some("http://localhost:8000/static/guide.wav")
        );
    }

    #[test]
    fn test_top_level_notes_win() {
        let body = r#"{
            "notes": [{"midi": 64, "time": 1, "duration": 1}],
            "midiJson": {"notes": [{"midi": 60, "time": 0, "duration": 0.5}]}
        }"#;
        let response: GenerationResponse = serde_json::from_str(body).unwrap();
        let result = response.into_result(&request());
        assert_eq!(result.notes, vec![NoteEvent::new(64, 1.0, 1.0)]);
        assert!(result.timestamps.is_empty());
        assert!(result.guide_audio_url.is_none());
    }

    #[test]
    fn test_style_names() {
        assert_eq!(Style::Rnb.as_str(), "rnb");
        assert_eq!(Style::Rnb.to_string(), "RNB");
        assert_eq!(Key::G.to_string(), "G");
    }
}

// Preview form - lyrics and parameters submitted for a melody preview

use crate::error::GenerationError;
use crate::generation::client::GenerationClient;
use crate::generation::payload::{
    DEFAULT_TEMPO, GenerationRequest, GenerationResult, Key, MAX_TEMPO, MIN_TEMPO, Style,
};

/// Form state behind the "Generate" button
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewForm {
    pub lyrics: String,
    tempo: u32,
    pub key: Key,
    pub style: Style,
    loading: bool,
    error: Option<String>,
}

impl Default for PreviewForm {
    fn default() -> Self {
        Self::new(String::new(), DEFAULT_TEMPO, Key::default(), Style::default())
    }
}

impl PreviewForm {
    pub fn new(lyrics: impl Into<String>, tempo: u32, key: Key, style: Style) -> Self {
        let mut form = Self {
            lyrics: lyrics.into(),
            tempo: DEFAULT_TEMPO,
            key,
            style,
            loading: false,
            error: None,
        };
        form.set_tempo(tempo);
        form
    }

    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    /// Sets the tempo, clamped to the generator's range
    pub fn set_tempo(&mut self, tempo: u32) {
        self.tempo = tempo.clamp(MIN_TEMPO, MAX_TEMPO);
    }

    /// Submission needs lyrics and no request already in flight
    pub fn can_submit(&self) -> bool {
        !self.loading && !self.lyrics.trim().is_empty()
    }

    /// Enters the loading state and returns the request to send
    pub fn begin_submit(&mut self) -> Option<GenerationRequest> {
        if !self.can_submit() {
            return None;
        }
        self.error = None;
        self.loading = true;
        Some(GenerationRequest {
            lyrics: self.lyrics.clone(),
            tempo: self.tempo,
            key: self.key,
            style: self.style,
        })
    }

    /// Leaves the loading state; a failure is kept as the form's message
    pub fn finish(
        &mut self,
        outcome: Result<GenerationResult, GenerationError>,
    ) -> Option<GenerationResult> {
        self.loading = false;
        match outcome {
            Ok(result) => Some(result),
            Err(e) => {
                log::warn!("Generation failed: {}", e);
                self.error = Some(e.to_string());
                None
            }
        }
    }

    /// Synchronous submit through `client`
    pub fn submit_with<C: GenerationClient + ?Sized>(
        &mut self,
        client: &C,
    ) -> Option<GenerationResult> {
        let request = self.begin_submit()?;
        let outcome = client.generate(&request);
        self.finish(outcome)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

// Error types for each collaborator boundary

use std::path::PathBuf;

/// Generation request errors
///
/// `Status` is what the user sees when the backend answers non-2xx.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Preview failed: {0}")]
    Status(u16),

    #[error("Preview failed: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Waveform renderer errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RendererError {
    #[error("Renderer initialization failed: {0}")]
    InitFailed(String),

    #[error("Audio source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Audio decode failed: {0}")]
    DecodeFailed(String),
}

/// Synthesis collaborator errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Audio output unavailable: {0}")]
    Unavailable(String),

    #[error("Audio stream error: {0}")]
    Stream(String),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write config {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Cannot serialize config: {0}")]
    Serialize(#[from] ron::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Umbrella error for callers that cross several boundaries
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Renderer(#[from] RendererError),

    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = StudioError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = GenerationError::Status(502);
        assert_eq!(err.to_string(), "Preview failed: 502");
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: StudioError = SynthError::NoDevice.into();
        assert_eq!(err.to_string(), "No audio output device found");
    }
}

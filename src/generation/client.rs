// Generation client - transport seam for the melody preview call

use crate::error::GenerationError;
use crate::generation::payload::{GenerationRequest, GenerationResponse, GenerationResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Route of the melody preview endpoint
pub const MELODY_PREVIEW_PATH: &str = "/api/generate/melody-preview";

/// Full endpoint URL for a backend base URL
pub fn endpoint(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), MELODY_PREVIEW_PATH)
}

/// Turns an HTTP status and body into a result
///
/// Non-2xx statuses become [`GenerationError::Status`] regardless of the
/// body, so no partial result ever escapes.
pub fn decode_response(
    status: u16,
    body: &str,
    request: &GenerationRequest,
) -> Result<GenerationResult, GenerationError> {
    if !(200..300).contains(&status) {
        return Err(GenerationError::Status(status));
    }
    let response: GenerationResponse = serde_json::from_str(body)?;
    Ok(response.into_result(request))
}

/// Anything that can answer a melody preview request
///
/// Implementations must be callable from a worker thread.
pub trait GenerationClient: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError>;
}

/// Blocking HTTP client for the generation backend
#[derive(Clone)]
pub struct HttpGenerationClient {
    url: String,
    agent: ureq::Agent,
}

impl HttpGenerationClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            url: endpoint(base_url),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for HttpGenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGenerationClient")
            .field("url", &self.url)
            .finish()
    }
}

impl GenerationClient for HttpGenerationClient {
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError> {
        request.validate()?;
        let body = serde_json::to_string(request)?;
        log::info!("POST {} ({} bytes)", self.url, body.len());

        let response = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_string(&body);

        match response {
            Ok(response) => {
                let status = response.status();
                let text = response.into_string()?;
                decode_response(status, &text, request)
            }
            Err(ureq::Error::Status(status, _)) => Err(GenerationError::Status(status)),
            Err(e) => Err(GenerationError::Transport(e.to_string())),
        }
    }
}

/// Answers every request from a saved response body
#[derive(Debug, Clone)]
pub struct OfflineGenerationClient {
    response_path: PathBuf,
}

impl OfflineGenerationClient {
    pub fn new(response_path: impl AsRef<Path>) -> Self {
        Self {
            response_path: response_path.as_ref().to_path_buf(),
        }
    }

    pub fn response_path(&self) -> &Path {
        &self.response_path
    }
}

impl GenerationClient for OfflineGenerationClient {
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError> {
        request.validate()?;
        let body = std::fs::read_to_string(&self.response_path)?;
        log::info!(
            "Answering {} from {:?}",
            MELODY_PREVIEW_PATH,
            self.response_path
        );
        decode_response(200, &body, request)
    }
}

// Generation module - Melody preview request/response contract
// The transport is pluggable; only the payloads are fixed

pub mod client;
pub mod form;
pub mod payload;

pub use client::{
    GenerationClient, HttpGenerationClient, MELODY_PREVIEW_PATH, OfflineGenerationClient,
    decode_response, endpoint,
};
pub use form::PreviewForm;
pub use payload::{GenerationRequest, GenerationResponse, GenerationResult, Key, Style};

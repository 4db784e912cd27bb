//! Failure classes for a single content generation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("no grammar point with id {id} in the catalog")]
    UnknownPoint { id: String },

    /// The prompt file has not been rendered yet.
    #[error("prompt file not found: {path} (run `grammarsite prompt` first)")]
    MissingPrompt { path: String },

    /// Network or API failure, including timeouts.
    #[error("generation endpoint failed: {0:#}")]
    Endpoint(anyhow::Error),

    /// No JSON object in the response, neither bare nor fenced.
    #[error("unparseable response: no valid JSON found")]
    Unparseable,

    /// JSON parsed but a required top-level field is absent.
    #[error("malformed content: missing required field `{field}`")]
    Malformed { field: &'static str },

    #[error("{0:#}")]
    Io(anyhow::Error),
}

impl GenerateError {
    /// Errors the operator may clear by simply re-running the item.
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerateError::Endpoint(_) | GenerateError::Unparseable)
    }
}

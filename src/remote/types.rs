use serde::{Deserialize, Serialize};

use crate::config::ModelParams;
use crate::error::{RemoteError, RemoteResult};
use crate::response::Response;

/// Request body sent to the remote source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteRequest {
    pub question: String,
    /// Full dataset, for deployments that answer from the data directly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_params: Option<ModelParams>,
}

impl RemoteRequest {
    /// Create a request carrying just the question
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            dataset: None,
            model_params: None,
        }
    }

    /// Attach dataset context
    pub fn with_dataset(mut self, dataset: serde_json::Value) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Attach model parameters; empty parameters are left off the wire
    pub fn with_model_params(mut self, params: ModelParams) -> Self {
        if params != ModelParams::default() {
            self.model_params = Some(params);
        }
        self
    }
}

/// Error body some deployments return alongside non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Decode and validate a success body.
///
/// The payload must parse as a [`Response`] and carry non-empty text.
pub fn decode_response(body: &str) -> RemoteResult<Response> {
    let response: Response =
        serde_json::from_str(body).map_err(|e| RemoteError::InvalidResponse {
            message: format!("Failed to parse response: {}", e),
        })?;

    response
        .validate()
        .map_err(|message| RemoteError::InvalidResponse { message })?;

    Ok(response)
}

/// Best-effort extraction of a readable message from an error body
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}

use thiserror::Error;

/// Failure of a single call against the wardrobe backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// No response at all: connection refused, DNS, timeout.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx response. `message` is the backend-supplied `erro`/`error` field, if any.
    #[error("Backend returned status {status}: {}", message.as_deref().unwrap_or("<no message>"))]
    Api { status: u16, message: Option<String> },

    #[error("Failed to decode backend response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn api(status: u16, message: Option<String>) -> Self {
        Self::Api { status, message }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// User-facing errors of the suggestion flow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlowError {
    /// Rejected locally, nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The backend reported an error or could not be reached.
    #[error("{0}")]
    Request(String),

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(i64),

    #[error("There is no suggestion to rate yet")]
    NoSuggestion,

    #[error("Feedback for this suggestion was already recorded")]
    FeedbackAlreadyRecorded,
}

/// Local validation of a wardrobe item payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("Nome é obrigatório")]
    MissingName,

    #[error("Tipo é obrigatório")]
    MissingCategory,

    #[error("Cor é obrigatória")]
    MissingColor,

    #[error("Minimum temperature {min} is above maximum {max}")]
    InvertedRange { min: i32, max: i32 },

    #[error("Nenhum campo para atualizar")]
    Empty,
}

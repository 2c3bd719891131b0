//! The outfit suggestion cycle: ask the backend for an outfit for a city,
//! normalize what comes back, and collect one rating for it.
//!
//! [`SuggestionFlow`] owns all UI state. Front ends never mutate it directly;
//! they call operations and render from [`SuggestionFlow::view`].

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{
    backend::WardrobeBackend,
    error::{BackendError, FlowError},
    model::{
        FeedbackPayload, FeedbackRating, GarmentCategory, OutfitPiece, OutfitSuggestion,
        SuggestionPayload, WeatherSnapshot,
    },
};

pub const EMPTY_CITY_MESSAGE: &str = "Por favor, digite o nome de uma cidade.";
pub const SUGGESTION_FAILED_MESSAGE: &str = "Erro ao buscar sugestão";
pub const CONNECTION_FAILED_MESSAGE: &str = "Erro de conexão com o servidor";

/// Rating state of the current suggestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedbackState {
    #[default]
    Pending,
    /// Terminal until the next suggestion request.
    Recorded(FeedbackRating),
}

/// Issued by [`SuggestionFlow::begin_request`]; names the city being queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub city: String,
}

#[derive(Debug)]
pub struct SuggestionFlow<B> {
    backend: B,
    default_city: String,
    city: String,
    loading: bool,
    error: Option<FlowError>,
    suggestion: Option<OutfitSuggestion>,
    feedback: FeedbackState,
    activated: bool,
}

impl<B: WardrobeBackend> SuggestionFlow<B> {
    pub fn new(backend: B, default_city: impl Into<String>) -> Self {
        let default_city = default_city.into();
        Self {
            backend,
            city: default_city.clone(),
            default_city,
            loading: false,
            error: None,
            suggestion: None,
            feedback: FeedbackState::Pending,
            activated: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// Replace the city input. Takes effect on the next request.
    pub fn set_city(&mut self, city: impl Into<String>) {
        self.city = city.into();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&FlowError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn suggestion(&self) -> Option<&OutfitSuggestion> {
        self.suggestion.as_ref()
    }

    pub fn feedback(&self) -> FeedbackState {
        self.feedback
    }

    /// First activation requests a suggestion for the default city; later
    /// calls do nothing.
    pub async fn activate(&mut self) -> Result<(), FlowError> {
        if self.activated {
            return Ok(());
        }
        self.activated = true;
        self.city = self.default_city.clone();
        self.request_suggestion().await
    }

    /// Request a suggestion for the current city input.
    pub async fn request_suggestion(&mut self) -> Result<(), FlowError> {
        let pending = self.begin_request()?;
        let result = self.backend.fetch_suggestion(&pending.city).await;
        self.complete_request(&pending, result)
    }

    /// Set the city input and request a suggestion for it.
    pub async fn request_for(&mut self, city: impl Into<String>) -> Result<(), FlowError> {
        self.set_city(city);
        self.request_suggestion().await
    }

    /// Validate the input and enter the loading state.
    ///
    /// Feedback of the previous suggestion is reset here, before anything is
    /// sent, so it is cleared even when the request then fails.
    pub fn begin_request(&mut self) -> Result<PendingRequest, FlowError> {
        let city = self.city.trim();
        if city.is_empty() {
            let err = FlowError::Validation(EMPTY_CITY_MESSAGE.to_string());
            self.error = Some(err.clone());
            return Err(err);
        }

        let pending = PendingRequest { city: city.to_string() };
        self.loading = true;
        self.error = None;
        self.feedback = FeedbackState::Pending;
        info!(city = %pending.city, "Suggestion requested");
        Ok(pending)
    }

    /// Apply the outcome of a request. The latest completion always wins.
    pub fn complete_request(
        &mut self,
        pending: &PendingRequest,
        result: Result<SuggestionPayload, BackendError>,
    ) -> Result<(), FlowError> {
        self.loading = false;

        match result {
            Ok(payload) => {
                let suggestion = OutfitSuggestion::from_payload(&pending.city, payload);
                info!(
                    city = %pending.city,
                    confidence = suggestion.confidence,
                    pieces = suggestion.outfit.len(),
                    "Suggestion received"
                );
                self.suggestion = Some(suggestion);
                Ok(())
            }
            Err(err) => {
                warn!(city = %pending.city, error = %err, "Suggestion request failed");
                let err = FlowError::Request(request_error_message(err));
                self.suggestion = None;
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Rate the current suggestion.
    ///
    /// Delivery is best effort: a failed submission is logged and the rating
    /// is still recorded locally.
    pub async fn submit_feedback(&mut self, rating: i64) -> Result<FeedbackRating, FlowError> {
        let rating = FeedbackRating::new(rating)?;
        let suggestion = self.suggestion.as_ref().ok_or(FlowError::NoSuggestion)?;
        if let FeedbackState::Recorded(_) = self.feedback {
            return Err(FlowError::FeedbackAlreadyRecorded);
        }

        let payload = FeedbackPayload::new(&suggestion.city, suggestion.weather.temperature, rating);
        if let Err(err) = self.backend.submit_feedback(&payload).await {
            warn!(error = %err, rating = rating.value(), "Failed to submit feedback");
        }

        self.feedback = FeedbackState::Recorded(rating);
        Ok(rating)
    }

    /// Snapshot of everything a front end needs to draw the flow.
    pub fn view(&self) -> FlowView<'_> {
        let result = match (&self.suggestion, self.loading) {
            (Some(suggestion), false) => Some(SuggestionView {
                weather: &suggestion.weather,
                headline: &suggestion.headline,
                explanation: &suggestion.explanation,
                confidence: suggestion.confidence,
                pieces: suggestion.ordered_pieces(),
                feedback: match self.feedback {
                    FeedbackState::Pending => FeedbackView::Prompt,
                    FeedbackState::Recorded(rating) => FeedbackView::Thanked(rating),
                },
                received_at: suggestion.received_at,
            }),
            _ => None,
        };

        FlowView {
            city: &self.city,
            loading: self.loading,
            error: self.error.as_ref().map(ToString::to_string),
            result,
        }
    }
}

fn request_error_message(err: BackendError) -> String {
    match err {
        BackendError::Api { message: Some(message), .. } => message,
        BackendError::Api { message: None, .. } => SUGGESTION_FAILED_MESSAGE.to_string(),
        BackendError::Transport(_) | BackendError::Decode(_) => CONNECTION_FAILED_MESSAGE.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowView<'a> {
    pub city: &'a str,
    pub loading: bool,
    pub error: Option<String>,
    /// Absent while loading and when there is no suggestion.
    pub result: Option<SuggestionView<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionView<'a> {
    pub weather: &'a WeatherSnapshot,
    pub headline: &'a str,
    pub explanation: &'a str,
    pub confidence: i64,
    /// Already in display order.
    pub pieces: Vec<(GarmentCategory, &'a OutfitPiece)>,
    pub feedback: FeedbackView,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackView {
    /// Show the 1–5 rating control.
    Prompt,
    Thanked(FeedbackRating),
}

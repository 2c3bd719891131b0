//! Core library for the `wardrobe` client.
//!
//! This crate defines:
//! - Configuration handling
//! - Abstraction over the wardrobe backend, with a REST implementation
//! - Shared domain models (weather, outfits, ratings, wardrobe items)
//! - The suggestion flow state machine
//!
//! It is used by `wardrobe-cli`, but can also drive any other front end.

pub mod backend;
pub mod config;
pub mod error;
pub mod flow;
pub mod model;

pub use backend::{WardrobeBackend, backend_from_config, http::HttpBackend, load_item_image};
pub use config::Config;
pub use error::{BackendError, DraftError, FlowError};
pub use flow::{FeedbackState, FeedbackView, FlowView, SuggestionFlow, SuggestionView};
pub use model::{
    FeedbackLabel, FeedbackPayload, FeedbackRating, GarmentCategory, ItemDraft, ItemUpload,
    OutfitPiece, OutfitSuggestion, SuggestionPayload, WardrobeItem, WeatherSnapshot,
};

use crate::{
    Config,
    backend::http::HttpBackend,
    error::BackendError,
    model::{FeedbackPayload, ItemDraft, ItemUpload, SuggestionPayload, WardrobeItem},
};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod http;

/// Everything the client needs from the wardrobe backend.
///
/// The suggestion flow only talks to this trait, so it can run against an
/// in-memory fake in tests.
#[async_trait]
pub trait WardrobeBackend: Send + Sync + Debug {
    async fn fetch_suggestion(&self, city: &str) -> Result<SuggestionPayload, BackendError>;

    async fn submit_feedback(&self, payload: &FeedbackPayload) -> Result<(), BackendError>;

    async fn list_items(&self) -> Result<Vec<WardrobeItem>, BackendError>;

    async fn create_item(&self, draft: &ItemDraft) -> Result<WardrobeItem, BackendError>;

    async fn update_item(&self, id: i64, draft: &ItemDraft) -> Result<WardrobeItem, BackendError>;

    async fn delete_item(&self, id: i64) -> Result<(), BackendError>;

    /// Store an image on the backend; returns the stored file name.
    async fn upload_image(&self, upload: &ItemUpload) -> Result<String, BackendError>;

    /// `GET /api/image/{id}`
    async fn fetch_item_image(&self, id: i64) -> Result<Vec<u8>, BackendError>;

    /// `GET /imagens/{file_name}`
    async fn fetch_image_file(&self, file_name: &str) -> Result<Vec<u8>, BackendError>;
}

/// Load the image of an item, trying the id-based route first and the
/// file-name route second. `None` means the caller should show a placeholder.
pub async fn load_item_image<B>(backend: &B, id: Option<i64>, file_name: Option<&str>) -> Option<Vec<u8>>
where
    B: WardrobeBackend + ?Sized,
{
    if let Some(id) = id {
        match backend.fetch_item_image(id).await {
            Ok(bytes) => return Some(bytes),
            Err(err) => tracing::debug!(id, error = %err, "Image by id unavailable, falling back to file name"),
        }
    }

    let file_name = file_name.map(str::trim).filter(|f| !f.is_empty())?;
    match backend.fetch_image_file(file_name).await {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            tracing::debug!(file_name, error = %err, "Image file unavailable");
            None
        }
    }
}

/// Construct the HTTP backend described by the configuration.
pub fn backend_from_config(config: &Config) -> anyhow::Result<HttpBackend> {
    let base_url = config.base_url.as_str();
    if base_url.trim().is_empty() {
        anyhow::bail!(
            "No backend URL configured.\n\
             Hint: run `wardrobe configure --base-url http://localhost:5000`."
        );
    }

    let backend = HttpBackend::with_timeout(base_url, Duration::from_secs(config.timeout_secs))?;
    Ok(backend)
}

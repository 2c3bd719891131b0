use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Response,
    multipart::{Form, Part},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::{
    error::BackendError,
    model::{FeedbackPayload, ItemDraft, ItemUpload, SuggestionPayload, WardrobeItem},
};

use super::WardrobeBackend;

/// Error body returned by the backend. Routes disagree on the key.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    erro: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn message(self) -> Option<String> {
        self.erro.or(self.error).filter(|m| !m.trim().is_empty())
    }
}

/// Fields checked on a successful suggestion answer before decoding it. The
/// backend answers an empty wardrobe with 200, an `erro` and no weather.
#[derive(Debug, Deserialize)]
struct SuggestionEnvelope {
    clima: Option<serde_json::Value>,
    #[serde(flatten)]
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    filename: String,
}

/// `WardrobeBackend` over plain REST.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    http: Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, http))
    }

    fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// JSON body when there is nothing to upload, multipart otherwise.
    fn item_body(request: RequestBuilder, draft: &ItemDraft) -> RequestBuilder {
        match &draft.upload {
            None => request.json(draft),
            Some(upload) => {
                let form = draft
                    .form_fields()
                    .into_iter()
                    .fold(Form::new(), |form, (name, value)| form.text(name, value));
                let part = Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone());
                request.multipart(form.part("imagem", part))
            }
        }
    }

    async fn send(request: RequestBuilder) -> Result<Response, BackendError> {
        let res = request.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        debug!(%status, body = %truncate_body(&body), "Backend returned an error");

        let message = serde_json::from_str::<ErrorBody>(&body).ok().and_then(ErrorBody::message);

        Err(BackendError::api(status.as_u16(), message))
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, BackendError> {
        let res = Self::send(request).await?;
        let body = res.text().await?;
        decode(&body)
    }

    async fn send_bytes(request: RequestBuilder) -> Result<Vec<u8>, BackendError> {
        let res = Self::send(request).await?;
        Ok(res.bytes().await?.to_vec())
    }
}

#[async_trait]
impl WardrobeBackend for HttpBackend {
    #[instrument(skip(self))]
    async fn fetch_suggestion(&self, city: &str) -> Result<SuggestionPayload, BackendError> {
        info!("Requesting outfit suggestion");
        let request = self
            .http
            .post(self.url("/api/sugestao"))
            .json(&json!({ "cidade": city }));

        let res = Self::send(request).await?;
        let status = res.status().as_u16();
        let body = res.text().await?;

        if let Ok(envelope) = serde_json::from_str::<SuggestionEnvelope>(&body) {
            if envelope.clima.is_none() {
                if let Some(message) = envelope.error.message() {
                    debug!(status, %message, "Backend refused the suggestion");
                    return Err(BackendError::api(status, Some(message)));
                }
            }
        }

        decode(&body)
    }

    #[instrument(skip(self, payload), fields(city = %payload.city, score = payload.score))]
    async fn submit_feedback(&self, payload: &FeedbackPayload) -> Result<(), BackendError> {
        info!(label = payload.label.as_str(), "Submitting feedback");
        let request = self.http.post(self.url("/api/feedback")).json(payload);

        Self::send(request).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn list_items(&self) -> Result<Vec<WardrobeItem>, BackendError> {
        Self::send_json(self.http.get(self.url("/roupas"))).await
    }

    #[instrument(skip(self, draft), fields(multipart = draft.upload.is_some()))]
    async fn create_item(&self, draft: &ItemDraft) -> Result<WardrobeItem, BackendError> {
        let request = Self::item_body(self.http.post(self.url("/roupas")), draft);
        let item: WardrobeItem = Self::send_json(request).await?;
        info!(id = item.id, "Item created");
        Ok(item)
    }

    #[instrument(skip(self, draft), fields(multipart = draft.upload.is_some()))]
    async fn update_item(&self, id: i64, draft: &ItemDraft) -> Result<WardrobeItem, BackendError> {
        let request = Self::item_body(self.http.put(self.url(&format!("/roupas/{id}"))), draft);
        let item = Self::send_json(request).await?;
        info!("Item updated");
        Ok(item)
    }

    #[instrument(skip(self))]
    async fn delete_item(&self, id: i64) -> Result<(), BackendError> {
        Self::send(self.http.delete(self.url(&format!("/roupas/{id}")))).await?;
        info!("Item deleted");
        Ok(())
    }

    #[instrument(skip(self, upload), fields(file_name = %upload.file_name))]
    async fn upload_image(&self, upload: &ItemUpload) -> Result<String, BackendError> {
        let part = Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone());
        let request = self
            .http
            .post(self.url("/upload-imagem"))
            .multipart(Form::new().part("file", part));

        let res: UploadResponse = Self::send_json(request).await?;
        Ok(res.filename)
    }

    #[instrument(skip(self))]
    async fn fetch_item_image(&self, id: i64) -> Result<Vec<u8>, BackendError> {
        Self::send_bytes(self.http.get(self.url(&format!("/api/image/{id}")))).await
    }

    #[instrument(skip(self))]
    async fn fetch_image_file(&self, file_name: &str) -> Result<Vec<u8>, BackendError> {
        Self::send_bytes(self.http.get(self.url(&format!("/imagens/{file_name}")))).await
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body)
        .map_err(|err| BackendError::Decode(format!("{err} (body: {})", truncate_body(body))))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

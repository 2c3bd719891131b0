use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use std::{collections::HashMap, fmt};

use crate::error::{DraftError, FlowError};

/// Scale from the backend's raw 0–20 score to a 0–100 display percentage.
pub const CONFIDENCE_SCALE: f64 = 5.0;

pub const FALLBACK_EXPLANATION: &str = "Sugestão baseada no clima atual";

/// Current weather for a city, as returned alongside a suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "temperatura", deserialize_with = "rounded_i32")]
    pub temperature: i32,
    #[serde(rename = "umidade", default, deserialize_with = "percent")]
    pub humidity: u8,
    /// km/h
    #[serde(rename = "vento", default)]
    pub wind_speed: f64,
    #[serde(rename = "condicao", default)]
    pub condition: String,
    /// km
    #[serde(rename = "visibilidade", default)]
    pub visibility: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentCategory {
    Outerwear,
    Top,
    Bottom,
    Footwear,
    Accessory,
}

impl GarmentCategory {
    /// Fixed order in which an outfit is presented.
    pub const DISPLAY_ORDER: [GarmentCategory; 4] = [
        GarmentCategory::Outerwear,
        GarmentCategory::Top,
        GarmentCategory::Bottom,
        GarmentCategory::Footwear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GarmentCategory::Outerwear => "outerwear",
            GarmentCategory::Top => "top",
            GarmentCategory::Bottom => "bottom",
            GarmentCategory::Footwear => "footwear",
            GarmentCategory::Accessory => "accessory",
        }
    }

    /// Portuguese name, as the backend and the web form spell it.
    pub fn label(&self) -> &'static str {
        match self {
            GarmentCategory::Outerwear => "casaco",
            GarmentCategory::Top => "superior",
            GarmentCategory::Bottom => "inferior",
            GarmentCategory::Footwear => "calçado",
            GarmentCategory::Accessory => "acessório",
        }
    }

    /// Accepts the English names and the Portuguese names the backend stores.
    pub fn parse(value: &str) -> Option<Self> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "outerwear" | "casaco" => Some(GarmentCategory::Outerwear),
            "top" | "superior" => Some(GarmentCategory::Top),
            "bottom" | "inferior" => Some(GarmentCategory::Bottom),
            "footwear" | "calçado" | "calcado" => Some(GarmentCategory::Footwear),
            "accessory" | "acessorio" | "acessório" => Some(GarmentCategory::Accessory),
            _ => None,
        }
    }

    /// Placeholder shown when an item image cannot be loaded.
    pub fn glyph(category: Option<GarmentCategory>) -> &'static str {
        match category {
            Some(GarmentCategory::Outerwear) => "🧥",
            Some(GarmentCategory::Top) => "👔",
            Some(GarmentCategory::Bottom) => "👖",
            Some(GarmentCategory::Footwear) => "👟",
            _ => "👕",
        }
    }
}

impl fmt::Display for GarmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One piece as listed in the backend's `sugestao` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedPiece {
    #[serde(rename = "tipo")]
    pub category: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "cor", default)]
    pub color: String,
    #[serde(rename = "imagem_path", default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionDetails {
    #[serde(rename = "recomendacao", default)]
    pub recommendation: Option<String>,
}

/// Success body of `POST /api/sugestao`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionPayload {
    #[serde(rename = "clima")]
    pub weather: WeatherSnapshot,
    #[serde(default)]
    pub score: f64,
    #[serde(rename = "sugestao", default, deserialize_with = "null_as_empty")]
    pub pieces: Vec<RecommendedPiece>,
    #[serde(rename = "detalhes", default)]
    pub details: Option<SuggestionDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutfitPiece {
    pub id: Option<i64>,
    pub name: String,
    pub color: String,
    pub image: Option<String>,
}

impl From<RecommendedPiece> for OutfitPiece {
    fn from(piece: RecommendedPiece) -> Self {
        Self {
            id: piece.id,
            name: piece.name,
            color: piece.color,
            image: piece.image.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// A normalized outfit recommendation, ready to be presented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutfitSuggestion {
    pub city: String,
    pub weather: WeatherSnapshot,
    pub outfit: HashMap<GarmentCategory, OutfitPiece>,
    pub headline: String,
    pub explanation: String,
    pub confidence: i64,
    pub received_at: DateTime<Utc>,
}

impl OutfitSuggestion {
    /// Normalize a backend payload.
    ///
    /// Pieces are inserted in the order received, so a repeated category keeps
    /// the last piece. Pieces whose category is unknown are dropped.
    pub fn from_payload(requested_city: &str, payload: SuggestionPayload) -> Self {
        let mut outfit = HashMap::new();

        for piece in payload.pieces {
            let Some(category) = GarmentCategory::parse(&piece.category) else {
                tracing::warn!(category = %piece.category, name = %piece.name, "Dropping piece with unknown category");
                continue;
            };

            if let Some(previous) = outfit.insert(category, OutfitPiece::from(piece)) {
                tracing::debug!(%category, replaced = %previous.name, "Duplicate category in suggestion, keeping the last piece");
            }
        }

        let explanation = payload
            .details
            .and_then(|d| d.recommendation)
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_EXPLANATION.to_string());

        Self {
            city: requested_city.to_string(),
            headline: headline(payload.weather.temperature, &payload.weather.city),
            confidence: confidence(payload.score),
            weather: payload.weather,
            outfit,
            explanation,
            received_at: Utc::now(),
        }
    }

    /// Pieces in display order; categories without a piece are skipped.
    pub fn ordered_pieces(&self) -> Vec<(GarmentCategory, &OutfitPiece)> {
        GarmentCategory::DISPLAY_ORDER
            .iter()
            .filter_map(|category| self.outfit.get(category).map(|piece| (*category, piece)))
            .collect()
    }
}

pub fn headline(temperature: i32, city: &str) -> String {
    format!("Outfit perfeito para {temperature}°C em {city}")
}

pub fn confidence(score: f64) -> i64 {
    (score * CONFIDENCE_SCALE).round() as i64
}

/// Star rating given to one suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FeedbackRating(u8);

impl FeedbackRating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, FlowError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(FlowError::InvalidRating(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> FeedbackLabel {
        match self.0 {
            Self::MAX => FeedbackLabel::Positive,
            Self::MIN => FeedbackLabel::Negative,
            _ => FeedbackLabel::Neutral,
        }
    }
}

impl fmt::Display for FeedbackRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse classification sent next to the rating, for backend analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackLabel {
    #[serde(rename = "positivo")]
    Positive,
    #[serde(rename = "neutro")]
    Neutral,
    #[serde(rename = "negativo")]
    Negative,
}

impl FeedbackLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackLabel::Positive => "positivo",
            FeedbackLabel::Neutral => "neutro",
            FeedbackLabel::Negative => "negativo",
        }
    }
}

/// Body of `POST /api/feedback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackPayload {
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "temperatura")]
    pub temperature: i32,
    #[serde(rename = "tipo_feedback")]
    pub label: FeedbackLabel,
    pub score: u8,
}

impl FeedbackPayload {
    pub fn new(city: &str, temperature: i32, rating: FeedbackRating) -> Self {
        Self {
            city: city.to_string(),
            temperature,
            label: rating.label(),
            score: rating.value(),
        }
    }
}

/// A wardrobe item as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardrobeItem {
    pub id: i64,
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(rename = "tipo", default)]
    pub category: String,
    #[serde(rename = "cor", default)]
    pub color: String,
    #[serde(rename = "ocasiao", default)]
    pub occasion: Option<String>,
    #[serde(rename = "temperatura_min", default, deserialize_with = "loose_temperature")]
    pub min_temperature: Option<i32>,
    #[serde(rename = "temperatura_max", default, deserialize_with = "loose_temperature")]
    pub max_temperature: Option<i32>,
    #[serde(rename = "imagem", alias = "imagem_path", default)]
    pub image: Option<String>,
}

impl WardrobeItem {
    pub fn garment_category(&self) -> Option<GarmentCategory> {
        GarmentCategory::parse(&self.category)
    }
}

/// A local image file to attach to an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Create/update payload for a wardrobe item.
///
/// With an `upload` the request is sent as multipart, otherwise as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemDraft {
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "tipo", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "cor", skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "temperatura_min", skip_serializing_if = "Option::is_none")]
    pub min_temperature: Option<i32>,
    #[serde(rename = "temperatura_max", skip_serializing_if = "Option::is_none")]
    pub max_temperature: Option<i32>,
    #[serde(rename = "imagem_path", skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(skip)]
    pub upload: Option<ItemUpload>,
}

impl ItemDraft {
    /// Checks required before creating an item.
    pub fn validate_for_create(&self) -> Result<(), DraftError> {
        if is_blank(&self.name) {
            return Err(DraftError::MissingName);
        }
        if is_blank(&self.category) {
            return Err(DraftError::MissingCategory);
        }
        if is_blank(&self.color) {
            return Err(DraftError::MissingColor);
        }
        self.validate_range()
    }

    pub fn validate_for_update(&self) -> Result<(), DraftError> {
        let empty = self.name.is_none()
            && self.category.is_none()
            && self.color.is_none()
            && self.min_temperature.is_none()
            && self.max_temperature.is_none()
            && self.image_path.is_none()
            && self.upload.is_none();
        if empty {
            return Err(DraftError::Empty);
        }
        self.validate_range()
    }

    fn validate_range(&self) -> Result<(), DraftError> {
        match (self.min_temperature, self.max_temperature) {
            (Some(min), Some(max)) if min > max => Err(DraftError::InvertedRange { min, max }),
            _ => Ok(()),
        }
    }

    /// Text fields as sent in a multipart form.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(name) = &self.name {
            fields.push(("nome", name.clone()));
        }
        if let Some(category) = &self.category {
            fields.push(("tipo", category.clone()));
        }
        if let Some(color) = &self.color {
            fields.push(("cor", color.clone()));
        }
        if let Some(min) = self.min_temperature {
            fields.push(("temperatura_min", min.to_string()));
        }
        if let Some(max) = self.max_temperature {
            fields.push(("temperatura_max", max.to_string()));
        }
        fields
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|s| s.trim().is_empty())
}

fn rounded_i32<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.round() as i32)
}

fn percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.round().clamp(0.0, 100.0) as u8)
}

/// Items created through the web form store temperatures as text, so a
/// number, a numeric string, `""` and null are all accepted.
fn loose_temperature<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(value)) => Ok(Some(value.round() as i32)),
        Some(Raw::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(|value| Some(value.round() as i32))
                .ok_or_else(|| D::Error::custom(format!("invalid temperature '{text}'")))
        }
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

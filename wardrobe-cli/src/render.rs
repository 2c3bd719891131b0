//! Text rendering of flow snapshots and item lists.

use chrono::Local;
use std::fmt::Write;
use wardrobe_core::{
    FeedbackRating, FeedbackView, FlowView, GarmentCategory, SuggestionView, WardrobeItem,
};

pub const RATING_PROMPT: &str = "Como você avalia esta sugestão?";

pub fn stars(count: u8) -> String {
    "⭐".repeat(usize::from(count))
}

pub fn loading(city: &str) -> String {
    format!("⏳ Analisando clima em {} e gerando sugestão...", city.trim())
}

pub fn flow(view: &FlowView<'_>) -> String {
    let mut out = String::new();

    if let Some(error) = &view.error {
        let _ = writeln!(out, "⚠️  {error}");
    }
    if view.loading {
        let _ = writeln!(out, "{}", loading(view.city));
    }
    if let Some(result) = &view.result {
        out.push_str(&suggestion_view(result));
    }

    out
}

fn suggestion_view(result: &SuggestionView<'_>) -> String {
    let mut out = String::new();
    let w = result.weather;

    let _ = writeln!(out, "🌤️  Clima em {}", w.city);
    let _ = writeln!(
        out,
        "   {}°C | Umidade {}% | Vento {} km/h | {} | Visibilidade {} km",
        w.temperature, w.humidity, w.wind_speed, w.condition, w.visibility
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "✨ {}  [{}% confiança]", result.headline, result.confidence);
    let _ = writeln!(out, "   {}", result.explanation);
    let _ = writeln!(
        out,
        "   Atualizado às {}",
        result.received_at.with_timezone(&Local).format("%H:%M")
    );

    if !result.pieces.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "👕 Seu Outfit Completo");
        for (category, piece) in &result.pieces {
            let _ = writeln!(
                out,
                "   {} {:<10} {} ({})",
                GarmentCategory::glyph(Some(*category)),
                category.label(),
                piece.name,
                piece.color
            );
        }
    }

    let _ = writeln!(out);
    match result.feedback {
        FeedbackView::Prompt => {
            let _ = writeln!(out, "{RATING_PROMPT} (1 = Péssimo … 5 = Excelente)");
        }
        FeedbackView::Thanked(rating) => {
            let _ = writeln!(out, "{}", thanks(rating));
        }
    }

    out
}

pub fn thanks(rating: FeedbackRating) -> String {
    let n = rating.value();
    let plural = if n > 1 { "s" } else { "" };
    format!("✅ Obrigado! Você avaliou com {n} estrela{plural}! {}", stars(n))
}

pub fn items(items: &[WardrobeItem]) -> String {
    if items.is_empty() {
        return "Nenhuma roupa cadastrada.\n".to_string();
    }

    let mut out = String::new();
    for item in items {
        let _ = writeln!(out, "{}", item_line(item));
    }
    out
}

pub fn item_line(item: &WardrobeItem) -> String {
    let range = match (item.min_temperature, item.max_temperature) {
        (Some(min), Some(max)) => format!("{min}..{max}°C"),
        (Some(min), None) => format!(">= {min}°C"),
        (None, Some(max)) => format!("<= {max}°C"),
        (None, None) => "-".to_string(),
    };
    let image = item
        .image
        .as_deref()
        .filter(|i| !i.trim().is_empty())
        .unwrap_or("-");

    format!(
        "#{:<4} {} {:<20} {:<10} {:<10} {:<12} {}",
        item.id,
        GarmentCategory::glyph(item.garment_category()),
        item.name,
        item.category,
        item.color,
        range,
        image
    )
}

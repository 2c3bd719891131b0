use anyhow::Context;
use inquire::{Select, Text};
use std::fmt;
use wardrobe_core::{FeedbackView, SuggestionFlow, WardrobeBackend};

use crate::{cli::request_with_progress, render};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Rate,
    NewOutfit,
    ChangeCity,
    DismissError,
    Quit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Rate => "⭐ Avaliar sugestão",
            Action::NewOutfit => "🔄 Novo outfit",
            Action::ChangeCity => "🔍 Buscar outra cidade",
            Action::DismissError => "✖ Fechar aviso",
            Action::Quit => "Sair",
        };
        f.write_str(label)
    }
}

/// Stars offered by the rating prompt, worst first.
#[derive(Debug, Clone, Copy)]
struct Stars(u8);

impl fmt::Display for Stars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hint = match self.0 {
            1 => " Péssimo",
            5 => " Excelente",
            _ => "",
        };
        write!(f, "{}{hint}", render::stars(self.0))
    }
}

fn actions(can_rate: bool, has_error: bool) -> Vec<Action> {
    let mut actions = Vec::new();
    if can_rate {
        actions.push(Action::Rate);
    }
    actions.push(Action::NewOutfit);
    actions.push(Action::ChangeCity);
    if has_error {
        actions.push(Action::DismissError);
    }
    actions.push(Action::Quit);
    actions
}

pub async fn run<B: WardrobeBackend>(flow: &mut SuggestionFlow<B>) -> anyhow::Result<()> {
    eprintln!("{}", render::loading(flow.city()));
    let _ = flow.activate().await;

    loop {
        let view = flow.view();
        println!("\n{}", render::flow(&view));

        let can_rate = matches!(view.result.as_ref().map(|r| r.feedback), Some(FeedbackView::Prompt));
        let has_error = view.error.is_some();

        let action = Select::new("O que deseja fazer?", actions(can_rate, has_error))
            .prompt()
            .context("Failed to read action")?;

        match action {
            Action::Rate => {
                let choices = (1..=5).map(Stars).collect();
                let Stars(value) = Select::new(render::RATING_PROMPT, choices)
                    .prompt()
                    .context("Failed to read rating")?;
                flow.submit_feedback(i64::from(value)).await?;
            }
            Action::NewOutfit => request_with_progress(flow).await,
            Action::ChangeCity => {
                let city = Text::new("Cidade:")
                    .with_placeholder("Digite o nome da cidade...")
                    .prompt()
                    .context("Failed to read city")?;
                flow.set_city(city);
                request_with_progress(flow).await;
            }
            Action::DismissError => flow.dismiss_error(),
            Action::Quit => return Ok(()),
        }
    }
}

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::Text;
use std::path::PathBuf;
use wardrobe_core::{Config, HttpBackend, SuggestionFlow, WardrobeBackend, backend_from_config};

use crate::{interactive, items, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wardrobe", version, about = "Outfit suggestions from your own wardrobe")]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Get an outfit suggestion for a city and optionally rate it.
    Suggest {
        /// City name; the configured default city when absent.
        city: Option<String>,

        /// Rate the suggestion from 1 (Péssimo) to 5 (Excelente).
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..=5))]
        rate: Option<i64>,
    },

    /// Browse suggestions interactively.
    Interactive,

    /// Manage wardrobe items.
    Items {
        #[command(subcommand)]
        command: ItemsCommand,
    },

    /// Configure backend URL, default city and timeout.
    Configure {
        #[arg(long)]
        base_url: Option<String>,

        #[arg(long)]
        default_city: Option<String>,

        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ItemsCommand {
    /// List all items.
    List,

    /// Register a new item; missing required fields are prompted for.
    Add(ItemFields),

    /// Change fields of an existing item.
    Edit {
        id: i64,

        #[command(flatten)]
        fields: ItemFields,
    },

    /// Delete an item.
    Delete {
        id: i64,

        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Upload an image on its own; prints the stored name for `--image-name`.
    Upload { path: PathBuf },

    /// Save an item's image to a file.
    Image {
        id: i64,

        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct ItemFields {
    #[arg(long)]
    pub name: Option<String>,

    /// Category, e.g. casaco, superior, inferior, calçado.
    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub color: Option<String>,

    /// Lowest comfortable temperature in °C.
    #[arg(long, allow_hyphen_values = true)]
    pub min_temp: Option<i32>,

    /// Highest comfortable temperature in °C.
    #[arg(long, allow_hyphen_values = true)]
    pub max_temp: Option<i32>,

    /// Local image file to upload with the item.
    #[arg(long, conflicts_with = "image_name")]
    pub image: Option<PathBuf>,

    /// Name of an image already stored on the backend.
    #[arg(long)]
    pub image_name: Option<String>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { base_url, default_city, timeout_secs } => {
                configure(base_url, default_city, timeout_secs)
            }
            Command::Suggest { city, rate } => {
                let (config, backend) = connect()?;
                let mut flow = SuggestionFlow::new(backend, config.default_city());
                suggest(&mut flow, city, rate).await
            }
            Command::Interactive => {
                let (config, backend) = connect()?;
                let mut flow = SuggestionFlow::new(backend, config.default_city());
                interactive::run(&mut flow).await
            }
            Command::Items { command } => {
                let (_, backend) = connect()?;
                items::run(&backend, command).await
            }
        }
    }
}

fn connect() -> anyhow::Result<(Config, HttpBackend)> {
    let config = Config::load()?;
    let backend = backend_from_config(&config)?;
    tracing::debug!(base_url = backend.base_url(), timeout_secs = config.timeout_secs, "Using backend");
    Ok((config, backend))
}

async fn suggest<B: WardrobeBackend>(
    flow: &mut SuggestionFlow<B>,
    city: Option<String>,
    rate: Option<i64>,
) -> anyhow::Result<()> {
    match city {
        Some(city) => {
            flow.set_city(city);
            request_with_progress(flow).await;
        }
        None => {
            eprintln!("{}", render::loading(flow.city()));
            let _ = flow.activate().await;
        }
    }

    print!("{}", render::flow(&flow.view()));

    if let Some(error) = flow.error() {
        anyhow::bail!("{error}");
    }

    if let Some(rate) = rate {
        let rating = flow.submit_feedback(rate).await?;
        println!("{}", render::thanks(rating));
    }

    Ok(())
}

/// Run one request, showing the loading state while it is in flight.
/// Errors end up in the flow state.
pub async fn request_with_progress<B: WardrobeBackend>(flow: &mut SuggestionFlow<B>) {
    let Ok(pending) = flow.begin_request() else {
        return;
    };
    eprint!("{}", render::flow(&flow.view()));

    let result = flow.backend().fetch_suggestion(&pending.city).await;
    let _ = flow.complete_request(&pending, result);
}

fn configure(
    base_url: Option<String>,
    default_city: Option<String>,
    timeout_secs: Option<u64>,
) -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;

    if base_url.is_none() && default_city.is_none() && timeout_secs.is_none() {
        let current = config.clone();
        let current_timeout = current.timeout_secs.to_string();

        config.base_url = Text::new("Backend URL:")
            .with_default(&current.base_url)
            .prompt()
            .context("Failed to read backend URL")?;
        config.default_city = Text::new("Default city:")
            .with_default(&current.default_city)
            .prompt()
            .context("Failed to read default city")?;
        let timeout = Text::new("Request timeout (seconds):")
            .with_default(&current_timeout)
            .prompt()
            .context("Failed to read timeout")?;
        config.timeout_secs = timeout
            .trim()
            .parse()
            .with_context(|| format!("Invalid timeout '{timeout}'"))?;
    } else {
        if let Some(url) = base_url {
            config.base_url = url;
        }
        if let Some(city) = default_city {
            config.default_city = city;
        }
        if let Some(secs) = timeout_secs {
            config.timeout_secs = secs;
        }
    }

    config.save_to(&path)?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

use anyhow::{Context, Result, anyhow};
use inquire::{Confirm, Text};
use std::{fs, path::Path};
use wardrobe_core::{GarmentCategory, ItemDraft, ItemUpload, WardrobeBackend, load_item_image};

use crate::{
    cli::{ItemFields, ItemsCommand},
    render,
};

pub async fn run<B: WardrobeBackend>(backend: &B, command: ItemsCommand) -> Result<()> {
    match command {
        ItemsCommand::List => {}
        ItemsCommand::Add(fields) => {
            let draft = draft_from(prompt_missing(fields)?)?;
            draft.validate_for_create()?;
            let item = backend.create_item(&draft).await?;
            println!("Roupa #{} cadastrada.", item.id);
        }
        ItemsCommand::Edit { id, fields } => {
            let draft = draft_from(fields)?;
            draft.validate_for_update()?;
            backend.update_item(id, &draft).await?;
            println!("Roupa #{id} atualizada.");
        }
        ItemsCommand::Delete { id, yes } => {
            let confirmed = yes
                || Confirm::new(&format!("Tem certeza que deseja excluir a roupa #{id}?"))
                    .with_default(false)
                    .prompt()
                    .context("Failed to read confirmation")?;
            if !confirmed {
                println!("Exclusão cancelada.");
                return Ok(());
            }
            backend.delete_item(id).await?;
            println!("Roupa #{id} excluída.");
        }
        ItemsCommand::Upload { path } => {
            let stored = backend.upload_image(&read_upload(&path)?).await?;
            println!("{stored}");
            return Ok(());
        }
        ItemsCommand::Image { id, out } => return save_image(backend, id, &out).await,
    }

    // The list is refreshed after every mutation.
    let items = backend.list_items().await?;
    print!("{}", render::items(&items));
    Ok(())
}

async fn save_image<B: WardrobeBackend>(backend: &B, id: i64, out: &Path) -> Result<()> {
    let items = backend.list_items().await?;
    let item = items
        .iter()
        .find(|i| i.id == id)
        .ok_or_else(|| anyhow!("Roupa #{id} não encontrada"))?;

    match load_item_image(backend, Some(item.id), item.image.as_deref()).await {
        Some(bytes) => {
            fs::write(out, bytes)
                .with_context(|| format!("Failed to write image to {}", out.display()))?;
            println!("Imagem salva em {}", out.display());
        }
        None => {
            println!(
                "{} Imagem indisponível para {}",
                GarmentCategory::glyph(item.garment_category()),
                item.name
            );
        }
    }
    Ok(())
}

fn prompt_missing(mut fields: ItemFields) -> Result<ItemFields> {
    if fields.name.as_deref().is_none_or(|s| s.trim().is_empty()) {
        fields.name = Some(Text::new("Nome:").prompt().context("Failed to read name")?);
    }
    if fields.category.as_deref().is_none_or(|s| s.trim().is_empty()) {
        fields.category = Some(
            Text::new("Tipo:")
                .with_help_message("casaco, superior, inferior, calçado, acessorio")
                .prompt()
                .context("Failed to read category")?,
        );
    }
    if fields.color.as_deref().is_none_or(|s| s.trim().is_empty()) {
        fields.color = Some(Text::new("Cor:").prompt().context("Failed to read color")?);
    }
    Ok(fields)
}

/// Build the request payload. A local file becomes a multipart upload.
fn draft_from(fields: ItemFields) -> Result<ItemDraft> {
    let upload = match &fields.image {
        Some(path) => Some(read_upload(path)?),
        None => None,
    };

    Ok(ItemDraft {
        name: fields.name,
        category: fields.category,
        color: fields.color,
        min_temperature: fields.min_temp,
        max_temperature: fields.max_temp,
        image_path: fields.image_name,
        upload,
    })
}

fn read_upload(path: &Path) -> Result<ItemUpload> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Invalid image path: {}", path.display()))?
        .to_string();

    let bytes =
        fs::read(path).with_context(|| format!("Failed to read image file: {}", path.display()))?;

    Ok(ItemUpload { file_name, bytes })
}
